use crate::config::default_port;

use serde::{Deserialize, Serialize};

/// Signaling endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingConfig {
    /// Port capture backends connect to.
    #[serde(default = "default_port")]
    pub port: u16,
}
