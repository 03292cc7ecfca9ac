use crate::config::default_download_url;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Handover to the Download Manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoverConfig {
    /// JSON file shared with the Download Manager.
    pub store_path: PathBuf,

    /// Download Manager page opened after a handover.
    #[serde(default = "default_download_url")]
    pub download_url: String,
}
