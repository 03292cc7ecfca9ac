//! Configuration management for iso-director.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, lazy validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        ConsoleConfig, DEFAULT_PORT, DEFAULT_TIMER_TICK_MS, HandoverConfig, SignalingConfig,
        default_download_url,
    },
};

use std::{fs, io::Write, panic::Location, path::PathBuf, time::Duration};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use iso_director_core::{ModePolicy, OrchestratorConfig, RecordingMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Director console behaviour.
    pub console: ConsoleConfig,
    /// Signaling endpoint for capture backends.
    pub signaling: SignalingConfig,
    /// Handover to the Download Manager.
    pub handover: HandoverConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    ///
    /// Note: This does NOT validate the Download Manager URL. Call
    /// `validate_download_url()` before the console starts taking
    /// operator input.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| AppError::ConfigError {
                reason: format!("Failed to read config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            let config = Self::parse(&contents)?;

            info!(config_path = ?config_path, "Configuration loaded");

            Ok(config)
        } else {
            info!("No config found, creating default");
            Self::create_default()
        }
    }

    /// Parse configuration from TOML text.
    #[track_caller]
    pub fn parse(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Validate that the Download Manager URL can be opened.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate_download_url(&self) -> AppResult<()> {
        let url = self.handover.download_url.trim();
        let supported = ["http://", "https://", "file://"]
            .iter()
            .any(|scheme| url.starts_with(scheme));

        if !supported || url.len() <= "file://".len() {
            return Err(AppError::ConfigError {
                reason: format!(
                    "Download Manager URL {:?} must be an http(s) or file URL",
                    self.handover.download_url
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    /// Save configuration to disk using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument]
    pub fn save(&self) -> AppResult<()> {
        let config_path = Self::config_path()?;

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, &config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Start validation policy for the Mode Controller.
    pub fn mode_policy(&self) -> ModePolicy {
        ModePolicy {
            iso_requires_source: self.console.iso_requires_source,
        }
    }

    /// Orchestrator tuning derived from the console section.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            await_start_ack: self.console.await_start_ack,
            timer_tick: Duration::from_millis(self.console.timer_tick_ms.max(1)),
        }
    }

    /// Room the console addresses at startup.
    pub fn initial_room(&self) -> &str {
        self.console.default_room.as_deref().unwrap_or_default()
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "iso-director", "Iso-Director").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn create_default() -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let store_path = proj_dirs.data_dir().join("handover.json");

        let config = Config {
            console: ConsoleConfig {
                default_mode: RecordingMode::Legacy,
                default_room: None,
                iso_requires_source: false,
                await_start_ack: false,
                timer_tick_ms: DEFAULT_TIMER_TICK_MS,
            },
            signaling: SignalingConfig { port: DEFAULT_PORT },
            handover: HandoverConfig {
                store_path,
                download_url: default_download_url(),
            },
        };

        config.save()?;

        info!(
            store_path = ?config.handover.store_path,
            "Default config created"
        );

        Ok(config)
    }
}
