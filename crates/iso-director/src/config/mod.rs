mod console_config;
#[allow(clippy::module_inception)]
mod config;
mod handover_config;
mod signaling_config;

pub(crate) use {
    config::Config, console_config::ConsoleConfig, handover_config::HandoverConfig,
    signaling_config::SignalingConfig,
};

pub(crate) const DEFAULT_PORT: u16 = 3001;
pub(crate) const DEFAULT_TIMER_TICK_MS: u64 = 1000;
pub(crate) const DEFAULT_DOWNLOAD_URL: &str = "http://localhost:3000/downloads.html";

pub(crate) fn default_port() -> u16 {
    DEFAULT_PORT
}

pub(crate) fn default_timer_tick_ms() -> u64 {
    DEFAULT_TIMER_TICK_MS
}

pub(crate) fn default_download_url() -> String {
    DEFAULT_DOWNLOAD_URL.to_string()
}
