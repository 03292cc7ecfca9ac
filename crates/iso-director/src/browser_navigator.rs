use iso_director_core::Navigator;

use tracing::{error, info, instrument};

/// Opens the Download Manager in the system browser.
#[derive(Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    #[instrument(skip(self))]
    fn navigate(&mut self, url: &str) {
        // The handover is already persisted; a browser that fails to open
        // leaves the data for the Download Manager to pick up later. The
        // opener is detached so the command loop never waits on it.
        match open::that_detached(url) {
            Ok(()) => info!("Opened Download Manager"),
            Err(e) => error!(error = ?e, "Failed to open Download Manager"),
        }
    }
}
