use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing::info;
use url::Url;

/// Takes the user to a page the server pointed at.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, url: &Url) -> Result<(), String>;
}

/// Opens pages in the system browser.
pub struct Browser;

impl Navigator for Browser {
    fn navigate(&self, url: &Url) -> Result<(), String> {
        info!(%url, "opening result page");
        open::that(url.as_str()).map_err(|e| format!("Failed to open {}: {}", url, e))
    }
}

/// Writes the target to stdout, for headless runs and machines without a browser.
pub struct Printer;

impl Navigator for Printer {
    fn navigate(&self, url: &Url) -> Result<(), String> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{url}").and_then(|()| stdout.flush()).map_err(|e| e.to_string())
    }
}

/// Keeps every target it was asked to visit.
#[derive(Default, Clone)]
pub struct Recorder {
    visited: Arc<Mutex<Vec<Url>>>,
}

impl Recorder {
    pub fn visited(&self) -> Vec<Url> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for Recorder {
    fn navigate(&self, url: &Url) -> Result<(), String> {
        self.visited
            .lock()
            .map_err(|e| e.to_string())?
            .push(url.clone());
        Ok(())
    }
}
