//! User settings, persisted as JSON in the local app data folder.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, error, warn};

pub const APP_DIR: &str = "plant-disease-uploader";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000/";

/// Counter for generating unique temp file names within this process.
static SAVE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// User-configurable application settings.
///
/// Missing fields fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the detection server; `submit` is resolved against it
    pub server_url: String,
    /// Open redirect targets in the system browser instead of printing them
    pub open_in_browser: bool,
    /// Timeout applied to every HTTP request
    pub request_timeout_secs: u64,
    /// Directory the file picker starts in, updated after every pick
    pub last_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            open_in_browser: true,
            request_timeout_secs: 60,
            last_directory: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Loads settings from `path`, falling back to defaults when the file is missing or unreadable.
    pub async fn load(path: &Path) -> Self {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), "failed to read settings: {}", e);
                return Self::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), "failed to parse settings: {}", e);
                Self::default()
            }
        }
    }

    /// Persists the settings to disk.
    ///
    /// Writes to a temporary file first, then renames it over `path`. Temp names are
    /// unique per process and save.
    pub async fn save(&self, path: &Path) {
        let unique_id = SAVE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        let temp_path = path.with_extension(format!("json.{}.{}.tmp", pid, unique_id));

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Failed to create settings directory: {}", e);
                return;
            }
        }

        let json = match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize settings: {}", e);
                return;
            }
        };

        if let Err(e) = tokio::fs::write(&temp_path, &json).await {
            error!("Failed to write settings to temp file: {}", e);
            return;
        }

        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            error!("Failed to rename temp settings file: {}", e);
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
    }
}

/// Returns the path to the settings file within the local app data directory.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("settings.json"))
}
