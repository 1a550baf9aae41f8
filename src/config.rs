use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "TubeFetch";

/// File name of the engine's download archive, kept under the destination root.
pub const ARCHIVE_FILE_NAME: &str = ".download-archive.txt";

pub const LOG_FILE_NAME: &str = "app.log";

/// Selectable resolution bounds, highest first.
pub const RESOLUTION_CHOICES: [(u32, &str); 7] = [
    (2160, "2160p (4K)"),
    (1440, "1440p"),
    (1080, "1080p"),
    (720, "720p"),
    (480, "480p"),
    (360, "360p"),
    (144, "144p"),
];

pub const DEFAULT_MAX_HEIGHT: u32 = 1080;

/// Number of log lines attached to the error dialog.
pub const LOG_TAIL_LINES: usize = 60;

/// Defaults the window starts from. Nothing here is persisted between sessions.
#[derive(Debug, Clone)]
pub struct Settings {
    pub default_root: PathBuf,
    pub max_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let base = dirs::download_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
        Self {
            default_root: base.join("Video Download"),
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

pub fn archive_path(root: &Path) -> PathBuf {
    root.join(ARCHIVE_FILE_NAME)
}

/// Preferred per-user log location, e.g. `~/.local/share/TubeFetch/logs/app.log`.
pub fn user_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_NAME).join("logs").join(LOG_FILE_NAME))
}

/// Used when the per-user directory cannot be created or written.
pub fn fallback_log_path() -> PathBuf {
    std::env::temp_dir()
        .join(APP_NAME.to_lowercase())
        .join(LOG_FILE_NAME)
}
