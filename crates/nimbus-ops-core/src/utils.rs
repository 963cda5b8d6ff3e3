//! Utility functions

/// Expand tilde (~) to home directory in path strings
pub fn expand_tilde(path: &str) -> String {
    if path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', home.to_str().unwrap_or(""), 1);
        }
    }
    path.to_string()
}

/// Run timestamp used in artifact filenames, local time
pub fn now_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
