use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "kicks")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("kicks_config.json"))
    }

    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("kicks")
                .join("kicks.log")
        } else {
            ProjectDirs::from("", "", "kicks")
                .map(|pd| pd.data_local_dir().join("kicks.log"))
                .unwrap_or_else(|| PathBuf::from("kicks.log"))
        }
    }
}
