use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::app_dirs::AppDirs;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("session length ({session}s) must be a whole number of effective windows ({window}s)")]
    SessionNotWindowMultiple { session: u32, window: u32 },

    #[error("effective window ({window}s) must be a whole number of drain intervals ({drain}s)")]
    WindowNotDrainMultiple { window: u32, drain: u32 },
}

/// Validated timing parameters for the counting core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    session_secs: u32,
    window_secs: u32,
    drain_secs: u32,
    input_debounce: Duration,
}

impl Cadence {
    pub fn new(
        session_secs: u32,
        window_secs: u32,
        drain_secs: u32,
        input_debounce: Duration,
    ) -> Result<Self, ConfigError> {
        if session_secs == 0 {
            return Err(ConfigError::Zero("session length"));
        }
        if window_secs == 0 {
            return Err(ConfigError::Zero("effective window"));
        }
        if drain_secs == 0 {
            return Err(ConfigError::Zero("drain interval"));
        }
        if session_secs % window_secs != 0 {
            return Err(ConfigError::SessionNotWindowMultiple {
                session: session_secs,
                window: window_secs,
            });
        }
        if window_secs % drain_secs != 0 {
            return Err(ConfigError::WindowNotDrainMultiple {
                window: window_secs,
                drain: drain_secs,
            });
        }
        Ok(Self {
            session_secs,
            window_secs,
            drain_secs,
            input_debounce,
        })
    }

    pub fn session_secs(&self) -> u32 {
        self.session_secs
    }

    pub fn window_secs(&self) -> u32 {
        self.window_secs
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.drain_secs))
    }

    /// Number of drains a window gets before it elapses.
    pub fn window_ticks(&self) -> u32 {
        self.window_secs / self.drain_secs
    }

    pub fn input_debounce(&self) -> Duration {
        self.input_debounce
    }

    /// The countdown always advances in whole seconds.
    pub fn tick(&self) -> Duration {
        Duration::from_secs(1)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            session_secs: 3600,
            window_secs: 300,
            drain_secs: 3,
            input_debounce: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub session_mins: u32,
    pub window_mins: u32,
    pub drain_secs: u32,
    pub input_debounce_ms: u64,
    pub confirm_cancel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_mins: 60,
            window_mins: 5,
            drain_secs: 3,
            input_debounce_ms: 1000,
            confirm_cancel: true,
        }
    }
}

impl Config {
    pub fn cadence(&self) -> Result<Cadence, ConfigError> {
        Cadence::new(
            self.session_mins.saturating_mul(60),
            self.window_mins.saturating_mul(60),
            self.drain_secs,
            Duration::from_millis(self.input_debounce_ms),
        )
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "could not read config");
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
