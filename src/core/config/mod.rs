use std::fmt;
use std::path::{Path, PathBuf};

use log::LevelFilter;

mod loader;
mod paths;

use loader::ConfigLoader;
pub use paths::ConfigPaths;

use crate::process::jobs::DEFAULT_MAX_JOBS;

pub const DEFAULT_PROMPT: &str = ": ";

/// Settings read from `~/.smallshrc` (or the file given with `-c`).
#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub max_jobs: usize,
    pub log_file: PathBuf,
    pub log_level: Option<LevelFilter>,
    paths: ConfigPaths,
}

impl Config {
    pub fn new(paths: ConfigPaths) -> Self {
        Config {
            prompt: DEFAULT_PROMPT.to_string(),
            max_jobs: DEFAULT_MAX_JOBS,
            log_file: paths.log_path.clone(),
            log_level: None,
            paths,
        }
    }

    /// Builds the config for `rc_override` or the default rc file and
    /// applies whatever the file sets. A missing default rc is fine; a
    /// missing explicit one is an error.
    pub fn load(rc_override: Option<&str>) -> Result<Self, ConfigError> {
        let mut paths = ConfigPaths::new()?;
        let explicit = rc_override.is_some();
        if let Some(path) = rc_override {
            paths = paths.with_rc_path(path);
        }

        let mut config = Config::new(paths);
        let rc_path = config.paths.rc_path.clone();
        if explicit && !rc_path.exists() {
            return Err(ConfigError::ConfigFileNotFound(
                rc_path.display().to_string(),
            ));
        }

        ConfigLoader::new().source_if_exists(&rc_path, &mut config)?;
        Ok(config)
    }

    pub fn rc_path(&self) -> &Path {
        &self.paths.rc_path
    }
}

#[derive(Debug)]
pub enum ConfigError {
    HomeDirNotFound,
    ConfigFileNotFound(String),
    IoError(std::io::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::HomeDirNotFound => write!(f, "Home directory not found"),
            ConfigError::ConfigFileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
