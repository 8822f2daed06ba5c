use super::ConfigError;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub rc_path: PathBuf,
    pub log_path: PathBuf,
}

impl ConfigPaths {
    pub fn new() -> Result<Self, ConfigError> {
        let home = env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or(ConfigError::HomeDirNotFound)?;
        Ok(Self::from_home(&home))
    }

    pub fn from_home(home: &Path) -> Self {
        ConfigPaths {
            rc_path: home.join(".smallshrc"),
            log_path: home.join(".smallsh.log"),
        }
    }

    /// `-c <path>` replaces the rc file; the log location stays in $HOME.
    pub fn with_rc_path(mut self, rc_path: impl Into<PathBuf>) -> Self {
        self.rc_path = rc_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_home() {
        let paths = ConfigPaths::from_home(Path::new("/home/testuser"));
        assert_eq!(paths.rc_path, PathBuf::from("/home/testuser/.smallshrc"));
        assert_eq!(paths.log_path, PathBuf::from("/home/testuser/.smallsh.log"));
    }

    #[test]
    fn test_rc_override() {
        let paths = ConfigPaths::from_home(Path::new("/home/testuser")).with_rc_path("/etc/smallshrc");
        assert_eq!(paths.rc_path, PathBuf::from("/etc/smallshrc"));
        assert_eq!(paths.log_path, PathBuf::from("/home/testuser/.smallsh.log"));
    }
}
