use std::{fs, path::Path, path::PathBuf};

use log::LevelFilter;

use super::{Config, ConfigError};

/// Reads `key = value` lines; `#` starts a comment line.
#[derive(Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn source_if_exists(&self, path: &Path, config: &mut Config) -> Result<(), ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            self.apply(&content, config);
        }
        Ok(())
    }

    pub fn apply(&self, content: &str, config: &mut Config) {
        for (index, line) in content.lines().enumerate() {
            self.process_line(index + 1, line, config);
        }
    }

    fn process_line(&self, number: usize, line: &str, config: &mut Config) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::warn!("config line {}: expected key = value", number);
            return;
        };
        let key = key.trim();
        let value = unquote(value.trim());

        match key {
            "prompt" => config.prompt = value.to_string(),
            "max_jobs" => match value.parse::<usize>() {
                Ok(max) if max > 0 => config.max_jobs = max,
                _ => invalid_value(number, key, value),
            },
            "log_file" => config.log_file = PathBuf::from(value),
            "log_level" => match value.parse::<LevelFilter>() {
                Ok(level) => config.log_level = Some(level),
                Err(_) => invalid_value(number, key, value),
            },
            _ => log::warn!("config line {}: unknown key {}", number, key),
        }
    }
}

/// A bad value keeps the current setting; the shell still starts.
fn invalid_value(number: usize, key: &str, value: &str) {
    log::warn!("config line {}: invalid value for {}: {:?}", number, key, value);
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigPaths;
    use std::env;

    fn setup_test_config() -> Config {
        Config::new(ConfigPaths::from_home(Path::new("/home/testuser")))
    }

    #[test]
    fn test_apply_settings() {
        let content = r#"
            # smallsh settings
            prompt = "$ "
            max_jobs = 16
            log_file = /tmp/smallsh-test.log
            log_level = debug
        "#;
        let mut config = setup_test_config();
        ConfigLoader::new().apply(content, &mut config);

        assert_eq!(config.prompt, "$ ");
        assert_eq!(config.max_jobs, 16);
        assert_eq!(config.log_file, PathBuf::from("/tmp/smallsh-test.log"));
        assert_eq!(config.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn test_unknown_keys_and_garbage_are_skipped() {
        let mut config = setup_test_config();
        ConfigLoader::new().apply("colour = red\nnot a setting\n", &mut config);
        assert_eq!(config.prompt, ": ");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let content = "max_jobs = 0\nlog_level = loud\nmax_jobs = many\nprompt = '% '";
        let mut config = setup_test_config();
        ConfigLoader::new().apply(content, &mut config);

        assert_eq!(config.max_jobs, crate::process::jobs::DEFAULT_MAX_JOBS);
        assert!(config.log_level.is_none());
        // Lines after a bad value are still applied.
        assert_eq!(config.prompt, "% ");
    }

    #[test]
    fn test_source_if_exists() {
        let file_path = env::temp_dir().join(format!("smallshrc-{}", std::process::id()));
        fs::write(&file_path, "prompt = '> '\n").expect("write");

        let loader = ConfigLoader::new();
        let mut config = setup_test_config();
        loader.source_if_exists(&file_path, &mut config).expect("source");
        assert_eq!(config.prompt, "> ");

        let _ = fs::remove_file(&file_path);
        let mut untouched = setup_test_config();
        loader.source_if_exists(&file_path, &mut untouched).expect("missing file");
        assert_eq!(untouched.prompt, ": ");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("plain"), "plain");
    }
}
