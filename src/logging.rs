use std::fs::OpenOptions;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::core::config::Config;
use crate::error::ShellError;

/// The level to log at: `--debug` wins, then `log_level` from the rc file.
/// `None` leaves logging off.
pub fn level(debug: bool, config: &Config) -> Option<LevelFilter> {
    if debug {
        Some(LevelFilter::Debug)
    } else {
        config.log_level.filter(|level| *level != LevelFilter::Off)
    }
}

/// Sends log records to the configured log file, appending. Shell output
/// on stdout/stderr is left alone.
pub fn init(debug: bool, config: &Config) -> Result<(), ShellError> {
    let Some(level) = level(debug, config) else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let log_config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, log_config, file)?;

    log::info!(
        "smallsh {} started (pid {})",
        env!("CARGO_PKG_VERSION"),
        std::process::id()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigPaths;
    use std::path::Path;

    #[test]
    fn test_level_selection() {
        let mut config = Config::new(ConfigPaths::from_home(Path::new("/home/u")));
        assert_eq!(level(false, &config), None);
        assert_eq!(level(true, &config), Some(LevelFilter::Debug));

        config.log_level = Some(LevelFilter::Warn);
        assert_eq!(level(false, &config), Some(LevelFilter::Warn));

        config.log_level = Some(LevelFilter::Off);
        assert_eq!(level(false, &config), None);
    }
}
