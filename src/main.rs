use smallsh::core::config::Config;
use smallsh::core::state::ShellState;
use smallsh::flags::Flags;
use smallsh::process::signal;
use smallsh::shell::Shell;
use std::env;
use std::sync::Arc;

fn main() -> Result<(), smallsh::error::ShellError> {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    flags.parse(&args)?;

    if flags.is_set("help") {
        flags.print_help();
        return Ok(());
    }

    if flags.is_set("version") {
        println!("smallsh {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(flags.get_value("config").map(String::as_str))?;
    smallsh::logging::init(flags.is_set("debug"), &config)?;
    log::debug!("settings from {}", config.rc_path().display());

    let state = Arc::new(ShellState::new(config.max_jobs));
    // Fatal: the error propagates out of main and the process exits with 1.
    signal::install(state.clone())?;

    let mut shell = Shell::new(flags, config, state)?;
    shell.run()
}
