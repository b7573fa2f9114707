//! Console logging: one human-readable line per event, on stdout.

use env_logger::{Builder, Env, Target};

/// Install the global logger. `RUST_LOG` overrides the default level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    let result = Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stdout)
        .format_target(false)
        .format_timestamp_secs()
        .try_init();

    if let Err(e) = result {
        eprintln!("Logger already initialized: {}", e);
    }
}
