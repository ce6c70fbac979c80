use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};

/// Default filter directive for the beat crates.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "beat_model=debug,beat_rule=debug,beat_play=debug,warn"
    } else {
        "beat_model=info,beat_rule=info,beat_play=info,warn"
    }
}

/// Initialize logging with env_logger.
///
/// `RUST_LOG` overrides the default filter. If `log_file` is provided, logs
/// are appended to that file instead of stderr. Calling this more than once
/// leaves the first logger installed.
pub fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(default_filter(verbose));
    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp_millis();

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    if builder.try_init().is_err() {
        log::debug!("logger already initialized");
    }
    Ok(())
}
