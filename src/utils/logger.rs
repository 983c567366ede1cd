use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging system.
///
/// `RUST_LOG` takes precedence over `level`. Without a log file everything
/// goes to stderr, keeping stdout free for prompts.
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{}'", level))?;

    let registry = tracing_subscriber::registry().with(filter);

    match (json_output, log_file) {
        (true, Some(file)) => {
            let file = open_log_file(file)?;
            registry.with(fmt::layer().json().with_writer(file)).try_init()?;
        }
        (true, None) => {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()?;
        }
        (false, Some(file)) => {
            let file = open_log_file(file)?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(file))
                .try_init()?;
        }
        (false, None) => {
            registry
                .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> Result<Mutex<std::fs::File>> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    Ok(Mutex::new(file))
}

/// Initialize logger from config
pub fn init_from_config(config: &crate::utils::config::LoggingConfig) -> Result<()> {
    let json = config.output == "json";
    let log_file = if !config.file_path.is_empty() {
        Some(Path::new(&config.file_path))
    } else {
        None
    };

    init_logger(&config.level, json, log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_log_file_is_error() {
        let result = open_log_file(Path::new("/nonexistent-dir/for/sure/dn.log"));
        assert!(result.is_err());
    }
}
