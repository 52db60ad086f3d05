//! # Logging Initialization
//!
//! Centralized `tracing` setup, called once at startup. Verbosity follows
//! `RUST_LOG` when set, otherwise the supplied default level with `debug`
//! for this crate. By default logs go to a daily rolling file in the
//! user-specific cache directory (via the `directories` crate) with ANSI
//! disabled; with `log_to_file = false`, or whenever the cache directory is
//! unavailable, logs go to stderr with colors enabled.
//!
//! Stdout is never used: the MCP protocol owns it.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    init_logging("trace", false).expect("Failed to initialize test logging");
}

/// Initializes the logging system. Safe to call more than once; only the
/// first call takes effect.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},aitaus_core=debug")));

        let file_appender = if log_to_file {
            ProjectDirs::from("com", "Aitaus", "aitaus_mcp").and_then(|proj_dirs| {
                let log_dir = proj_dirs.cache_dir();
                std::fs::create_dir_all(log_dir).ok()?;
                std::panic::catch_unwind(|| {
                    tracing_appender::rolling::daily(log_dir, "aitaus_mcp.log")
                })
                .ok()
            })
        } else {
            None
        };

        match file_appender {
            Some(appender) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .init();
                // Leaked so buffered log lines are flushed on exit.
                Box::leak(Box::new(guard));
            }
            None => {
                // Stderr fallback covers both opt-out and sandboxed
                // environments where the cache dir is unavailable.
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(stderr).with_ansi(true))
                    .init();
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug", false).unwrap();
        init_logging("info", false).unwrap();
        tracing::debug!("logging initialized for tests");
    }
}
