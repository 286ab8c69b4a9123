//! CLI error types with miette diagnostics.
//!
//! Only a few failures stop the daemon before it starts polling: a config
//! file that exists but cannot be read or parsed, and an interface that
//! cannot be sampled. Everything else is logged and retried per poll.

use miette::Diagnostic;
use thiserror::Error;

use netquota_config::ConfigError;
use netquota_core::CoreError;

/// Exit code for every fatal startup error.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Cannot load config file {path}")]
    #[diagnostic(
        code(netquota::config),
        help("Fix the JSON syntax, or move the file away to start from defaults.")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    // ── Startup checks ───────────────────────────────────────────────
    #[error("Cannot sample interface '{interface}'")]
    #[diagnostic(
        code(netquota::interface_unavailable),
        help(
            "Check the interface name with `ip link` and set \"interface\" in the config.\n\
             Statistics are read from --net-dev (default /proc/net/dev)."
        )
    )]
    InterfaceUnavailable {
        interface: String,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    #[diagnostic(code(netquota::core))]
    Core(CoreError),
}

impl CliError {
    /// Attach the config file path to a load failure.
    pub fn from_config(source: ConfigError, path: &std::path::Path) -> Self {
        Self::Config {
            path: path.display().to_string(),
            source,
        }
    }

    /// Classify a failure from the daemon's startup check.
    pub fn from_startup(err: CoreError, interface: &str) -> Self {
        if err.is_fatal_at_startup() {
            Self::InterfaceUnavailable {
                interface: interface.to_owned(),
                source: err,
            }
        } else {
            Self::Core(err)
        }
    }
}
