// ── Core error types ──
//
// Errors surfaced by the accounting engine. Transport-level failures from
// netquota-api are folded into `Notification` so the daemon never has to
// know about HTTP.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Sampling ─────────────────────────────────────────────────────
    #[error("Interface not found: {interface}")]
    InterfaceNotFound { interface: String },

    #[error("Cannot read interface statistics from {path}: {source}")]
    StatsUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed counters for {interface}: {reason}")]
    MalformedCounters { interface: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid comparison category '{category}' (expected download/upload/upload+download)")]
    UnknownCategory { category: String },

    // ── Side effects ─────────────────────────────────────────────────
    #[error("Failed to persist state: {message}")]
    Persistence { message: String },

    #[error("Notification failed: {message}")]
    Notification {
        message: String,
        /// Whether the transport considers the failure temporary.
        transient: bool,
    },

    #[error("Shutdown command failed: {message}")]
    Shutdown { message: String },
}

impl CoreError {
    /// Returns `true` for failures that must stop the daemon before polling.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotFound { .. }
                | Self::StatsUnavailable { .. }
                | Self::MalformedCounters { .. }
        )
    }

    /// Returns `false` for a notification failure that will keep failing
    /// until the operator fixes the configuration (bad token, unknown chat).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Notification { transient, .. } => *transient,
            _ => true,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<netquota_api::Error> for CoreError {
    fn from(err: netquota_api::Error) -> Self {
        let message = if err.is_unauthorized() {
            format!("bot token rejected: {err}")
        } else {
            err.to_string()
        };
        Self::Notification {
            transient: err.is_transient(),
            message,
        }
    }
}
