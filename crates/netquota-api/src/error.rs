use thiserror::Error;

/// Top-level error type for the `netquota-api` crate.
///
/// Covers every way a Bot API call can fail: building the client, reaching
/// the server, and the `{ok: false}` envelope Telegram answers with.
/// `netquota-core` maps these into notification failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    ///
    /// The request URL is stripped before wrapping: it embeds the bot token.
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The configured API base URL cannot carry a path (e.g. `mailto:`).
    #[error("API base URL cannot be a base: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be built (TLS backend initialisation).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Bot API ─────────────────────────────────────────────────────
    /// Flood control. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Structured error from the Bot API (`{"ok": false, ...}`).
    #[error("Telegram API error {code}: {description}")]
    Telegram { code: u16, description: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url())
    }
}

impl Error {
    /// Returns `true` if the bot token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Telegram { code: 401, .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Telegram { code, .. } => *code >= 500,
            _ => false,
        }
    }
}
