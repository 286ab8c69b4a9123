// Telegram Bot API HTTP client
//
// Wraps `reqwest::Client` with bot-token URL construction and unwrapping of
// the `{ ok, result | error_code, description }` envelope. Only the calls
// the daemon needs are implemented.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Public Bot API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// The Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<u16>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// The subset of a Telegram `Message` returned by `sendMessage` that we keep.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
    #[serde(default)]
    pub text: Option<String>,
}

/// Raw HTTP client for the Telegram Bot API.
///
/// The bot token lives in the request path (`/bot<token>/<method>`), so it is
/// kept as a [`SecretString`] and never logged.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is normally [`DEFAULT_API_URL`]; a self-hosted Bot API
    /// server can be used instead.
    pub fn new(
        base_url: Url,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, token)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        token: SecretString,
    ) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Send a plain text message to `chat_id`.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<SentMessage, Error> {
        debug!(chat_id, len = text.len(), "sending Telegram message");
        self.call("sendMessage", &SendMessageRequest { chat_id, text })
            .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build `{base}/bot{token}/{method}`, keeping any path prefix on the base.
    fn method_url(&self, method: &str) -> Url {
        let mut url = self.base_url.clone();
        // `with_client` rejects cannot-be-a-base URLs, so segments are available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&format!("bot{}", self.token.expose_secret()))
                .push(method);
        }
        url
    }

    /// POST a JSON body to a Bot API method and unwrap the envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        trace!(method, "POST bot API");

        let resp = self.http.post(self.method_url(method)).json(body).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("HTTP {status}: {e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if envelope.ok && status.is_success() {
            return envelope.result.ok_or_else(|| Error::Deserialization {
                message: "response has `ok: true` but no `result`".into(),
                body,
            });
        }

        if let Some(retry_after_secs) = envelope.parameters.and_then(|p| p.retry_after) {
            return Err(Error::RateLimited { retry_after_secs });
        }

        Err(Error::Telegram {
            code: envelope.error_code.unwrap_or_else(|| status.as_u16()),
            description: envelope
                .description
                .unwrap_or_else(|| format!("HTTP {status}")),
        })
    }
}
