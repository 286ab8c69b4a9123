// netquota-api: Async Rust client for the Telegram Bot API (alert delivery)

pub mod error;
pub mod telegram;
pub mod transport;

pub use error::Error;
pub use telegram::{DEFAULT_API_URL, SentMessage, TelegramClient};
pub use transport::TransportConfig;
