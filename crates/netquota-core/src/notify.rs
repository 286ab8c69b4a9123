// ── Alert delivery ──
//
// The evaluator composes the message body; the notifier owns the transport
// and the `[device]` prefix that tells several monitored hosts apart in one
// chat.

use std::future::Future;

use netquota_api::TelegramClient;
use tracing::debug;

use crate::error::CoreError;

/// Delivers a text alert.
pub trait Notifier: Send + Sync {
    fn notify(&self, text: &str) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Sends alerts to a Telegram chat through the Bot API.
///
/// Built [`unconfigured`](Self::unconfigured) when the token or chat is
/// missing: every send then fails, so accounting keeps running and the
/// alert is retried on each poll until the config is fixed.
#[derive(Debug)]
pub struct TelegramNotifier {
    delivery: Delivery,
    device_label: String,
}

#[derive(Debug)]
enum Delivery {
    Bot {
        client: TelegramClient,
        chat_id: String,
    },
    Unconfigured {
        reason: String,
    },
}

impl TelegramNotifier {
    pub fn new(
        client: TelegramClient,
        chat_id: impl Into<String>,
        device_label: impl Into<String>,
    ) -> Self {
        Self {
            delivery: Delivery::Bot {
                client,
                chat_id: chat_id.into(),
            },
            device_label: device_label.into(),
        }
    }

    pub fn unconfigured(reason: impl Into<String>, device_label: impl Into<String>) -> Self {
        Self {
            delivery: Delivery::Unconfigured {
                reason: reason.into(),
            },
            device_label: device_label.into(),
        }
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), CoreError> {
        match &self.delivery {
            Delivery::Bot { client, chat_id } => {
                let text = labelled(&self.device_label, text);
                let sent = client.send_message(chat_id, &text).await?;
                debug!(message_id = sent.message_id, "alert delivered");
                Ok(())
            }
            Delivery::Unconfigured { reason } => Err(CoreError::Notification {
                message: format!("Telegram is not configured: {reason}"),
                transient: false,
            }),
        }
    }
}

/// Prefix `text` with the device label in square brackets.
pub fn labelled(device_label: &str, text: &str) -> String {
    format!("[{device_label}] {text}")
}

/// Body of the advisory alert sent when usage crosses the threshold.
pub fn warning_message(usage_gb: f64, threshold: f64) -> String {
    format!(
        "Traffic alert: current usage is {usage_gb:.2} GB, exceeding the {:.0}% threshold",
        threshold * 100.0
    )
}

/// Body of the critical alert sent right before the host is shut down.
pub fn critical_message(usage_gb: f64, ratio: f64) -> String {
    format!(
        "Shutdown warning: current usage is {usage_gb:.2} GB, exceeding {:.0}% of the limit, \
         shutting down!",
        ratio * 100.0
    )
}
