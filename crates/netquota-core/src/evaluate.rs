// ── Threshold evaluation ──
//
// Two independent checks per poll, each gated by its own persisted flag:
// the advisory threshold and the critical ratio. A flag only flips after a
// successful send, so a failed send is retried on the next poll and a sent
// one is never repeated within the period.

use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::model::{AccountingState, BYTES_PER_GIB, Comparison};
use crate::notify::{self, Notifier};
use crate::store::StateStore;

/// What happened to one of the two checks during a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Usage is under this limit.
    BelowLimit,
    /// Over the limit, but already notified this period.
    AlreadyNotified,
    /// Notification delivered and flag recorded.
    Sent,
    /// Delivery failed; the flag stays clear for a retry next poll.
    Failed(String),
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub usage_gb: f64,
    pub warning: AlertOutcome,
    pub critical: AlertOutcome,
}

impl Evaluation {
    /// The critical alert went out in this pass, so the host shutdown
    /// sequence must now run.
    pub fn shutdown_armed(&self) -> bool {
        self.critical == AlertOutcome::Sent
    }
}

/// Convert a byte count to binary gigabytes.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB as f64
}

/// Compare the running totals in `state` against `comparison` and send any
/// alert that is due.
///
/// An unknown category aborts the pass before any flag is touched. Flags
/// that flip are persisted through `store` straight away; a persistence
/// failure is logged but the in-memory flag stays set, since the alert was
/// delivered.
pub async fn evaluate<N, P>(
    state: &mut AccountingState,
    comparison: &Comparison,
    notifier: &N,
    store: &mut P,
) -> Result<Evaluation, CoreError>
where
    N: Notifier,
    P: StateStore,
{
    let category = comparison.category()?;
    let usage_gb = to_gb(category.usage_bytes(state));

    let warning = if usage_gb < comparison.threshold_limit_gb() {
        AlertOutcome::BelowLimit
    } else if state.notified_threshold {
        AlertOutcome::AlreadyNotified
    } else {
        let text = notify::warning_message(usage_gb, comparison.threshold);
        match notifier.notify(&text).await {
            Ok(()) => {
                info!(usage_gb, %category, "threshold alert sent");
                state.notified_threshold = true;
                persist(store, state, "threshold flag");
                AlertOutcome::Sent
            }
            Err(e) => {
                log_send_failure(&e, usage_gb, "threshold");
                AlertOutcome::Failed(e.to_string())
            }
        }
    };

    let critical = if usage_gb < comparison.ratio_limit_gb() {
        AlertOutcome::BelowLimit
    } else if state.notified_ratio {
        AlertOutcome::AlreadyNotified
    } else {
        let text = notify::critical_message(usage_gb, comparison.ratio);
        match notifier.notify(&text).await {
            Ok(()) => {
                info!(usage_gb, %category, "critical alert sent");
                state.notified_ratio = true;
                persist(store, state, "ratio flag");
                AlertOutcome::Sent
            }
            Err(e) => {
                log_send_failure(&e, usage_gb, "critical");
                AlertOutcome::Failed(e.to_string())
            }
        }
    };

    Ok(Evaluation {
        usage_gb,
        warning,
        critical,
    })
}

fn log_send_failure(e: &CoreError, usage_gb: f64, alert: &str) {
    if e.is_transient() {
        warn!(error = %e, usage_gb, alert, "alert failed, will retry next poll");
    } else {
        error!(
            error = %e,
            usage_gb,
            alert,
            "alert rejected, check the Telegram settings; will retry next poll"
        );
    }
}

fn persist<P: StateStore>(store: &mut P, state: &AccountingState, what: &str) {
    if let Err(e) = store.save(state) {
        warn!(error = %e, what, "failed to persist state");
    }
}
