// ── Domain model ──
//
// Plain data carried through the polling loop. Nothing here touches disk
// or the network; netquota-config translates the JSON document into these
// types and back.

use std::time::Duration;

use chrono::NaiveDate;
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Bytes in one binary gigabyte (2^30). Limits are expressed in this unit.
pub const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// One reading of an interface's raw byte counters.
///
/// Raw counters restart from zero when the interface or host resets, so a
/// `Sample` is only meaningful relative to the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub received: u64,
    pub transmitted: u64,
}

/// Bytes added to each running total by one reconciliation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterGain {
    pub received: u64,
    pub transmitted: u64,
}

/// Durable accounting state for the current period.
///
/// Owned by the daemon and written back after every mutation. The stored
/// file is the only source of truth across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountingState {
    /// Bytes received since the period began.
    pub total_received: u64,
    /// Bytes transmitted since the period began.
    pub total_transmitted: u64,
    /// Raw receive counter seen at the previous poll.
    pub last_received: u64,
    /// Raw transmit counter seen at the previous poll.
    pub last_transmitted: u64,
    /// Day the current period began. `None` when never reset or unreadable.
    pub last_reset: Option<NaiveDate>,
    /// The warning notification was delivered this period.
    pub notified_threshold: bool,
    /// The critical notification was delivered this period.
    pub notified_ratio: bool,
}

impl AccountingState {
    /// Start a new period: zero both totals, clear both flags and stamp
    /// `today` as the reset date. Raw `last_*` counters are kept so the next
    /// delta is still computed against the real previous sample.
    pub fn reset(&mut self, today: NaiveDate) {
        self.total_received = 0;
        self.total_transmitted = 0;
        self.notified_threshold = false;
        self.notified_ratio = false;
        self.last_reset = Some(today);
    }
}

/// Which direction(s) of traffic count against the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Category {
    #[strum(serialize = "download")]
    Download,
    #[strum(serialize = "upload")]
    Upload,
    #[strum(serialize = "upload+download")]
    Total,
}

impl Category {
    /// Bytes of `state` that count against the quota.
    pub fn usage_bytes(self, state: &AccountingState) -> u64 {
        match self {
            Self::Download => state.total_received,
            Self::Upload => state.total_transmitted,
            Self::Total => state.total_received.saturating_add(state.total_transmitted),
        }
    }
}

/// Quota limits as configured.
///
/// `category` stays a raw string: an unknown value is a per-poll
/// configuration error, not a load failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub category: String,
    /// Quota size in binary GB.
    pub limit_gb: f64,
    /// Fraction of the limit that triggers the warning.
    pub threshold: f64,
    /// Fraction of the limit that triggers the critical alert and shutdown.
    pub ratio: f64,
}

impl Comparison {
    pub fn category(&self) -> Result<Category, CoreError> {
        self.category
            .trim()
            .parse()
            .map_err(|_| CoreError::UnknownCategory {
                category: self.category.clone(),
            })
    }

    pub fn threshold_limit_gb(&self) -> f64 {
        self.limit_gb * self.threshold
    }

    pub fn ratio_limit_gb(&self) -> f64 {
        self.limit_gb * self.ratio
    }
}

/// Runtime settings for the daemon, resolved from the config document.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Interface to sample. Empty means [`MonitorConfig::DEFAULT_INTERFACE`].
    pub interface: String,
    /// Sleep between polls. Zero means [`MonitorConfig::DEFAULT_POLL_INTERVAL`].
    pub poll_interval: Duration,
    /// Day of month (1–31) the accounting period starts on.
    pub period_start_day: u32,
    pub comparison: Comparison,
    /// Wait between the critical notification and the shutdown action.
    pub shutdown_grace: Duration,
}

impl MonitorConfig {
    pub const DEFAULT_INTERFACE: &'static str = "eth0";
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(600);
    pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

    /// Fill the interface and poll interval when left unset.
    pub fn with_fallbacks(mut self) -> Self {
        if self.interface.trim().is_empty() {
            Self::DEFAULT_INTERFACE.clone_into(&mut self.interface);
        }
        if self.poll_interval.is_zero() {
            self.poll_interval = Self::DEFAULT_POLL_INTERVAL;
        }
        self
    }
}
