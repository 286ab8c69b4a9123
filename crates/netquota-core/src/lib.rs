//! Accounting engine for the `netquota` daemon.
//!
//! This crate owns the state machine that turns a host's raw interface
//! counters into a per-period running total and fires quota alerts exactly
//! once per period:
//!
//! - **[`period`]**: monthly reset scheduling anchored to a day-of-month,
//!   clamped to the length of short months.
//!
//! - **[`reconcile`]**: folds raw samples into running totals, carrying the
//!   previous epoch across counter resets (interface down/up, reboot).
//!
//! - **[`evaluate`]**: compares usage against the warning threshold and the
//!   hard ratio limit, gated by persisted "already notified" flags.
//!
//! - **[`Daemon`]**: the polling driver tying it together. All I/O goes
//!   through the narrow traits in [`sampler`], [`store`], [`notify`] and
//!   [`host`], so every step can run against test doubles.

pub mod daemon;
pub mod error;
pub mod evaluate;
pub mod host;
pub mod model;
pub mod notify;
pub mod period;
pub mod reconcile;
pub mod sampler;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use daemon::{Daemon, PollReport, Services};
pub use error::CoreError;
pub use evaluate::{AlertOutcome, Evaluation};
pub use host::{HostControl, ShutdownSequence, SystemShutdown};
pub use model::{
    AccountingState, BYTES_PER_GIB, Category, Comparison, CounterGain, MonitorConfig, Sample,
};
pub use notify::{Notifier, TelegramNotifier};
pub use period::{Clock, LocalClock};
pub use sampler::{ProcNetDev, Sampler};
pub use store::StateStore;
