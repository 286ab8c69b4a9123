// ── Polling driver ──
//
// Starting → Polling → Polling … with no terminal state. Each iteration runs
// to completion before the next sleep; nothing overlaps.

use std::convert::Infallible;

use bytesize::ByteSize;
use tracing::{debug, error, info, warn};

use crate::error::CoreError;
use crate::evaluate::{self, Evaluation};
use crate::host::{HostControl, ShutdownSequence};
use crate::model::{AccountingState, CounterGain, MonitorConfig, Sample};
use crate::notify::Notifier;
use crate::period::{self, Clock, LocalClock};
use crate::reconcile;
use crate::sampler::Sampler;
use crate::store::StateStore;

/// The collaborators a [`Daemon`] drives.
#[derive(Debug)]
pub struct Services<S, P, N, H, C = LocalClock> {
    pub sampler: S,
    pub store: P,
    pub notifier: N,
    pub host: H,
    pub clock: C,
}

/// What one poll did, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    /// A new accounting period began before sampling.
    pub reset: bool,
    /// The raw reading, if sampling succeeded.
    pub sample: Option<Sample>,
    /// Bytes added to the running totals.
    pub gain: Option<CounterGain>,
    /// Threshold checks, if they ran.
    pub evaluation: Option<Evaluation>,
    /// The shutdown sequence ran (successfully or not).
    pub shutdown_invoked: bool,
}

/// The accounting daemon: owns the state and the collaborators.
pub struct Daemon<S, P, N, H, C = LocalClock> {
    config: MonitorConfig,
    state: AccountingState,
    sampler: S,
    store: P,
    notifier: N,
    shutdown: ShutdownSequence<H>,
    clock: C,
}

impl<S, P, N, H, C> Daemon<S, P, N, H, C>
where
    S: Sampler,
    P: StateStore,
    N: Notifier,
    H: HostControl,
    C: Clock,
{
    /// Build a daemon from loaded configuration and state.
    ///
    /// An empty interface name and a zero poll interval fall back to their
    /// defaults here.
    pub fn new(
        config: MonitorConfig,
        state: AccountingState,
        services: Services<S, P, N, H, C>,
    ) -> Self {
        let config = config.with_fallbacks();
        let shutdown = ShutdownSequence::new(services.host, config.shutdown_grace);
        Self {
            config,
            state,
            sampler: services.sampler,
            store: services.store,
            notifier: services.notifier,
            shutdown,
            clock: services.clock,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> &AccountingState {
        &self.state
    }

    /// Check once that the configured interface can be sampled.
    ///
    /// Failure here is fatal: polling a missing interface forever would only
    /// fill the log.
    pub fn preflight(&self) -> Result<Sample, CoreError> {
        let sample = self.sampler.counters(&self.config.interface)?;
        debug!(
            interface = %self.config.interface,
            rx = sample.received,
            tx = sample.transmitted,
            "interface is readable"
        );
        Ok(sample)
    }

    /// Validate the interface, then poll forever.
    pub async fn run(mut self) -> Result<Infallible, CoreError> {
        self.preflight()?;

        info!(
            interface = %self.config.interface,
            interval = %humantime::format_duration(self.config.poll_interval),
            start_day = self.config.period_start_day,
            "monitoring started"
        );

        loop {
            let report = self.poll_once().await;
            debug!(?report, "poll complete");
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One iteration: maybe reset, sample, reconcile, persist, evaluate, and
    /// run the shutdown sequence if the critical alert just went out.
    pub async fn poll_once(&mut self) -> PollReport {
        let mut report = PollReport::default();

        let today = self.clock.today();
        if period::should_reset(today, self.state.last_reset, self.config.period_start_day) {
            info!(
                %today,
                previous = ?self.state.last_reset,
                "new accounting period, resetting totals"
            );
            self.state.reset(today);
            self.persist("period reset");
            report.reset = true;
        }

        let sample = match self.sampler.counters(&self.config.interface) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(
                    error = %e,
                    interface = %self.config.interface,
                    "sampling failed, retrying next poll"
                );
                return report;
            }
        };
        report.sample = Some(sample);

        if sample.received < self.state.last_received
            || sample.transmitted < self.state.last_transmitted
        {
            info!(
                rx = sample.received,
                last_rx = self.state.last_received,
                tx = sample.transmitted,
                last_tx = self.state.last_transmitted,
                "counter went backwards, assuming interface reset"
            );
        }
        let gain = reconcile::reconcile(&mut self.state, sample);
        report.gain = Some(gain);
        self.persist("counter update");

        debug!(
            total_rx = %ByteSize::b(self.state.total_received),
            total_tx = %ByteSize::b(self.state.total_transmitted),
            "totals updated"
        );

        let evaluation = match evaluate::evaluate(
            &mut self.state,
            &self.config.comparison,
            &self.notifier,
            &mut self.store,
        )
        .await
        {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!(error = %e, "threshold evaluation skipped");
                return report;
            }
        };

        if evaluation.shutdown_armed() {
            // Failure is already logged and deliberately not retried.
            let _ = self.shutdown.execute().await;
            report.shutdown_invoked = true;
        }
        report.evaluation = Some(evaluation);

        report
    }

    fn persist(&mut self, what: &str) {
        if let Err(e) = self.store.save(&self.state) {
            warn!(error = %e, what, "failed to persist state");
        }
    }
}
