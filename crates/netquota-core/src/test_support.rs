// In-memory stand-ins for the daemon's collaborators.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::host::HostControl;
use crate::model::{AccountingState, Sample};
use crate::notify::Notifier;
use crate::period::Clock;
use crate::sampler::Sampler;
use crate::store::StateStore;

/// Replays scripted readings; repeats the last one when the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedSampler {
    readings: Arc<Mutex<VecDeque<Result<Sample, String>>>>,
    last: Arc<Mutex<Option<Sample>>>,
}

impl ScriptedSampler {
    pub fn new(readings: impl IntoIterator<Item = Result<Sample, String>>) -> Self {
        Self {
            readings: Arc::new(Mutex::new(readings.into_iter().collect())),
            last: Arc::default(),
        }
    }

    pub fn received(values: impl IntoIterator<Item = u64>) -> Self {
        Self::new(values.into_iter().map(|received| {
            Ok(Sample {
                received,
                transmitted: 0,
            })
        }))
    }

    pub fn push(&self, reading: Result<Sample, String>) {
        self.readings.lock().unwrap().push_back(reading);
    }
}

impl Sampler for ScriptedSampler {
    fn counters(&self, interface: &str) -> Result<Sample, CoreError> {
        let next = self.readings.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(Ok(sample)) => {
                *last = Some(sample);
                Ok(sample)
            }
            Some(Err(reason)) => Err(CoreError::MalformedCounters {
                interface: interface.to_owned(),
                reason,
            }),
            None => (*last).ok_or_else(|| CoreError::InterfaceNotFound {
                interface: interface.to_owned(),
            }),
        }
    }
}

/// Keeps every saved state; can be told to fail.
#[derive(Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<AccountingState>>>,
    fail: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn saves(&self) -> Vec<AccountingState> {
        self.saved.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<AccountingState> {
        self.saved.lock().unwrap().last().cloned()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl StateStore for MemoryStore {
    fn save(&mut self, state: &AccountingState) -> Result<(), CoreError> {
        if *self.fail.lock().unwrap() {
            return Err(CoreError::Persistence {
                message: "disk full".into(),
            });
        }
        self.saved.lock().unwrap().push(state.clone());
        Ok(())
    }
}

/// Records delivered messages; fails the next `n` sends when asked.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    failures_left: Arc<AtomicUsize>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), CoreError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(CoreError::Notification {
                message: "connection refused".into(),
                transient: true,
            });
        }
        self.sent.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

/// Counts shutdown invocations.
#[derive(Clone, Default)]
pub struct FakeHost {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl FakeHost {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HostControl for FakeHost {
    async fn shutdown(&self) -> Result<(), CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(CoreError::Shutdown {
                message: "permission denied".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// A settable calendar.
#[derive(Clone)]
pub struct FixedClock(Arc<Mutex<NaiveDate>>);

impl FixedClock {
    pub fn new(y: i32, m: u32, d: u32) -> Self {
        Self(Arc::new(Mutex::new(date(y, m, d))))
    }

    pub fn set(&self, y: i32, m: u32, d: u32) {
        *self.0.lock().unwrap() = date(y, m, d);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `gb` binary gigabytes in bytes.
pub fn gib(gb: u64) -> u64 {
    gb * crate::model::BYTES_PER_GIB
}
