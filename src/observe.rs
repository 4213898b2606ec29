//! Observation sink - named scalar readings emitted by scoring and training
//!
//! The algorithm never depends on what an observer does with a reading. Pass
//! [`NullObserver`] to discard everything, [`SummaryObserver`] to aggregate
//! per-label count/sum/min/max, or [`LogObserver`] to forward to `log::trace!`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Receives labelled scalar observations
pub trait Observer {
    fn observe(&mut self, label: &str, value: f64);
}

/// Drops every observation
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    #[inline]
    fn observe(&mut self, _label: &str, _value: f64) {}
}

/// Forwards every observation to `log::trace!`
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn observe(&mut self, label: &str, value: f64) {
        log::trace!("{} = {}", label, value);
    }
}

/// Running summary of one label
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Mean of all observed values
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregates observations per label, in label order
#[derive(Clone, Debug, Default)]
pub struct SummaryObserver {
    summaries: BTreeMap<String, Summary>,
}

impl SummaryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary for one label, if anything was observed under it
    pub fn get(&self, label: &str) -> Option<&Summary> {
        self.summaries.get(label)
    }

    /// Mean for one label, if anything was observed under it
    pub fn mean(&self, label: &str) -> Option<f64> {
        self.get(label).map(Summary::mean)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.summaries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Forget everything observed so far
    pub fn reset(&mut self) {
        self.summaries.clear();
    }

    /// Render one line per label: `label count=.. sum=.. mean=.. min=.. max=..`
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (label, s) in &self.summaries {
            let _ = writeln!(
                out,
                "{} count={} sum={:.6} mean={:.6} min={:.6} max={:.6}",
                label,
                s.count,
                s.sum,
                s.mean(),
                s.min,
                s.max
            );
        }
        out
    }

    /// Render and then reset
    pub fn drain(&mut self) -> String {
        let out = self.dump();
        self.reset();
        out
    }
}

impl Observer for SummaryObserver {
    fn observe(&mut self, label: &str, value: f64) {
        match self.summaries.get_mut(label) {
            Some(summary) => summary.push(value),
            None => {
                self.summaries.insert(label.to_string(), Summary::new(value));
            }
        }
    }
}
