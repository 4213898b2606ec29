//! Background-rate schedules
//!
//! The background rate is the exploration floor handed to the updater each
//! step. How it decays is a caller policy; [`StallExponential`] decays with the
//! samples seen and collapses faster the longer training stalls.

use serde::{Deserialize, Serialize};

/// Where training is when the next background rate is chosen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduleState {
    /// Samples drawn from the source so far
    pub samples_seen: usize,
    /// Training steps completed so far
    pub steps: usize,
    /// Consecutive steps that reported zero activity
    pub stall_count: usize,
}

/// Picks the background rate for the next training step
pub trait BackgroundSchedule: Send + Sync {
    fn background(&self, state: &ScheduleState) -> f64;
}

/// Same rate forever
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant(pub f64);

impl BackgroundSchedule for Constant {
    fn background(&self, _state: &ScheduleState) -> f64 {
        self.0
    }
}

/// `initial * exp(-steps / time_constant)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Exponential {
    pub initial: f64,
    pub time_constant: f64,
}

impl BackgroundSchedule for Exponential {
    fn background(&self, state: &ScheduleState) -> f64 {
        if self.time_constant <= 0.0 {
            return 0.0;
        }
        self.initial * (-(state.steps as f64) / self.time_constant).exp()
    }
}

/// `initial * exp(-(stall_count + 1) * samples_seen / horizon)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StallExponential {
    pub initial: f64,
    pub horizon: f64,
}

impl BackgroundSchedule for StallExponential {
    fn background(&self, state: &ScheduleState) -> f64 {
        if self.horizon <= 0.0 {
            return 0.0;
        }
        let pressure = (state.stall_count + 1) as f64 * state.samples_seen as f64;
        self.initial * (-pressure / self.horizon).exp()
    }
}

/// Serializable choice of schedule
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleConfig {
    Constant { background: f64 },
    Exponential { initial: f64, time_constant: f64 },
    StallExponential { initial: f64, horizon: f64 },
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::StallExponential {
            initial: 4.0,
            horizon: 60000.0,
        }
    }
}

impl ScheduleConfig {
    pub fn build(&self) -> Box<dyn BackgroundSchedule> {
        match *self {
            Self::Constant { background } => Box::new(Constant(background)),
            Self::Exponential {
                initial,
                time_constant,
            } => Box::new(Exponential {
                initial,
                time_constant,
            }),
            Self::StallExponential { initial, horizon } => {
                Box::new(StallExponential { initial, horizon })
            }
        }
    }

    /// Starting background rate
    pub fn initial(&self) -> f64 {
        match *self {
            Self::Constant { background } => background,
            Self::Exponential { initial, .. } | Self::StallExponential { initial, .. } => initial,
        }
    }
}
