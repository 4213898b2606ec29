//! # Parliament - Ternary Voting Networks
//!
//! Feed-forward networks whose weights, activations, and error signals are all
//! drawn from {-1, 0, +1}. Training is gradient-free: errors are pushed
//! backward only through weights that can still move in the needed direction,
//! and every weight is nudged stochastically, with an exploration floor that
//! decays as training settles.
//!
//! ## Core Components
//!
//! - **Ternary projection**: integer, float (with tolerance), and sign-only clamps
//! - **Network**: layers of voting units, one flat weight arena per layer
//! - **Scorer**: ternary output error (`expected - actual`, projected)
//! - **Propagator**: feasible-direction masking of the error per weight
//! - **Updater**: exponential-draw stochastic weight nudges
//! - **Trainer**: batching, background-rate schedules, stall detection
//!
//! ## Design Principles
//!
//! - **No hidden state**: randomness is an explicit `Rng` handle, instrumentation
//!   an explicit [`Observer`]
//! - **Ternary everywhere**: every weight and activation stays in {-1, 0, +1}
//! - **Configuration defects are errors**: shape mismatches return
//!   [`ParliamentError`], they never abort
//!
//! ## Example
//!
//! ```
//! use parliament::{Network, UpdateRates};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut net = Network::random(&[2, 4, 1], &mut rng).unwrap();
//! let rates = UpdateRates::new(5.0, 1.0).unwrap();
//!
//! let inputs: Vec<Vec<i8>> = vec![vec![1, 1], vec![1, -1], vec![-1, 1], vec![-1, -1]];
//! let targets: Vec<Vec<i8>> = vec![vec![1], vec![-1], vec![-1], vec![-1]];
//! let activity = net
//!     .train_step(&inputs, &targets, rates, &mut rng)
//!     .unwrap();
//! assert!(activity >= 0.0);
//! ```

// Ternary primitives
mod ternary;
pub use ternary::{
    float_project, is_trit, project, sign_project, Polarity, Trit, FLOAT_TOLERANCE,
};

// Network model
pub mod network;
pub use network::{validate_sizes, Layer, Network, WeightHistogram};

// Scoring and classification
pub mod score;
pub use score::{all_correct, argmax, classify, fraction_correct, score, ClassOutcome};

// Feasible-direction propagation and stochastic updates
pub mod learning;
pub use learning::{apply_updates, propagate, MaskedError, Seeding, UpdateRates};

// Train step and trainer loop
pub mod train;
pub use train::{
    batch_accuracy, train_step, BatchAccuracy, Evaluation, StepOutcome, TrainReport, Trainer,
};

// Background-rate schedules
pub mod schedule;
pub use schedule::{
    BackgroundSchedule, Constant, Exponential, ScheduleConfig, ScheduleState, StallExponential,
};

// Sample sources and encoders
pub mod data;
pub use data::{
    bit_pattern, one_hot, threshold_encode, Encoder, Sample, SampleSource, VecSource,
    DEFAULT_CUTOFF,
};

// Instrumentation sinks
pub mod observe;
pub use observe::{LogObserver, NullObserver, Observer, Summary, SummaryObserver};

// Trainer configuration
pub mod config;
pub use config::TrainConfig;

// Snapshot persistence
pub mod snapshot;
pub use snapshot::NetworkSnapshot;

// Error types
pub mod error;
pub use error::{ParliamentError, Result};
