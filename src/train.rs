//! Training - one backward walk per batch, and the loop that drives it
//!
//! [`train_step`] is the whole algorithm for one batch: score every sample, sum
//! the ternary errors into one signal for the output layer, then walk layers
//! last to first, masking, flipping, and handing the column mean back.
//!
//! [`Trainer`] is the caller-side loop: it fills batches from a
//! [`SampleSource`], picks the background rate from a schedule, restarts the
//! source when a pass runs out, and stops once activity has been zero for
//! longer than the configured stall threshold.

use crate::config::TrainConfig;
use crate::data::{Sample, SampleSource};
use crate::error::{ParliamentError, Result};
use crate::learning::{apply_updates, propagate, UpdateRates};
use crate::network::Network;
use crate::observe::{NullObserver, Observer};
use crate::schedule::{BackgroundSchedule, ScheduleState};
use crate::score::{all_correct, classify, fraction_correct, score};
use crate::ternary::Trit;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Run one training step over a batch
///
/// Returns the total activity: the sum of `|v|` over every masked cell in every
/// layer. Exactly 0 means no cell carried any error this step.
pub fn train_step<I, T, R>(
    net: &mut Network,
    inputs: &[I],
    expected: &[T],
    rates: UpdateRates,
    rng: &mut R,
    observer: &mut dyn Observer,
) -> Result<f64>
where
    I: AsRef<[Trit]>,
    T: AsRef<[Trit]>,
    R: Rng + ?Sized,
{
    if inputs.len() != expected.len() {
        return Err(ParliamentError::LengthMismatch {
            inputs: inputs.len(),
            targets: expected.len(),
        });
    }

    let mut error = vec![0.0; net.output_width()];
    for (input, target) in inputs.iter().zip(expected) {
        let sample_error = score(net, input.as_ref(), target.as_ref(), observer)?;
        for (acc, e) in error.iter_mut().zip(sample_error) {
            *acc += e as f64;
        }
    }

    let mut total = 0.0;
    for index in (0..net.layers().len()).rev() {
        let masked = propagate(net.layer(index), &error)?;
        total += apply_updates(net.layer_mut(index), &masked, rates, rng, observer)?;
        observer.observe(&format!("activity_{}", index), total);
        error = masked.backward();
    }

    log::debug!(
        "train step: batch={} activity={} background={}",
        inputs.len(),
        total,
        rates.background()
    );

    Ok(total)
}

/// How well a network fits a batch
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatchAccuracy {
    /// Mean fraction of output positions correct
    pub easy: f64,
    /// Fraction of samples with every output position correct
    pub hard: f64,
}

impl BatchAccuracy {
    pub fn is_perfect(&self) -> bool {
        self.hard == 1.0
    }
}

/// Score a batch without training. Emits `eval_easy` and `eval_hard` per sample.
pub fn batch_accuracy<I, T>(
    net: &Network,
    inputs: &[I],
    expected: &[T],
    observer: &mut dyn Observer,
) -> Result<BatchAccuracy>
where
    I: AsRef<[Trit]>,
    T: AsRef<[Trit]>,
{
    if inputs.len() != expected.len() {
        return Err(ParliamentError::LengthMismatch {
            inputs: inputs.len(),
            targets: expected.len(),
        });
    }
    if inputs.is_empty() {
        return Ok(BatchAccuracy::default());
    }

    let mut easy = 0.0;
    let mut hard = 0.0;
    for (input, target) in inputs.iter().zip(expected) {
        let errors = score(net, input.as_ref(), target.as_ref(), &mut NullObserver)?;
        let sample_easy = fraction_correct(&errors);
        let sample_hard = if all_correct(&errors) { 1.0 } else { 0.0 };
        observer.observe("eval_easy", sample_easy);
        observer.observe("eval_hard", sample_hard);
        easy += sample_easy;
        hard += sample_hard;
    }

    let n = inputs.len() as f64;
    Ok(BatchAccuracy {
        easy: easy / n,
        hard: hard / n,
    })
}

impl Network {
    /// [`train_step`] without an observer
    pub fn train_step<I, T, R>(
        &mut self,
        inputs: &[I],
        expected: &[T],
        rates: UpdateRates,
        rng: &mut R,
    ) -> Result<f64>
    where
        I: AsRef<[Trit]>,
        T: AsRef<[Trit]>,
        R: Rng + ?Sized,
    {
        train_step(self, inputs, expected, rates, rng, &mut NullObserver)
    }
}

/// Result of one [`Trainer::step`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub activity: f64,
    pub background: f64,
    /// Fit of the batch after the update
    pub accuracy: BatchAccuracy,
}

/// Summary of a [`Trainer::run`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrainReport {
    pub steps: usize,
    pub samples_seen: usize,
    /// Completed passes over the source
    pub epochs: usize,
    pub last_activity: f64,
    pub final_background: f64,
    /// Stopped because activity stayed at zero
    pub stalled: bool,
    pub last_accuracy: Option<BatchAccuracy>,
}

/// Accuracy over one full pass of a source
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub samples: usize,
    /// Fraction of samples whose whole output matched the target
    pub exact: f64,
    /// Mean `ClassOutcome::easy` over samples with a one-hot target
    pub class_easy: f64,
    /// Mean `ClassOutcome::hard` over samples with a one-hot target
    pub class_hard: f64,
}

/// Caller-side training loop around a network
pub struct Trainer {
    net: Network,
    config: TrainConfig,
    schedule: Box<dyn BackgroundSchedule>,
    rng: StdRng,
    state: ScheduleState,
}

impl Trainer {
    /// Build the network described by `config`
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut net = Network::new(&config.sizes)?;
        if config.randomize {
            net.randomize(&mut rng);
        }
        Ok(Self::assemble(net, config, rng))
    }

    /// Train an existing network. `config.sizes` must describe it.
    pub fn with_network(net: Network, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        if net.sizes() != config.sizes {
            return Err(ParliamentError::InvalidConfig(format!(
                "network shape {:?} does not match config {:?}",
                net.sizes(),
                config.sizes
            )));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::assemble(net, config, rng))
    }

    fn assemble(net: Network, config: TrainConfig, rng: StdRng) -> Self {
        let schedule = config.schedule.build();
        Self {
            net,
            config,
            schedule,
            rng,
            state: ScheduleState::default(),
        }
    }

    /// Replace the configured background schedule
    pub fn with_schedule(mut self, schedule: Box<dyn BackgroundSchedule>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn network(&self) -> &Network {
        &self.net
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.net
    }

    pub fn into_network(self) -> Network {
        self.net
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    /// Background rate the next step would use
    pub fn background(&self) -> f64 {
        self.schedule.background(&self.state).max(0.0)
    }

    /// Train on one batch and advance the step and stall counters
    pub fn step(&mut self, batch: &[Sample], observer: &mut dyn Observer) -> Result<StepOutcome> {
        let background = self.background();
        let rates =
            UpdateRates::new(self.config.rate, background)?.with_seeding(self.config.seeding);

        let inputs: Vec<&[Trit]> = batch.iter().map(|s| s.input.as_slice()).collect();
        let targets: Vec<&[Trit]> = batch.iter().map(|s| s.target.as_slice()).collect();

        let activity =
            train_step(&mut self.net, &inputs, &targets, rates, &mut self.rng, observer)?;
        let accuracy = batch_accuracy(&self.net, &inputs, &targets, observer)?;
        observer.observe("background", background);

        self.state.steps += 1;
        if activity == 0.0 {
            self.state.stall_count += 1;
        } else {
            self.state.stall_count = 0;
        }

        Ok(StepOutcome {
            activity,
            background,
            accuracy,
        })
    }

    /// Train from `source` until the activity stalls or the sample budget runs out
    ///
    /// A batch is trained each time `batch_size` fresh samples have been drawn.
    /// An exhausted source is restarted and counted as a completed epoch.
    pub fn run(
        &mut self,
        source: &mut dyn SampleSource,
        observer: &mut dyn Observer,
    ) -> Result<TrainReport> {
        let batch_size = self.config.batch_size;
        let mut batch: Vec<Sample> = Vec::with_capacity(batch_size);
        let mut report = TrainReport::default();
        let mut drawn = 0usize;

        for ii in 0..self.config.max_samples {
            self.state.samples_seen = ii;

            if ii > 0 && ii % batch_size == 0 {
                let outcome = self.step(&batch, observer)?;
                report.steps += 1;
                report.last_activity = outcome.activity;
                report.final_background = outcome.background;
                report.last_accuracy = Some(outcome.accuracy);

                if self.state.stall_count > self.config.stall_threshold {
                    log::info!(
                        "stalled after {} steps ({} samples, {} epochs)",
                        report.steps,
                        ii,
                        report.epochs
                    );
                    report.stalled = true;
                    break;
                }
            }

            let sample = match source.next_sample() {
                Some(sample) => sample,
                None => {
                    report.epochs += 1;
                    log::info!(
                        "epoch {} done at sample {} (activity {}, background {})",
                        report.epochs,
                        ii,
                        report.last_activity,
                        self.background()
                    );
                    source.restart();
                    source.next_sample().ok_or_else(|| {
                        ParliamentError::InvalidConfig("sample source is empty".to_string())
                    })?
                }
            };

            drawn += 1;

            if batch.len() < batch_size {
                batch.push(sample);
            } else {
                batch[ii % batch_size] = sample;
            }
        }

        report.samples_seen = drawn;
        if !report.stalled {
            log::warn!(
                "sample budget of {} exhausted after {} steps without stalling",
                self.config.max_samples,
                report.steps
            );
        }

        let histogram = self.net.summarize();
        observer.observe("weights_neg", histogram.negative as f64);
        observer.observe("weights_zero", histogram.zero as f64);
        observer.observe("weights_pos", histogram.positive as f64);

        Ok(report)
    }

    /// Score one full pass of `source` without training, then restart it
    pub fn evaluate(
        &self,
        source: &mut dyn SampleSource,
        observer: &mut dyn Observer,
    ) -> Result<Evaluation> {
        source.restart();

        let mut eval = Evaluation::default();
        let mut exact = 0.0;
        let mut labelled = 0usize;
        let mut easy = 0.0;
        let mut hard = 0.0;

        while let Some(sample) = source.next_sample() {
            eval.samples += 1;
            let errors = score(&self.net, &sample.input, &sample.target, &mut NullObserver)?;
            if all_correct(&errors) {
                exact += 1.0;
            }
            if let Some(label) = one_hot_label(&sample.target) {
                let outcome = classify(&self.net, &sample.input, label, observer)?;
                labelled += 1;
                easy += if outcome.easy { 1.0 } else { 0.0 };
                hard += outcome.hard;
            }
        }
        source.restart();

        if eval.samples > 0 {
            eval.exact = exact / eval.samples as f64;
        }
        if labelled > 0 {
            eval.class_easy = easy / labelled as f64;
            eval.class_hard = hard / labelled as f64;
        }
        Ok(eval)
    }
}

/// The class of a one-hot target: the single +1 position
fn one_hot_label(target: &[Trit]) -> Option<usize> {
    let mut hot = target.iter().enumerate().filter(|(_, &t)| t == 1);
    let (label, _) = hot.next()?;
    if hot.next().is_some() {
        return None;
    }
    Some(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{bit_pattern, VecSource};
    use crate::learning::Seeding;
    use crate::observe::SummaryObserver;
    use crate::schedule::{Constant, Exponential, ScheduleConfig};

    fn and_batch() -> (Vec<Vec<Trit>>, Vec<Vec<Trit>>) {
        let mut inputs = Vec::new();
        let mut targets = Vec::new();
        for value in 0..4 {
            let input = bit_pattern(value, 2);
            let target = if value == 3 { vec![1] } else { vec![-1] };
            inputs.push(input);
            targets.push(target);
        }
        (inputs, targets)
    }

    #[test]
    fn test_train_step_rejects_length_mismatch() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = Network::new(&[3, 4]).unwrap();
        let rates = UpdateRates::new(5.0, 0.0).unwrap();
        let inputs: Vec<Vec<Trit>> = vec![vec![1, 0, -1]];
        let targets: Vec<Vec<Trit>> = vec![];

        let err = net.train_step(&inputs, &targets, rates, &mut rng).unwrap_err();
        assert!(matches!(err, ParliamentError::LengthMismatch { inputs: 1, targets: 0 }));
    }

    #[test]
    fn test_train_step_rejects_wrong_target_width() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = Network::new(&[3, 4]).unwrap();
        let rates = UpdateRates::new(5.0, 0.0).unwrap();
        let inputs: Vec<Vec<Trit>> = vec![vec![1, 0, -1]];
        let targets: Vec<Vec<Trit>> = vec![vec![0, 1, 0]];
        let err = net.train_step(&inputs, &targets, rates, &mut rng).unwrap_err();
        assert!(matches!(err, ParliamentError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_perfect_batch_has_zero_activity() {
        let mut rng = StdRng::seed_from_u64(4);
        let net = Network::random(&[3, 5, 2], &mut rng).unwrap();
        let inputs: Vec<Vec<Trit>> = vec![vec![1, -1, 1], vec![0, 1, -1], vec![-1, -1, -1]];
        // targets are exactly what the network already says
        let targets: Vec<Vec<Trit>> = inputs.iter().map(|x| net.output(x).unwrap()).collect();

        let rates = UpdateRates::new(5.0, 0.0).unwrap();
        let mut trained = net.clone();
        let activity = trained.train_step(&inputs, &targets, rates, &mut rng).unwrap();
        assert_eq!(activity, 0.0);
        assert_eq!(trained, net);

        // exploration may move zero weights, but the activity is still zero
        let explore = UpdateRates::new(5.0, 3.0).unwrap();
        let activity = trained.train_step(&inputs, &targets, explore, &mut rng).unwrap();
        assert_eq!(activity, 0.0);
    }

    #[test]
    fn test_train_step_emits_layer_activity() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut net = Network::new(&[3, 6, 5]).unwrap();
        let rates = UpdateRates::new(5.0, 0.0).unwrap();
        let mut obs = SummaryObserver::new();

        let inputs: Vec<Vec<Trit>> = vec![vec![1, 1, 1]];
        let targets: Vec<Vec<Trit>> = vec![vec![1, 1, 1, 1, -1]];
        let activity = train_step(&mut net, &inputs, &targets, rates, &mut rng, &mut obs).unwrap();

        // all-zero output against a +-1 target: every output unit carries error
        assert!(activity > 0.0);
        assert!(obs.get("activity_1").is_some());
        assert_eq!(obs.get("activity_0").map(|s| s.max), Some(activity));
        assert_eq!(obs.mean("score_easy"), Some(0.0));
    }

    #[test]
    fn test_training_keeps_weights_ternary() {
        let mut rng = StdRng::seed_from_u64(31);
        let mut net = Network::random(&[3, 6, 5], &mut rng).unwrap();
        let rates = UpdateRates::new(5.0, 1.0).unwrap();
        let inputs: Vec<Vec<Trit>> = vec![vec![1, 1, 1], vec![-1, 1, -1]];
        let targets: Vec<Vec<Trit>> = vec![vec![1, 1, 1, 1, -1], vec![-1, 1, 1, -1, 1]];

        for _ in 0..500 {
            net.train_step(&inputs, &targets, rates, &mut rng).unwrap();
        }
        for layer in net.layers() {
            assert!(layer.weights().iter().all(|&w| (-1..=1).contains(&w)));
        }
    }

    #[test]
    fn test_single_layer_learns_constant_target() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut net = Network::new(&[3, 4]).unwrap();
        let rates = UpdateRates::new(5.0, 0.0).unwrap();
        let inputs: Vec<Vec<Trit>> = vec![vec![1, 1, 1], vec![1, -1, 1]];
        let targets: Vec<Vec<Trit>> = vec![vec![1, 1, 1, 1], vec![1, 1, 1, 1]];

        let mut last = f64::MAX;
        for _ in 0..2000 {
            last = net.train_step(&inputs, &targets, rates, &mut rng).unwrap();
            if last == 0.0 {
                break;
            }
        }

        // weights only climb toward +1 here, and every unit is correct well
        // before all of its weights reach +1
        assert_eq!(last, 0.0);
        let acc = batch_accuracy(&net, &inputs, &targets, &mut NullObserver).unwrap();
        assert!(acc.is_perfect());
    }

    fn learns_and(seed: u64, steps: usize) -> bool {
        let (inputs, targets) = and_batch();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Network::random(&[2, 4, 1], &mut rng).unwrap();
        let schedule = Exponential {
            initial: 4.0,
            time_constant: 3000.0,
        };

        for step in 0..steps {
            let background = schedule.background(&ScheduleState {
                steps: step,
                ..Default::default()
            });
            let rates = UpdateRates::new(5.0, background).unwrap();
            net.train_step(&inputs, &targets, rates, &mut rng).unwrap();

            let acc = batch_accuracy(&net, &inputs, &targets, &mut NullObserver).unwrap();
            if acc.is_perfect() {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_and_gate_converges() {
        // statistical: each seed is an independent search
        let solved = (0..6u64).filter(|&seed| learns_and(seed, 20_000)).count();
        assert!(solved >= 5, "only {}/6 seeds learned AND", solved);
    }

    fn trainer_learns_and(seed: u64, steps: usize) -> bool {
        let (inputs, targets) = and_batch();
        let batch: Vec<Sample> = inputs
            .into_iter()
            .zip(targets)
            .map(|(input, target)| Sample::new(input, target))
            .collect();

        let mut config = TrainConfig::with_sizes(&[2, 4, 1]);
        config.batch_size = batch.len();
        config.schedule = ScheduleConfig::Exponential {
            initial: 4.0,
            time_constant: 3000.0,
        };
        config.seed = Some(seed);
        let mut trainer = Trainer::new(config).unwrap();

        for _ in 0..steps {
            let outcome = trainer.step(&batch, &mut NullObserver).unwrap();
            if outcome.accuracy.is_perfect() {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_default_trainer_learns_and() {
        assert_eq!(TrainConfig::default().seeding, Seeding::ZeroSignal);
        let solved = (10..16u64)
            .filter(|&seed| trainer_learns_and(seed, 20_000))
            .count();
        assert!(solved >= 5, "only {}/6 seeds learned AND", solved);
    }

    #[test]
    fn test_batch_accuracy() {
        let mut net = Network::new(&[2, 2]).unwrap();
        net.layer_mut(0).set_weight(0, 0, 1);
        net.layer_mut(0).set_weight(1, 1, 1);
        let inputs: Vec<Vec<Trit>> = vec![vec![1, -1], vec![1, 1]];
        let targets: Vec<Vec<Trit>> = vec![vec![1, -1], vec![1, -1]];
        let mut obs = SummaryObserver::new();

        let acc = batch_accuracy(&net, &inputs, &targets, &mut obs).unwrap();
        assert_eq!(acc.easy, 0.75);
        assert_eq!(acc.hard, 0.5);
        assert_eq!(obs.get("eval_hard").map(|s| s.count), Some(2));
    }

    #[test]
    fn test_one_hot_label() {
        assert_eq!(one_hot_label(&[-1, 1, -1]), Some(1));
        assert_eq!(one_hot_label(&[-1, -1]), None);
        assert_eq!(one_hot_label(&[1, 1]), None);
    }

    // all-ones weights solve every sample, so climbing toward +1 cannot get stuck
    fn constant_source() -> VecSource {
        VecSource::new(vec![
            Sample::new(vec![1, 1, 1], vec![1, 1, 1, 1]),
            Sample::new(vec![1, -1, 1], vec![1, 1, 1, 1]),
            Sample::new(vec![1, 1, -1], vec![1, 1, 1, 1]),
        ])
    }

    #[test]
    fn test_trainer_stalls_on_solved_task() {
        let mut config = TrainConfig::with_sizes(&[3, 4]);
        config.batch_size = 3;
        config.stall_threshold = 3;
        config.max_samples = 100_000;
        config.randomize = false;
        config.seed = Some(1);

        let mut trainer = Trainer::new(config)
            .unwrap()
            .with_schedule(Box::new(Constant(0.0)));
        let mut source = constant_source();
        let mut obs = SummaryObserver::new();

        let report = trainer.run(&mut source, &mut obs).unwrap();
        assert!(report.stalled);
        assert_eq!(report.last_activity, 0.0);
        assert!(report.epochs > 0);
        assert!(report.last_accuracy.map_or(false, |a| a.is_perfect()));
        assert!(obs.get("weights_pos").is_some());

        let eval = trainer.evaluate(&mut source, &mut NullObserver).unwrap();
        assert_eq!(eval.samples, 3);
        assert_eq!(eval.exact, 1.0);
    }

    #[test]
    fn test_trainer_budget_without_stall() {
        let mut config = TrainConfig::with_sizes(&[3, 4]);
        config.batch_size = 2;
        config.max_samples = 11;
        config.seed = Some(3);

        let mut trainer = Trainer::new(config)
            .unwrap()
            .with_schedule(Box::new(Constant(2.0)));
        let report = trainer.run(&mut constant_source(), &mut NullObserver).unwrap();

        // steps fire before drawing samples 2, 4, 6, 8, 10
        assert_eq!(report.steps, 5);
        assert_eq!(report.samples_seen, 11);
        assert_eq!(report.epochs, 3);
        assert!(!report.stalled);
        assert_eq!(report.final_background, 2.0);
        assert_eq!(trainer.state().steps, 5);
    }

    #[test]
    fn test_trainer_rejects_empty_source() {
        let mut config = TrainConfig::with_sizes(&[3, 4]);
        config.batch_size = 2;
        config.max_samples = 10;
        let mut trainer = Trainer::new(config).unwrap();
        let result = trainer.run(&mut VecSource::default(), &mut NullObserver);
        assert!(matches!(result, Err(ParliamentError::InvalidConfig(_))));
    }

    #[test]
    fn test_with_network_checks_shape() {
        let net = Network::new(&[2, 3]).unwrap();
        assert!(Trainer::with_network(net.clone(), TrainConfig::with_sizes(&[2, 3])).is_ok());
        assert!(Trainer::with_network(net, TrainConfig::with_sizes(&[2, 4])).is_err());
    }

    #[test]
    fn test_classification_evaluation() {
        // unit j fires only for input pattern j
        let mut net = Network::new(&[2, 2]).unwrap();
        net.layer_mut(0).set_weight(0, 0, 1);
        net.layer_mut(0).set_weight(1, 0, -1);
        let mut source = VecSource::new(vec![
            Sample::new(vec![1, 0], vec![1, -1]),
            Sample::new(vec![-1, 0], vec![-1, 1]),
        ]);
        let trainer = Trainer::with_network(net, TrainConfig::with_sizes(&[2, 2])).unwrap();

        let eval = trainer.evaluate(&mut source, &mut NullObserver).unwrap();
        assert_eq!(eval.samples, 2);
        assert_eq!(eval.exact, 1.0);
        assert_eq!(eval.class_easy, 1.0);
        assert_eq!(eval.class_hard, 1.0);
    }
}
