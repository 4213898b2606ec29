//! Scoring - the only place error is measured
//!
//! [`score`] keeps the sign of `expected - actual` per output unit and throws the
//! magnitude away. [`classify`] reads the final layer as a vote over classes.

use crate::error::{ParliamentError, Result};
use crate::network::Network;
use crate::observe::Observer;
use crate::ternary::{project, Trit};

/// Ternary error of the network's output against a target
///
/// Position `i` is 0 where the output already matches, +1 where the target is
/// above the output, -1 where the output is above the target. Emits
/// `score_easy` (fraction of positions correct) and `score_hard` (1 if all are).
pub fn score(
    net: &Network,
    input: &[Trit],
    expected: &[Trit],
    observer: &mut dyn Observer,
) -> Result<Vec<Trit>> {
    let actual = net.output(input)?;
    if actual.len() != expected.len() {
        return Err(ParliamentError::dimension("expected output", actual.len(), expected.len()));
    }

    let errors: Vec<Trit> = expected
        .iter()
        .zip(&actual)
        .map(|(&e, &a)| project(e as i32 - a as i32))
        .collect();

    observer.observe("score_easy", fraction_correct(&errors));
    observer.observe("score_hard", if all_correct(&errors) { 1.0 } else { 0.0 });

    Ok(errors)
}

/// Fraction of positions with zero error
pub fn fraction_correct(errors: &[Trit]) -> f64 {
    if errors.is_empty() {
        return 1.0;
    }
    let good = errors.iter().filter(|&&e| e == 0).count();
    good as f64 / errors.len() as f64
}

/// Does every position have zero error?
pub fn all_correct(errors: &[Trit]) -> bool {
    errors.iter().all(|&e| e == 0)
}

/// Index of the first maximum and how many positions share that maximum
pub fn argmax(values: &[Trit]) -> Option<(usize, usize)> {
    let max = *values.iter().max()?;
    let first = values.iter().position(|&v| v == max)?;
    let ties = values.iter().filter(|&&v| v == max).count();
    Some((first, ties))
}

/// Result of reading the output layer as a class vote
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassOutcome {
    /// The label's own output unit fired +1
    pub easy: bool,
    /// `1 / ties` when argmax lands on the label, otherwise 0
    pub hard: f64,
}

/// Evaluate one labelled sample as a classification
///
/// Emits `class_easy_{label}` and `class_hard_{label}`.
pub fn classify(
    net: &Network,
    input: &[Trit],
    label: usize,
    observer: &mut dyn Observer,
) -> Result<ClassOutcome> {
    let output = net.output(input)?;
    if label >= output.len() {
        return Err(ParliamentError::InvalidLabel {
            label,
            classes: output.len(),
        });
    }

    let easy = output[label] == 1;
    let hard = match argmax(&output) {
        Some((winner, ties)) if winner == label => 1.0 / ties as f64,
        _ => 0.0,
    };

    observer.observe(&format!("class_easy_{}", label), if easy { 1.0 } else { 0.0 });
    observer.observe(&format!("class_hard_{}", label), hard);

    Ok(ClassOutcome { easy, hard })
}

impl Network {
    /// [`score`] without an observer
    pub fn score(&self, input: &[Trit], expected: &[Trit]) -> Result<Vec<Trit>> {
        score(self, input, expected, &mut crate::observe::NullObserver)
    }
}
