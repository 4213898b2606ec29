//! Feasible-direction learning - masking and stochastic flips for ternary weights
//!
//! There is no gradient in this domain. Instead:
//!
//! 1. **Mask** ([`propagate`]): a per-unit error is copied onto each of that
//!    unit's weights only where the weight can still move in that direction.
//!    A weight at +1 takes no further positive push, a weight at -1 no further
//!    negative push, a weight at 0 takes either.
//! 2. **Flip** ([`apply_updates`]): each masked cell is updated with a
//!    probability that grows with the size of its signal, plus a background
//!    floor that keeps zero-signal cells moving occasionally.
//! 3. **Hand back** ([`MaskedError::column_mean`]): averaging the mask across
//!    units gives one value per weight position, which becomes the error for
//!    the previous layer's units.

use crate::error::{ParliamentError, Result};
use crate::network::Layer;
use crate::observe::Observer;
use crate::ternary::{float_project, project, Trit};
use rand::Rng;
use rand_distr::Exp1;
use serde::{Deserialize, Serialize};

/// Masked error for one layer, unit-major like the layer's weight arena
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedError {
    units: usize,
    width: usize,
    values: Vec<f64>,
}

impl MaskedError {
    /// All-zero mask
    pub fn zeros(units: usize, width: usize) -> Self {
        Self {
            units,
            width,
            values: vec![0.0; units * width],
        }
    }

    /// Build from explicit rows. Every row must have the same width.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(ParliamentError::dimension("masked error row", width, row.len()));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            units: rows.len(),
            width,
            values,
        })
    }

    #[inline]
    pub fn units(&self) -> usize {
        self.units
    }

    /// Cells per unit (the layer's stride)
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn row(&self, unit: usize) -> &[f64] {
        &self.values[unit * self.width..(unit + 1) * self.width]
    }

    /// Sum of absolute values over every cell
    pub fn abs_sum(&self) -> f64 {
        self.values.iter().map(|v| v.abs()).sum()
    }

    /// Mean of each weight position across units
    pub fn column_mean(&self) -> Vec<f64> {
        let mut mean = vec![0.0; self.width];
        if self.units == 0 {
            return mean;
        }
        for row in self.values.chunks_exact(self.width) {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= self.units as f64;
        }
        mean
    }

    /// Error for the previous layer: the column mean without the bias column
    pub fn backward(&self) -> Vec<f64> {
        let mut mean = self.column_mean();
        mean.truncate(self.width.saturating_sub(1));
        mean
    }
}

/// Mask a per-unit error against the layer's current weights
///
/// Cell `(j, k)` receives `error[j]` when `error[j] > 0` and `w[j][k] <= 0`,
/// or when `error[j] < 0` and `w[j][k] >= 0`. Everything else is 0.
pub fn propagate(layer: &Layer, error: &[f64]) -> Result<MaskedError> {
    if error.len() != layer.units() {
        return Err(ParliamentError::dimension("propagated error", layer.units(), error.len()));
    }

    let mut masked = MaskedError::zeros(layer.units(), layer.stride());
    for (j, &e) in error.iter().enumerate() {
        if e == 0.0 {
            continue;
        }
        for (k, &w) in layer.gate(j).iter().enumerate() {
            let feasible = (e > 0.0 && w <= 0) || (e < 0.0 && w >= 0);
            if feasible {
                masked.values[j * masked.width + k] = e;
            }
        }
    }

    Ok(masked)
}

/// What an update does when there is nothing to nudge with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    /// A zero signal is replaced by a random ±1 push, so any weight can move
    #[default]
    ZeroSignal,
    /// A weight sitting at 0 is replaced by a random ±1 before the signal is added.
    /// Nonzero weights with no signal never move, so a unit can get stuck.
    ZeroWeight,
}

/// Base and background update rates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateRates {
    rate: f64,
    background: f64,
    seeding: Seeding,
}

impl UpdateRates {
    /// `rate` must be positive and `background` non-negative, both finite
    pub fn new(rate: f64, background: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ParliamentError::InvalidConfig(format!(
                "rate must be positive and finite, got {}",
                rate
            )));
        }
        if !background.is_finite() || background < 0.0 {
            return Err(ParliamentError::InvalidConfig(format!(
                "background rate must be non-negative and finite, got {}",
                background
            )));
        }
        Ok(Self {
            rate,
            background,
            seeding: Seeding::default(),
        })
    }

    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    #[inline]
    pub fn background(&self) -> f64 {
        self.background
    }

    #[inline]
    pub fn seeding(&self) -> Seeding {
        self.seeding
    }

    /// Same base rate and seeding with a different background
    pub fn with_background(self, background: f64) -> Result<Self> {
        Ok(Self::new(self.rate, background)?.with_seeding(self.seeding))
    }

    /// Exponential draw a cell with signal `v` must beat to be updated
    ///
    /// Infinite when both `v` and the background are zero.
    #[inline]
    pub fn threshold(&self, v: f64) -> f64 {
        (self.rate + self.background) / (v.abs() + self.background)
    }
}

/// Stochastically flip weights of `layer` according to `masked`
///
/// Walks cells in unit-major order. Each cell draws `e ~ Exp(1)` and is updated
/// when `e` exceeds [`UpdateRates::threshold`]. An update replaces the weight
/// with `float_project(base + push)`. Under [`Seeding::ZeroWeight`] `base` is
/// the current weight, or a random ±1 when that weight is 0, and `push` is `v`.
/// Under [`Seeding::ZeroSignal`] `base` is the current weight and `push` is `v`,
/// or a random ±1 when `v` is 0. Each cell is read and written once, so no cell
/// sees another cell's update from the same pass.
///
/// Returns the sum of `|v|` over all cells.
pub fn apply_updates<R: Rng + ?Sized>(
    layer: &mut Layer,
    masked: &MaskedError,
    rates: UpdateRates,
    rng: &mut R,
    observer: &mut dyn Observer,
) -> Result<f64> {
    if masked.units() != layer.units() {
        return Err(ParliamentError::dimension("masked error units", layer.units(), masked.units()));
    }
    if masked.width() != layer.stride() {
        return Err(ParliamentError::dimension(
            "masked error width",
            layer.stride(),
            masked.width(),
        ));
    }

    let mut sum = 0.0;
    for j in 0..masked.units() {
        for (k, &v) in masked.row(j).iter().enumerate() {
            sum += v.abs();

            let draw: f64 = rng.sample(Exp1);
            if draw <= rates.threshold(v) {
                continue;
            }

            let current = layer.weight(j, k);
            let (base, push, seeded) = match rates.seeding() {
                Seeding::ZeroWeight if current == 0 => (random_sign(rng), v, true),
                Seeding::ZeroSignal if v == 0.0 => (current, random_sign(rng) as f64, true),
                _ => (current, v, false),
            };

            observer.observe("bkg_entry", if v.abs() < rates.background() { 1.0 } else { 0.0 });
            observer.observe("seeded", if seeded { 1.0 } else { 0.0 });
            observer.observe("bpr", push);
            if project(current as i32) == float_project(push) {
                observer.observe("match", current as f64);
            }
            if current > 0 {
                observer.observe("pos", current as f64);
            } else {
                observer.observe("neg", -(current as f64));
            }

            layer.set_weight(j, k, float_project(base as f64 + push) as i32);
        }
    }

    Ok(sum)
}

#[inline]
fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> Trit {
    if rng.gen::<bool>() {
        1
    } else {
        -1
    }
}
