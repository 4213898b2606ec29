//! Network model - layers of ternary voting units ("gates")
//!
//! Each [`Layer`] owns one flat weight arena. Unit `j` occupies the slice
//! `weights[j * stride .. (j + 1) * stride]` where `stride = inputs + 1`; the
//! trailing element of every unit is its bias weight.
//!
//! # Example
//! ```
//! use parliament::Network;
//!
//! let net = Network::new(&[3, 4]).unwrap();
//! assert_eq!(net.layers().len(), 1);
//! assert_eq!(net.layer(0).units(), 4);
//! assert_eq!(net.layer(0).stride(), 4);
//!
//! let activations = net.evaluate(&[1, -1, 0]).unwrap();
//! assert_eq!(activations[0], vec![0, 0, 0, 0]);
//! ```

use crate::error::{ParliamentError, Result};
use crate::ternary::{project, Polarity, Trit};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One layer of voting units sharing the same input width
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    inputs: usize,
    units: usize,
    weights: Vec<Trit>,
}

impl Layer {
    /// Create a layer with every weight at zero
    pub fn new(inputs: usize, units: usize) -> Self {
        Self {
            inputs,
            units,
            weights: vec![0; units * (inputs + 1)],
        }
    }

    /// Rebuild a layer from a flat weight arena, projecting every weight
    pub(crate) fn from_weights(inputs: usize, units: usize, weights: Vec<Trit>) -> Result<Self> {
        let expected = units * (inputs + 1);
        if weights.len() != expected {
            return Err(ParliamentError::dimension("layer weights", expected, weights.len()));
        }
        let mut layer = Self { inputs, units, weights };
        layer.project();
        Ok(layer)
    }

    /// Input width this layer expects
    #[inline]
    pub fn inputs(&self) -> usize {
        self.inputs
    }

    /// Number of units (the output width)
    #[inline]
    pub fn units(&self) -> usize {
        self.units
    }

    /// Weights per unit: inputs plus the bias
    #[inline]
    pub fn stride(&self) -> usize {
        self.inputs + 1
    }

    /// The whole arena, unit-major
    #[inline]
    pub fn weights(&self) -> &[Trit] {
        &self.weights
    }

    /// Weights of one unit, bias last
    #[inline]
    pub fn gate(&self, unit: usize) -> &[Trit] {
        let stride = self.stride();
        &self.weights[unit * stride..(unit + 1) * stride]
    }

    /// Bias weight of one unit
    #[inline]
    pub fn bias(&self, unit: usize) -> Trit {
        self.weight(unit, self.inputs)
    }

    #[inline]
    pub fn weight(&self, unit: usize, k: usize) -> Trit {
        self.weights[unit * self.stride() + k]
    }

    /// Set a single weight. The value is projected, so anything outside
    /// {-1, 0, +1} lands on the nearest bound.
    #[inline]
    pub fn set_weight(&mut self, unit: usize, k: usize, value: i32) {
        let stride = self.stride();
        self.weights[unit * stride + k] = project(value);
    }

    /// Overwrite every weight with an independent uniform draw from {-1, 0, +1}
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for w in self.weights.iter_mut() {
            *w = rng.gen_range(-1..=1);
        }
    }

    /// Re-apply `project` to every weight
    pub fn project(&mut self) {
        for w in self.weights.iter_mut() {
            *w = project(*w as i32);
        }
    }

    /// Compute this layer's ternary output for one input vector
    ///
    /// Unit `j` emits `project(sum_k w[j][k] * input[k] + bias[j])`.
    pub fn evaluate(&self, input: &[Trit]) -> Result<Vec<Trit>> {
        if input.len() != self.inputs {
            return Err(ParliamentError::dimension("layer input", self.inputs, input.len()));
        }

        let output = self
            .weights
            .chunks_exact(self.stride())
            .map(|gate| {
                let (inner, bias) = gate.split_at(self.inputs);
                let sum: i32 = inner
                    .iter()
                    .zip(input)
                    .map(|(&w, &x)| w as i32 * x as i32)
                    .sum();
                project(sum + bias[0] as i32)
            })
            .collect();

        Ok(output)
    }

    fn tally(&self, histogram: &mut WeightHistogram) {
        for &w in &self.weights {
            histogram.record(Polarity::of(w as i32));
        }
    }
}

/// Count of weights by sign
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightHistogram {
    pub negative: usize,
    pub zero: usize,
    pub positive: usize,
}

impl WeightHistogram {
    fn record(&mut self, polarity: Polarity) {
        match polarity {
            Polarity::Negative => self.negative += 1,
            Polarity::Zero => self.zero += 1,
            Polarity::Positive => self.positive += 1,
        }
    }

    /// Total number of weights counted
    pub fn total(&self) -> usize {
        self.negative + self.zero + self.positive
    }

    /// Fraction of weights that are zero (disconnected)
    pub fn sparsity(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.zero as f64 / self.total() as f64
    }
}

/// Feed-forward stack of ternary layers
///
/// Built from a size specification `[s0, s1, ..., sk]`: `s0` is the input width,
/// `sk` the output width, and the network has `k` layers. Layer and unit counts
/// are fixed at construction; only weight values change afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Build a network with every weight at zero
    pub fn new(sizes: &[usize]) -> Result<Self> {
        validate_sizes(sizes)?;

        let layers = sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1]))
            .collect();

        Ok(Self { layers })
    }

    /// Build a network and immediately randomize it
    pub fn random<R: Rng + ?Sized>(sizes: &[usize], rng: &mut R) -> Result<Self> {
        let mut net = Self::new(sizes)?;
        net.randomize(rng);
        Ok(net)
    }

    pub(crate) fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(ParliamentError::InvalidConfig(
                "network needs at least one layer".to_string(),
            ));
        }
        for pair in layers.windows(2) {
            if pair[1].inputs() != pair[0].units() {
                return Err(ParliamentError::dimension(
                    "layer chaining",
                    pair[0].units(),
                    pair[1].inputs(),
                ));
            }
        }
        Ok(Self { layers })
    }

    /// Overwrite every weight with an independent uniform draw from {-1, 0, +1}
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for layer in &mut self.layers {
            layer.randomize(rng);
        }
    }

    /// Re-apply `project` to every weight. A no-op once weights are ternary.
    pub fn project(&mut self) {
        for layer in &mut self.layers {
            layer.project();
        }
    }

    /// Forward pass. Returns one activation vector per layer, in order.
    ///
    /// The last entry is the network output.
    pub fn evaluate(&self, input: &[Trit]) -> Result<Vec<Vec<Trit>>> {
        let first = &self.layers[0];
        if input.len() != first.inputs() {
            return Err(ParliamentError::dimension("network input", first.inputs(), input.len()));
        }

        let mut carrier: Vec<Vec<Trit>> = Vec::with_capacity(self.layers.len());
        carrier.push(first.evaluate(input)?);
        for layer in &self.layers[1..] {
            let previous = &carrier[carrier.len() - 1];
            let next = layer.evaluate(previous)?;
            carrier.push(next);
        }

        Ok(carrier)
    }

    /// Forward pass returning only the final layer's activations
    pub fn output(&self, input: &[Trit]) -> Result<Vec<Trit>> {
        let mut carrier = self.evaluate(input)?;
        // evaluate always yields one vector per layer and there is at least one layer
        Ok(carrier.pop().unwrap_or_default())
    }

    /// Count weights by sign across all layers
    pub fn summarize(&self) -> WeightHistogram {
        let mut histogram = WeightHistogram::default();
        for layer in &self.layers {
            layer.tally(&mut histogram);
        }
        histogram
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, index: usize) -> &Layer {
        &self.layers[index]
    }

    #[inline]
    pub fn layer_mut(&mut self, index: usize) -> &mut Layer {
        &mut self.layers[index]
    }

    /// Width of the input vector
    pub fn input_width(&self) -> usize {
        self.layers[0].inputs()
    }

    /// Width of the output vector
    pub fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].units()
    }

    /// The size specification this network was built from
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.layers.len() + 1);
        sizes.push(self.input_width());
        sizes.extend(self.layers.iter().map(Layer::units));
        sizes
    }

    /// Total number of weights (biases included)
    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights().len()).sum()
    }
}

/// Check a size specification: at least two entries, all positive
pub fn validate_sizes(sizes: &[usize]) -> Result<()> {
    if sizes.len() < 2 {
        return Err(ParliamentError::InvalidConfig(format!(
            "need at least 2 layer sizes, got {}",
            sizes.len()
        )));
    }
    if let Some(pos) = sizes.iter().position(|&s| s == 0) {
        return Err(ParliamentError::InvalidConfig(format!(
            "layer size at position {} must be positive",
            pos
        )));
    }
    Ok(())
}
