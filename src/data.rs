//! Sample sources - ternary (input, target) pairs fed to training
//!
//! The network only ever sees ternary vectors. Raw data is turned into them by
//! an [`Encoder`]: bytes above a cutoff become +1 (everything else -1), and a
//! class label becomes a one-hot target of +1 at the label and -1 elsewhere.

use crate::error::{ParliamentError, Result};
use crate::ternary::Trit;

/// Default byte cutoff: anything brighter than this is "on"
pub const DEFAULT_CUTOFF: u8 = 10;

/// One training pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    pub input: Vec<Trit>,
    pub target: Vec<Trit>,
}

impl Sample {
    pub fn new(input: Vec<Trit>, target: Vec<Trit>) -> Self {
        Self { input, target }
    }
}

/// A finite, restartable stream of samples
///
/// `next_sample` returning `None` means the current pass is exhausted; a fresh
/// pass starts after `restart`.
pub trait SampleSource {
    fn next_sample(&mut self) -> Option<Sample>;

    fn restart(&mut self);
}

/// In-memory sample source
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    samples: Vec<Sample>,
    cursor: usize,
}

impl VecSource {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// Encode raw `(bytes, label)` pairs
    pub fn from_raw<'a, I>(raw: I, encoder: &Encoder) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a [u8], usize)>,
    {
        let samples = raw
            .into_iter()
            .map(|(bytes, label)| encoder.encode(bytes, label))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(samples))
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for VecSource {
    fn next_sample(&mut self) -> Option<Sample> {
        let sample = self.samples.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(sample)
    }

    fn restart(&mut self) {
        self.cursor = 0;
    }
}

/// Turns raw bytes and class labels into ternary samples
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoder {
    pub cutoff: u8,
    pub classes: usize,
}

impl Encoder {
    pub fn new(classes: usize) -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            classes,
        }
    }

    pub fn with_cutoff(mut self, cutoff: u8) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn encode(&self, bytes: &[u8], label: usize) -> Result<Sample> {
        if label >= self.classes {
            return Err(ParliamentError::InvalidLabel {
                label,
                classes: self.classes,
            });
        }
        Ok(Sample::new(
            threshold_encode(bytes, self.cutoff),
            one_hot(label, self.classes),
        ))
    }
}

/// Byte above `cutoff` → +1, otherwise -1
pub fn threshold_encode(bytes: &[u8], cutoff: u8) -> Vec<Trit> {
    bytes.iter().map(|&b| if b > cutoff { 1 } else { -1 }).collect()
}

/// +1 at `index`, -1 everywhere else
pub fn one_hot(index: usize, width: usize) -> Vec<Trit> {
    (0..width).map(|i| if i == index { 1 } else { -1 }).collect()
}

/// Little-endian ±1 bit pattern of `value` across `bits` positions
pub fn bit_pattern(value: usize, bits: usize) -> Vec<Trit> {
    (0..bits)
        .map(|b| if (value >> b) & 1 == 1 { 1 } else { -1 })
        .collect()
}
