//! Scalar quantization of a sampled signal.
//!
//! A quantizer with `P` ascending thresholds (the partition) divides the real line into `P + 1`
//! regions. A sample `x` falls in region `k`, the smallest index with `x <= partitions[k]`, or in
//! region `P` when it exceeds every threshold. A sample equal to a threshold therefore takes that
//! threshold's index. Region `k` is reconstructed as `codebook[k]`.
//!
//! [`quantize`] is the plain left-to-right scan. [`ScalarQuantizer`] validates its levels up
//! front and locates regions by binary search; the two agree on every input.

use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::log::trace;
use crate::numeric::first_descent;

/// Largest bit depth accepted by [`ScalarQuantizer::uniform`].
pub const MAX_UNIFORM_BITS: u32 = 16;

/// The result of quantizing a signal: parallel index and reconstruction sequences.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Quantized {
    pub indices: Vec<usize>,
    pub quanta: Vec<f64>,
}

impl Quantized {
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Mean squared difference between `signal` and the reconstruction. Zero for an empty
    /// signal.
    ///
    /// # Panics
    ///
    /// Panics if `signal` is not the signal this output was produced from (length mismatch).
    #[must_use]
    pub fn mean_squared_error(&self, signal: &[f64]) -> f64 {
        assert_eq!(
            signal.len(),
            self.quanta.len(),
            "signal and quantized output differ in length"
        );
        if signal.is_empty() {
            return 0.0;
        }
        let total: f64 = signal
            .iter()
            .zip(&self.quanta)
            .map(|(x, q)| (x - q).powi(2))
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let mse = total / signal.len() as f64;
        mse
    }
}

/// Maps each sample of `signal` to a region index and its codebook value.
///
/// # Errors
///
/// - `SirError::UnsortedPartitions` if `partitions` is not non-decreasing
/// - `SirError::CodebookTooShort` if some sample resolves to an index past the end of `codebook`
pub fn quantize(
    signal: &[f64],
    partitions: &[f64],
    codebook: &[f64],
) -> Result<Quantized, SirError> {
    check_partitions(partitions)?;

    let mut quantized = Quantized {
        indices: Vec::with_capacity(signal.len()),
        quanta: Vec::with_capacity(signal.len()),
    };
    for &x in signal {
        let mut index = 0;
        while index < partitions.len() && x > partitions[index] {
            index += 1;
        }
        let quantum = *codebook.get(index).ok_or(SirError::CodebookTooShort {
            index,
            len: codebook.len(),
        })?;
        quantized.indices.push(index);
        quantized.quanta.push(quantum);
    }
    trace!(
        "quantized {} samples against {} partitions",
        signal.len(),
        partitions.len()
    );
    Ok(quantized)
}

fn check_partitions(partitions: &[f64]) -> Result<(), SirError> {
    match first_descent(partitions) {
        Some(position) => Err(SirError::UnsortedPartitions { position }),
        None => Ok(()),
    }
}

/// A validated partition/codebook pair. Deserialization goes through [`ScalarQuantizer::new`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "QuantizerLevels")]
pub struct ScalarQuantizer {
    partitions: Vec<f64>,
    codebook: Vec<f64>,
}

/// Unvalidated serialized form of a `ScalarQuantizer`.
#[derive(Deserialize)]
struct QuantizerLevels {
    partitions: Vec<f64>,
    codebook: Vec<f64>,
}

impl TryFrom<QuantizerLevels> for ScalarQuantizer {
    type Error = SirError;

    fn try_from(levels: QuantizerLevels) -> Result<Self, Self::Error> {
        ScalarQuantizer::new(levels.partitions, levels.codebook)
    }
}

impl ScalarQuantizer {
    /// # Errors
    ///
    /// - `SirError::UnsortedPartitions` if `partitions` is not non-decreasing
    /// - `SirError::CodebookTooShort` if `codebook` has fewer than `partitions.len() + 1` entries
    pub fn new(partitions: Vec<f64>, codebook: Vec<f64>) -> Result<Self, SirError> {
        check_partitions(&partitions)?;
        if codebook.len() < partitions.len() + 1 {
            return Err(SirError::CodebookTooShort {
                index: partitions.len(),
                len: codebook.len(),
            });
        }
        Ok(Self {
            partitions,
            codebook,
        })
    }

    /// A uniform mid-rise quantizer with `2^bits` equal-width regions over `[xmin, xmax]`.
    /// Thresholds sit on the interior region boundaries and each codebook entry is its region's
    /// midpoint. Samples outside the range fall in the first or last region.
    ///
    /// # Errors
    ///
    /// Returns `SirError::InvalidQuantizerRange` if the bounds or their difference are not finite,
    /// `xmin >= xmax`, or `bits` is outside `1..=16`.
    pub fn uniform(xmin: f64, xmax: f64, bits: u32) -> Result<Self, SirError> {
        if !(xmin.is_finite() && xmax.is_finite()) || xmin >= xmax {
            return Err(SirError::InvalidQuantizerRange(format!(
                "range [{xmin}, {xmax}] must be finite and non-empty"
            )));
        }
        if bits == 0 || bits > MAX_UNIFORM_BITS {
            return Err(SirError::InvalidQuantizerRange(format!(
                "bits must be in 1..={MAX_UNIFORM_BITS}, got {bits}"
            )));
        }

        let width = xmax - xmin;
        if !width.is_finite() {
            return Err(SirError::InvalidQuantizerRange(format!(
                "range [{xmin}, {xmax}] is too wide to subdivide"
            )));
        }

        let levels = 1_usize << bits;
        #[allow(clippy::cast_precision_loss)]
        let delta = width / levels as f64;
        #[allow(clippy::cast_precision_loss)]
        let partitions = (1..levels).map(|k| xmin + k as f64 * delta).collect();
        #[allow(clippy::cast_precision_loss)]
        let codebook = (0..levels)
            .map(|k| xmin + (k as f64 + 0.5) * delta)
            .collect();
        Self::new(partitions, codebook)
    }

    #[must_use]
    pub fn partitions(&self) -> &[f64] {
        &self.partitions
    }

    #[must_use]
    pub fn codebook(&self) -> &[f64] {
        &self.codebook
    }

    /// Number of regions, `partitions.len() + 1`.
    #[must_use]
    pub fn regions(&self) -> usize {
        self.partitions.len() + 1
    }

    /// Region index of a single sample. A NaN sample exceeds no threshold and lands in region 0.
    #[must_use]
    pub fn index_of(&self, x: f64) -> usize {
        self.partitions.partition_point(|&p| p < x)
    }

    #[must_use]
    pub fn quantize(&self, signal: &[f64]) -> Quantized {
        let indices: Vec<usize> = signal.iter().map(|&x| self.index_of(x)).collect();
        let quanta = indices.iter().map(|&k| self.codebook[k]).collect();
        Quantized { indices, quanta }
    }
}
