#![allow(clippy::approx_constant)]
//! Floating point helpers shared by the integrator and the quantizer. The comparison functions are
//! convenience wrappers around methods from the approx crate.

use approx::AbsDiffEq;

use crate::error::SirError;

/// Compares if two floats are close via `approx::abs_diff_eq` using a maximum absolute difference
/// (epsilon) of `acc`.
#[must_use]
pub fn almost_eq(a: f64, b: f64, acc: f64) -> bool {
    if a.is_infinite() && b.is_infinite() {
        return a == b;
    }
    a.abs_diff_eq(&b, acc)
}

/// Returns `num` evenly spaced samples over the closed interval `[start, stop]`.
///
/// A single sample yields `[start]`; zero samples yield an empty vector. The last sample is
/// exactly `stop`.
///
/// # Errors
///
/// Returns `SirError::InvalidTimeGrid` if either endpoint is not finite.
pub fn linspace(start: f64, stop: f64, num: usize) -> Result<Vec<f64>, SirError> {
    if !start.is_finite() || !stop.is_finite() {
        return Err(SirError::InvalidTimeGrid(format!(
            "endpoints must be finite, got [{start}, {stop}]"
        )));
    }
    match num {
        0 => Ok(Vec::new()),
        1 => Ok(vec![start]),
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num - 1)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let offset = i as f64 * step;
                    start + offset
                })
                .collect();
            values.push(stop);
            Ok(values)
        }
    }
}

/// Returns the position of the first element that is smaller than its predecessor (or is NaN),
/// or `None` if the slice is non-decreasing.
#[must_use]
pub fn first_descent(values: &[f64]) -> Option<usize> {
    if values.iter().any(|v| v.is_nan()) {
        return values.iter().position(|v| v.is_nan());
    }
    values
        .windows(2)
        .position(|pair| pair[1] < pair[0])
        .map(|i| i + 1)
}
