//! Adaptive integration of the SIR system over a time grid.
//!
//! The solver is the embedded Dormand-Prince 5(4) Runge-Kutta pair. Each attempted step produces
//! a fifth-order solution and a fourth-order one; their difference, measured in a mixed
//! absolute/relative norm, accepts or rejects the step and picks the next step size. Steps are
//! clipped so that every requested grid point is landed on exactly, so no interpolation is
//! needed to report the solution.
//!
//! Every stage of an explicit Runge-Kutta method is a linear combination of derivative
//! evaluations, and the SIR derivatives sum to zero, so `S + I + R` is preserved up to rounding
//! regardless of the step size.

use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::log::{debug, trace};
use crate::model::{ModelParameters, StateVector, COMPARTMENTS};
use crate::trajectory::Trajectory;

type State = [f64; COMPARTMENTS];

// Step-size controller constants
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const ERROR_EXPONENT: f64 = -0.2;
const STRETCH: f64 = 1.01;

// Dormand-Prince tableau. The abscissae are omitted since the SIR system is autonomous.
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
// Fifth-order weights; also the seventh stage's coefficients (first same as last).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
// Fifth-order minus fourth-order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Tolerances and limits for the adaptive solver.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct IntegratorOptions {
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    /// First trial step. Chosen from the initial derivative when absent.
    pub initial_step: Option<f64>,
    /// Upper bound on attempted steps (accepted plus rejected) over the whole grid.
    pub max_steps: usize,
}

impl Default for IntegratorOptions {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-9,
            absolute_tolerance: 1e-9,
            initial_step: None,
            max_steps: 100_000,
        }
    }
}

impl IntegratorOptions {
    /// # Errors
    ///
    /// Returns `SirError::Config` if a tolerance or the initial step is not positive and finite,
    /// or `max_steps` is zero.
    pub fn validate(&self) -> Result<(), SirError> {
        for (name, value) in [
            ("relative_tolerance", self.relative_tolerance),
            ("absolute_tolerance", self.absolute_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SirError::Config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if let Some(step) = self.initial_step {
            if !(step.is_finite() && step > 0.0) {
                return Err(SirError::Config(format!(
                    "initial_step must be positive and finite, got {step}"
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(SirError::Config("max_steps must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Integrates the SIR system from `initial_state` at `time_grid[0]` and returns the solution at
/// every grid point, using the default `IntegratorOptions`.
///
/// # Errors
///
/// - `SirError::InvalidParameters` if the parameters or initial state are invalid
/// - `SirError::InvalidTimeGrid` if the grid is empty, not strictly increasing, negative, or
///   not finite
/// - `SirError::IntegrationFailed` if the solver cannot reach the end of the grid
pub fn integrate(
    params: &ModelParameters,
    initial_state: &StateVector,
    time_grid: &[f64],
) -> Result<Trajectory, SirError> {
    integrate_with_options(
        params,
        initial_state,
        time_grid,
        &IntegratorOptions::default(),
    )
}

/// `integrate` with explicit solver options.
///
/// # Errors
///
/// See [`integrate`]; additionally `SirError::Config` for invalid options.
pub fn integrate_with_options(
    params: &ModelParameters,
    initial_state: &StateVector,
    time_grid: &[f64],
    options: &IntegratorOptions,
) -> Result<Trajectory, SirError> {
    params.validate()?;
    initial_state.validate_against(params)?;
    validate_time_grid(time_grid)?;
    options.validate()?;

    let mut solver = Solver::new(params, options, time_grid[0], initial_state.to_array());
    let mut states = Vec::with_capacity(time_grid.len());
    states.push(*initial_state);
    for &target in &time_grid[1..] {
        solver.advance_to(target)?;
        states.push(StateVector::from_array(solver.y));
    }

    debug!(
        "integrated {} grid points with {} accepted and {} rejected steps",
        time_grid.len(),
        solver.accepted,
        solver.rejected
    );
    Ok(Trajectory::new(
        params.total_population,
        time_grid.to_vec(),
        states,
    ))
}

/// Checks that the grid is non-empty, finite, starts at or after zero, and strictly increases.
///
/// # Errors
///
/// Returns `SirError::InvalidTimeGrid` describing the first violation.
pub fn validate_time_grid(time_grid: &[f64]) -> Result<(), SirError> {
    let Some(&first) = time_grid.first() else {
        return Err(SirError::InvalidTimeGrid("time grid is empty".to_string()));
    };
    if let Some(position) = time_grid.iter().position(|t| !t.is_finite()) {
        return Err(SirError::InvalidTimeGrid(format!(
            "time grid value at position {position} is not finite"
        )));
    }
    if first < 0.0 {
        return Err(SirError::InvalidTimeGrid(format!(
            "time grid starts at {first}, before t = 0"
        )));
    }
    if let Some(position) = time_grid.windows(2).position(|w| w[1] <= w[0]) {
        return Err(SirError::InvalidTimeGrid(format!(
            "time grid is not strictly increasing at position {}",
            position + 1
        )));
    }
    Ok(())
}

/// Integration state carried between grid points.
struct Solver<'a> {
    params: &'a ModelParameters,
    options: &'a IntegratorOptions,
    t: f64,
    y: State,
    /// Derivative at `(t, y)`, reused as the first stage of the next step.
    k1: State,
    /// Nominal step size proposed by the controller.
    h: f64,
    accepted: usize,
    rejected: usize,
}

impl<'a> Solver<'a> {
    fn new(params: &'a ModelParameters, options: &'a IntegratorOptions, t0: f64, y0: State) -> Self {
        let k1 = eval(params, &y0);
        let h = options
            .initial_step
            .unwrap_or_else(|| initial_step(options, &y0, &k1));
        Self {
            params,
            options,
            t: t0,
            y: y0,
            k1,
            h,
            accepted: 0,
            rejected: 0,
        }
    }

    fn advance_to(&mut self, target: f64) -> Result<(), SirError> {
        while self.t < target {
            if self.accepted + self.rejected >= self.options.max_steps {
                return Err(SirError::integration_failed(
                    self.t,
                    format!("exceeded {} steps", self.options.max_steps),
                ));
            }

            // Stretch the step slightly rather than leave a sliver before the grid point
            let remaining = target - self.t;
            let clipped = self.h * STRETCH >= remaining;
            let h = if clipped { remaining } else { self.h };
            let min_step = 16.0 * f64::EPSILON * self.t.abs().max(1.0);
            if clipped && h <= min_step {
                // The grid point is within rounding of `t`, so the state cannot change
                self.t = target;
                break;
            }
            if h <= min_step {
                return Err(SirError::integration_failed(
                    self.t,
                    format!("step size underflow (h = {h:e})"),
                ));
            }

            let (y_new, k7, error) = self.attempt(h);
            if !error.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
                return Err(SirError::integration_failed(
                    self.t,
                    "non-finite value in stage evaluation",
                ));
            }

            let factor = if error == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * error.powf(ERROR_EXPONENT)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if error <= 1.0 {
                self.t = if clipped { target } else { self.t + h };
                self.y = y_new;
                self.k1 = k7;
                self.accepted += 1;
                // A step clipped to a grid point says little about the achievable step size
                self.h = if clipped { self.h.max(h * factor) } else { h * factor };
            } else {
                trace!("rejected step h = {h:e} at t = {} (error {error:.3})", self.t);
                self.rejected += 1;
                self.h = h * factor.min(1.0);
            }
        }
        Ok(())
    }

    /// One Dormand-Prince step of size `h` from the current state. Returns the fifth-order
    /// solution, the derivative there, and the scaled error norm.
    fn attempt(&self, h: f64) -> (State, State, f64) {
        let y = &self.y;
        let k1 = &self.k1;

        let k2 = eval(self.params, &combine(y, h, &[(A21, k1)]));
        let k3 = eval(self.params, &combine(y, h, &[(A31, k1), (A32, &k2)]));
        let k4 = eval(
            self.params,
            &combine(y, h, &[(A41, k1), (A42, &k2), (A43, &k3)]),
        );
        let k5 = eval(
            self.params,
            &combine(y, h, &[(A51, k1), (A52, &k2), (A53, &k3), (A54, &k4)]),
        );
        let k6 = eval(
            self.params,
            &combine(
                y,
                h,
                &[(A61, k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
            ),
        );
        let y_new = combine(
            y,
            h,
            &[(B1, k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
        );
        let k7 = eval(self.params, &y_new);

        let mut sum_sq = 0.0;
        for i in 0..COMPARTMENTS {
            let local_error = h
                * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
            let scale = self.options.absolute_tolerance
                + self.options.relative_tolerance * y[i].abs().max(y_new[i].abs());
            sum_sq += (local_error / scale).powi(2);
        }
        #[allow(clippy::cast_precision_loss)]
        let error = (sum_sq / COMPARTMENTS as f64).sqrt();
        (y_new, k7, error)
    }
}

fn eval(params: &ModelParameters, y: &State) -> State {
    let mut dy = [0.0; COMPARTMENTS];
    params.derivative_into(y, &mut dy);
    dy
}

/// `y + h * sum(a_j * k_j)`
fn combine(y: &State, h: f64, terms: &[(f64, &State)]) -> State {
    let mut out = *y;
    for (i, value) in out.iter_mut().enumerate() {
        let increment: f64 = terms.iter().map(|(a, k)| a * k[i]).sum();
        *value += h * increment;
    }
    out
}

/// Picks a first trial step from the size of the state relative to its derivative.
fn initial_step(options: &IntegratorOptions, y0: &State, f0: &State) -> f64 {
    let mut d0 = 0.0;
    let mut d1 = 0.0;
    for i in 0..COMPARTMENTS {
        let scale = options.absolute_tolerance + options.relative_tolerance * y0[i].abs();
        d0 += (y0[i] / scale).powi(2);
        d1 += (f0[i] / scale).powi(2);
    }
    let (d0, d1) = (d0.sqrt(), d1.sqrt());
    if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
}
