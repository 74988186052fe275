//! The SIR compartmental model: parameters, state, and the right-hand side of the ODE system.
//!
//! ```text
//! dS/dt = -beta * S * I / N
//! dI/dt =  beta * S * I / N - gamma * I
//! dR/dt =  gamma * I
//! ```
//!
//! The three derivatives sum to zero, so `S + I + R` stays at `N` along exact solutions.

use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::numeric::almost_eq;

/// Relative tolerance used when checking that an initial state sums to the population.
pub const POPULATION_SUM_TOLERANCE: f64 = 1e-9;

/// Number of compartments in the state vector.
pub const COMPARTMENTS: usize = 3;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct ModelParameters {
    /// Total population `N`.
    pub total_population: f64,
    /// Transmission rate `beta` (per day).
    pub transmission_rate: f64,
    /// Recovery rate `gamma` (per day), the inverse of the mean infectious period.
    pub recovery_rate: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            total_population: 1000.0,
            transmission_rate: 0.2,
            recovery_rate: 0.1,
        }
    }
}

impl ModelParameters {
    /// Builds a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns `SirError::InvalidParameters` when `validate` would.
    pub fn new(
        total_population: f64,
        transmission_rate: f64,
        recovery_rate: f64,
    ) -> Result<Self, SirError> {
        let params = Self {
            total_population,
            transmission_rate,
            recovery_rate,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks that `N` is positive and both rates are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns `SirError::InvalidParameters` naming the offending field.
    pub fn validate(&self) -> Result<(), SirError> {
        if !(self.total_population.is_finite() && self.total_population > 0.0) {
            return Err(SirError::InvalidParameters(format!(
                "total_population must be positive and finite, got {}",
                self.total_population
            )));
        }
        for (name, rate) in [
            ("transmission_rate", self.transmission_rate),
            ("recovery_rate", self.recovery_rate),
        ] {
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(SirError::InvalidParameters(format!(
                    "{name} must be non-negative and finite, got {rate}"
                )));
            }
        }
        Ok(())
    }

    /// Basic reproduction number `beta / gamma`. Infinite when `gamma == 0` and `beta > 0`;
    /// zero when both rates are zero.
    #[must_use]
    pub fn basic_reproduction_number(&self) -> f64 {
        if self.recovery_rate == 0.0 {
            if self.transmission_rate == 0.0 {
                return 0.0;
            }
            return f64::INFINITY;
        }
        self.transmission_rate / self.recovery_rate
    }

    /// Fraction of the population that must be immune for `I` to decline from the outset,
    /// `1 - 1/R0`. Zero when `R0 <= 1`.
    #[must_use]
    pub fn herd_immunity_threshold(&self) -> f64 {
        let r0 = self.basic_reproduction_number();
        if r0 <= 1.0 {
            0.0
        } else {
            1.0 - 1.0 / r0
        }
    }

    /// Evaluates the SIR right-hand side at `state`.
    #[must_use]
    pub fn derivative(&self, state: &StateVector) -> StateVector {
        let mut dy = [0.0; COMPARTMENTS];
        self.derivative_into(&state.to_array(), &mut dy);
        StateVector::from_array(dy)
    }

    /// Slice form of `derivative` used by the integrator's stage evaluations.
    pub(crate) fn derivative_into(&self, y: &[f64; COMPARTMENTS], dy: &mut [f64; COMPARTMENTS]) {
        let [s, i, _r] = *y;
        let infection = self.transmission_rate * s * i / self.total_population;
        let recovery = self.recovery_rate * i;
        dy[0] = -infection;
        dy[1] = infection - recovery;
        dy[2] = recovery;
    }
}

/// Population counts in each compartment at one point in time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct StateVector {
    pub susceptible: f64,
    pub infected: f64,
    pub removed: f64,
}

impl StateVector {
    #[must_use]
    pub fn new(susceptible: f64, infected: f64, removed: f64) -> Self {
        Self {
            susceptible,
            infected,
            removed,
        }
    }

    /// The state with `infected` and `removed` seeded and everyone else susceptible.
    #[must_use]
    pub fn seeded(total_population: f64, infected: f64, removed: f64) -> Self {
        Self::new(total_population - infected - removed, infected, removed)
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.removed
    }

    /// Checks that every compartment is finite and non-negative and that the compartments
    /// sum to the population of `params`.
    ///
    /// # Errors
    ///
    /// Returns `SirError::InvalidParameters` describing the violation.
    pub fn validate_against(&self, params: &ModelParameters) -> Result<(), SirError> {
        for (name, value) in [
            ("susceptible", self.susceptible),
            ("infected", self.infected),
            ("removed", self.removed),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SirError::InvalidParameters(format!(
                    "initial {name} must be non-negative and finite, got {value}"
                )));
            }
        }
        let n = params.total_population;
        if !almost_eq(self.total(), n, POPULATION_SUM_TOLERANCE * n) {
            return Err(SirError::InvalidParameters(format!(
                "initial state sums to {} but total_population is {n}",
                self.total()
            )));
        }
        Ok(())
    }

    pub(crate) fn to_array(self) -> [f64; COMPARTMENTS] {
        [self.susceptible, self.infected, self.removed]
    }

    pub(crate) fn from_array([susceptible, infected, removed]: [f64; COMPARTMENTS]) -> Self {
        Self::new(susceptible, infected, removed)
    }
}
