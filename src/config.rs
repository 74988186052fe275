//! Run configuration. Every field has a default, so a configuration file only needs to name what
//! it changes:
//!
//! ```json
//! {
//!   "parameters": { "transmission_rate": 0.3 },
//!   "time": { "stop": 200.0, "points": 201 },
//!   "quantizer": { "kind": "explicit", "partitions": [0.05, 0.1], "codebook": [0.0, 0.075, 0.15] }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SirError;
use crate::integrator::{validate_time_grid, IntegratorOptions};
use crate::model::{ModelParameters, StateVector};
use crate::numeric::linspace;
use crate::quantizer::ScalarQuantizer;

/// Seed values for the infected and removed compartments; everyone else starts susceptible.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct InitialConditions {
    pub infected: f64,
    pub removed: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            infected: 1.0,
            removed: 0.0,
        }
    }
}

/// A uniformly spaced grid of `points` samples over `[start, stop]`, endpoints included.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct TimeGridConfig {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl Default for TimeGridConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: 160.0,
            points: 160,
        }
    }
}

impl TimeGridConfig {
    /// # Errors
    ///
    /// Returns `SirError::InvalidTimeGrid` if the grid would be empty, decreasing, or negative.
    pub fn grid(&self) -> Result<Vec<f64>, SirError> {
        let grid = linspace(self.start, self.stop, self.points)?;
        validate_time_grid(&grid)?;
        Ok(grid)
    }
}

/// How the quantizer's levels are obtained.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuantizerConfig {
    /// `2^bits` equal regions over `[xmin, xmax]`.
    Uniform { xmin: f64, xmax: f64, bits: u32 },
    /// Caller-supplied thresholds and reconstruction values.
    Explicit {
        partitions: Vec<f64>,
        codebook: Vec<f64>,
    },
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        QuantizerConfig::Uniform {
            xmin: -1.0,
            xmax: 2.0,
            bits: 3,
        }
    }
}

impl QuantizerConfig {
    /// # Errors
    ///
    /// Returns the error of `ScalarQuantizer::uniform` or `ScalarQuantizer::new`.
    pub fn build(&self) -> Result<ScalarQuantizer, SirError> {
        match self {
            QuantizerConfig::Uniform { xmin, xmax, bits } => {
                ScalarQuantizer::uniform(*xmin, *xmax, *bits)
            }
            QuantizerConfig::Explicit {
                partitions,
                codebook,
            } => ScalarQuantizer::new(partitions.clone(), codebook.clone()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub parameters: ModelParameters,
    pub initial: InitialConditions,
    pub time: TimeGridConfig,
    pub quantizer: QuantizerConfig,
    pub integrator: IntegratorOptions,
}

impl RunConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `SirError::Io` if the file cannot be read, `SirError::Json` if it does not parse.
    pub fn from_path(path: &Path) -> Result<Self, SirError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// # Errors
    ///
    /// Returns `SirError::Json` if `text` is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self, SirError> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    ///
    /// Returns `SirError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, SirError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn initial_state(&self) -> StateVector {
        StateVector::seeded(
            self.parameters.total_population,
            self.initial.infected,
            self.initial.removed,
        )
    }

    /// Checks every section without running anything.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> Result<(), SirError> {
        self.parameters.validate()?;
        self.initial_state().validate_against(&self.parameters)?;
        self.time.grid()?;
        self.quantizer.build()?;
        self.integrator.validate()
    }
}
