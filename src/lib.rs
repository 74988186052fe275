//! Numerical simulation of an SIR epidemic and scalar quantization of its infected curve
//!
//! The crate has two independent pieces composed one after the other:
//! * The [`integrator`] advances the SIR ordinary differential equations from an initial state
//!   over a time grid and returns a [`Trajectory`] of susceptible, infected, and removed counts.
//! * The [`quantizer`] maps a sampled signal, typically the infected fraction `I(t) / N` of a
//!   trajectory, onto a finite set of reconstruction levels.
//!
//! Around them sit the pieces a complete run needs:
//! * [`config`] holds every literal of a run and loads it from JSON.
//! * [`runner`] parses the command line, runs integrator then quantizer, and writes
//!   [`report`]s, the CSV files consumed by external plotting.
//! * [`log`] configures diagnostic logging.
//!
//! ```
//! use sir_quant::{integrate, linspace, quantize, ModelParameters, StateVector};
//!
//! let params = ModelParameters::new(1000.0, 0.2, 0.1).unwrap();
//! let initial = StateVector::seeded(1000.0, 1.0, 0.0);
//! let grid = linspace(0.0, 160.0, 160).unwrap();
//! let trajectory = integrate(&params, &initial, &grid).unwrap();
//!
//! let signal = trajectory.infected_fraction();
//! let quantized = quantize(&signal, &[0.05, 0.1], &[0.0, 0.075, 0.15]).unwrap();
//! assert_eq!(quantized.len(), 160);
//! ```
pub mod config;
pub mod error;
pub mod integrator;
pub mod log;
pub mod model;
pub mod numeric;
pub mod quantizer;
pub mod report;
pub mod runner;
pub mod trajectory;

mod macros;

pub use config::RunConfig;
pub use error::SirError;
pub use integrator::{integrate, integrate_with_options, IntegratorOptions};
pub use model::{ModelParameters, StateVector};
pub use numeric::linspace;
pub use quantizer::{quantize, Quantized, ScalarQuantizer};
pub use trajectory::Trajectory;
