use serde::Serialize;

use crate::model::StateVector;

/// The solution of one integration: a state per time-grid point. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    total_population: f64,
    times: Vec<f64>,
    states: Vec<StateVector>,
}

/// A single `(t, S, I, R)` sample, the row type of the trajectory report.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub susceptible: f64,
    pub infected: f64,
    pub removed: f64,
}

impl Trajectory {
    pub(crate) fn new(total_population: f64, times: Vec<f64>, states: Vec<StateVector>) -> Self {
        debug_assert_eq!(times.len(), states.len());
        Self {
            total_population,
            times,
            states,
        }
    }

    #[must_use]
    pub fn total_population(&self) -> f64 {
        self.total_population
    }

    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[must_use]
    pub fn states(&self) -> &[StateVector] {
        &self.states
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = TrajectoryPoint> + '_ {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(&time, state)| TrajectoryPoint {
                time,
                susceptible: state.susceptible,
                infected: state.infected,
                removed: state.removed,
            })
    }

    #[must_use]
    pub fn susceptible(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.susceptible).collect()
    }

    #[must_use]
    pub fn infected(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.infected).collect()
    }

    #[must_use]
    pub fn removed(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.removed).collect()
    }

    /// `I(t) / N` at every grid point. This is the signal handed to the quantizer.
    #[must_use]
    pub fn infected_fraction(&self) -> Vec<f64> {
        self.states
            .iter()
            .map(|s| s.infected / self.total_population)
            .collect()
    }

    /// Time and value of the largest `I` on the grid. The earliest point wins ties.
    #[must_use]
    pub fn peak(&self) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (&time, state) in self.times.iter().zip(&self.states) {
            match best {
                Some((_, infected)) if state.infected <= infected => {}
                _ => best = Some((time, state.infected)),
            }
        }
        best
    }

    /// Largest `|S + I + R - N|` over the trajectory.
    #[must_use]
    pub fn max_conservation_error(&self) -> f64 {
        self.states
            .iter()
            .map(|s| (s.total() - self.total_population).abs())
            .fold(0.0, f64::max)
    }
}
