//! The eight-component state of the granule model.

use serde::{Deserialize, Serialize};

/// Number of state variables.
pub const N_STATES: usize = 8;

/// Position of each component in the flat state vector.
///
/// The order is fixed; secretion post-processing reads `F` at index 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateIndex {
    I = 0,
    V = 1,
    R = 2,
    D = 3,
    DIR = 4,
    F = 5,
    Gamma = 6,
    Rho = 7,
}

impl StateIndex {
    pub const ALL: [StateIndex; N_STATES] = [
        StateIndex::I,
        StateIndex::V,
        StateIndex::R,
        StateIndex::D,
        StateIndex::DIR,
        StateIndex::F,
        StateIndex::Gamma,
        StateIndex::Rho,
    ];

    /// Column label used in printed tables
    pub fn label(self) -> &'static str {
        match self {
            StateIndex::I => "I",
            StateIndex::V => "V",
            StateIndex::R => "R",
            StateIndex::D => "D",
            StateIndex::DIR => "DIR",
            StateIndex::F => "F",
            StateIndex::Gamma => "gamma",
            StateIndex::Rho => "rho",
        }
    }
}

/// Granule pools and rate coefficients at one instant.
///
/// The same struct carries derivatives when returned from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Proinsulin aggregates (amol)
    pub I: f64,
    /// Granule membrane material (amol-equivalent)
    pub V: f64,
    /// Reserve granules
    pub R: f64,
    /// Docked granules
    pub D: f64,
    /// Immediately releasable granules
    pub DIR: f64,
    /// Granules fused with the plasma membrane
    pub F: f64,
    /// Priming rate (min⁻¹)
    pub gamma: f64,
    /// Fusion rate (min⁻¹)
    pub rho: f64,
}

impl State {
    pub fn from_array(x: [f64; N_STATES]) -> Self {
        Self {
            I: x[0],
            V: x[1],
            R: x[2],
            D: x[3],
            DIR: x[4],
            F: x[5],
            gamma: x[6],
            rho: x[7],
        }
    }

    pub fn to_array(&self) -> [f64; N_STATES] {
        [
            self.I, self.V, self.R, self.D, self.DIR, self.F, self.gamma, self.rho,
        ]
    }

    pub fn get(&self, index: StateIndex) -> f64 {
        self.to_array()[index as usize]
    }

    /// First component that is NaN or infinite, if any
    pub fn first_non_finite(&self) -> Option<(StateIndex, f64)> {
        StateIndex::ALL
            .iter()
            .map(|&idx| (idx, self.get(idx)))
            .find(|(_, value)| !value.is_finite())
    }

    /// Largest absolute component
    pub fn max_abs(&self) -> f64 {
        self.to_array().iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
    }
}

impl From<[f64; N_STATES]> for State {
    fn from(x: [f64; N_STATES]) -> Self {
        Self::from_array(x)
    }
}

impl From<State> for [f64; N_STATES] {
    fn from(s: State) -> Self {
        s.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_fixed() {
        let s = State::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(s.F, 6.0);
        assert_eq!(s.get(StateIndex::F), 6.0);
        assert_eq!(s.get(StateIndex::Rho), 8.0);
        assert_eq!(s.to_array()[StateIndex::DIR as usize], 5.0);
    }

    #[test]
    fn test_first_non_finite() {
        let mut s = State::default();
        assert!(s.first_non_finite().is_none());
        s.R = f64::INFINITY;
        s.gamma = f64::NAN;
        assert_eq!(s.first_non_finite().map(|(idx, _)| idx), Some(StateIndex::R));
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = StateIndex::ALL.iter().map(|i| i.label()).collect();
        assert_eq!(labels, ["I", "V", "R", "D", "DIR", "F", "gamma", "rho"]);
    }
}
