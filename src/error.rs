//! Error types for the granule model and its integrator.

use thiserror::Error;

/// Domain errors raised by the parameter set and the derivative function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A state component, delayed value, time or derivative is NaN or infinite
    #[error("non-finite {quantity}: {value}")]
    NonFinite { quantity: &'static str, value: f64 },

    /// A parameter is outside its physical range
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// The docking sites saturate before the basal flux can be released
    #[error("no equilibrium at glucose {glucose} mM: DIR* = {dir} >= CT = {ct}")]
    NoEquilibrium { glucose: f64, dir: f64, ct: f64 },
}

/// Errors surfaced by a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Derivative evaluation or parameter validation failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// The underlying ODE solver rejected a step
    #[error("solver error: {0}")]
    Solver(&'static str),

    /// Time span, output step or tolerances are unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors reading an explicitly requested parameter file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("cannot read parameter file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid parameter set
    #[error("cannot parse parameter file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed but holds out-of-range values
    #[error("parameter file {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: ModelError,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
