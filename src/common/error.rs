//! Error types for the crossbar simulator.
//!
//! Every fallible operation in the crate reports one of the variants
//! defined here. Errors are terminal for the call that raised them: a
//! failing operation leaves counters, cell state, and configuration
//! exactly as they were.

use std::error::Error;
use std::fmt;

/// Result alias used throughout the simulator.
pub type Result<T> = std::result::Result<T, SimError>;

/// Simulator error taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Malformed, missing, or mutually inconsistent configuration, or
    /// input data that is inconsistent with the configured precision.
    Config(String),

    /// Dimension mismatch between supplied buffers and the declared
    /// matrix shape, or a shape that does not fit the physical tile.
    Shape(String),

    /// Operation attempted on an unbuilt or stale crossbar.
    State(String),

    /// Device model parameters that yield non-finite derived constants.
    DeviceModel(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "configuration error: {msg}"),
            SimError::Shape(msg) => write!(f, "shape error: {msg}"),
            SimError::State(msg) => write!(f, "state error: {msg}"),
            SimError::DeviceModel(msg) => write!(f, "device model error: {msg}"),
        }
    }
}

impl Error for SimError {}
