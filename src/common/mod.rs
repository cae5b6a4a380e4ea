//! Common types shared across the crossbar simulator.
//!
//! Provides the error taxonomy and the device-profile constants used by
//! the configuration layer, the state store, and the execution engine.

/// Profile constants (tile geometry, idle cell encoding).
pub mod constants;

/// Error types and the crate-wide `Result` alias.
pub mod error;

pub use constants::{DEFAULT_TILE_COLS, DEFAULT_TILE_ROWS, IDLE_LEVEL};
pub use error::{Result, SimError};
