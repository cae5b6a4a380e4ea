//! Analog In-Memory-Computing Crossbar Simulator Library.
//!
//! This crate implements a behavioral golden model of an analog crossbar
//! accelerator performing signed-integer matrix-vector multiplication on
//! resistive memory cells. It reproduces the numerically relevant device
//! effects: finite conductance states between HRS and LRS, ADC
//! quantization of the analog column currents, and time-dependent
//! conductance drift from repeated non-destructive reads, with an
//! optional refresh-based mitigation policy.
//!
//! # Architecture
//!
//! * **Mapping**: per-mode weight/activation encodings (differential,
//!   offset, two's complement, unsigned, and binary schemes) with bit
//!   slicing across physical rows.
//! * **Crossbar**: a fixed physical tile of cells, of which one logical
//!   m×n block is active, with per-cell wear and stress bookkeeping.
//! * **Numerics**: symmetric and positive ADC families, a read-disturb
//!   drift model, and an exact digital comparison path.
//!
//! # Modules
//!
//! * `common`: shared constants and error handling.
//! * `config`: typed configuration records, validation, update policy.
//! * `device`: read-disturb drift model.
//! * `adc`: analog-to-digital quantization.
//! * `xbar`: crossbar cell state store.
//! * `mapping`: mapping-mode kernels.
//! * `engine`: execution engine orchestrating the above.
//! * `stats`: operation counters and reporting.

/// Shared constants, error types, and the crate `Result` alias.
pub mod common;

/// Configuration records, validation, and the hot/structural update
/// classification.
pub mod config;

/// Analog-to-digital converter families.
pub mod adc;

/// Read-disturb device model (transition time and conductance decay).
pub mod device;

/// Weight and activation mapping kernels.
pub mod mapping;

/// Crossbar cell state: conductance grids and wear counters.
pub mod xbar;

/// The MVM execution engine.
pub mod engine;

/// Operation counters and reporting.
pub mod stats;

pub use common::{Result, SimError};
pub use config::{ConfigUpdate, CrossbarConfig, MappingMode};
pub use engine::CrossbarEngine;
