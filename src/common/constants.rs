//! Profile-level constants.
//!
//! The physical tile size and the idle cell encoding are properties of
//! the simulated device profile. They are exposed here (and overridable
//! through the configuration) instead of being embedded as literals in
//! the state store.

/// Default number of physical rows in one crossbar tile.
pub const DEFAULT_TILE_ROWS: usize = 32;

/// Default number of physical columns in one crossbar tile.
pub const DEFAULT_TILE_COLS: usize = 32;

/// Digital level held by a cell that has never been programmed.
pub const IDLE_LEVEL: i32 = 0;
