//! Crossbar state store.
//!
//! Holds the cell state of one physical tile: the digital weight grids,
//! the analog conductance grids, and the per-cell wear bookkeeping the
//! read-disturb model needs (completed set/reset cycles and accumulated
//! read stress per polarity).
//!
//! Grid geometry: a logical row occupies one physical row per bit slice,
//! so the grids are `(tile_rows * slices) x tile_cols`. Only the region
//! mapped by the most recent write holds data; every other cell stays at
//! the idle value (digital 0, analog HRS).

use crate::common::IDLE_LEVEL;
use crate::config::CrossbarConfig;
use crate::device::ReadDisturb;

/// Per-tile cell state and wear counters.
#[derive(Debug, Clone)]
pub struct CrossbarState {
    phys_rows: usize,
    phys_cols: usize,
    slices: usize,
    hrs: f32,
    lrs: f32,
    differential: bool,
    full_level: Vec<i32>,
    active_rows: usize,
    active_cols: usize,

    gd_p: Vec<Vec<i32>>,
    gd_m: Vec<Vec<i32>>,
    ia_p: Vec<Vec<f32>>,
    ia_m: Vec<Vec<f32>>,

    cycles_p: Vec<Vec<u64>>,
    cycles_m: Vec<Vec<u64>>,
    reads_p: Vec<Vec<u64>>,
    reads_m: Vec<Vec<u64>>,
    refreshes: Vec<Vec<u64>>,

    sum_w: Vec<i32>,
}

impl CrossbarState {
    /// Allocates a tile with every cell at the idle value.
    ///
    /// `active_rows`/`active_cols` record the logical block the next
    /// mapping pass will fill; they may be zero for a freshly loaded,
    /// still-empty device.
    pub fn new(cfg: &CrossbarConfig, active_rows: usize, active_cols: usize) -> Self {
        let slices = cfg.split.len();
        let phys_rows = cfg.tile_rows * slices;
        let phys_cols = cfg.tile_cols;
        let differential = cfg.mode.is_differential_weight();
        let full_level = cfg
            .split
            .iter()
            .map(|&s| {
                if differential {
                    1i32 << (s - 1)
                } else {
                    (1i32 << s) - 1
                }
            })
            .collect();

        Self {
            phys_rows,
            phys_cols,
            slices,
            hrs: cfg.hrs,
            lrs: cfg.lrs,
            differential,
            full_level,
            active_rows,
            active_cols,
            gd_p: vec![vec![IDLE_LEVEL; phys_cols]; phys_rows],
            gd_m: vec![vec![IDLE_LEVEL; phys_cols]; phys_rows],
            ia_p: vec![vec![cfg.hrs; phys_cols]; phys_rows],
            ia_m: vec![vec![cfg.hrs; phys_cols]; phys_rows],
            cycles_p: vec![vec![0; phys_cols]; phys_rows],
            cycles_m: vec![vec![0; phys_cols]; phys_rows],
            reads_p: vec![vec![0; phys_cols]; phys_rows],
            reads_m: vec![vec![0; phys_cols]; phys_rows],
            refreshes: vec![vec![0; phys_cols]; phys_rows],
            sum_w: vec![0; cfg.tile_rows],
        }
    }

    /// Logical dimensions of the mapped block.
    pub fn active_dims(&self) -> (usize, usize) {
        (self.active_rows, self.active_cols)
    }

    /// Records the logical block covered by a mapping pass.
    pub fn set_active_dims(&mut self, rows: usize, cols: usize) {
        self.active_rows = rows;
        self.active_cols = cols;
    }

    /// Number of physical rows per logical row.
    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Writes both polarities of one physical cell.
    ///
    /// A completed set/reset cycle is recorded for a polarity when it is
    /// erased after having been programmed. The stress clocks of both
    /// polarities restart. Returns the number of elementary polarity
    /// writes performed (two).
    pub fn write_pair(&mut self, row: usize, col: usize, level_p: i32, level_m: i32) -> u64 {
        if self.gd_p[row][col] != IDLE_LEVEL && level_p == IDLE_LEVEL {
            self.cycles_p[row][col] += 1;
        }
        if self.gd_m[row][col] != IDLE_LEVEL && level_m == IDLE_LEVEL {
            self.cycles_m[row][col] += 1;
        }
        self.gd_p[row][col] = level_p;
        self.gd_m[row][col] = level_m;
        self.reads_p[row][col] = 0;
        self.reads_m[row][col] = 0;
        2
    }

    /// Writes the positive polarity of one physical cell.
    ///
    /// Single-polarity counterpart of [`write_pair`](Self::write_pair);
    /// returns one elementary write.
    pub fn write_single(&mut self, row: usize, col: usize, level_p: i32) -> u64 {
        if self.gd_p[row][col] != IDLE_LEVEL && level_p == IDLE_LEVEL {
            self.cycles_p[row][col] += 1;
        }
        self.gd_p[row][col] = level_p;
        self.reads_p[row][col] = 0;
        1
    }

    /// Programs the analog conductances of both polarities of one cell.
    pub fn program_pair(&mut self, row: usize, col: usize, g_p: f32, g_m: f32) {
        self.ia_p[row][col] = g_p;
        self.ia_m[row][col] = g_m;
    }

    /// Programs the analog conductance of the positive polarity.
    pub fn program_single(&mut self, row: usize, col: usize, g_p: f32) {
        self.ia_p[row][col] = g_p;
    }

    /// Stores the row weight sum used by offset-corrected read schemes.
    pub fn set_row_sum(&mut self, logical_row: usize, sum: i32) {
        self.sum_w[logical_row] = sum;
    }

    /// Row weight sum recorded at mapping time.
    pub fn row_sum(&self, logical_row: usize) -> i32 {
        self.sum_w[logical_row]
    }

    /// Adds one read pulse to the stress clocks of every active cell.
    ///
    /// Both polarity clocks advance; stress is only cleared by a rewrite
    /// or a mitigation refresh.
    pub fn advance_stress(&mut self) {
        for row in 0..self.active_rows * self.slices {
            for col in 0..self.active_cols {
                self.reads_p[row][col] += 1;
                self.reads_m[row][col] += 1;
            }
        }
    }

    fn at_full_scale(&self, row: usize, level: i32) -> bool {
        level == self.full_level[row % self.slices]
    }

    /// Re-derives the analog conductance of drifted cells.
    ///
    /// Only polarities programmed to the low-resistance state drift; the
    /// scaled value is recomputed from the nominal LRS each time, so the
    /// result depends only on the current stress state.
    pub fn apply_drift(&mut self, model: &ReadDisturb) {
        for row in 0..self.active_rows * self.slices {
            for col in 0..self.active_cols {
                if self.at_full_scale(row, self.gd_p[row][col]) {
                    let t_stress = model.stress_time(self.reads_p[row][col]);
                    let scale = model.conductance_scaling(t_stress, self.cycles_p[row][col]);
                    self.ia_p[row][col] = (f64::from(self.lrs) * scale) as f32;
                }
                if self.differential && self.at_full_scale(row, self.gd_m[row][col]) {
                    let t_stress = model.stress_time(self.reads_m[row][col]);
                    let scale = model.conductance_scaling(t_stress, self.cycles_m[row][col]);
                    self.ia_m[row][col] = (f64::from(self.lrs) * scale) as f32;
                }
            }
        }
    }

    /// Rewrites over-stressed cells back to their nominal conductance.
    ///
    /// A polarity is refreshed when its accumulated stress reaches
    /// `threshold_fp` times the transition time for its cycle count,
    /// which pins the conductance at nominal before any decay becomes
    /// observable. Returns the number of refreshed cell polarities.
    pub fn refresh_over_threshold(&mut self, model: &ReadDisturb, threshold_fp: f32) -> u64 {
        let mut refreshed = 0u64;
        for row in 0..self.active_rows * self.slices {
            for col in 0..self.active_cols {
                if self.at_full_scale(row, self.gd_p[row][col]) {
                    let t_stress = model.stress_time(self.reads_p[row][col]);
                    let tau = model.transition_time(self.cycles_p[row][col]);
                    if t_stress >= f64::from(threshold_fp) * tau {
                        self.ia_p[row][col] = self.lrs;
                        self.reads_p[row][col] = 0;
                        self.refreshes[row][col] += 1;
                        refreshed += 1;
                    }
                }
                if self.differential && self.at_full_scale(row, self.gd_m[row][col]) {
                    let t_stress = model.stress_time(self.reads_m[row][col]);
                    let tau = model.transition_time(self.cycles_m[row][col]);
                    if t_stress >= f64::from(threshold_fp) * tau {
                        self.ia_m[row][col] = self.lrs;
                        self.reads_m[row][col] = 0;
                        self.refreshes[row][col] += 1;
                        refreshed += 1;
                    }
                }
            }
        }
        refreshed
    }

    /// Positive digital weight grid (full physical tile).
    pub fn gd_p(&self) -> &Vec<Vec<i32>> {
        &self.gd_p
    }

    /// Negative digital weight grid (full physical tile).
    pub fn gd_m(&self) -> &Vec<Vec<i32>> {
        &self.gd_m
    }

    /// Positive analog conductance grid (full physical tile).
    pub fn ia_p(&self) -> &Vec<Vec<f32>> {
        &self.ia_p
    }

    /// Negative analog conductance grid (full physical tile).
    pub fn ia_m(&self) -> &Vec<Vec<f32>> {
        &self.ia_m
    }

    /// Per-cell completed write cycles, positive polarity.
    pub fn cycles_p(&self) -> &Vec<Vec<u64>> {
        &self.cycles_p
    }

    /// Per-cell completed write cycles, negative polarity.
    pub fn cycles_m(&self) -> &Vec<Vec<u64>> {
        &self.cycles_m
    }

    /// Per-cell mitigation refresh counts.
    pub fn cell_refreshes(&self) -> &Vec<Vec<u64>> {
        &self.refreshes
    }
}
