//! Analog MVM execution engine.
//!
//! [`CrossbarEngine`] ties the pieces together: it owns the validated
//! configuration, the read-disturb device model, the ADC, the mapping
//! kernel selected for the configured mode, the crossbar state, and the
//! operation counters. One engine models one physical device; separate
//! devices need separate instances, which share nothing.
//!
//! Lifecycle: `load` resets the instance around a new configuration;
//! `update` applies a typed partial record, rebuilding derived state and
//! marking the crossbar stale when a structural parameter changes; `cpy`
//! lazily (re)builds the crossbar and maps a weight matrix; `mvm` reads
//! the array through the drift model and the ADC. Every failing call is
//! side-effect free: validation happens before any state is touched, and
//! counters advance only on success.

use crate::adc::Adc;
use crate::common::{Result, SimError};
use crate::config::{ConfigUpdate, CrossbarConfig};
use crate::device::ReadDisturb;
use crate::mapping::{build_kernel, MappingKernel};
use crate::stats::OpCounters;
use crate::xbar::CrossbarState;

/// One simulated crossbar accelerator instance.
pub struct CrossbarEngine {
    cfg: CrossbarConfig,
    device: ReadDisturb,
    adc: Adc,
    kernel: Box<dyn MappingKernel>,
    xbar: CrossbarState,
    stale: bool,
    counters: OpCounters,
}

impl CrossbarEngine {
    /// Builds an engine from a validated configuration.
    pub fn new(cfg: CrossbarConfig) -> Result<Self> {
        cfg.validate()?;
        let device = ReadDisturb::new(cfg.v_read, cfg.t_read)?;
        let adc = Adc::for_config(&cfg);
        let kernel = build_kernel(&cfg)?;
        let xbar = CrossbarState::new(&cfg, 0, 0);
        Ok(Self {
            cfg,
            device,
            adc,
            kernel,
            xbar,
            stale: false,
            counters: OpCounters::default(),
        })
    }

    /// Replaces the configuration wholesale.
    ///
    /// Discards the crossbar and resets every counter.
    pub fn load(&mut self, cfg: CrossbarConfig) -> Result<()> {
        *self = CrossbarEngine::new(cfg)?;
        Ok(())
    }

    /// Applies a partial configuration update.
    ///
    /// The merged configuration is validated before anything changes.
    /// Hot fields apply in place; structural fields rebuild the derived
    /// pipeline and mark the crossbar stale, to be rebuilt by the next
    /// `cpy`. Counters persist either way.
    pub fn update(&mut self, update: &ConfigUpdate) -> Result<()> {
        let merged = update.merged_into(&self.cfg);
        merged.validate()?;
        if update.touches_structural() {
            let device = ReadDisturb::new(merged.v_read, merged.t_read)?;
            let adc = Adc::for_config(&merged);
            let kernel = build_kernel(&merged)?;
            self.device = device;
            self.adc = adc;
            self.kernel = kernel;
            self.stale = true;
        }
        if merged.verbose {
            println!(
                "config update applied (structural: {})",
                update.touches_structural()
            );
        }
        self.cfg = merged;
        Ok(())
    }

    /// Maps a row-major signed weight matrix onto the crossbar.
    ///
    /// Rebuilds the crossbar first when it is stale, empty, or sized for
    /// different dimensions. Re-invoking with identical values and no
    /// intervening reads reproduces identical cell state and the same
    /// counter increment.
    pub fn cpy(&mut self, mat: &[i32], m: usize, n: usize) -> Result<()> {
        self.check_dims(m, n)?;
        if mat.len() != m * n {
            return Err(SimError::Shape(format!(
                "matrix buffer holds {} entries, expected {}x{}",
                mat.len(),
                m,
                n
            )));
        }
        self.kernel.validate_matrix(mat)?;

        if self.stale || self.xbar.active_dims() != (m, n) {
            self.xbar = CrossbarState::new(&self.cfg, m, n);
            self.stale = false;
        }
        let writes = self.kernel.encode(&mut self.xbar, mat, m, n);
        if !self.cfg.digital_only {
            self.kernel.program(&mut self.xbar, m, n);
        }
        self.counters.writes += writes;
        if self.cfg.verbose {
            println!(
                "cpy: mapped {}x{} matrix ({} elementary writes)",
                m, n, writes
            );
        }
        Ok(())
    }

    /// Executes one matrix-vector multiplication.
    ///
    /// Reads the mapped cells through the drift model, sums in the
    /// analog domain, quantizes through the ADC, and accumulates the
    /// rescaled integer result into `res`. The matrix argument is part
    /// of the host call signature and is validated for shape, but the
    /// multiplication uses the state mapped by the last `cpy`.
    pub fn mvm(
        &mut self,
        res: &mut [i32],
        vec: &[i32],
        mat: &[i32],
        m: usize,
        n: usize,
    ) -> Result<()> {
        self.check_dims(m, n)?;
        if res.len() != m {
            return Err(SimError::Shape(format!(
                "result buffer holds {} entries, expected {}",
                res.len(),
                m
            )));
        }
        if vec.len() != n {
            return Err(SimError::Shape(format!(
                "vector buffer holds {} entries, expected {}",
                vec.len(),
                n
            )));
        }
        if mat.len() != m * n {
            return Err(SimError::Shape(format!(
                "matrix buffer holds {} entries, expected {}x{}",
                mat.len(),
                m,
                n
            )));
        }
        if self.stale {
            return Err(SimError::State(
                "crossbar is stale after a structural update; write before reading".into(),
            ));
        }
        if self.xbar.active_dims() != (m, n) {
            return Err(SimError::State(format!(
                "no crossbar materialized for {}x{} (mapped: {}x{})",
                m,
                n,
                self.xbar.active_dims().0,
                self.xbar.active_dims().1
            )));
        }
        self.kernel.validate_vector(vec)?;

        if self.cfg.digital_only {
            self.kernel.mvm_digital(&self.xbar, res, vec, m, n);
        } else {
            self.xbar.advance_stress();
            if self.cfg.read_disturb_mitigation {
                let refreshed = self
                    .xbar
                    .refresh_over_threshold(&self.device, self.cfg.mitigation_fp);
                if refreshed > 0 {
                    self.counters.refresh_passes += 1;
                    self.counters.refreshed_cells += refreshed;
                }
            } else {
                self.xbar.apply_drift(&self.device);
            }
            self.kernel.mvm_analog(&self.xbar, &self.adc, res, vec, m, n);
        }

        self.counters.mvms += 1;
        self.counters.reads += self.kernel.elementary_reads(m, n);
        if self.cfg.verbose {
            println!("mvm: {}x{} call #{}", m, n, self.counters.mvms);
        }
        Ok(())
    }

    fn check_dims(&self, m: usize, n: usize) -> Result<()> {
        if m == 0 || n == 0 {
            return Err(SimError::Shape(format!(
                "matrix dimensions must be positive, got {m}x{n}"
            )));
        }
        if m > self.cfg.tile_rows || n > self.cfg.tile_cols {
            return Err(SimError::Shape(format!(
                "{}x{} exceeds the {}x{} tile",
                m, n, self.cfg.tile_rows, self.cfg.tile_cols
            )));
        }
        Ok(())
    }

    /// Active configuration.
    pub fn config(&self) -> &CrossbarConfig {
        &self.cfg
    }

    /// Operation counters.
    pub fn counters(&self) -> &OpCounters {
        &self.counters
    }

    /// Positive analog conductance grid (full physical tile).
    pub fn ga_p(&self) -> &Vec<Vec<f32>> {
        self.xbar.ia_p()
    }

    /// Negative analog conductance grid (full physical tile).
    pub fn ga_m(&self) -> &Vec<Vec<f32>> {
        self.xbar.ia_m()
    }

    /// Positive digital weight grid (full physical tile).
    pub fn gd_p(&self) -> &Vec<Vec<i32>> {
        self.xbar.gd_p()
    }

    /// Negative digital weight grid (full physical tile).
    pub fn gd_m(&self) -> &Vec<Vec<i32>> {
        self.xbar.gd_m()
    }

    /// Per-cell completed write cycles, positive polarity.
    pub fn cycles_p(&self) -> &Vec<Vec<u64>> {
        self.xbar.cycles_p()
    }

    /// Per-cell completed write cycles, negative polarity.
    pub fn cycles_m(&self) -> &Vec<Vec<u64>> {
        self.xbar.cycles_m()
    }

    /// Per-cell mitigation refresh counts.
    pub fn cell_refreshes(&self) -> &Vec<Vec<u64>> {
        self.xbar.cell_refreshes()
    }

    /// Prints the operation report for this instance.
    pub fn print_stats(&self) {
        self.counters
            .print(self.cfg.mode, self.cfg.i_bit, self.cfg.split.len());
    }
}
