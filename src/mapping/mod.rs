//! Weight and activation mapping.
//!
//! Each configuration selects exactly one mapping kernel at build time.
//! A kernel owns the arithmetic of its mode: how signed weights become
//! per-cell target levels, how activations are driven onto the array,
//! and how the polarity partial sums recombine into an integer result.
//! The execution engine is mode-agnostic and only talks to the
//! [`MappingKernel`] trait.
//!
//! Contract shared by every kernel: in the noiseless, unquantized limit
//! the recombined output equals the exact integer dot product of the
//! original matrix and vector.

use crate::adc::Adc;
use crate::common::{Result, SimError};
use crate::config::{CrossbarConfig, MappingMode};
use crate::xbar::CrossbarState;

mod bnn;
mod int;

use bnn::{BnnI, BnnII, BnnIII, BnnIV, BnnV, BnnVI};
use int::{DiffInput, OffsetInput, OffsetWeight, TwosComplementInput, UnsignedInput};

/// One mapping strategy, selected at configuration-build time.
pub trait MappingKernel {
    /// The mode this kernel implements.
    fn mode(&self) -> MappingMode;

    /// Rejects weight values the mode cannot represent.
    fn validate_matrix(&self, mat: &[i32]) -> Result<()>;

    /// Rejects activation values the mode cannot drive.
    fn validate_vector(&self, vec: &[i32]) -> Result<()>;

    /// Maps a weight matrix onto the digital grids.
    ///
    /// Returns the number of elementary polarity writes performed.
    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64;

    /// Programs the analog conductance grids from the digital levels.
    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize);

    /// Evaluates the MVM on the digital grids (exact comparison path).
    ///
    /// Accumulates into `res`.
    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize);

    /// Evaluates the MVM on the analog grids through the ADC.
    ///
    /// Accumulates into `res`.
    fn mvm_analog(
        &self,
        xbar: &CrossbarState,
        adc: &Adc,
        res: &mut [i32],
        vec: &[i32],
        m: usize,
        n: usize,
    );

    /// Elementary cell reads one MVM call costs in this mode.
    fn elementary_reads(&self, m: usize, n: usize) -> u64;
}

/// Builds the kernel for the configured mode.
pub fn build_kernel(cfg: &CrossbarConfig) -> Result<Box<dyn MappingKernel>> {
    let kernel: Box<dyn MappingKernel> = match cfg.mode {
        MappingMode::IDiffWDiff1Xb => Box::new(DiffInput::new(cfg, false)),
        MappingMode::IDiffWDiff2Xb => Box::new(DiffInput::new(cfg, true)),
        MappingMode::IOffsWDiff => Box::new(OffsetInput::new(cfg)),
        MappingMode::ITcWDiff => Box::new(TwosComplementInput::new(cfg)),
        MappingMode::IUintWDiff => Box::new(UnsignedInput::new(cfg)),
        MappingMode::IUintWOffs => Box::new(OffsetWeight::new(cfg)),
        MappingMode::BnnI => Box::new(BnnI::new(cfg)),
        MappingMode::BnnII => Box::new(BnnII::new(cfg)),
        MappingMode::BnnIII => Box::new(BnnIII::new(cfg)),
        MappingMode::BnnIV => Box::new(BnnIV::new(cfg)),
        MappingMode::BnnV => Box::new(BnnV::new(cfg)),
        MappingMode::BnnVI => Box::new(BnnVI::new(cfg)),
    };
    Ok(kernel)
}

/// Per-slice mapping parameters derived once from the configuration.
///
/// `shift[s]` is the bit position of slice `s` within the weight word
/// (most significant slice first); `step[s]` is the conductance added
/// per digital level in that slice.
#[derive(Debug, Clone)]
pub(crate) struct SlicePlan {
    pub split: Vec<u32>,
    pub shift: Vec<u32>,
    pub step: Vec<f32>,
    pub i_mm: f32,
    pub hrs: f32,
}

impl SlicePlan {
    pub fn new(cfg: &CrossbarConfig, differential: bool) -> Self {
        let i_mm = cfg.span();
        let mut shift = Vec::with_capacity(cfg.split.len());
        let mut remaining = cfg.w_bit;
        for &s in &cfg.split {
            remaining -= s;
            shift.push(remaining);
        }
        let step = cfg
            .split
            .iter()
            .map(|&s| {
                if differential {
                    i_mm / (1u32 << (s - 1)) as f32
                } else {
                    i_mm / ((1u32 << s) - 1) as f32
                }
            })
            .collect();
        Self {
            split: cfg.split.clone(),
            shift,
            step,
            i_mm,
            hrs: cfg.hrs,
        }
    }

    pub fn slices(&self) -> usize {
        self.split.len()
    }
}

/// Splits a signed weight matrix across differential polarities.
///
/// The magnitude of each entry is bit-sliced; positive values land in
/// the positive grid, negative values in the negative grid. Row weight
/// sums are recorded for the offset-corrected read schemes.
pub(crate) fn encode_differential(
    plan: &SlicePlan,
    xbar: &mut CrossbarState,
    mat: &[i32],
    m: usize,
    n: usize,
) -> u64 {
    let slices = plan.slices();
    let mut writes = 0u64;
    for row in 0..m {
        let mut sum = 0i32;
        for col in 0..n {
            let w = mat[n * row + col];
            sum += w;
            for s in 0..slices {
                let phys = row * slices + s;
                let mask = (1i32 << plan.split[s]) - 1;
                let (p, neg) = if w >= 0 {
                    ((w >> plan.shift[s]) & mask, 0)
                } else {
                    (0, (-w >> plan.shift[s]) & mask)
                };
                writes += xbar.write_pair(phys, col, p, neg);
            }
        }
        xbar.set_row_sum(row, sum);
    }
    writes
}

/// Maps weights with a `2^(W_BIT-1)` offset onto the positive grid only.
pub(crate) fn encode_offset(
    plan: &SlicePlan,
    xbar: &mut CrossbarState,
    mat: &[i32],
    m: usize,
    n: usize,
    w_bit: u32,
) -> u64 {
    let slices = plan.slices();
    let bias = 1i32 << (w_bit - 1);
    let mut writes = 0u64;
    for row in 0..m {
        for col in 0..n {
            let w = mat[n * row + col] + bias;
            for s in 0..slices {
                let phys = row * slices + s;
                let mask = (1i32 << plan.split[s]) - 1;
                writes += xbar.write_single(phys, col, (w >> plan.shift[s]) & mask);
            }
        }
    }
    writes
}

/// Splits a ±1 matrix across differential polarities.
pub(crate) fn encode_binary_differential(
    xbar: &mut CrossbarState,
    mat: &[i32],
    m: usize,
    n: usize,
) -> u64 {
    let mut writes = 0u64;
    for row in 0..m {
        let mut sum = 0i32;
        for col in 0..n {
            let w = mat[n * row + col];
            sum += w;
            let (p, neg) = if w == 1 { (1, 0) } else { (0, 1) };
            writes += xbar.write_pair(row, col, p, neg);
        }
        xbar.set_row_sum(row, sum);
    }
    writes
}

/// Programs both analog grids from the digital levels.
pub(crate) fn program_differential(plan: &SlicePlan, xbar: &mut CrossbarState, m: usize, n: usize) {
    let slices = plan.slices();
    for phys in 0..m * slices {
        let step = plan.step[phys % slices];
        for col in 0..n {
            let g_p = xbar.gd_p()[phys][col] as f32 * step + plan.hrs;
            let g_m = xbar.gd_m()[phys][col] as f32 * step + plan.hrs;
            xbar.program_pair(phys, col, g_p, g_m);
        }
    }
}

/// Programs the positive analog grid from the digital levels.
pub(crate) fn program_single(plan: &SlicePlan, xbar: &mut CrossbarState, m: usize, n: usize) {
    let slices = plan.slices();
    for phys in 0..m * slices {
        let step = plan.step[phys % slices];
        for col in 0..n {
            let g_p = xbar.gd_p()[phys][col] as f32 * step + plan.hrs;
            xbar.program_single(phys, col, g_p);
        }
    }
}

pub(crate) fn check_signed_range(values: &[i32], bits: u32, what: &str) -> Result<()> {
    let lo = -(1i64 << (bits - 1));
    let hi = (1i64 << (bits - 1)) - 1;
    for &v in values {
        if i64::from(v) < lo || i64::from(v) > hi {
            return Err(SimError::Config(format!(
                "{what} value {v} does not fit {bits} signed bits"
            )));
        }
    }
    Ok(())
}

pub(crate) fn check_unsigned_range(values: &[i32], bits: u32, what: &str) -> Result<()> {
    let hi = (1i64 << bits) - 1;
    for &v in values {
        if i64::from(v) < 0 || i64::from(v) > hi {
            return Err(SimError::Config(format!(
                "{what} value {v} does not fit {bits} unsigned bits"
            )));
        }
    }
    Ok(())
}

pub(crate) fn check_binary(values: &[i32], what: &str) -> Result<()> {
    for &v in values {
        if v != 1 && v != -1 {
            return Err(SimError::Config(format!(
                "binary {what} value must be +1 or -1, got {v}"
            )));
        }
    }
    Ok(())
}
