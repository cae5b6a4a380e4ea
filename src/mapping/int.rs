//! Signed-integer mapping kernels.
//!
//! Five encodings of a signed weight matrix and activation vector onto
//! the array. All of them bit-slice the weights across `SPLIT` physical
//! rows and evaluate the activation bit-serially on the analog path; the
//! digital path evaluates the same encoding with exact integer
//! arithmetic.

use crate::adc::Adc;
use crate::common::Result;
use crate::config::{CrossbarConfig, MappingMode};
use crate::xbar::CrossbarState;

use super::{
    check_signed_range, check_unsigned_range, encode_differential, encode_offset,
    program_differential, program_single, MappingKernel, SlicePlan,
};

/// Differential inputs over differential weights.
///
/// Covers the one-array variant (polarity reads in consecutive cycles)
/// and the two-array replica variant; the numerics are identical, the
/// replica variant just programs twice the cells.
pub(crate) struct DiffInput {
    plan: SlicePlan,
    w_bit: u32,
    i_bit: u32,
    replicated: bool,
}

impl DiffInput {
    pub fn new(cfg: &CrossbarConfig, replicated: bool) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
            w_bit: cfg.w_bit,
            i_bit: cfg.i_bit,
            replicated,
        }
    }
}

impl MappingKernel for DiffInput {
    fn mode(&self) -> MappingMode {
        if self.replicated {
            MappingMode::IDiffWDiff2Xb
        } else {
            MappingMode::IDiffWDiff1Xb
        }
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_signed_range(mat, self.w_bit, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_signed_range(vec, self.i_bit, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        let writes = encode_differential(&self.plan, xbar, mat, m, n);
        if self.replicated {
            writes * 2
        } else {
            writes
        }
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let slices = self.plan.slices();
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let vd_p: Vec<i32> = vec.iter().map(|&v| v.max(0)).collect();
        let vd_m: Vec<i32> = vec.iter().map(|&v| (-v).max(0)).collect();

        for row in 0..m {
            for s in 0..slices {
                let phys = row * slices + s;
                let mut acc = 0i32;
                for col in 0..n {
                    acc += (gd_p[phys][col] - gd_m[phys][col]) * vd_p[col];
                    acc += (gd_m[phys][col] - gd_p[phys][col]) * vd_m[col];
                }
                res[row] += acc << self.plan.shift[s];
            }
        }
    }

    fn mvm_analog(
        &self,
        xbar: &CrossbarState,
        adc: &Adc,
        res: &mut [i32],
        vec: &[i32],
        m: usize,
        n: usize,
    ) {
        let slices = self.plan.slices();
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();
        let vd_p: Vec<i32> = vec.iter().map(|&v| v.max(0)).collect();
        let vd_m: Vec<i32> = vec.iter().map(|&v| (-v).max(0)).collect();

        // Positive input bits: the sign position is always clear, so one
        // fewer bit-serial pass is needed than for the magnitudes of the
        // negative inputs.
        for bit in 0..self.i_bit - 1 {
            for row in 0..m {
                for s in 0..slices {
                    let phys = row * slices + s;
                    let mut current = 0.0f32;
                    for col in 0..n {
                        current +=
                            (ia_p[phys][col] - ia_m[phys][col]) * ((vd_p[col] >> bit) & 1) as f32;
                    }
                    res[row] += rescale(adc.convert(current), &self.plan, s, bit);
                }
            }
        }

        for bit in 0..self.i_bit {
            for row in 0..m {
                for s in 0..slices {
                    let phys = row * slices + s;
                    let mut current = 0.0f32;
                    for col in 0..n {
                        current +=
                            (ia_m[phys][col] - ia_p[phys][col]) * ((vd_m[col] >> bit) & 1) as f32;
                    }
                    res[row] += rescale(adc.convert(current), &self.plan, s, bit);
                }
            }
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        let cells = (m * n * self.plan.slices()) as u64;
        2 * cells * (2 * u64::from(self.i_bit) - 1)
    }
}

/// Offset-shifted inputs over differential weights.
pub(crate) struct OffsetInput {
    plan: SlicePlan,
    w_bit: u32,
    i_bit: u32,
}

impl OffsetInput {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
            w_bit: cfg.w_bit,
            i_bit: cfg.i_bit,
        }
    }
}

impl MappingKernel for OffsetInput {
    fn mode(&self) -> MappingMode {
        MappingMode::IOffsWDiff
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_signed_range(mat, self.w_bit, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_signed_range(vec, self.i_bit, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_differential(&self.plan, xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let slices = self.plan.slices();
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let bias = 1i32 << (self.i_bit - 1);
        let vd: Vec<i32> = vec.iter().map(|&v| v + bias).collect();

        for row in 0..m {
            for s in 0..slices {
                let phys = row * slices + s;
                let mut acc = 0i32;
                for col in 0..n {
                    acc += (gd_p[phys][col] - gd_m[phys][col]) * vd[col];
                }
                res[row] += acc << self.plan.shift[s];
            }
            // Remove the contribution of the constant input offset.
            res[row] -= xbar.row_sum(row) << (self.i_bit - 1);
        }
    }

    fn mvm_analog(
        &self,
        xbar: &CrossbarState,
        adc: &Adc,
        res: &mut [i32],
        vec: &[i32],
        m: usize,
        n: usize,
    ) {
        let slices = self.plan.slices();
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();
        let bias = 1i32 << (self.i_bit - 1);
        let vd: Vec<i32> = vec.iter().map(|&v| v + bias).collect();

        // The shifted inputs occupy one bit more than the raw precision.
        for bit in 0..self.i_bit + 1 {
            for row in 0..m {
                for s in 0..slices {
                    let phys = row * slices + s;
                    let mut current = 0.0f32;
                    for col in 0..n {
                        current +=
                            (ia_p[phys][col] - ia_m[phys][col]) * ((vd[col] >> bit) & 1) as f32;
                    }
                    res[row] += rescale(adc.convert(current), &self.plan, s, bit);
                }
            }
        }

        for row in 0..m {
            res[row] -= xbar.row_sum(row) << (self.i_bit - 1);
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        let cells = (m * n * self.plan.slices()) as u64;
        2 * cells * (u64::from(self.i_bit) + 1)
    }
}

/// Two's-complement inputs over differential weights.
pub(crate) struct TwosComplementInput {
    plan: SlicePlan,
    w_bit: u32,
    i_bit: u32,
}

impl TwosComplementInput {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
            w_bit: cfg.w_bit,
            i_bit: cfg.i_bit,
        }
    }
}

impl MappingKernel for TwosComplementInput {
    fn mode(&self) -> MappingMode {
        MappingMode::ITcWDiff
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_signed_range(mat, self.w_bit, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_signed_range(vec, self.i_bit, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_differential(&self.plan, xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let slices = self.plan.slices();
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let magnitude_mask = (1i32 << (self.i_bit - 1)) - 1;
        let sign_mask = 1i32 << (self.i_bit - 1);

        for row in 0..m {
            for s in 0..slices {
                let phys = row * slices + s;
                let mut acc = 0i32;
                for col in 0..n {
                    let diff = gd_p[phys][col] - gd_m[phys][col];
                    acc += diff * (vec[col] & magnitude_mask);
                    acc -= diff * (vec[col] & sign_mask);
                }
                res[row] += acc << self.plan.shift[s];
            }
        }
    }

    fn mvm_analog(
        &self,
        xbar: &CrossbarState,
        adc: &Adc,
        res: &mut [i32],
        vec: &[i32],
        m: usize,
        n: usize,
    ) {
        let slices = self.plan.slices();
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();

        for bit in 0..self.i_bit - 1 {
            for row in 0..m {
                for s in 0..slices {
                    let phys = row * slices + s;
                    let mut current = 0.0f32;
                    for col in 0..n {
                        current +=
                            (ia_p[phys][col] - ia_m[phys][col]) * ((vec[col] >> bit) & 1) as f32;
                    }
                    res[row] += rescale(adc.convert(current), &self.plan, s, bit);
                }
            }
        }

        // The sign bit carries negative weight in two's complement.
        let sign = self.i_bit - 1;
        for row in 0..m {
            for s in 0..slices {
                let phys = row * slices + s;
                let mut current = 0.0f32;
                for col in 0..n {
                    current += (ia_p[phys][col] - ia_m[phys][col]) * ((vec[col] >> sign) & 1) as f32;
                }
                res[row] -= rescale(adc.convert(current), &self.plan, s, sign);
            }
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        let cells = (m * n * self.plan.slices()) as u64;
        2 * cells * u64::from(self.i_bit)
    }
}

/// Unsigned inputs over differential weights.
pub(crate) struct UnsignedInput {
    plan: SlicePlan,
    w_bit: u32,
    i_bit: u32,
}

impl UnsignedInput {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
            w_bit: cfg.w_bit,
            i_bit: cfg.i_bit,
        }
    }
}

impl MappingKernel for UnsignedInput {
    fn mode(&self) -> MappingMode {
        MappingMode::IUintWDiff
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_signed_range(mat, self.w_bit, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_unsigned_range(vec, self.i_bit, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_differential(&self.plan, xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let slices = self.plan.slices();
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();

        for row in 0..m {
            for s in 0..slices {
                let phys = row * slices + s;
                let mut acc = 0i32;
                for col in 0..n {
                    acc += (gd_p[phys][col] - gd_m[phys][col]) * vec[col];
                }
                res[row] += acc << self.plan.shift[s];
            }
        }
    }

    fn mvm_analog(
        &self,
        xbar: &CrossbarState,
        adc: &Adc,
        res: &mut [i32],
        vec: &[i32],
        m: usize,
        n: usize,
    ) {
        let slices = self.plan.slices();
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();

        for bit in 0..self.i_bit {
            for row in 0..m {
                for s in 0..slices {
                    let phys = row * slices + s;
                    let mut current = 0.0f32;
                    for col in 0..n {
                        current +=
                            (ia_p[phys][col] - ia_m[phys][col]) * ((vec[col] >> bit) & 1) as f32;
                    }
                    res[row] += rescale(adc.convert(current), &self.plan, s, bit);
                }
            }
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        let cells = (m * n * self.plan.slices()) as u64;
        2 * cells * u64::from(self.i_bit)
    }
}

/// Unsigned inputs over offset-encoded single-polarity weights.
///
/// The only integer mode without differential cells. The weight offset
/// and the HRS baseline current both scale with the input sum, so the
/// result is corrected once with a closed-form constant instead of a
/// second polarity read.
pub(crate) struct OffsetWeight {
    plan: SlicePlan,
    w_bit: u32,
    i_bit: u32,
    delta: f32,
}

impl OffsetWeight {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        let plan = SlicePlan::new(cfg, false);
        let mut span_levels = 0i32;
        for s in 0..plan.slices() {
            span_levels += (1i32 << plan.shift[s]) * ((1i32 << plan.split[s]) - 1);
        }
        let delta = plan.hrs / plan.i_mm * span_levels as f32;
        Self {
            plan,
            w_bit: cfg.w_bit,
            i_bit: cfg.i_bit,
            delta,
        }
    }
}

impl MappingKernel for OffsetWeight {
    fn mode(&self) -> MappingMode {
        MappingMode::IUintWOffs
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_signed_range(mat, self.w_bit, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_unsigned_range(vec, self.i_bit, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_offset(&self.plan, xbar, mat, m, n, self.w_bit)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_single(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let slices = self.plan.slices();
        let gd_p = xbar.gd_p();
        let inp_sum: i64 = vec.iter().map(|&v| i64::from(v)).sum();

        for row in 0..m {
            for s in 0..slices {
                let phys = row * slices + s;
                let mut acc = 0i32;
                for col in 0..n {
                    acc += gd_p[phys][col] * vec[col];
                }
                res[row] += acc << self.plan.shift[s];
            }
            res[row] -= (inp_sum << (self.w_bit - 1)) as i32;
        }
    }

    fn mvm_analog(
        &self,
        xbar: &CrossbarState,
        adc: &Adc,
        res: &mut [i32],
        vec: &[i32],
        m: usize,
        n: usize,
    ) {
        let slices = self.plan.slices();
        let ia_p = xbar.ia_p();
        let inp_sum: i64 = vec.iter().map(|&v| i64::from(v)).sum();
        let mut res_fp = vec![0.0f32; m];

        for bit in 0..self.i_bit {
            for row in 0..m {
                for s in 0..slices {
                    let phys = row * slices + s;
                    let mut current = 0.0f32;
                    for col in 0..n {
                        current += ia_p[phys][col] * ((vec[col] >> bit) & 1) as f32;
                    }
                    // Partial sums stay fractional; rounding happens once
                    // after the offset correction.
                    let scale = ((1u64 << self.plan.shift[s]) * (1u64 << bit)) as f32
                        / self.plan.step[s];
                    res_fp[row] += adc.convert(current) * scale;
                }
            }
        }

        let correction = self.delta + (1u64 << (self.w_bit - 1)) as f32;
        for row in 0..m {
            res_fp[row] -= inp_sum as f32 * correction;
            res[row] += res_fp[row].round() as i32;
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        let cells = (m * n * self.plan.slices()) as u64;
        cells * u64::from(self.i_bit)
    }
}

/// Rescales one quantized slice current into the integer weight domain.
fn rescale(quantized: f32, plan: &SlicePlan, slice: usize, bit: u32) -> i32 {
    let scale = ((1u64 << plan.shift[slice]) * (1u64 << bit)) as f32;
    (quantized / plan.step[slice] * scale).round() as i32
}
