//! Binary (±1) mapping kernels.
//!
//! Six encodings of a ±1 weight matrix, differing in whether both
//! polarities are stored, how the ±1 activations are pulsed onto the
//! lines, and which closed-form correction recovers the signed dot
//! product from unipolar partial sums. All require a single-bit slice
//! scheme.

use crate::adc::Adc;
use crate::common::Result;
use crate::config::{CrossbarConfig, MappingMode};
use crate::xbar::CrossbarState;

use super::{
    check_binary, encode_binary_differential, program_differential, program_single, MappingKernel,
    SlicePlan,
};

/// Splits a ±1 activation vector into unipolar pulse trains.
fn split_activations(vec: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let vd_p = vec.iter().map(|&v| i32::from(v == 1)).collect();
    let vd_m = vec.iter().map(|&v| i32::from(v == -1)).collect();
    (vd_p, vd_m)
}

/// Mode I: differential cells, positive activations pulsed once.
pub(crate) struct BnnI {
    plan: SlicePlan,
}

impl BnnI {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
        }
    }
}

impl MappingKernel for BnnI {
    fn mode(&self) -> MappingMode {
        MappingMode::BnnI
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_binary(mat, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_binary(vec, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_binary_differential(xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let vd: Vec<i32> = vec.iter().map(|&v| (v + 1) >> 1).collect();
        for row in 0..m {
            for col in 0..n {
                res[row] += (gd_p[row][col] - gd_m[row][col]) * vd[col] * 2;
            }
            res[row] -= xbar.row_sum(row);
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
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();
        let vd: Vec<i32> = vec.iter().map(|&v| (v + 1) >> 1).collect();
        for row in 0..m {
            let mut current = 0.0f32;
            for col in 0..n {
                current += (ia_p[row][col] - ia_m[row][col]) * vd[col] as f32;
            }
            res[row] +=
                (adc.convert(current) * 2.0 / self.plan.i_mm).round() as i32 - xbar.row_sum(row);
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        2 * (m * n) as u64
    }
}

/// Mode II: differential cells, inverted activation pulses.
pub(crate) struct BnnII {
    plan: SlicePlan,
}

impl BnnII {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
        }
    }
}

impl MappingKernel for BnnII {
    fn mode(&self) -> MappingMode {
        MappingMode::BnnII
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_binary(mat, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_binary(vec, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_binary_differential(xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let vd: Vec<i32> = vec.iter().map(|&v| (v - 1) / -2).collect();
        for row in 0..m {
            for col in 0..n {
                res[row] += (gd_m[row][col] - gd_p[row][col]) * vd[col] * 2;
            }
            res[row] += xbar.row_sum(row);
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
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();
        let vd: Vec<i32> = vec.iter().map(|&v| (v - 1) / -2).collect();
        for row in 0..m {
            let mut current = 0.0f32;
            for col in 0..n {
                current += (ia_m[row][col] - ia_p[row][col]) * vd[col] as f32;
            }
            res[row] +=
                (adc.convert(current) * 2.0 / self.plan.i_mm).round() as i32 + xbar.row_sum(row);
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        2 * (m * n) as u64
    }
}

/// Mode III: single-polarity cells, two activation cycles.
pub(crate) struct BnnIII {
    plan: SlicePlan,
}

impl BnnIII {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, false),
        }
    }
}

impl MappingKernel for BnnIII {
    fn mode(&self) -> MappingMode {
        MappingMode::BnnIII
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_binary(mat, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_binary(vec, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        let mut writes = 0u64;
        for row in 0..m {
            for col in 0..n {
                writes += xbar.write_single(row, col, (mat[n * row + col] + 1) >> 1);
            }
        }
        writes
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_single(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let gd_p = xbar.gd_p();
        let (vd_p, vd_m) = split_activations(vec);
        let vec_sum: i32 = vec.iter().sum();
        for row in 0..m {
            res[row] -= vec_sum;
            for col in 0..n {
                res[row] += 2 * (gd_p[row][col] * vd_p[col] - gd_p[row][col] * vd_m[col]);
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
        let ia_p = xbar.ia_p();
        let (vd_p, vd_m) = split_activations(vec);
        let vec_sum: i32 = vec.iter().sum();
        let scale = 2.0 / self.plan.i_mm;
        for row in 0..m {
            let mut current_p = 0.0f32;
            let mut current_m = 0.0f32;
            for col in 0..n {
                current_p += ia_p[row][col] * vd_p[col] as f32;
                current_m += ia_p[row][col] * vd_m[col] as f32;
            }
            // The HRS baseline of the positive cycle scales with the
            // input sum and is removed ahead of quantization.
            let q_p = adc.convert(current_p - vec_sum as f32 * self.plan.hrs);
            let q_m = adc.convert(current_m);
            res[row] += (q_p * scale).round() as i32 - (q_m * scale).round() as i32 - vec_sum;
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        2 * (m * n) as u64
    }
}

/// Mode IV: inverted single-polarity cells, two activation cycles.
pub(crate) struct BnnIV {
    plan: SlicePlan,
}

impl BnnIV {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, false),
        }
    }
}

impl MappingKernel for BnnIV {
    fn mode(&self) -> MappingMode {
        MappingMode::BnnIV
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_binary(mat, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_binary(vec, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        let mut writes = 0u64;
        for row in 0..m {
            for col in 0..n {
                writes += xbar.write_single(row, col, (mat[n * row + col] - 1) / -2);
            }
        }
        writes
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_single(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let gd_p = xbar.gd_p();
        let (vd_p, vd_m) = split_activations(vec);
        let vec_sum: i32 = vec.iter().sum();
        for row in 0..m {
            res[row] += vec_sum;
            for col in 0..n {
                res[row] += 2 * (gd_p[row][col] * vd_m[col] - gd_p[row][col] * vd_p[col]);
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
        let ia_p = xbar.ia_p();
        let (vd_p, vd_m) = split_activations(vec);
        let vec_sum: i32 = vec.iter().sum();
        for row in 0..m {
            let mut current_p = 0.0f32;
            let mut current_m = 0.0f32;
            for col in 0..n {
                current_p += ia_p[row][col] * vd_p[col] as f32;
                current_m += ia_p[row][col] * vd_m[col] as f32;
            }
            let diff = 2.0 / self.plan.i_mm * (adc.convert(current_m) - adc.convert(current_p));
            let baseline = vec_sum as f32 * 2.0 * self.plan.hrs / self.plan.i_mm;
            res[row] += (diff + vec_sum as f32 + baseline).round() as i32;
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        2 * (m * n) as u64
    }
}

/// Mode V: differential cells read through complementary lines.
pub(crate) struct BnnV {
    plan: SlicePlan,
}

impl BnnV {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
        }
    }
}

impl MappingKernel for BnnV {
    fn mode(&self) -> MappingMode {
        MappingMode::BnnV
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_binary(mat, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_binary(vec, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_binary_differential(xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let (vd_p, vd_m) = split_activations(vec);
        for row in 0..m {
            res[row] -= n as i32;
            for col in 0..n {
                res[row] += (gd_p[row][col] * vd_p[col] + gd_m[row][col] * vd_m[col]) << 1;
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
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();
        let (vd_p, vd_m) = split_activations(vec);
        let scale = 2.0 / self.plan.i_mm;
        let baseline = n as f32 * self.plan.hrs;
        for row in 0..m {
            let mut current = 0.0f32;
            for col in 0..n {
                current += ia_p[row][col] * vd_p[col] as f32 + ia_m[row][col] * vd_m[col] as f32;
            }
            res[row] += (adc.convert(current - baseline) * scale).round() as i32 - n as i32;
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        2 * (m * n) as u64
    }
}

/// Mode VI: fully differential cells and activations.
pub(crate) struct BnnVI {
    plan: SlicePlan,
}

impl BnnVI {
    pub fn new(cfg: &CrossbarConfig) -> Self {
        Self {
            plan: SlicePlan::new(cfg, true),
        }
    }
}

impl MappingKernel for BnnVI {
    fn mode(&self) -> MappingMode {
        MappingMode::BnnVI
    }

    fn validate_matrix(&self, mat: &[i32]) -> Result<()> {
        check_binary(mat, "weight")
    }

    fn validate_vector(&self, vec: &[i32]) -> Result<()> {
        check_binary(vec, "input")
    }

    fn encode(&self, xbar: &mut CrossbarState, mat: &[i32], m: usize, n: usize) -> u64 {
        encode_binary_differential(xbar, mat, m, n)
    }

    fn program(&self, xbar: &mut CrossbarState, m: usize, n: usize) {
        program_differential(&self.plan, xbar, m, n);
    }

    fn mvm_digital(&self, xbar: &CrossbarState, res: &mut [i32], vec: &[i32], m: usize, n: usize) {
        let gd_p = xbar.gd_p();
        let gd_m = xbar.gd_m();
        let (vd_p, vd_m) = split_activations(vec);
        for row in 0..m {
            for col in 0..n {
                res[row] += gd_p[row][col] * vd_p[col] + gd_m[row][col] * vd_m[col]
                    - gd_m[row][col] * vd_p[col]
                    - gd_p[row][col] * vd_m[col];
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
        let ia_p = xbar.ia_p();
        let ia_m = xbar.ia_m();
        let (vd_p, vd_m) = split_activations(vec);
        for row in 0..m {
            let mut current = 0.0f32;
            for col in 0..n {
                current += ia_p[row][col] * vd_p[col] as f32 + ia_m[row][col] * vd_m[col] as f32
                    - ia_m[row][col] * vd_p[col] as f32
                    - ia_p[row][col] * vd_m[col] as f32;
            }
            res[row] += (adc.convert(current) / self.plan.i_mm).round() as i32;
        }
    }

    fn elementary_reads(&self, m: usize, n: usize) -> u64 {
        2 * (m * n) as u64
    }
}
