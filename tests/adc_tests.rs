//! Unit tests for the ADC quantization error bound.
//!
//! The analog result may deviate from the exact integer dot product by
//! at most half an ADC step, translated through the weight step size.
//! The suites below assert inclusion within that bound for every tested
//! resolution, not just closeness.

use xbar_sim::config::{CrossbarConfig, MappingMode};
use xbar_sim::CrossbarEngine;

const MAT: [i32; 15] = [
    -128, -128, -128, -128, -128, //
    127, 127, 127, 127, 127, //
    -12, 88, 65, 0, -99,
];

/// Creates a single-slice analog configuration for bound testing.
///
/// One input bit keeps the activation bit-serial loop to a single pass,
/// so the ADC is exercised exactly once per row and slice.
fn create_config(mode: MappingMode, resolution: u32) -> CrossbarConfig {
    CrossbarConfig {
        mode,
        w_bit: 8,
        i_bit: 1,
        split: vec![8],
        hrs: 5.0,
        lrs: 30.0,
        resolution,
        alpha: 1.0,
        tile_rows: 32,
        tile_cols: 32,
        digital_only: false,
        verbose: false,
        read_disturb_mitigation: false,
        mitigation_fp: 0.9,
        v_read: -0.4,
        t_read: 100e-9,
    }
}

fn exact_result(mat: &[i32], vec: &[i32], m: usize, n: usize) -> Vec<i64> {
    (0..m)
        .map(|row| {
            (0..n)
                .map(|col| i64::from(mat[n * row + col]) * i64::from(vec[col]))
                .sum()
        })
        .collect()
}

/// Runs the bound check for one mode over a set of resolutions.
fn check_bound(mode: MappingMode, vec: &[i32], resolutions: &[u32]) {
    let (m, n) = (3, 5);
    let exact = exact_result(&MAT, vec, m, n);

    for &bits in resolutions {
        let cfg = create_config(mode, bits);
        let adc_range = match mode {
            MappingMode::IUintWOffs => cfg.tile_cols as f64 * f64::from(cfg.lrs),
            _ => 2.0 * cfg.tile_cols as f64 * f64::from(cfg.span()),
        };
        let delta = adc_range / ((1u64 << bits) as f64 - 1.0);
        let weight_step = match mode {
            MappingMode::IUintWOffs => f64::from(cfg.span()) / ((1u64 << cfg.w_bit) as f64 - 1.0),
            _ => f64::from(cfg.span()) / (1u64 << (cfg.w_bit - 1)) as f64,
        };
        let max_error = (delta / 2.0) / weight_step;

        let mut engine = CrossbarEngine::new(cfg).unwrap();
        engine.cpy(&MAT, m, n).unwrap();
        let mut res = vec![0i32; m];
        engine.mvm(&mut res, vec, &MAT, m, n).unwrap();

        for (row, &c) in exact.iter().enumerate() {
            let lo = (c as f64 - max_error).round() as i64;
            let hi = (c as f64 + max_error).round() as i64;
            let got = i64::from(res[row]);
            assert!(
                lo <= got && got <= hi,
                "{} at {} bit: row {} got {} outside [{}, {}]",
                mode.as_str(),
                bits,
                row,
                got,
                lo,
                hi
            );
        }
    }
}

/// Tests the symmetric-ADC bound for differential inputs.
#[test]
fn test_sym_adc_bound_diff_input() {
    check_bound(
        MappingMode::IDiffWDiff1Xb,
        &[-1, -1, -1, -1, -1],
        &[2, 3, 4, 5, 6, 7, 8],
    );
}

/// Tests the symmetric-ADC bound for offset inputs.
#[test]
fn test_sym_adc_bound_offset_input() {
    check_bound(
        MappingMode::IOffsWDiff,
        &[0, 0, 0, 0, 0],
        &[2, 3, 4, 5, 6, 7, 8],
    );
}

/// Tests the symmetric-ADC bound for two's-complement inputs.
#[test]
fn test_sym_adc_bound_tc_input() {
    check_bound(
        MappingMode::ITcWDiff,
        &[-1, -1, -1, -1, -1],
        &[2, 3, 4, 5, 6, 7, 8],
    );
}

/// Tests the symmetric-ADC bound for unsigned inputs.
#[test]
fn test_sym_adc_bound_unsigned_input() {
    check_bound(
        MappingMode::IUintWDiff,
        &[1, 1, 1, 1, 1],
        &[2, 3, 4, 5, 6, 7, 8],
    );
}

/// Tests the positive-ADC bound for offset weights.
#[test]
fn test_pos_adc_bound_offset_weight() {
    check_bound(
        MappingMode::IUintWOffs,
        &[1, 1, 1, 1, 1],
        &[3, 4, 5, 6, 7, 8],
    );
}

/// Tests that quantization is a monotone function of the analog sum.
#[test]
fn test_quantization_monotonic() {
    use xbar_sim::adc::Adc;
    let cfg = create_config(MappingMode::IDiffWDiff1Xb, 4);
    let adc = Adc::for_config(&cfg);

    let mut previous = f32::MIN;
    let mut current = -900.0f32;
    while current <= 900.0 {
        let q = adc.convert(current);
        assert!(q >= previous, "reordering at input {current}");
        previous = q;
        current += 0.37;
    }
}
