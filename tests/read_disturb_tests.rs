//! Unit tests for the read-disturb model and its mitigation policy.

use xbar_sim::config::{CrossbarConfig, MappingMode};
use xbar_sim::device::ReadDisturb;
use xbar_sim::{CrossbarEngine, SimError};

/// Reference implementation of the drift model, kept independent of the
/// library code paths.
struct DriftGolden {
    t_read: f64,
    exp_tt: f64,
    p: f64,
}

impl DriftGolden {
    fn new(v_read: f32, t_read: f32) -> Self {
        let kb_t = 1.380_648_52e-23 * 300.0 / 1.602_176_634e-19;
        let boost = 0.0068 * (0.11 * f64::from(v_read).abs() / kb_t).exp();
        Self {
            t_read: f64::from(t_read),
            exp_tt: 1.0 / boost,
            p: boost,
        }
    }

    fn transition_time(&self, n_cycle: u64) -> f64 {
        let wear = 0.003 * (n_cycle as f64).powf(0.41);
        1.55e-8 * 1.43339f64.powf(self.exp_tt) * (1.0 - wear).powf(self.exp_tt)
    }

    fn scaling(&self, t_stress: f64, n_cycle: u64) -> f64 {
        let tau = self.transition_time(n_cycle);
        if t_stress < tau {
            1.0
        } else {
            (t_stress / tau).powf(-self.p)
        }
    }
}

/// Creates a binary-mode configuration for drift testing.
fn create_config(mitigation: bool) -> CrossbarConfig {
    CrossbarConfig {
        mode: MappingMode::BnnI,
        w_bit: 1,
        i_bit: 1,
        split: vec![1],
        hrs: 5.0,
        lrs: 30.0,
        resolution: 8,
        alpha: 1.0,
        tile_rows: 32,
        tile_cols: 32,
        digital_only: false,
        verbose: false,
        read_disturb_mitigation: mitigation,
        mitigation_fp: 0.9,
        v_read: -0.4,
        t_read: 100e-9,
    }
}

/// Tests the derived drift quantities against the reference model.
#[test]
fn test_device_model_against_golden() {
    let golden = DriftGolden::new(-0.4, 100e-9);
    let model = ReadDisturb::new(-0.4, 100e-9).unwrap();

    for n_cycle in [0, 1, 10, 99, 999] {
        let tau = model.transition_time(n_cycle);
        assert!((tau - golden.transition_time(n_cycle)).abs() < 1e-12);
    }
    for (t, n) in [(1e-4, 0), (1e-2, 99), (2e-2, 999)] {
        let s = model.conductance_scaling(t, n);
        assert!((s - golden.scaling(t, n)).abs() < 1e-12);
    }
}

/// Tests that the transition time shrinks as cells wear out.
#[test]
fn test_transition_time_decreases_with_cycles() {
    let model = ReadDisturb::new(-0.4, 100e-9).unwrap();
    let mut previous = f64::MAX;
    for n_cycle in [0, 1, 100, 10_000] {
        let tau = model.transition_time(n_cycle);
        assert!(tau > 0.0);
        assert!(tau < previous);
        previous = tau;
    }
}

/// Tests rejection of device parameters with no finite derivation.
#[test]
fn test_invalid_device_parameters() {
    match ReadDisturb::new(0.0, 100e-9) {
        Err(SimError::DeviceModel(_)) => {}
        other => panic!("expected a device model error, got {:?}", other.err()),
    }
    match ReadDisturb::new(-0.4, 0.0) {
        Err(SimError::DeviceModel(_)) => {}
        other => panic!("expected a device model error, got {:?}", other.err()),
    }
}

/// Drives one differential cell through write cycles and read stress,
/// checking the low-resistance polarity against the reference decay.
///
/// The cell is cycled +1/-1 so the negative polarity ends up holding
/// full scale; cumulative read stress is applied in three steps per
/// cycle-count checkpoint.
#[test]
fn test_lrs_decay_under_read_stress() {
    let golden = DriftGolden::new(-0.4, 100e-9);
    let mut engine = CrossbarEngine::new(create_config(false)).unwrap();

    let vec = [1];
    let mut mat = [0i32];
    let mut res = [0i32];
    let mut total_mvms = 0u64;
    let mut total_writes = 0u64;

    let checkpoints = [1u64, 100, 1000];
    let stress_times = [1e-4f64, 1e-2, 2e-2];

    let mut cycles_done = 0u64;
    for &target in &checkpoints {
        for _ in cycles_done..target {
            mat[0] = 1;
            engine.cpy(&mat, 1, 1).unwrap();
            mat[0] = -1;
            engine.cpy(&mat, 1, 1).unwrap();
            total_writes += 4;
        }
        cycles_done = target;
        assert_eq!(engine.counters().writes, total_writes);
        assert_eq!(engine.ga_p()[0][0], 5.0);
        assert_eq!(engine.ga_m()[0][0], 30.0);

        let mut reads_done = 0u64;
        for &t_stress in &stress_times {
            let reads = (t_stress / golden.t_read).round() as u64;
            for _ in reads_done..reads {
                engine.mvm(&mut res, &vec, &mat, 1, 1).unwrap();
                total_mvms += 1;
            }
            reads_done = reads;
            assert_eq!(engine.counters().mvms, total_mvms);
            assert_eq!(engine.counters().refresh_passes, 0);
            assert_eq!(engine.counters().refreshed_cells, 0);

            assert_eq!(engine.cycles_p()[0][0], target);
            assert_eq!(engine.cycles_m()[0][0], target - 1);

            let stress = reads as f64 * golden.t_read;
            let expected = (30.0f64 * golden.scaling(stress, target - 1)) as f32;
            let ia_m = engine.ga_m()[0][0];
            assert!(
                (ia_m - expected).abs() <= 1e-6,
                "cycles {target}, stress {t_stress}: got {ia_m}, expected {expected}"
            );
            assert_eq!(engine.ga_p()[0][0], 5.0);
        }
    }
}

/// Tests that mitigation pins the conductance at nominal values.
#[test]
fn test_mitigation_pins_conductance() {
    let golden = DriftGolden::new(-0.4, 100e-9);
    let mut engine = CrossbarEngine::new(create_config(true)).unwrap();

    let vec = [1];
    let mut mat = [0i32];
    let mut res = [0i32];

    let checkpoints = [1u64, 100, 1000];
    let stress_times = [1e-4f64, 1e-2, 2e-2];

    let mut cycles_done = 0u64;
    for &target in &checkpoints {
        for _ in cycles_done..target {
            mat[0] = 1;
            engine.cpy(&mat, 1, 1).unwrap();
            mat[0] = -1;
            engine.cpy(&mat, 1, 1).unwrap();
        }
        cycles_done = target;

        let mut reads_done = 0u64;
        for &t_stress in &stress_times {
            let reads = (t_stress / golden.t_read).round() as u64;
            for _ in reads_done..reads {
                engine.mvm(&mut res, &vec, &mat, 1, 1).unwrap();
            }
            reads_done = reads;

            // Refreshes keep the conductance at nominal, exactly.
            assert_eq!(engine.ga_m()[0][0], 30.0);
            assert_eq!(engine.ga_p()[0][0], 5.0);
        }
    }

    assert!(engine.counters().refresh_passes > 0);
    assert!(engine.counters().refreshed_cells > 0);
    assert!(engine.cell_refreshes()[0][0] > 0);
}

/// Tests the documented counter accounting for writes and MVM calls.
#[test]
fn test_counter_accounting() {
    let mut engine = CrossbarEngine::new(create_config(false)).unwrap();
    let mat = [1];
    let vec = [1];
    let mut res = [0i32];

    // One differential write is two elementary polarity writes.
    let n = 5;
    for _ in 0..n {
        engine.cpy(&mat, 1, 1).unwrap();
    }
    assert_eq!(engine.counters().writes, 2 * n);

    for call in 1..=4u64 {
        engine.mvm(&mut res, &vec, &mat, 1, 1).unwrap();
        assert_eq!(engine.counters().mvms, call);
        // Binary mode I reads both polarities of the single active cell.
        assert_eq!(engine.counters().reads, 2 * call);
    }
}
