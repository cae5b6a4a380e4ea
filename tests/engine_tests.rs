//! Integration tests for the execution engine's state machine.

use xbar_sim::config::{CrossbarConfig, MappingMode};
use xbar_sim::{CrossbarEngine, SimError};

/// Creates a differential-mode configuration for testing.
fn create_config(mode: MappingMode) -> CrossbarConfig {
    CrossbarConfig {
        mode,
        w_bit: 8,
        i_bit: 8,
        split: vec![8],
        hrs: 5.0,
        lrs: 30.0,
        resolution: 8,
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

fn assert_shape_err<T: std::fmt::Debug>(result: Result<T, SimError>) {
    match result {
        Err(SimError::Shape(_)) => {}
        other => panic!("expected a shape error, got {other:?}"),
    }
}

/// Tests rejection of buffers that do not match the declared shape.
#[test]
fn test_shape_validation() {
    let mut engine = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];

    assert_shape_err(engine.cpy(&mat, 2, 2));
    assert_shape_err(engine.cpy(&mat, 0, 6));
    assert_shape_err(engine.cpy(&mat, 33, 1));

    engine.cpy(&mat, 3, 2).unwrap();
    let vec = [-120, 55];
    let mut res = [0i32; 3];
    assert_shape_err(engine.mvm(&mut res, &vec, &mat, 3, 3));
    assert_shape_err(engine.mvm(&mut res, &vec[..1], &mat, 3, 2));
    assert_shape_err(engine.mvm(&mut res[..2], &vec, &mat, 3, 2));

    // None of the failures may have advanced a counter.
    assert_eq!(engine.counters().mvms, 0);
    assert_eq!(engine.counters().reads, 0);
}

/// Tests that reading an empty crossbar is a state error.
#[test]
fn test_mvm_before_cpy() {
    let mut engine = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];
    let vec = [-120, 55];
    let mut res = [0i32; 3];
    match engine.mvm(&mut res, &vec, &mat, 3, 2) {
        Err(SimError::State(_)) => {}
        other => panic!("expected a state error, got {other:?}"),
    }
}

/// Tests that reading with mismatched dimensions is a state error.
#[test]
fn test_mvm_dimension_mismatch() {
    let mut engine = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];
    engine.cpy(&mat, 3, 2).unwrap();

    let vec = [-120, 55, 7];
    let mut res = [0i32; 2];
    match engine.mvm(&mut res, &vec, &mat[..6], 2, 3) {
        Err(SimError::State(_)) => {}
        other => panic!("expected a state error, got {other:?}"),
    }
}

/// Tests the write cost of the replicated two-array mode.
#[test]
fn test_replicated_mode_write_cost() {
    let mat = [100, -32, 1, 0, 12, 1];

    let mut single = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();
    single.cpy(&mat, 3, 2).unwrap();

    let mut replicated = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff2Xb)).unwrap();
    replicated.cpy(&mat, 3, 2).unwrap();

    assert_eq!(single.counters().writes, 12u64);
    assert_eq!(replicated.counters().writes, 2 * single.counters().writes);
}

/// Tests the bit-serial read cost model of the integer modes.
#[test]
fn test_elementary_read_accounting() {
    let mat = [100, -32, 1, 0, 12, 1];
    let vec = [-120, 55];
    let cells: u64 = 3 * 2;

    let expectations = [
        (MappingMode::IDiffWDiff1Xb, 2 * cells * (2 * 8 - 1)),
        (MappingMode::IOffsWDiff, 2 * cells * (8 + 1)),
        (MappingMode::ITcWDiff, 2 * cells * 8),
    ];
    for (mode, expected) in expectations {
        let mut engine = CrossbarEngine::new(create_config(mode)).unwrap();
        engine.cpy(&mat, 3, 2).unwrap();
        let mut res = [0i32; 3];
        engine.mvm(&mut res, &vec, &mat, 3, 2).unwrap();
        assert_eq!(
            engine.counters().reads,
            expected,
            "mode {}",
            mode.as_str()
        );
        assert_eq!(engine.counters().mvms, 1);
    }
}

/// Tests that remapping with new dimensions resets the idle padding.
#[test]
fn test_remap_with_new_dimensions() {
    let mut engine = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();
    let wide = [100, -32, 1, 0, 12, 1];
    engine.cpy(&wide, 3, 2).unwrap();
    assert_eq!(engine.gd_p()[2][0], 12);

    let narrow = [7, -9];
    engine.cpy(&narrow, 1, 2).unwrap();
    assert_eq!(engine.gd_p()[0][0], 7);
    // Cells of the previous mapping are back at idle.
    assert_eq!(engine.gd_p()[2][0], 0);
    assert_eq!(engine.ga_p()[2][0], 5.0);

    // The old shape is gone, so its reads must fail.
    let vec = [-120, 55];
    let mut res = [0i32; 3];
    match engine.mvm(&mut res, &vec, &wide, 3, 2) {
        Err(SimError::State(_)) => {}
        other => panic!("expected a state error, got {other:?}"),
    }
}

/// Tests that independent engine instances share no state.
#[test]
fn test_instances_are_independent() {
    let mut a = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();
    let b = CrossbarEngine::new(create_config(MappingMode::IDiffWDiff1Xb)).unwrap();

    let mat = [100, -32, 1, 0, 12, 1];
    a.cpy(&mat, 3, 2).unwrap();

    assert!(a.counters().writes > 0);
    assert_eq!(b.counters().writes, 0);
    assert_eq!(b.gd_p()[0][0], 0);
}
