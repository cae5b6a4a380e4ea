//! Unit tests for configuration validation and the update policy.

use xbar_sim::config::{ConfigUpdate, CrossbarConfig, MappingMode};
use xbar_sim::{CrossbarEngine, SimError};

/// Creates a valid differential-mode configuration for testing.
fn create_config() -> CrossbarConfig {
    CrossbarConfig {
        mode: MappingMode::IDiffWDiff1Xb,
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

fn assert_config_err(result: Result<(), SimError>) {
    match result {
        Err(SimError::Config(_)) => {}
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

/// Tests that a well-formed configuration passes validation.
#[test]
fn test_valid_config() {
    assert!(create_config().validate().is_ok());
}

/// Tests rejection of sub-minimal ADC resolution.
#[test]
fn test_resolution_below_two_rejected() {
    let mut cfg = create_config();
    cfg.resolution = 1;
    assert_config_err(cfg.validate());
}

/// Tests rejection of a bit-slice scheme wider than the weight width.
#[test]
fn test_split_wider_than_weight_rejected() {
    let mut cfg = create_config();
    cfg.split = vec![6, 4];
    assert_config_err(cfg.validate());
}

/// Tests rejection of an empty bit-slice scheme.
#[test]
fn test_empty_split_rejected() {
    let mut cfg = create_config();
    cfg.split = vec![];
    assert_config_err(cfg.validate());
}

/// Tests rejection of inverted conductance bounds.
#[test]
fn test_lrs_not_above_hrs_rejected() {
    let mut cfg = create_config();
    cfg.lrs = cfg.hrs;
    assert_config_err(cfg.validate());
}

/// Tests rejection of an out-of-range clipping fraction.
#[test]
fn test_alpha_out_of_range_rejected() {
    let mut cfg = create_config();
    cfg.alpha = 0.0;
    assert_config_err(cfg.validate());
    cfg.alpha = 1.5;
    assert_config_err(cfg.validate());
}

/// Tests that binary modes demand a single-bit slice scheme.
#[test]
fn test_binary_mode_needs_single_bit_slice() {
    let mut cfg = create_config();
    cfg.mode = MappingMode::BnnI;
    assert_config_err(cfg.validate());
    cfg.split = vec![1];
    cfg.w_bit = 1;
    cfg.i_bit = 1;
    assert!(cfg.validate().is_ok());
}

/// Tests that a zero read voltage is a device model error.
#[test]
fn test_zero_read_voltage_rejected() {
    let mut cfg = create_config();
    cfg.v_read = 0.0;
    match CrossbarEngine::new(cfg) {
        Err(SimError::DeviceModel(_)) => {}
        other => panic!("expected a device model error, got {:?}", other.err()),
    }
}

/// Tests that a malformed engine build leaves no usable instance and a
/// valid one starts with zeroed counters.
#[test]
fn test_new_engine_counters_zero() {
    let engine = CrossbarEngine::new(create_config()).unwrap();
    assert_eq!(engine.counters().writes, 0);
    assert_eq!(engine.counters().reads, 0);
    assert_eq!(engine.counters().mvms, 0);
}

/// Tests that toggling a hot field leaves MVM output unchanged.
#[test]
fn test_hot_update_idempotent() {
    let mut engine = CrossbarEngine::new(create_config()).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];
    let vec = [-120, 55];
    engine.cpy(&mat, 3, 2).unwrap();

    let mut before = [0i32; 3];
    engine.mvm(&mut before, &vec, &mat, 3, 2).unwrap();

    let update = ConfigUpdate {
        verbose: Some(true),
        ..ConfigUpdate::default()
    };
    engine.update(&update).unwrap();

    let mut after = [0i32; 3];
    engine.mvm(&mut after, &vec, &mat, 3, 2).unwrap();
    assert_eq!(before, after);
}

/// Tests that a structural update invalidates stored cell values.
#[test]
fn test_structural_update_rebuilds_crossbar() {
    let mut engine = CrossbarEngine::new(create_config()).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];
    engine.cpy(&mat, 3, 2).unwrap();
    let before = engine.ga_p().clone();

    let update = ConfigUpdate {
        hrs: Some(10.0),
        ..ConfigUpdate::default()
    };
    engine.update(&update).unwrap();

    // Reading a stale crossbar must fail until the next write.
    let vec = [-120, 55];
    let mut res = [0i32; 3];
    match engine.mvm(&mut res, &vec, &mat, 3, 2) {
        Err(SimError::State(_)) => {}
        other => panic!("expected a state error, got {other:?}"),
    }

    engine.cpy(&mat, 3, 2).unwrap();
    let after = engine.ga_p().clone();
    assert_ne!(before, after);
}

/// Tests that counters persist across updates and reset on load.
#[test]
fn test_counter_lifecycle() {
    let mut engine = CrossbarEngine::new(create_config()).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];
    engine.cpy(&mat, 3, 2).unwrap();
    let writes = engine.counters().writes;
    assert!(writes > 0);

    let update = ConfigUpdate {
        hrs: Some(10.0),
        ..ConfigUpdate::default()
    };
    engine.update(&update).unwrap();
    assert_eq!(engine.counters().writes, writes);

    engine.load(create_config()).unwrap();
    assert_eq!(engine.counters().writes, 0);
}

/// Tests that an invalid update is rejected without changing state.
#[test]
fn test_invalid_update_rejected() {
    let mut engine = CrossbarEngine::new(create_config()).unwrap();
    let mat = [100, -32, 1, 0, 12, 1];
    engine.cpy(&mat, 3, 2).unwrap();
    let before = engine.ga_p().clone();

    let update = ConfigUpdate {
        resolution: Some(1),
        ..ConfigUpdate::default()
    };
    assert!(engine.update(&update).is_err());

    // The failed update must not have marked the crossbar stale.
    let vec = [-120, 55];
    let mut res = [0i32; 3];
    engine.mvm(&mut res, &vec, &mat, 3, 2).unwrap();
    assert_eq!(&before, engine.ga_p());
}

/// Tests parsing of a JSON partial-update document.
#[test]
fn test_update_record_from_json() {
    let update =
        ConfigUpdate::from_json_str(r#"{"HRS": 10.0, "verbose": true, "resolution": 6}"#).unwrap();
    assert_eq!(update.hrs, Some(10.0));
    assert_eq!(update.verbose, Some(true));
    assert_eq!(update.resolution, Some(6));
    assert!(update.touches_structural());

    let hot = ConfigUpdate::from_json_str(r#"{"verbose": true}"#).unwrap();
    assert!(!hot.touches_structural());
}

/// Tests parsing of a JSON configuration profile.
#[test]
fn test_profile_from_json() {
    let text = r#"{
        "m_mode": "BNN_I",
        "W_BIT": 1,
        "I_BIT": 1,
        "SPLIT": [1],
        "HRS": 5.0,
        "LRS": 30.0,
        "resolution": 8,
        "alpha": 1.0,
        "M": 32,
        "N": 32,
        "digital_only": false,
        "verbose": false,
        "adc_type": "SYM_RANGE_ADC"
    }"#;
    let cfg: CrossbarConfig = serde_json::from_str(text).unwrap();
    assert_eq!(cfg.mode, MappingMode::BnnI);
    assert_eq!(cfg.split, vec![1]);
    assert_eq!(cfg.tile_rows, 32);
    assert!(!cfg.read_disturb_mitigation);
    assert!(cfg.validate().is_ok());
}
