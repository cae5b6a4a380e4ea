//! Configuration system for the crossbar simulator.
//!
//! A [`CrossbarConfig`] describes one simulated device: mapping mode, bit
//! widths, bit-slice scheme, conductance bounds, ADC parameters, and the
//! read-disturb policy. Field names follow the JSON dialect of the host
//! bindings, so existing profiles parse unchanged; TOML profiles with the
//! same keys are accepted as well.
//!
//! Parameters are partitioned into two classes. STRUCTURAL parameters
//! participate in the mapped cell state or the derived numeric pipeline;
//! changing one invalidates the crossbar, which is rebuilt on the next
//! write. HOT parameters apply in place without touching mapped state.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::common::{Result, SimError, DEFAULT_TILE_COLS, DEFAULT_TILE_ROWS};

const DEFAULT_V_READ: f32 = -0.4;
const DEFAULT_T_READ: f32 = 100e-9;
const DEFAULT_MITIGATION_FP: f32 = 0.9;

/// Weight/activation mapping mode.
///
/// The integer modes differ in how the signed activation vector is fed to
/// the array (differential, offset-shifted, two's complement, or already
/// unsigned) and in whether weights are stored differentially or with an
/// offset. The `BNN_*` modes are the binary (±1) encodings used for
/// binary neural networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MappingMode {
    /// Differential inputs and weights, one array read per input polarity.
    #[serde(rename = "I_DIFF_W_DIFF_1XB")]
    IDiffWDiff1Xb,
    /// Differential inputs and weights on two replica arrays.
    #[serde(rename = "I_DIFF_W_DIFF_2XB")]
    IDiffWDiff2Xb,
    /// Inputs shifted into the positive range, differential weights.
    #[serde(rename = "I_OFFS_W_DIFF")]
    IOffsWDiff,
    /// Inputs interpreted as two's complement, differential weights.
    #[serde(rename = "I_TC_W_DIFF")]
    ITcWDiff,
    /// Unsigned inputs, differential weights.
    #[serde(rename = "I_UINT_W_DIFF")]
    IUintWDiff,
    /// Unsigned inputs, offset-encoded weights on a single polarity.
    #[serde(rename = "I_UINT_W_OFFS")]
    IUintWOffs,
    /// Binary mode I: differential cells, unipolar activation pulses.
    #[serde(rename = "BNN_I")]
    BnnI,
    /// Binary mode II: differential cells, inverted activation pulses.
    #[serde(rename = "BNN_II")]
    BnnII,
    /// Binary mode III: single-polarity cells, two activation cycles.
    #[serde(rename = "BNN_III")]
    BnnIII,
    /// Binary mode IV: inverted single-polarity cells, two cycles.
    #[serde(rename = "BNN_IV")]
    BnnIV,
    /// Binary mode V: differential cells read through complementary lines.
    #[serde(rename = "BNN_V")]
    BnnV,
    /// Binary mode VI: fully differential cells and activations.
    #[serde(rename = "BNN_VI")]
    BnnVI,
}

impl MappingMode {
    /// Returns the configuration-file spelling of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMode::IDiffWDiff1Xb => "I_DIFF_W_DIFF_1XB",
            MappingMode::IDiffWDiff2Xb => "I_DIFF_W_DIFF_2XB",
            MappingMode::IOffsWDiff => "I_OFFS_W_DIFF",
            MappingMode::ITcWDiff => "I_TC_W_DIFF",
            MappingMode::IUintWDiff => "I_UINT_W_DIFF",
            MappingMode::IUintWOffs => "I_UINT_W_OFFS",
            MappingMode::BnnI => "BNN_I",
            MappingMode::BnnII => "BNN_II",
            MappingMode::BnnIII => "BNN_III",
            MappingMode::BnnIV => "BNN_IV",
            MappingMode::BnnV => "BNN_V",
            MappingMode::BnnVI => "BNN_VI",
        }
    }

    /// True for the binary (±1) modes.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            MappingMode::BnnI
                | MappingMode::BnnII
                | MappingMode::BnnIII
                | MappingMode::BnnIV
                | MappingMode::BnnV
                | MappingMode::BnnVI
        )
    }

    /// True when weights occupy both cell polarities.
    ///
    /// Single-polarity modes store only the positive grid; the negative
    /// grid stays at the idle value.
    pub fn is_differential_weight(&self) -> bool {
        !matches!(
            self,
            MappingMode::IUintWOffs | MappingMode::BnnIII | MappingMode::BnnIV
        )
    }

    /// ADC family required by the mode's analog read scheme.
    pub fn adc_family(&self) -> AdcFamily {
        match self {
            MappingMode::IUintWOffs
            | MappingMode::BnnIII
            | MappingMode::BnnIV
            | MappingMode::BnnV => AdcFamily::Positive,
            _ => AdcFamily::Symmetric,
        }
    }
}

/// ADC transfer-function family, derived from the mapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcFamily {
    /// Bipolar range, symmetric around zero.
    Symmetric,
    /// Unipolar, positive-only range.
    Positive,
}

/// Complete configuration for one crossbar engine instance.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossbarConfig {
    /// Mapping mode.
    #[serde(rename = "m_mode")]
    pub mode: MappingMode,

    /// Weight precision in bits (signed).
    #[serde(rename = "W_BIT")]
    pub w_bit: u32,

    /// Input precision in bits.
    #[serde(rename = "I_BIT")]
    pub i_bit: u32,

    /// Bit-slice scheme: weight bits carried by each physical slice,
    /// most significant slice first.
    #[serde(rename = "SPLIT")]
    pub split: Vec<u32>,

    /// High-resistance-state conductance bound (idle cell value).
    #[serde(rename = "HRS")]
    pub hrs: f32,

    /// Low-resistance-state conductance bound (full-scale cell value).
    #[serde(rename = "LRS")]
    pub lrs: f32,

    /// ADC quantization depth in bits.
    pub resolution: u32,

    /// Fraction of the ADC full-scale range that is actually sensed.
    pub alpha: f32,

    /// Physical tile rows.
    #[serde(rename = "M", default = "default_tile_rows")]
    pub tile_rows: usize,

    /// Physical tile columns.
    #[serde(rename = "N", default = "default_tile_cols")]
    pub tile_cols: usize,

    /// Skip the analog pipeline and evaluate on the digital weight grids.
    #[serde(default)]
    pub digital_only: bool,

    /// Emit per-operation diagnostics.
    #[serde(default)]
    pub verbose: bool,

    /// Refresh drifted cells instead of letting conductance decay.
    #[serde(default)]
    pub read_disturb_mitigation: bool,

    /// Refresh threshold as a fraction of the drift transition time.
    #[serde(
        rename = "read_disturb_mitigation_fp",
        default = "default_mitigation_fp"
    )]
    pub mitigation_fp: f32,

    /// Read voltage applied to the cells during MVM, in volts.
    #[serde(rename = "V_read", default = "default_v_read")]
    pub v_read: f32,

    /// Read pulse width, in seconds.
    #[serde(rename = "t_read", default = "default_t_read")]
    pub t_read: f32,
}

fn default_tile_rows() -> usize {
    DEFAULT_TILE_ROWS
}

fn default_tile_cols() -> usize {
    DEFAULT_TILE_COLS
}

fn default_mitigation_fp() -> f32 {
    DEFAULT_MITIGATION_FP
}

fn default_v_read() -> f32 {
    DEFAULT_V_READ
}

fn default_t_read() -> f32 {
    DEFAULT_T_READ
}

impl CrossbarConfig {
    /// Loads a configuration from a TOML or JSON profile.
    ///
    /// The format is chosen by file extension; unknown keys are ignored
    /// so profiles written for the original host bindings stay loadable.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("cannot read {}: {e}", path.display())))?;
        let cfg: CrossbarConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text)
                .map_err(|e| SimError::Config(format!("invalid TOML profile: {e}")))?,
            _ => serde_json::from_str(&text)
                .map_err(|e| SimError::Config(format!("invalid JSON profile: {e}")))?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks internal consistency of the parameter set.
    pub fn validate(&self) -> Result<()> {
        if self.tile_rows == 0 || self.tile_cols == 0 {
            return Err(SimError::Config("tile dimensions must be positive".into()));
        }
        if self.w_bit == 0 || self.w_bit > 31 {
            return Err(SimError::Config(format!(
                "W_BIT must be in 1..=31, got {}",
                self.w_bit
            )));
        }
        if self.i_bit == 0 || self.i_bit > 31 {
            return Err(SimError::Config(format!(
                "I_BIT must be in 1..=31, got {}",
                self.i_bit
            )));
        }
        if self.split.is_empty() {
            return Err(SimError::Config("SPLIT must name at least one slice".into()));
        }
        if self.split.iter().any(|&s| s == 0) {
            return Err(SimError::Config("SPLIT entries must be positive".into()));
        }
        if self.split.iter().sum::<u32>() > self.w_bit {
            return Err(SimError::Config(format!(
                "SPLIT covers {} bits but W_BIT is {}",
                self.split.iter().sum::<u32>(),
                self.w_bit
            )));
        }
        if self.mode.is_binary() && self.split != [1] {
            return Err(SimError::Config(format!(
                "{} requires SPLIT = [1]",
                self.mode.as_str()
            )));
        }
        if !(self.hrs > 0.0) {
            return Err(SimError::Config(format!("HRS must be positive, got {}", self.hrs)));
        }
        if !(self.lrs > self.hrs) {
            return Err(SimError::Config(format!(
                "LRS ({}) must exceed HRS ({})",
                self.lrs, self.hrs
            )));
        }
        if !(2..=31).contains(&self.resolution) {
            return Err(SimError::Config(format!(
                "ADC resolution must be in 2..=31 bits, got {}",
                self.resolution
            )));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SimError::Config(format!(
                "alpha must lie in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.mitigation_fp > 0.0 && self.mitigation_fp <= 1.0) {
            return Err(SimError::Config(format!(
                "read_disturb_mitigation_fp must lie in (0, 1], got {}",
                self.mitigation_fp
            )));
        }
        Ok(())
    }

    /// Conductance span `LRS - HRS` used by the mapping step sizes.
    pub fn span(&self) -> f32 {
        self.lrs - self.hrs
    }
}

/// Typed partial-update record for [`CrossbarConfig`].
///
/// Every field is optional; absent fields keep their current value. The
/// record parses from the same JSON documents the original string-keyed
/// update interface accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    /// New mapping mode.
    #[serde(rename = "m_mode", default)]
    pub mode: Option<MappingMode>,
    /// New weight precision.
    #[serde(rename = "W_BIT", default)]
    pub w_bit: Option<u32>,
    /// New input precision.
    #[serde(rename = "I_BIT", default)]
    pub i_bit: Option<u32>,
    /// New bit-slice scheme.
    #[serde(rename = "SPLIT", default)]
    pub split: Option<Vec<u32>>,
    /// New high-resistance bound.
    #[serde(rename = "HRS", default)]
    pub hrs: Option<f32>,
    /// New low-resistance bound.
    #[serde(rename = "LRS", default)]
    pub lrs: Option<f32>,
    /// New ADC resolution.
    #[serde(default)]
    pub resolution: Option<u32>,
    /// New ADC range fraction.
    #[serde(default)]
    pub alpha: Option<f32>,
    /// New tile row count.
    #[serde(rename = "M", default)]
    pub tile_rows: Option<usize>,
    /// New tile column count.
    #[serde(rename = "N", default)]
    pub tile_cols: Option<usize>,
    /// Toggle the digital comparison path.
    #[serde(default)]
    pub digital_only: Option<bool>,
    /// Toggle diagnostics.
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Toggle read-disturb mitigation.
    #[serde(default)]
    pub read_disturb_mitigation: Option<bool>,
    /// New refresh threshold fraction.
    #[serde(rename = "read_disturb_mitigation_fp", default)]
    pub mitigation_fp: Option<f32>,
    /// New read voltage.
    #[serde(rename = "V_read", default)]
    pub v_read: Option<f32>,
    /// New read pulse width.
    #[serde(rename = "t_read", default)]
    pub t_read: Option<f32>,
}

impl ConfigUpdate {
    /// Parses an update record from a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| SimError::Config(format!("invalid update record: {e}")))
    }

    /// True when any rebuild-triggering parameter is present.
    ///
    /// The classification is the single source of truth for the
    /// "classify then selectively rebuild" policy: HOT fields are exactly
    /// the ones not listed here.
    pub fn touches_structural(&self) -> bool {
        self.mode.is_some()
            || self.w_bit.is_some()
            || self.i_bit.is_some()
            || self.split.is_some()
            || self.hrs.is_some()
            || self.lrs.is_some()
            || self.resolution.is_some()
            || self.alpha.is_some()
            || self.tile_rows.is_some()
            || self.tile_cols.is_some()
            || self.digital_only.is_some()
            || self.v_read.is_some()
            || self.t_read.is_some()
    }

    /// Returns a copy of `base` with the present fields applied.
    pub fn merged_into(&self, base: &CrossbarConfig) -> CrossbarConfig {
        let mut cfg = base.clone();
        if let Some(v) = self.mode {
            cfg.mode = v;
        }
        if let Some(v) = self.w_bit {
            cfg.w_bit = v;
        }
        if let Some(v) = self.i_bit {
            cfg.i_bit = v;
        }
        if let Some(ref v) = self.split {
            cfg.split = v.clone();
        }
        if let Some(v) = self.hrs {
            cfg.hrs = v;
        }
        if let Some(v) = self.lrs {
            cfg.lrs = v;
        }
        if let Some(v) = self.resolution {
            cfg.resolution = v;
        }
        if let Some(v) = self.alpha {
            cfg.alpha = v;
        }
        if let Some(v) = self.tile_rows {
            cfg.tile_rows = v;
        }
        if let Some(v) = self.tile_cols {
            cfg.tile_cols = v;
        }
        if let Some(v) = self.digital_only {
            cfg.digital_only = v;
        }
        if let Some(v) = self.verbose {
            cfg.verbose = v;
        }
        if let Some(v) = self.read_disturb_mitigation {
            cfg.read_disturb_mitigation = v;
        }
        if let Some(v) = self.mitigation_fp {
            cfg.mitigation_fp = v;
        }
        if let Some(v) = self.v_read {
            cfg.v_read = v;
        }
        if let Some(v) = self.t_read {
            cfg.t_read = v;
        }
        cfg
    }
}
