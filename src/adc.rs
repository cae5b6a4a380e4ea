//! ADC quantizer.
//!
//! Discretizes the analog column current into one of `2^resolution`
//! reconstruction levels. Two transfer-function families exist, chosen
//! by the mapping mode: a symmetric family spanning the bipolar range of
//! a fully differential read, and a positive family for unipolar read
//! schemes. Conversion is round-to-nearest, so the output is a monotone,
//! non-reordering function of the input with a maximum error of half a
//! step inside the clip range.

use crate::config::{AdcFamily, CrossbarConfig};

/// Analog-to-digital converter for one engine instance.
#[derive(Debug, Clone)]
pub struct Adc {
    min_curr: f32,
    max_curr: f32,
    alpha: f32,
    step: f32,
}

impl Adc {
    /// Builds the converter family required by the configured mode.
    ///
    /// Symmetric family: range `±N·(LRS−HRS)`, step `range/(2^res − 1)`.
    /// Positive family: range `[0, N·LRS]`, step `alpha·max/(2^res − 1)`.
    pub fn for_config(cfg: &CrossbarConfig) -> Self {
        let cols = cfg.tile_cols as f32;
        let levels = (1u64 << cfg.resolution) as f32 - 1.0;
        match cfg.mode.adc_family() {
            AdcFamily::Symmetric => {
                let max = cols * cfg.span();
                Self {
                    min_curr: -max,
                    max_curr: max,
                    alpha: cfg.alpha,
                    step: (max - (-max)) / levels,
                }
            }
            AdcFamily::Positive => {
                let max = cols * cfg.lrs;
                Self {
                    min_curr: 0.0,
                    max_curr: max,
                    alpha: cfg.alpha,
                    step: max * cfg.alpha / levels,
                }
            }
        }
    }

    /// Quantization step size in current units.
    pub fn step(&self) -> f32 {
        self.step
    }

    fn clip(&self, current: f32) -> f32 {
        current
            .max(self.alpha * self.min_curr)
            .min(self.alpha * self.max_curr)
    }

    /// Converts an analog current to its quantized reconstruction.
    pub fn convert(&self, current: f32) -> f32 {
        let clipped = self.clip(current);
        (clipped / self.step).round() * self.step
    }
}
