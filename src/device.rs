//! Read-disturb device model.
//!
//! Analytic model of conductance drift in resistive cells under repeated
//! non-destructive reads, after Jiang et al., "An Analytical Model of
//! Read-Disturb Failure Time in a Post-Cycling Resistive Switching
//! Memory" (<https://ieeexplore.ieee.org/document/9580480>).
//!
//! A cell holding the low-resistance state tolerates accumulated read
//! stress up to a transition time that shrinks with the number of
//! set/reset cycles the cell has seen; past that point its conductance
//! decays as a power law of the stress time. The two exponents of the
//! model depend only on the read voltage and are derived once per
//! instance.

use crate::common::{Result, SimError};

const T0: f64 = 1.55e-8;
const FITTING_PARAM: f64 = 1.43339; // obtained from the paper's graphs
const C1: f64 = 0.0068;
const A: f64 = 0.11;
const KB: f64 = 1.380_648_52e-23;
const TEMPERATURE: f64 = 300.0;
const K: f64 = 0.003;
const M: f64 = 0.41;
const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;

/// Read-disturb drift model for one device profile.
///
/// Construction derives the transition-time exponent and the power-law
/// factor from the read voltage; both are fixed for the lifetime of the
/// instance.
#[derive(Debug, Clone)]
pub struct ReadDisturb {
    v_read: f64,
    t_read: f64,
    exp_tt: f64,
    p: f64,
}

impl ReadDisturb {
    /// Builds the model for the given read voltage and pulse width.
    ///
    /// Fails with a device model error when the parameters would produce
    /// non-finite derived constants (zero read voltage, non-positive
    /// pulse width, or an exponent overflow).
    pub fn new(v_read: f32, t_read: f32) -> Result<Self> {
        if v_read == 0.0 {
            return Err(SimError::DeviceModel(
                "read voltage must be non-zero".into(),
            ));
        }
        if !(t_read > 0.0) {
            return Err(SimError::DeviceModel(format!(
                "read pulse width must be positive, got {t_read}"
            )));
        }
        let kb_t = KB * TEMPERATURE / ELEMENTARY_CHARGE;
        let boost = C1 * (A * f64::from(v_read).abs() / kb_t).exp();
        let exp_tt = 1.0 / boost;
        let p = boost;
        if !exp_tt.is_finite() || !p.is_finite() {
            return Err(SimError::DeviceModel(format!(
                "derived drift exponents are not finite for V_read = {v_read}"
            )));
        }
        Ok(Self {
            v_read: f64::from(v_read),
            t_read: f64::from(t_read),
            exp_tt,
            p,
        })
    }

    /// Read voltage the model was derived for, in volts.
    pub fn v_read(&self) -> f64 {
        self.v_read
    }

    /// Stress time contributed by `reads` read pulses, in seconds.
    pub fn stress_time(&self, reads: u64) -> f64 {
        reads as f64 * self.t_read
    }

    /// Stress threshold below which a cell shows no drift.
    ///
    /// Shrinks with the cell's accumulated set/reset cycle count. The
    /// model is undefined for cycle counts large enough that
    /// `k * N^m >= 1`; that regime is reported as an immediate
    /// transition (zero time) after a warning.
    pub fn transition_time(&self, n_cycles: u64) -> f64 {
        let wear = K * (n_cycles as f64).powf(M);
        if wear >= 1.0 {
            eprintln!(
                "warning: read disturb model undefined for cycle count {n_cycles}"
            );
            return 0.0;
        }
        T0 * FITTING_PARAM.powf(self.exp_tt) * (1.0 - wear).powf(self.exp_tt)
    }

    /// Conductance scaling factor for the low-resistance state.
    ///
    /// Returns 1 while the stress time is below the transition time,
    /// then decays as `(t_stress / tau)^(-p)`.
    pub fn conductance_scaling(&self, t_stress: f64, n_cycles: u64) -> f64 {
        let tau = self.transition_time(n_cycles);
        if t_stress < tau {
            1.0
        } else {
            (t_stress / tau).powf(-self.p)
        }
    }
}
