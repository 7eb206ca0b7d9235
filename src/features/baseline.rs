//! Resting-potential estimation between beats
//!
//! While outside a beat, the estimator looks for the flattest stretch of the
//! diastolic interval: among samples whose voltage gradient magnitude is below
//! a flatness threshold, it keeps the one with the smallest gradient seen
//! since the last beat. If no sample is flat enough before the next upstroke,
//! the minimum voltage observed since the last beat is used instead.

/// Incremental resting-potential estimator
///
/// All state is explicit `Option`s; there is no "not yet seen" sentinel value
/// that could leak into a comparison.
#[derive(Debug, Clone, Default)]
pub struct BaselineEstimator {
    /// Maximum |dV/dt| for a sample to qualify as resting plateau
    flatness_threshold: f64,

    /// Smallest gradient magnitude among flat samples since last reset
    flattest_gradient: Option<f64>,

    /// Voltage at the flattest qualifying sample
    flat_voltage: Option<f64>,

    /// Minimum voltage since last reset (fallback when nothing is flat)
    min_voltage: Option<f64>,
}

impl BaselineEstimator {
    /// Create an estimator with the given flatness threshold (mV per time unit)
    pub fn new(flatness_threshold: f64) -> Self {
        Self {
            flatness_threshold,
            ..Self::default()
        }
    }

    /// Feed one inter-sample observation: the voltage at the earlier sample
    /// and the gradient across the pair
    pub fn observe(&mut self, voltage: f64, gradient: f64) {
        let magnitude = gradient.abs();
        if magnitude <= self.flatness_threshold
            && self.flattest_gradient.is_none_or(|g| magnitude <= g)
        {
            self.flattest_gradient = Some(magnitude);
            self.flat_voltage = Some(voltage);
        }
        if self.min_voltage.is_none_or(|m| voltage < m) {
            self.min_voltage = Some(voltage);
        }
    }

    /// Current resting-value candidate
    ///
    /// Prefers the flattest-gradient sample; falls back to the minimum voltage
    /// seen since the last reset. `None` only if nothing has been observed.
    pub fn resting_value(&self) -> Option<f64> {
        self.flat_voltage.or(self.min_voltage)
    }

    /// Forget everything; called at every beat start
    pub fn reset(&mut self) {
        self.flattest_gradient = None;
        self.flat_voltage = None;
        self.min_voltage = None;
    }
}
