//! Configuration parameters for APD analysis

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct ApdConfig {
    /// Repolarization fraction in percent (default: 90.0 for APD90)
    ///
    /// Must lie strictly between 0 and 100. The per-beat fine threshold is
    /// `resting + (1 - fraction/100) * (peak - resting)`.
    pub repolarization_percent: f64,

    /// Margin added to the minimum voltage to form the coarse beat-detection
    /// threshold, in mV (default: 5.0)
    pub coarse_margin_mv: f64,

    /// Maximum |dV/dt| for a sample to count as part of the resting plateau,
    /// in mV per time unit (default: 0.01)
    pub flatness_threshold: f64,

    /// Fraction of each pacing segment treated as a settling window (default: 1/3)
    ///
    /// Within the first `settle_fraction` of a segment no beats are detected,
    /// and the segment's coarse threshold is computed from the voltage minimum
    /// over the trailing `settle_fraction` of its span. Ignored when analyzing
    /// without pacing segments.
    pub settle_fraction: f64,
}

impl Default for ApdConfig {
    fn default() -> Self {
        Self {
            repolarization_percent: 90.0,
            coarse_margin_mv: 5.0,
            flatness_threshold: 0.01,
            settle_fraction: 1.0 / 3.0,
        }
    }
}

impl ApdConfig {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `ApdError::InvalidInput` if any parameter is out of range.
    pub fn validate(&self) -> Result<(), crate::error::ApdError> {
        use crate::error::ApdError;

        if !(0.0..100.0).contains(&self.repolarization_percent) || self.repolarization_percent <= 0.0 {
            return Err(ApdError::InvalidInput(format!(
                "Repolarization percent must be in (0, 100), got {}",
                self.repolarization_percent
            )));
        }
        if !self.coarse_margin_mv.is_finite() || self.coarse_margin_mv <= 0.0 {
            return Err(ApdError::InvalidInput(format!(
                "Coarse margin must be positive, got {}",
                self.coarse_margin_mv
            )));
        }
        if !self.flatness_threshold.is_finite() || self.flatness_threshold <= 0.0 {
            return Err(ApdError::InvalidInput(format!(
                "Flatness threshold must be positive, got {}",
                self.flatness_threshold
            )));
        }
        if !(self.settle_fraction > 0.0 && self.settle_fraction < 1.0) {
            return Err(ApdError::InvalidInput(format!(
                "Settle fraction must be in (0, 1), got {}",
                self.settle_fraction
            )));
        }
        Ok(())
    }
}
