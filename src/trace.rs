//! Validated view over a simulated membrane-voltage time series

use crate::error::ApdError;

/// Borrowed, validated (time, voltage) trace
///
/// Time must be strictly increasing; the sampling interval may be non-uniform
/// (adaptive-step integrators emit irregular grids). Construction validates
/// once, so downstream passes can index freely.
#[derive(Debug, Clone, Copy)]
pub struct VoltageTrace<'a> {
    time: &'a [f64],
    voltage: &'a [f64],
}

impl<'a> VoltageTrace<'a> {
    /// Create a validated trace view over aligned time/voltage arrays
    ///
    /// # Errors
    ///
    /// Returns `ApdError::InvalidInput` if the arrays differ in length, hold
    /// fewer than two samples, contain non-finite values, or time is not
    /// strictly increasing.
    pub fn new(time: &'a [f64], voltage: &'a [f64]) -> Result<Self, ApdError> {
        if time.len() != voltage.len() {
            return Err(ApdError::InvalidInput(format!(
                "Time and voltage lengths differ: {} vs {}",
                time.len(),
                voltage.len()
            )));
        }
        if time.len() < 2 {
            return Err(ApdError::InvalidInput(format!(
                "Trace needs at least 2 samples, got {}",
                time.len()
            )));
        }
        for (i, w) in time.windows(2).enumerate() {
            if !(w[1] > w[0]) {
                return Err(ApdError::InvalidInput(format!(
                    "Time must be strictly increasing, violated at index {} ({} -> {})",
                    i, w[0], w[1]
                )));
            }
        }
        if time.iter().chain(voltage.iter()).any(|v| !v.is_finite()) {
            return Err(ApdError::InvalidInput(
                "Trace contains non-finite values".to_string(),
            ));
        }

        Ok(Self { time, voltage })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// True if the trace holds no samples (never, post-validation)
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Time array
    pub fn time(&self) -> &'a [f64] {
        self.time
    }

    /// Voltage array
    pub fn voltage(&self) -> &'a [f64] {
        self.voltage
    }

    /// Time of the first sample
    pub fn start_time(&self) -> f64 {
        self.time[0]
    }

    /// Time of the last sample
    pub fn end_time(&self) -> f64 {
        self.time[self.time.len() - 1]
    }

    /// Total time span covered
    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Minimum voltage over the half-open sample range `[from, to)`
    ///
    /// Returns `None` for an empty range.
    pub fn min_voltage_in(&self, from: usize, to: usize) -> Option<f64> {
        let to = to.min(self.voltage.len());
        if from >= to {
            return None;
        }
        self.voltage[from..to]
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.min(v)))
            })
    }

    /// Index of the first sample with `time >= t`, or `len()` if past the end
    pub fn index_at_or_after(&self, t: f64) -> usize {
        self.time.partition_point(|&x| x < t)
    }
}
