//! Pacing protocol description
//!
//! Variable-cycle-length protocols (dynamic restitution, HRV, return-loop)
//! change the pacing interval over the course of one simulation. Each stretch
//! of constant interval is a [`PacingSegment`]; the [`resolver`] maps trace
//! samples onto segments and derives a per-segment coarse detection threshold.

pub mod resolver;

use serde::{Deserialize, Serialize};

use crate::error::ApdError;

/// Floor for the interval-grouping tolerance
const MIN_PERIOD_TOLERANCE: f64 = 1e-9;

/// A contiguous stretch of constant pacing interval
///
/// Segments are expected to be sorted by `start_time`, non-overlapping, and
/// to jointly cover the analyzed trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingSegment {
    /// Time the segment begins
    pub start_time: f64,

    /// Pacing cycle length within the segment
    pub period: f64,

    /// Number of stimuli delivered during the segment
    pub stimulus_count: u32,
}

impl PacingSegment {
    /// Derive pacing segments from a raw stimulus on/off channel
    ///
    /// Detects rising edges of the stimulus signal, computes inter-stimulus
    /// intervals, and groups runs of equal interval into segments. A new
    /// segment starts at the stimulus whose following interval first takes the
    /// new value. The first segment is extended back to the start of the
    /// trace, so the returned segments cover the full time span.
    ///
    /// Onsets are located at sample resolution, so the intervals of a
    /// constant-period protocol jitter by up to one sampling step when the
    /// stimuli fall off the sampling grid. Intervals are therefore grouped
    /// with a tolerance of 1.5 median sample spacings, and each segment's
    /// period is the mean over its run of intervals.
    ///
    /// # Arguments
    ///
    /// * `time` - Sample times, strictly increasing
    /// * `stimulus` - Stimulus channel aligned with `time`; positive while a
    ///   stimulus is being applied, zero (or negative) otherwise
    ///
    /// # Errors
    ///
    /// Returns `ApdError::InvalidInput` if the arrays are mismatched or fewer
    /// than two stimuli are present (no interval can be derived).
    pub fn from_stimulus_log(time: &[f64], stimulus: &[f64]) -> Result<Vec<PacingSegment>, ApdError> {
        if time.len() != stimulus.len() {
            return Err(ApdError::InvalidInput(format!(
                "Time and stimulus lengths differ: {} vs {}",
                time.len(),
                stimulus.len()
            )));
        }

        // Rising edges mark stimulus onsets
        let mut onsets = Vec::new();
        for i in 1..stimulus.len() {
            if stimulus[i] > 0.0 && stimulus[i - 1] <= 0.0 {
                onsets.push(time[i]);
            }
        }
        if stimulus.first().copied().unwrap_or(0.0) > 0.0 {
            onsets.insert(0, time[0]);
        }

        if onsets.len() < 2 {
            return Err(ApdError::InvalidInput(format!(
                "Need at least 2 stimuli to derive pacing segments, found {}",
                onsets.len()
            )));
        }

        let intervals: Vec<f64> = onsets.windows(2).map(|w| w[1] - w[0]).collect();

        // Sample-grid quantization jitters intervals by up to one spacing
        let mut spacings: Vec<f64> = time.windows(2).map(|w| w[1] - w[0]).collect();
        spacings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median_spacing = spacings[spacings.len() / 2];
        let tolerance = (1.5 * median_spacing).max(MIN_PERIOD_TOLERANCE);

        let mean = |range: &[f64]| range.iter().sum::<f64>() / range.len() as f64;

        let mut segments = Vec::new();
        let mut run_start = 0usize; // index into `onsets` of the first stimulus of the run
        for j in 1..intervals.len() {
            if (intervals[j] - intervals[j - 1]).abs() > tolerance {
                segments.push(PacingSegment {
                    start_time: onsets[run_start],
                    period: mean(&intervals[run_start..j]),
                    stimulus_count: (j - run_start) as u32,
                });
                run_start = j;
            }
        }
        segments.push(PacingSegment {
            start_time: onsets[run_start],
            period: mean(&intervals[run_start..]),
            // Last run: its stimuli reach through the final onset
            stimulus_count: (onsets.len() - run_start) as u32,
        });

        // Cover any lead-in before the first stimulus
        segments[0].start_time = time[0];

        log::debug!(
            "Derived {} pacing segment(s) from {} stimuli",
            segments.len(),
            onsets.len()
        );

        Ok(segments)
    }
}
