//! Analysis result types

use serde::{Deserialize, Serialize};

/// One detected action potential
///
/// All times are in the trace's time unit, voltages in mV. The invariant
/// `resting_voltage <= repol_threshold <= peak_voltage` holds for any
/// repolarization fraction in (0, 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Upward coarse-threshold crossing time (sub-sample interpolated)
    pub onset_time: f64,

    /// Time of the maximum voltage within the beat
    pub peak_time: f64,

    /// Maximum voltage within the beat
    pub peak_voltage: f64,

    /// Resting potential immediately preceding onset
    pub resting_voltage: f64,

    /// Fine threshold for this beat at the requested repolarization fraction
    pub repol_threshold: f64,

    /// Time the voltage crosses the fine threshold on the upstroke
    pub repol_onset_time: f64,

    /// Time the voltage crosses the fine threshold on repolarization
    pub repol_offset_time: f64,

    /// Action potential duration: `repol_offset_time - repol_onset_time`
    pub duration: f64,
}

/// Beats dropped during analysis, by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardCounts {
    /// Partial beats at trace edges or pacing-segment boundaries
    pub incomplete: u32,

    /// Fine-threshold crossing searches that reached end of trace
    pub threshold_search_exhausted: u32,

    /// Beats whose fine onset fell inside the previous beat's repolarization
    pub overlap_skipped: u32,
}

impl DiscardCounts {
    /// Total number of dropped beats
    pub fn total(&self) -> u32 {
        self.incomplete + self.threshold_search_exhausted + self.overlap_skipped
    }
}

/// Analysis metadata and diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Trace time span
    pub trace_duration: f64,

    /// Number of trace samples
    pub samples: usize,

    /// Number of pacing segments analyzed (1 when no schedule was supplied)
    pub segments: usize,

    /// Coarse detection threshold per segment, for diagnostic overlay
    pub coarse_thresholds: Vec<f64>,

    /// Repolarization fraction the durations were computed at
    pub repolarization_percent: f64,

    /// Beats that passed coarse segmentation
    pub beats_detected: usize,

    /// Beats dropped, by reason
    pub beats_discarded: DiscardCounts,

    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: f64,

    /// Algorithm version
    pub algorithm_version: String,
}

/// Complete analysis result: detected beats plus diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApdResult {
    /// Detected beats in trace order
    pub beats: Vec<Beat>,

    /// Metadata and diagnostics
    pub metadata: AnalysisMetadata,
}

impl ApdResult {
    /// Durations of all reported beats, in detection order
    pub fn durations(&self) -> Vec<f64> {
        self.beats.iter().map(|b| b.duration).collect()
    }

    /// Onset times of all reported beats, in detection order
    pub fn onsets(&self) -> Vec<f64> {
        self.beats.iter().map(|b| b.onset_time).collect()
    }
}
