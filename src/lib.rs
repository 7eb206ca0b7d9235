//! # Cardiac APD
//!
//! Action potential detection and duration measurement for simulated
//! transmembrane-voltage traces, as produced by cardiac cell-model
//! integrators.
//!
//! ## Features
//!
//! - **Beat segmentation**: two-state threshold segmenter with sub-sample
//!   interpolated onset/offset times
//! - **Adaptive per-beat thresholds**: APD at any repolarization fraction
//!   (APD90, APD50, ...) from each beat's own resting and peak voltages
//! - **Variable pacing support**: per-segment coarse thresholds for
//!   dynamic-restitution and heart-rate-variability protocols
//! - **Restitution statistics**: diastolic-interval pairing and alternans
//!   measures over the detected beats
//!
//! ## Quick Start
//!
//! ```no_run
//! use cardiac_apd::{analyze_trace, ApdConfig};
//!
//! // Membrane potential and time arrays from your simulator
//! let time: Vec<f64> = vec![];
//! let voltage: Vec<f64> = vec![];
//!
//! let result = analyze_trace(&time, &voltage, ApdConfig::default())?;
//! for beat in &result.beats {
//!     println!("onset {:.2}  APD90 {:.2}", beat.onset_time, beat.duration);
//! }
//! # Ok::<(), cardiac_apd::ApdError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Trace -> Coarse Segmentation -> Per-Beat Repolarization Search -> Beats
//!             (baseline + peak         (fine threshold,
//!              tracking, state          interpolated crossings)
//!              machine)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod pacing;
pub mod trace;

// Re-export main types
pub use analysis::result::{AnalysisMetadata, ApdResult, Beat, DiscardCounts};
pub use config::ApdConfig;
pub use error::ApdError;
pub use pacing::PacingSegment;
pub use trace::VoltageTrace;

use pacing::resolver::SegmentResolver;

/// Analyze a trace paced at a single cycle length
///
/// Beats are segmented against one global coarse threshold,
/// `min(voltage) + coarse_margin`, then each beat's APD is measured at the
/// configured repolarization fraction.
///
/// # Arguments
///
/// * `time` - Sample times, strictly increasing (any unit; ms for the usual
///   cell-model output)
/// * `voltage` - Membrane potential in mV, aligned with `time`
/// * `config` - Analysis parameters
///
/// # Returns
///
/// `ApdResult` with one [`Beat`] per fully captured action potential, in
/// trace order. A trace with no beats yields an `Ok` result with an empty
/// beat list.
///
/// # Errors
///
/// Returns `ApdError::InvalidInput` for mismatched or non-monotonic input
/// arrays or an out-of-range configuration.
pub fn analyze_trace(
    time: &[f64],
    voltage: &[f64],
    config: ApdConfig,
) -> Result<ApdResult, ApdError> {
    config.validate()?;
    let trace = VoltageTrace::new(time, voltage)?;
    let resolver = SegmentResolver::global(&trace, &config)?;
    run(&trace, &resolver, &config)
}

/// Analyze a trace whose pacing interval changes over time
///
/// Each [`PacingSegment`] gets its own coarse threshold, computed from the
/// voltage minimum over the segment's trailing third; beats inside the
/// leading third of a segment, or straddling a segment boundary, are
/// discarded. Segments can be given explicitly or derived from a stimulus
/// channel with [`PacingSegment::from_stimulus_log`].
///
/// # Errors
///
/// Returns `ApdError::InvalidInput` for invalid arrays or configuration, an
/// empty or unsorted segment list, or a segment containing no samples.
pub fn analyze_paced_trace(
    time: &[f64],
    voltage: &[f64],
    segments: &[PacingSegment],
    config: ApdConfig,
) -> Result<ApdResult, ApdError> {
    config.validate()?;
    let trace = VoltageTrace::new(time, voltage)?;
    let resolver = SegmentResolver::from_segments(&trace, segments, &config)?;
    run(&trace, &resolver, &config)
}

fn run(
    trace: &VoltageTrace<'_>,
    resolver: &SegmentResolver,
    config: &ApdConfig,
) -> Result<ApdResult, ApdError> {
    use std::time::Instant;
    let start_time = Instant::now();

    log::debug!(
        "Starting APD analysis: {} samples over {:.1} time units, {} segment(s), APD{}",
        trace.len(),
        trace.duration(),
        resolver.segments().len(),
        config.repolarization_percent
    );

    let (coarse_beats, segmenter_stats) = features::segmenter::segment_beats(trace, resolver, config);

    let (measured, repol_stats) =
        features::repolarization::locate_all(trace, &coarse_beats, config.repolarization_percent);

    let beats: Vec<Beat> = measured
        .into_iter()
        .map(|(coarse, fine)| Beat {
            onset_time: coarse.onset_time,
            peak_time: coarse.peak_time,
            peak_voltage: coarse.peak_voltage,
            resting_voltage: coarse.resting_voltage,
            repol_threshold: fine.repol_threshold,
            repol_onset_time: fine.repol_onset_time,
            repol_offset_time: fine.repol_offset_time,
            duration: fine.repol_offset_time - fine.repol_onset_time,
        })
        .collect();

    let beats_discarded = DiscardCounts {
        incomplete: segmenter_stats.incomplete,
        threshold_search_exhausted: repol_stats.search_exhausted,
        overlap_skipped: repol_stats.overlap_skipped,
    };

    log::debug!(
        "APD analysis done: {} beat(s) reported, {} dropped",
        beats.len(),
        beats_discarded.total()
    );

    Ok(ApdResult {
        metadata: AnalysisMetadata {
            trace_duration: trace.duration(),
            samples: trace.len(),
            segments: resolver.segments().len(),
            coarse_thresholds: resolver
                .segments()
                .iter()
                .map(|s| s.coarse_threshold)
                .collect(),
            repolarization_percent: config.repolarization_percent,
            beats_detected: coarse_beats.len(),
            beats_discarded,
            processing_time_ms: start_time.elapsed().as_secs_f64() * 1000.0,
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        beats,
    })
}
