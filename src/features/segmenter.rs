//! Coarse beat segmentation
//!
//! A two-state machine over the trace: `Outside` until the voltage crosses
//! the active coarse threshold upward, `Inside` until it crosses back down.
//! Crossing times are linearly interpolated between the bracketing samples.
//! Beats cut off by the start or end of the trace, or by a pacing-segment
//! boundary, are discarded rather than reported with missing endpoints.

use crate::config::ApdConfig;
use crate::features::baseline::BaselineEstimator;
use crate::features::peak::PeakTracker;
use crate::pacing::resolver::SegmentResolver;
use crate::trace::VoltageTrace;

/// One beat delimited by the coarse threshold, before the fine
/// repolarization search
#[derive(Debug, Clone, Copy)]
pub(crate) struct CoarseBeat {
    /// Interpolated upward coarse-threshold crossing time
    pub onset_time: f64,

    /// Index of the first sample above the coarse threshold
    pub onset_index: usize,

    /// Resting potential snapshotted at onset
    pub resting_voltage: f64,

    /// Time of the maximum voltage within the beat
    pub peak_time: f64,

    /// Maximum voltage within the beat
    pub peak_voltage: f64,

    /// Coarse threshold active at this beat's onset
    pub coarse_threshold: f64,
}

/// Beats dropped during coarse segmentation
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SegmenterStats {
    /// Partial beats at trace edges or pacing-segment boundaries
    pub incomplete: u32,
}

/// Per-beat accumulator, alive only while the machine is `Inside`
#[derive(Debug, Clone, Copy)]
struct PendingBeat {
    onset_time: f64,
    onset_index: usize,
    resting_voltage: Option<f64>,
    coarse_threshold: f64,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Outside,
    Inside(PendingBeat),
}

/// Partition the trace into coarse beats
pub(crate) fn segment_beats(
    trace: &VoltageTrace<'_>,
    resolver: &SegmentResolver,
    config: &ApdConfig,
) -> (Vec<CoarseBeat>, SegmenterStats) {
    let time = trace.time();
    let voltage = trace.voltage();

    let mut baseline = BaselineEstimator::new(config.flatness_threshold);
    let mut peaks = PeakTracker::default();
    let mut state = State::Outside;
    let mut beats = Vec::new();
    let mut stats = SegmenterStats::default();
    let mut current_segment = resolver.segment_at(time[0]);

    for i in 1..trace.len() {
        let segment_index = resolver.segment_at(time[i]);
        let segment = resolver.segments()[segment_index];

        // Forced transition at every pacing-segment boundary, regardless of
        // voltage: a beat straddling the boundary is dropped. The settle
        // window below usually covers this too, but not when the sampling
        // grid skips it entirely.
        if segment_index != current_segment {
            current_segment = segment_index;
            if matches!(state, State::Inside(_)) {
                stats.incomplete += 1;
                log::debug!(
                    "Dropping beat straddling pacing-segment boundary at t={}",
                    segment.start_time
                );
            }
            state = State::Outside;
            baseline.reset();
            peaks.reset();
            continue;
        }

        // Settling window after a pacing-interval change: no detection while
        // the membrane adapts to the new rate.
        if time[i] < segment.eligible_from {
            state = State::Outside;
            baseline.reset();
            peaks.reset();
            continue;
        }

        let threshold = segment.coarse_threshold;
        let gradient = (voltage[i] - voltage[i - 1]) / (time[i] - time[i - 1]);

        match state {
            State::Outside => {
                if voltage[i - 1] >= threshold && voltage[i] < threshold {
                    // Downcross with no tracked onset: the trace (or segment)
                    // began mid-beat. Drop it and clear the baseline, which by
                    // now holds plateau samples from the partial beat.
                    stats.incomplete += 1;
                    baseline.reset();
                    continue;
                }

                baseline.observe(voltage[i - 1], gradient);

                if voltage[i - 1] <= threshold && voltage[i] > threshold {
                    let onset_time = time[i - 1]
                        + (threshold - voltage[i - 1]) * (time[i] - time[i - 1])
                            / (voltage[i] - voltage[i - 1]);
                    let pending = PendingBeat {
                        onset_time,
                        onset_index: i,
                        resting_voltage: baseline.resting_value(),
                        coarse_threshold: threshold,
                    };
                    baseline.reset();
                    peaks.reset();
                    peaks.observe(time[i], voltage[i]);
                    state = State::Inside(pending);
                }
            }
            State::Inside(pending) => {
                if voltage[i - 1] >= threshold && voltage[i] < threshold {
                    match (pending.resting_voltage, peaks.peak()) {
                        (Some(resting_voltage), Some((peak_time, peak_voltage))) => {
                            beats.push(CoarseBeat {
                                onset_time: pending.onset_time,
                                onset_index: pending.onset_index,
                                resting_voltage,
                                peak_time,
                                peak_voltage,
                                coarse_threshold: pending.coarse_threshold,
                            });
                        }
                        _ => {
                            // No resting value could be assigned before onset
                            stats.incomplete += 1;
                        }
                    }
                    peaks.reset();
                    state = State::Outside;
                } else {
                    peaks.observe(time[i], voltage[i]);
                }
            }
        }
    }

    // Trace ended while still above threshold: no valid offset
    if matches!(state, State::Inside(_)) {
        stats.incomplete += 1;
        log::debug!("Dropping unfinished beat at end of trace");
    }

    log::debug!(
        "Coarse segmentation: {} beat(s), {} incomplete dropped",
        beats.len(),
        stats.incomplete
    );

    (beats, stats)
}
