//! Per-beat fine repolarization threshold and crossing times
//!
//! Each coarse beat gets its own threshold derived from its resting and peak
//! voltages: `resting + (1 - r/100) * (peak - resting)` for repolarization
//! fraction `r`. The trace is then searched for the exact (interpolated)
//! times it crosses that threshold on the upstroke and on repolarization.
//!
//! Every search either finds a bracketing sample pair or reports the beat as
//! failed; there is no fallback to values from a previous beat.

use rayon::prelude::*;

use crate::features::segmenter::CoarseBeat;
use crate::trace::VoltageTrace;

/// Fine threshold and crossing times for one beat
#[derive(Debug, Clone, Copy)]
pub(crate) struct FineMeasure {
    pub repol_threshold: f64,
    pub repol_onset_time: f64,
    pub repol_offset_time: f64,
}

/// Outcome counters for the fine pass
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RepolStats {
    /// Crossing searches that ran off the end of the trace
    pub search_exhausted: u32,

    /// Beats skipped because their fine onset preceded the previous beat's
    /// fine offset (coarse segmentation mis-split one physiological beat)
    pub overlap_skipped: u32,
}

/// Locate fine thresholds for all coarse beats
///
/// The per-beat searches are read-only on the trace and run in parallel; the
/// overlap guard between consecutive beats is applied in a sequential pass
/// afterwards.
pub(crate) fn locate_all(
    trace: &VoltageTrace<'_>,
    beats: &[CoarseBeat],
    repolarization_percent: f64,
) -> (Vec<(CoarseBeat, FineMeasure)>, RepolStats) {
    let measures: Vec<Option<FineMeasure>> = beats
        .par_iter()
        .map(|beat| locate(trace, beat, repolarization_percent))
        .collect();

    let mut stats = RepolStats::default();
    let mut out = Vec::with_capacity(beats.len());
    let mut previous_offset: Option<f64> = None;

    for (beat, measure) in beats.iter().zip(measures) {
        let Some(measure) = measure else {
            stats.search_exhausted += 1;
            continue;
        };
        if let Some(end) = previous_offset {
            if measure.repol_onset_time < end {
                stats.overlap_skipped += 1;
                log::debug!(
                    "Skipping beat with onset {} inside previous repolarization (ends {})",
                    measure.repol_onset_time,
                    end
                );
                continue;
            }
        }
        previous_offset = Some(measure.repol_offset_time);
        out.push((*beat, measure));
    }

    (out, stats)
}

/// Locate the fine threshold crossings for one beat
///
/// Returns `None` if either crossing search reaches the end of the trace
/// without finding the expected crossing (truncated final beat, or a peak so
/// close to resting that the threshold is never spanned).
fn locate(trace: &VoltageTrace<'_>, beat: &CoarseBeat, repolarization_percent: f64) -> Option<FineMeasure> {
    let time = trace.time();
    let voltage = trace.voltage();

    let threshold = beat.resting_voltage
        + (1.0 - repolarization_percent / 100.0) * (beat.peak_voltage - beat.resting_voltage);

    // Resolve the upstroke crossing of the fine threshold, starting from the
    // coarse onset sample.
    let (onset_time, search_from) = if threshold >= beat.coarse_threshold {
        // Fine threshold sits above the coarse one: scan forward for the
        // first upward crossing.
        let mut found = None;
        for i in beat.onset_index..time.len() {
            if voltage[i - 1] <= threshold && voltage[i] > threshold {
                found = Some((interpolate(time, voltage, i, threshold), i));
                break;
            }
        }
        found?
    } else {
        // Fine threshold sits below the coarse one: walk back to the last
        // sample below it and interpolate forward from there.
        let mut found = None;
        for j in (0..beat.onset_index).rev() {
            if voltage[j] < threshold {
                found = Some((interpolate(time, voltage, j + 1, threshold), j + 1));
                break;
            }
        }
        found?
    };

    // Downward crossing after the resolved onset ends the beat
    let mut offset_time = None;
    for i in (search_from + 1)..time.len() {
        if voltage[i - 1] >= threshold && voltage[i] < threshold {
            offset_time = Some(interpolate(time, voltage, i, threshold));
            break;
        }
    }
    let repol_offset_time = offset_time?;

    Some(FineMeasure {
        repol_threshold: threshold,
        repol_onset_time: onset_time,
        repol_offset_time,
    })
}

/// Linear interpolation of the time at which voltage reaches `threshold`
/// between samples `i - 1` and `i`
fn interpolate(time: &[f64], voltage: &[f64], i: usize, threshold: f64) -> f64 {
    time[i - 1]
        + (threshold - voltage[i - 1]) * (time[i] - time[i - 1]) / (voltage[i] - voltage[i - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApdConfig;
    use crate::features::segmenter::segment_beats;
    use crate::pacing::resolver::SegmentResolver;

    /// One idealized action potential: flat rest, linear upstroke over
    /// [50, 52], linear decay back to rest over [52, 300]
    fn ramp_beat() -> (Vec<f64>, Vec<f64>) {
        let time: Vec<f64> = (0..=700).map(|i| i as f64 * 0.5).collect();
        let voltage: Vec<f64> = time
            .iter()
            .map(|&t| {
                if t < 50.0 {
                    -85.0
                } else if t < 52.0 {
                    -85.0 + (t - 50.0) * 62.5
                } else {
                    (40.0 - (t - 52.0) * (125.0 / 248.0)).max(-85.0)
                }
            })
            .collect();
        (time, voltage)
    }

    fn coarse(time: &[f64], voltage: &[f64]) -> (VoltageTrace<'static>, Vec<CoarseBeat>) {
        // Leak is fine in tests; keeps the borrowed trace simple to return
        let time: &'static [f64] = Box::leak(time.to_vec().into_boxed_slice());
        let voltage: &'static [f64] = Box::leak(voltage.to_vec().into_boxed_slice());
        let config = ApdConfig::default();
        let trace = VoltageTrace::new(time, voltage).unwrap();
        let resolver = SegmentResolver::global(&trace, &config).unwrap();
        let (beats, _) = segment_beats(&trace, &resolver, &config);
        (trace, beats)
    }

    #[test]
    fn test_apd90_on_linear_ramp() {
        let (time, voltage) = ramp_beat();
        let (trace, beats) = coarse(&time, &voltage);
        assert_eq!(beats.len(), 1);

        let (measured, stats) = locate_all(&trace, &beats, 90.0);
        assert_eq!(measured.len(), 1);
        assert_eq!(stats.search_exhausted, 0);

        let (_, fine) = measured[0];
        // resting -85, peak 40: APD90 threshold = -85 + 0.1 * 125 = -72.5
        assert!((fine.repol_threshold - (-72.5)).abs() < 1e-12);

        // Onset on the upstroke: threshold reached 12.5/62.5 = 0.2 after t=50
        assert!((fine.repol_onset_time - 50.2).abs() < 1e-9);

        // Offset on the decay ramp: 40 -> -72.5 at 125/248 mV per unit
        let expected_offset = 52.0 + 112.5 / (125.0 / 248.0);
        assert!((fine.repol_offset_time - expected_offset).abs() < 1e-6);

        let duration = fine.repol_offset_time - fine.repol_onset_time;
        assert!((duration - (expected_offset - 50.2)).abs() < 1e-6);
    }

    #[test]
    fn test_apd_monotonic_in_fraction() {
        let (time, voltage) = ramp_beat();
        let (trace, beats) = coarse(&time, &voltage);

        let mut last = f64::INFINITY;
        for percent in [90.0, 70.0, 50.0, 30.0] {
            let (measured, _) = locate_all(&trace, &beats, percent);
            assert_eq!(measured.len(), 1, "no beat at fraction {}", percent);
            let (_, fine) = measured[0];
            let duration = fine.repol_offset_time - fine.repol_onset_time;
            assert!(
                duration <= last,
                "APD{} = {} exceeds APD at higher fraction ({})",
                percent,
                duration,
                last
            );
            last = duration;
        }
    }

    #[test]
    fn test_backward_search_when_fine_threshold_below_coarse() {
        // APD98 threshold (-82.5) sits below the coarse threshold (-80), so
        // the onset search walks backward from the coarse onset sample.
        let (time, voltage) = ramp_beat();
        let (trace, beats) = coarse(&time, &voltage);
        let (measured, _) = locate_all(&trace, &beats, 98.0);
        assert_eq!(measured.len(), 1);

        let (_, fine) = measured[0];
        assert!((fine.repol_threshold - (-82.5)).abs() < 1e-12);
        assert!(fine.repol_threshold < beats[0].coarse_threshold);
        // Crossing on the upstroke: 2.5/62.5 = 0.04 after t=50
        assert!((fine.repol_onset_time - 50.04).abs() < 1e-9);
    }

    #[test]
    fn test_notched_plateau_skips_overlapping_beat() {
        // A deep notch in the plateau dips below the coarse threshold, so the
        // coarse pass splits one physiological beat in two. At APD99 both
        // halves resolve fine thresholds below the notch floor, and the second
        // half's backward onset search lands inside the first half's
        // repolarization. The guard must report exactly one beat.
        let time: Vec<f64> = (0..=800).map(|i| i as f64 * 0.5).collect();
        let voltage: Vec<f64> = time
            .iter()
            .map(|&t| {
                if t < 50.0 {
                    -85.0
                } else if t < 52.0 {
                    -85.0 + (t - 50.0) * 62.5
                } else if t < 148.0 {
                    40.0
                } else if t < 150.0 {
                    40.0 - (t - 148.0) * 61.0
                } else if t < 152.0 {
                    -82.0
                } else if t < 154.0 {
                    -82.0 + (t - 152.0) * 58.5
                } else if t < 250.0 {
                    35.0
                } else if t < 270.0 {
                    35.0 - (t - 250.0) * 6.0
                } else {
                    -85.0
                }
            })
            .collect();
        let (trace, beats) = coarse(&time, &voltage);
        assert_eq!(beats.len(), 2);

        let (measured, stats) = locate_all(&trace, &beats, 99.0);
        assert_eq!(measured.len(), 1);
        assert_eq!(stats.overlap_skipped, 1);
        assert_eq!(stats.search_exhausted, 0);

        // The first half survives; its fine onset sits on the upstroke
        let (_, fine) = measured[0];
        assert!((fine.repol_onset_time - 50.02).abs() < 1e-9);
        assert!(fine.repol_offset_time > 250.0);
    }

    #[test]
    fn test_shelved_decay_reports_exhausted_search() {
        // Decay drops below the coarse threshold (completing the coarse beat)
        // but shelves at -81 and never reaches the APD99 threshold (-83.75),
        // so the fine offset search runs off the end of the trace.
        let (time, mut voltage) = ramp_beat();
        for (i, &t) in time.iter().enumerate() {
            if t > 100.0 {
                voltage[i] = -81.0;
            }
        }
        let (trace, beats) = coarse(&time, &voltage);
        assert_eq!(beats.len(), 1);

        let (measured, stats) = locate_all(&trace, &beats, 99.0);
        assert!(measured.is_empty());
        assert_eq!(stats.search_exhausted, 1);
    }

    #[test]
    fn test_results_are_deterministic() {
        let (time, voltage) = ramp_beat();
        let (trace, beats) = coarse(&time, &voltage);

        let (first, _) = locate_all(&trace, &beats, 90.0);
        let (second, _) = locate_all(&trace, &beats, 90.0);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.1.repol_onset_time.to_bits(), b.1.repol_onset_time.to_bits());
            assert_eq!(a.1.repol_offset_time.to_bits(), b.1.repol_offset_time.to_bits());
        }
    }
}
