//! Restitution and alternans statistics over a beat sequence
//!
//! Restitution protocols (dynamic, S1-S2, HRV) exist to relate each beat's
//! APD to the diastolic interval preceding it. These helpers compute that
//! relation, and the beat-to-beat duration alternation that dynamic pacing
//! provokes at short cycle lengths, directly from detected beats.

use crate::analysis::result::Beat;

/// (diastolic interval, APD) pairs for a restitution curve
///
/// The diastolic interval before beat `k` is measured from beat `k - 1`'s
/// repolarization offset to beat `k`'s fine onset, so the first beat
/// contributes no pair. Beats are assumed to be in detection order.
pub fn restitution_pairs(beats: &[Beat]) -> Vec<(f64, f64)> {
    beats
        .windows(2)
        .map(|w| (w[1].repol_onset_time - w[0].repol_offset_time, w[1].duration))
        .collect()
}

/// Mean absolute beat-to-beat APD difference
///
/// A steady rhythm gives a value near zero; sustained long-short alternans
/// gives roughly the alternans amplitude. `None` for fewer than 3 beats
/// (a single difference says nothing about alternation).
pub fn alternans_magnitude(beats: &[Beat]) -> Option<f64> {
    if beats.len() < 3 {
        return None;
    }
    let diffs: Vec<f64> = beats
        .windows(2)
        .map(|w| (w[1].duration - w[0].duration).abs())
        .collect();
    Some(diffs.iter().sum::<f64>() / diffs.len() as f64)
}

/// Mean APD over the beat sequence, `None` when empty
pub fn mean_apd(beats: &[Beat]) -> Option<f64> {
    if beats.is_empty() {
        return None;
    }
    Some(beats.iter().map(|b| b.duration).sum::<f64>() / beats.len() as f64)
}
