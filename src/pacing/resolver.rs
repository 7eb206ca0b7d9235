//! Segment resolution and per-segment coarse thresholds
//!
//! Over a long protocol with changing cycle length the resting potential
//! drifts, and a single global threshold under- or over-detects beats. The
//! resolver computes an independent coarse threshold for every pacing segment
//! from the voltage minimum over its trailing third, and blanks out the
//! leading third of each segment where the membrane is still adapting to the
//! new rate.

use crate::config::ApdConfig;
use crate::error::ApdError;
use crate::pacing::PacingSegment;
use crate::trace::VoltageTrace;

/// A pacing segment resolved against a concrete trace
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSegment {
    /// Segment start time
    pub start_time: f64,

    /// Segment end time (start of the next segment, or end of trace)
    pub end_time: f64,

    /// Samples before this time are ineligible for beat detection
    pub eligible_from: f64,

    /// Coarse beat-detection threshold active within this segment
    pub coarse_threshold: f64,
}

/// Maps trace samples to the pacing segment active at their time
#[derive(Debug, Clone)]
pub struct SegmentResolver {
    segments: Vec<ResolvedSegment>,
}

impl SegmentResolver {
    /// Resolve an explicit pacing-segment sequence against a trace
    ///
    /// # Errors
    ///
    /// Returns `ApdError::InvalidInput` if the segment list is empty, not
    /// sorted by start time, or a segment's threshold window contains no
    /// samples.
    pub fn from_segments(
        trace: &VoltageTrace<'_>,
        segments: &[PacingSegment],
        config: &ApdConfig,
    ) -> Result<Self, ApdError> {
        if segments.is_empty() {
            return Err(ApdError::InvalidInput(
                "Pacing segment list is empty".to_string(),
            ));
        }
        for w in segments.windows(2) {
            if w[1].start_time <= w[0].start_time {
                return Err(ApdError::InvalidInput(format!(
                    "Pacing segments must be sorted by start time ({} before {})",
                    w[1].start_time, w[0].start_time
                )));
            }
        }

        let mut resolved = Vec::with_capacity(segments.len());
        for (k, segment) in segments.iter().enumerate() {
            let start_time = segment.start_time;
            let end_time = segments
                .get(k + 1)
                .map(|next| next.start_time)
                .unwrap_or_else(|| trace.end_time());
            let span = end_time - start_time;

            // Threshold from the minimum over the trailing settle window;
            // the membrane has settled to the new rate by then.
            let window_from = trace.index_at_or_after(end_time - config.settle_fraction * span);
            // The final segment's window reaches through the last sample; its
            // end_time is the trace end, which is itself a sample.
            let window_to = if k + 1 == segments.len() {
                trace.len()
            } else {
                trace.index_at_or_after(end_time)
            };
            let min_voltage = trace.min_voltage_in(window_from, window_to).ok_or_else(|| {
                ApdError::InvalidInput(format!(
                    "Pacing segment {} ({}..{}) holds no trace samples in its threshold window",
                    k, start_time, end_time
                ))
            })?;

            resolved.push(ResolvedSegment {
                start_time,
                end_time,
                eligible_from: start_time + config.settle_fraction * span,
                coarse_threshold: min_voltage + config.coarse_margin_mv,
            });
        }

        log::debug!(
            "Resolved {} pacing segment(s); thresholds: {:?}",
            resolved.len(),
            resolved.iter().map(|s| s.coarse_threshold).collect::<Vec<_>>()
        );

        Ok(Self { segments: resolved })
    }

    /// Single segment spanning the whole trace, threshold `min(V) + margin`
    ///
    /// No settle blanking: detection is eligible from the first sample.
    pub fn global(trace: &VoltageTrace<'_>, config: &ApdConfig) -> Result<Self, ApdError> {
        let min_voltage = trace
            .min_voltage_in(0, trace.len())
            .ok_or_else(|| ApdError::ProcessingError("Trace has no samples".to_string()))?;

        Ok(Self {
            segments: vec![ResolvedSegment {
                start_time: trace.start_time(),
                end_time: trace.end_time(),
                eligible_from: trace.start_time(),
                coarse_threshold: min_voltage + config.coarse_margin_mv,
            }],
        })
    }

    /// Index of the segment active at time `t`
    ///
    /// Times before the first segment resolve to segment 0, times past the
    /// last to the final segment.
    pub fn segment_at(&self, t: f64) -> usize {
        let after = self.segments.partition_point(|s| s.start_time <= t);
        after.saturating_sub(1)
    }

    /// Resolved segments, in time order
    pub fn segments(&self) -> &[ResolvedSegment] {
        &self.segments
    }
}
