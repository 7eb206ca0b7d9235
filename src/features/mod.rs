//! Feature extraction for action potential analysis
//!
//! - Baseline (resting potential) estimation between beats
//! - Peak tracking within a beat
//! - Coarse beat segmentation (two-state machine)
//! - Fine repolarization-threshold location per beat

pub mod baseline;
pub mod peak;
pub mod repolarization;
pub mod segmenter;
