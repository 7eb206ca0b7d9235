//! Result types and derived statistics
//!
//! - Beat records and analysis metadata
//! - Restitution pairs and alternans measures computed from beat sequences

pub mod restitution;
pub mod result;
