//! Peak tracking within an active beat

/// Tracks the maximum voltage sample (and its time) since the last reset
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakTracker {
    peak: Option<(f64, f64)>, // (time, voltage)
}

impl PeakTracker {
    /// Feed one sample
    pub fn observe(&mut self, time: f64, voltage: f64) {
        match self.peak {
            Some((_, best)) if voltage <= best => {}
            _ => self.peak = Some((time, voltage)),
        }
    }

    /// Peak as `(time, voltage)`, if any sample has been observed
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.peak
    }

    /// Forget the current peak; called at every beat start
    pub fn reset(&mut self) {
        self.peak = None;
    }
}
