//! Edge Detection
//!
//! A hysteretic two-state detector over a voltage signal. Event inputs
//! (clocks, resets, external sample-and-hold clocks) are never compared
//! against a single threshold: noise near the threshold would retrigger on
//! every sample. Instead the detector arms low and fires once per low→high
//! crossing of a hysteresis band.

/// Rising-edge detector with hysteresis.
///
/// The detector enters the high state when the voltage reaches
/// [`HIGH_THRESHOLD`] and only re-arms once the voltage falls back to
/// [`LOW_THRESHOLD`]. [`process`](SchmittTrigger::process) reports `true`
/// exactly once per low→high transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchmittTrigger {
    high: bool,
}

/// Voltage at or above which the detector enters the high state
pub const HIGH_THRESHOLD: f64 = 1.0;

/// Voltage at or below which the detector re-arms to the low state
pub const LOW_THRESHOLD: f64 = 0.1;

impl SchmittTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the detector by one sample. Returns `true` on a rising edge.
    pub fn process(&mut self, voltage: f64) -> bool {
        if self.high {
            if voltage <= LOW_THRESHOLD {
                self.high = false;
            }
            false
        } else if voltage >= HIGH_THRESHOLD {
            self.high = true;
            true
        } else {
            false
        }
    }

    /// Current detector state
    pub fn is_high(&self) -> bool {
        self.high
    }

    /// Re-arm to the low state
    pub fn reset(&mut self) {
        self.high = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_edge_fires_once() {
        let mut trig = SchmittTrigger::new();
        assert!(!trig.process(0.0));
        assert!(trig.process(5.0));
        // Held high: no retrigger
        assert!(!trig.process(5.0));
        assert!(trig.is_high());
    }

    #[test]
    fn test_hysteresis_band() {
        let mut trig = SchmittTrigger::new();
        assert!(trig.process(5.0));
        // Dropping into the band does not re-arm...
        assert!(!trig.process(0.5));
        assert!(trig.is_high());
        // ...so climbing back out does not fire
        assert!(!trig.process(5.0));
        // Only a full drop below the low threshold re-arms
        assert!(!trig.process(0.05));
        assert!(!trig.is_high());
        assert!(trig.process(5.0));
    }

    #[test]
    fn test_threshold_boundaries() {
        let mut trig = SchmittTrigger::new();
        // Below the high threshold: still armed low
        assert!(!trig.process(0.99));
        // Exactly at the high threshold fires
        assert!(trig.process(HIGH_THRESHOLD));
        // Exactly at the low threshold re-arms
        trig.process(LOW_THRESHOLD);
        assert!(!trig.is_high());
    }

    #[test]
    fn test_reset_rearms() {
        let mut trig = SchmittTrigger::new();
        trig.process(5.0);
        trig.reset();
        assert!(!trig.is_high());
        assert!(trig.process(5.0));
    }
}
