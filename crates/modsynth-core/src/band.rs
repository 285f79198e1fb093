//! Band-pass gain curve used as a frequency mask.

/// Band-pass gain curve: unity between `low` and `high`, ramping linearly to
/// zero over `ramp` Hz on either side, scaled by `volume`.
///
/// ```text
///  gain
///   1 |        ________
///     |       /        \
///   0 |______/          \______
///          low-r low  high high+r
/// ```
///
/// A zero ramp gives hard band edges. The gain never goes negative.
///
/// ```rust
/// use modsynth_core::BandCurve;
///
/// let band = BandCurve::new(200.0, 800.0, 100.0, 1.0);
/// assert_eq!(band.gain(500.0), 1.0);
/// assert_eq!(band.gain(150.0), 0.5);
/// assert_eq!(band.gain(50.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandCurve {
    /// Lower pass-band edge in Hz
    pub low: f32,
    /// Upper pass-band edge in Hz
    pub high: f32,
    /// Width of the linear skirt in Hz
    pub ramp: f32,
    /// Overall gain applied to the curve
    pub volume: f32,
}

impl BandCurve {
    /// Create a curve. A negative ramp is treated as zero.
    pub fn new(low: f32, high: f32, ramp: f32, volume: f32) -> Self {
        Self {
            low,
            high,
            ramp: ramp.max(0.0),
            volume,
        }
    }

    /// Gain at `frequency`.
    #[inline]
    pub fn gain(&self, frequency: f32) -> f32 {
        let shape = if frequency >= self.low && frequency <= self.high {
            1.0
        } else if self.ramp <= 0.0 {
            0.0
        } else {
            let distance = if frequency < self.low {
                self.low - frequency
            } else {
                frequency - self.high
            };
            (1.0 - distance / self.ramp).max(0.0)
        };
        shape * self.volume
    }
}

impl Default for BandCurve {
    /// Passes everything at unity gain.
    fn default() -> Self {
        Self::new(0.0, f32::INFINITY, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_band_is_unity() {
        let band = BandCurve::new(100.0, 1000.0, 50.0, 1.0);
        assert_eq!(band.gain(100.0), 1.0);
        assert_eq!(band.gain(1000.0), 1.0);
        assert_eq!(band.gain(440.0), 1.0);
    }

    #[test]
    fn skirts_are_linear_and_floored() {
        let band = BandCurve::new(100.0, 1000.0, 100.0, 1.0);
        assert!((band.gain(1025.0) - 0.75).abs() < 1e-6);
        assert!((band.gain(75.0) - 0.75).abs() < 1e-6);
        assert_eq!(band.gain(1200.0), 0.0);
        assert_eq!(band.gain(0.0), 0.0);
    }

    #[test]
    fn zero_ramp_is_a_hard_edge() {
        let band = BandCurve::new(100.0, 200.0, 0.0, 1.0);
        assert_eq!(band.gain(99.9), 0.0);
        assert_eq!(band.gain(200.1), 0.0);
    }

    #[test]
    fn volume_scales_gain() {
        let band = BandCurve::new(100.0, 200.0, 0.0, 0.25);
        assert_eq!(band.gain(150.0), 0.25);
    }

    #[test]
    fn default_passes_everything() {
        let band = BandCurve::default();
        assert_eq!(band.gain(0.0), 1.0);
        assert_eq!(band.gain(19_999.0), 1.0);
    }
}
