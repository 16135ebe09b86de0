/// Number of entries in each channel of a gamma ramp.
pub const RAMP_SIZE: usize = 256;

const UINT_MAX_VALUE: f64 = 65535.0;

pub const MIN_GAMMA: f64 = 0.4;
pub const MAX_GAMMA: f64 = 2.8;

/// Device gamma ramp in the exact layout GDI expects:
/// red, green and blue tables of 256 native-endian `u16` each, 1536 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GammaRamp {
    pub red: [u16; RAMP_SIZE],
    pub green: [u16; RAMP_SIZE],
    pub blue: [u16; RAMP_SIZE],
}

const _: () = assert!(std::mem::size_of::<GammaRamp>() == 1536);

impl GammaRamp {
    /// Same curve on all three channels.
    pub fn flat(values: &[u16; RAMP_SIZE]) -> Self {
        Self {
            red: *values,
            green: *values,
            blue: *values,
        }
    }

    /// Identity ramp produced by the neutral profile.
    pub fn neutral() -> Self {
        Self::flat(&compute_ramp(0.5, 0.5, 1.0))
    }

    pub fn zeroed() -> Self {
        Self {
            red: [0; RAMP_SIZE],
            green: [0; RAMP_SIZE],
            blue: [0; RAMP_SIZE],
        }
    }

    pub fn is_flat(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }
}

impl Default for GammaRamp {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Compute the intensity curve for the given brightness (0..1), contrast (0..1)
/// and gamma (0.4..2.8). Out-of-range inputs are clamped.
///
/// The curve is not forced to be monotonic; at extreme brightness and contrast
/// combinations entries saturate at 0 or 65535.
pub fn compute_ramp(brightness: f64, contrast: f64, gamma: f64) -> [u16; RAMP_SIZE] {
    let gamma = gamma.clamp(MIN_GAMMA, MAX_GAMMA);
    let contrast = (contrast.clamp(0.0, 1.0) - 0.5) * 2.0;
    let brightness = (brightness.clamp(0.0, 1.0) - 0.5) * 2.0;

    let mut offset = if contrast > 0.0 {
        contrast * -25.4
    } else {
        contrast * -32.0
    };
    let range = (RAMP_SIZE as f64 - 1.0) + offset * 2.0;
    offset += brightness * (range / 5.0);

    let mut ramp = [0u16; RAMP_SIZE];
    for (i, entry) in ramp.iter_mut().enumerate() {
        let base = (i as f64 + offset) / range;
        // Negative bases have no real fractional power; they sit below black.
        let factor = if base <= 0.0 {
            0.0
        } else {
            base.powf(1.0 / gamma).clamp(0.0, 1.0)
        };
        *entry = (factor * UINT_MAX_VALUE).round() as u16;
    }
    ramp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_ramp_reference_value() {
        let ramp = compute_ramp(0.5, 0.5, 1.0);
        assert_eq!(ramp[17], 4369);
        assert_eq!(ramp[0], 0);
        assert_eq!(ramp[255], 65535);
    }

    #[test]
    fn test_neutral_ramp_is_linear() {
        let ramp = compute_ramp(0.5, 0.5, 1.0);
        for (i, value) in ramp.iter().enumerate() {
            assert_eq!(*value as usize, i * 257);
        }
    }

    #[test]
    fn test_ramp_is_deterministic() {
        assert_eq!(compute_ramp(0.3, 0.7, 1.6), compute_ramp(0.3, 0.7, 1.6));
    }

    #[test]
    fn test_ramp_bounds_across_parameter_space() {
        let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        let gammas = [0.4, 0.7, 1.0, 1.5, 2.2, 2.8];
        for &b in &steps {
            for &c in &steps {
                for &g in &gammas {
                    let ramp = compute_ramp(b, c, g);
                    assert_eq!(ramp.len(), RAMP_SIZE);
                    assert!(ramp[255] >= ramp[0], "b={} c={} g={}", b, c, g);
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        assert_eq!(compute_ramp(-3.0, 7.0, 10.0), compute_ramp(0.0, 1.0, 2.8));
        assert_eq!(compute_ramp(0.5, 0.5, 0.01), compute_ramp(0.5, 0.5, 0.4));
    }

    #[test]
    fn test_brightness_raises_curve() {
        let dark = compute_ramp(0.2, 0.5, 1.0);
        let bright = compute_ramp(0.8, 0.5, 1.0);
        assert!(bright[128] > dark[128]);
    }

    #[test]
    fn test_higher_gamma_lifts_midtones() {
        let neutral = compute_ramp(0.5, 0.5, 1.0);
        let lifted = compute_ramp(0.5, 0.5, 2.0);
        assert!(lifted[64] > neutral[64]);
    }

    #[test]
    fn test_flat_ramp_replicates_channels() {
        let values = compute_ramp(0.6, 0.4, 1.2);
        let ramp = GammaRamp::flat(&values);
        assert!(ramp.is_flat());
        assert_eq!(ramp.red, values);
        assert_eq!(GammaRamp::default(), GammaRamp::neutral());
    }
}
