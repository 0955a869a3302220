//! Initial disturbances seeded into the field.

use crate::params::InitialBump;

/// Compactly supported Gaussian bump sampled at integer texel positions.
///
/// Row-major, `grid_size * grid_size` samples. Cells farther than `radius`
/// from the centre are exactly zero; inside, `amplitude * exp(-d²/2σ²)` with
/// `σ = radius / 3`.
pub fn gaussian_bump(grid_size: u32, bump: &InitialBump) -> Vec<f32> {
    let [cx, cy] = bump.center_for(grid_size);
    let sigma = bump.radius / 3.0;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let n = grid_size as usize;
    let mut samples = vec![0.0f32; n * n];

    for y in 0..n {
        for x in 0..n {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq <= bump.radius * bump.radius {
                samples[y * n + x] = bump.amplitude * (-dist_sq / two_sigma_sq).exp();
            }
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_peak_and_support() {
        let bump = InitialBump::default();
        let samples = gaussian_bump(50, &bump);
        assert_eq!(samples.len(), 2500);

        // Peak sits exactly on texel (25, 25)
        assert_eq!(samples[25 * 50 + 25], bump.amplitude);

        // 13 texels out is past the 12.5 radius
        assert_eq!(samples[25 * 50 + 38], 0.0);
        assert!(samples[25 * 50 + 37] > 0.0);

        let max = samples.iter().cloned().fold(f32::MIN, f32::max);
        assert_eq!(max, bump.amplitude);
    }

    #[test]
    fn test_small_valid_bump_is_finite() {
        let bump = InitialBump {
            amplitude: 1.0,
            radius: 0.5,
            center: None,
        };
        assert!(bump.validate().is_ok());

        let samples = gaussian_bump(8, &bump);
        assert!(samples.iter().all(|h| h.is_finite()));
        assert_eq!(samples[4 * 8 + 4], 1.0);
        assert_eq!(samples.iter().filter(|&&h| h != 0.0).count(), 1);
    }
}
