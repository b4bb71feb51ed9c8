use rand::{Rng, seq::SliceRandom};
use rand_distr::{Distribution, Normal};

/// Samples rounded Gaussian integers centered at zero.
///
/// # Panics
///
/// Panics if `std_dev` is not finite and positive.
pub fn gaussian_integers<const DEGREE: usize, R: Rng + ?Sized>(
    std_dev: f64,
    rng: &mut R,
) -> [i64; DEGREE] {
    assert!(
        std_dev.is_finite() && std_dev > 0.0,
        "gaussian_integers: std_dev must be finite and positive"
    );
    let normal = Normal::new(0.0, std_dev)
        .expect("gaussian_integers: failed to create Normal distribution");
    let mut coeffs = [0i64; DEGREE];
    for coeff in &mut coeffs {
        *coeff = normal.sample(rng).round() as i64;
    }
    coeffs
}

/// Samples a ternary vector with coefficients in `{-1, 0, 1}`.
///
/// Exactly `hamming_weight` entries are non-zero.
///
/// # Panics
///
/// Panics if `hamming_weight > DEGREE`.
pub fn ternary_coefficients<const DEGREE: usize, R: Rng + ?Sized>(
    hamming_weight: usize,
    rng: &mut R,
) -> [i64; DEGREE] {
    assert!(
        hamming_weight <= DEGREE,
        "ternary_coefficients: hamming_weight must be <= DEGREE"
    );
    let mut out = [0i64; DEGREE];
    // Shuffle indices and assign signs on the selected support.
    let mut indices: Vec<usize> = (0..DEGREE).collect();
    indices.shuffle(rng);
    for &idx in indices.iter().take(hamming_weight) {
        out[idx] = if rng.random_bool(0.5) { 1 } else { -1 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{gaussian_integers, ternary_coefficients};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn gaussian_integers_have_reasonable_mean_and_variance() {
        const DEGREE: usize = 16_384;
        let std_dev = 3.2;
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let coeffs = gaussian_integers::<DEGREE, _>(std_dev, &mut rng);

        let mean =
            coeffs.iter().map(|&x| x as f64).sum::<f64>() / DEGREE as f64;
        let variance = coeffs
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / DEGREE as f64;

        let expected_variance = std_dev * std_dev;
        assert!(mean.abs() <= 0.25, "mean too far from 0: {mean}");
        assert!(
            (variance - expected_variance).abs() <= expected_variance * 0.35,
            "variance {variance} too far from expected {expected_variance}"
        );
    }

    #[test]
    #[should_panic(expected = "gaussian_integers: std_dev must be finite and positive")]
    fn gaussian_integers_panics_on_non_positive_std_dev() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let _ = gaussian_integers::<8, _>(0.0, &mut rng);
    }

    #[test]
    fn ternary_coefficients_have_exact_hamming_weight() {
        let mut rng = ChaCha20Rng::seed_from_u64(123);
        let coeffs = ternary_coefficients::<256, _>(31, &mut rng);
        let non_zero = coeffs.iter().filter(|&&x| x != 0).count();
        assert_eq!(non_zero, 31);
    }

    #[test]
    fn ternary_coefficients_are_in_expected_set() {
        let mut rng = ChaCha20Rng::seed_from_u64(321);
        let coeffs = ternary_coefficients::<256, _>(64, &mut rng);
        for &x in &coeffs {
            assert!(x == -1 || x == 0 || x == 1);
        }
    }

    #[test]
    fn ternary_coefficients_handle_weight_extremes() {
        let mut rng = ChaCha20Rng::seed_from_u64(999);
        let all_zero = ternary_coefficients::<64, _>(0, &mut rng);
        assert!(all_zero.iter().all(|&x| x == 0));

        let full = ternary_coefficients::<64, _>(64, &mut rng);
        assert!(full.iter().all(|&x| x == -1 || x == 1));
    }

    #[test]
    #[should_panic(expected = "ternary_coefficients: hamming_weight must be <= DEGREE")]
    fn ternary_coefficients_panics_on_oversized_hamming_weight() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let _ = ternary_coefficients::<8, _>(9, &mut rng);
    }
}
