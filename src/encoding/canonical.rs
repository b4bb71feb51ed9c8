//! Canonical embedding for the approximate numeric model.
//!
//! Real slot vectors live at the odd 2N-th roots of unity: a plaintext
//! polynomial m(X) in R[X]/(X^N + 1) carries slot j as m(zeta_j) with
//! zeta_j = psi^(2j+1) and psi = e^(i*pi/N). Complex conjugation pairs
//! zeta_j with zeta_(N-1-j), so N/2 real slots determine a polynomial with
//! real coefficients. Multiplication in the ring is evaluation-wise at the
//! roots, which is what makes packed products act slot by slot.
//!
//! Both directions reduce to a length-N FFT after twisting by powers of psi.
//! Values are scaled up before rounding to integer coefficients; the rounding
//! error is what decryption noise ultimately sits on top of.

use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

fn twist<const DEGREE: usize>(k: usize) -> Complex64 {
    Complex64::from_polar(1.0, PI * k as f64 / DEGREE as f64)
}

/// Embeds up to N/2 real values into integer polynomial coefficients at the
/// given scale. Unused slots are zero.
pub fn encode<const DEGREE: usize>(values: &[f64], scale: f64) -> [i64; DEGREE] {
    assert!(values.len() <= DEGREE / 2);

    // Evaluation targets with conjugate symmetry: slot j pairs with N-1-j.
    let mut spectrum = vec![Complex64::new(0.0, 0.0); DEGREE];
    for (j, &value) in values.iter().enumerate() {
        let target = Complex64::new(value * scale, 0.0);
        spectrum[j] = target;
        spectrum[DEGREE - 1 - j] = target.conj();
    }

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(DEGREE).process(&mut spectrum);

    // Untwist and round. The 1/N factor undoes the unnormalized transform.
    let normalize = (DEGREE as f64).recip();
    let mut coeffs = [0i64; DEGREE];
    for (k, coeff) in coeffs.iter_mut().enumerate() {
        let untwisted = spectrum[k] * normalize * twist::<DEGREE>(k).conj();
        *coeff = untwisted.re.round() as i64;
    }
    coeffs
}

/// Evaluates centered coefficients at the first `slots` odd roots and
/// divides the scale back out.
pub fn decode<const DEGREE: usize>(coeffs: &[f64], scale: f64, slots: usize) -> Vec<f64> {
    debug_assert_eq!(coeffs.len(), DEGREE);
    let mut twisted: Vec<Complex64> = coeffs
        .iter()
        .enumerate()
        .map(|(k, &c)| Complex64::new(c, 0.0) * twist::<DEGREE>(k))
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(DEGREE).process(&mut twisted);

    twisted.iter().take(slots).map(|z| z.re / scale).collect()
}
