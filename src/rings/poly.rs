//! Coefficient arithmetic in Z_q[X]/(X^DEGREE + 1).
//!
//! One polynomial type backs all three schemes. Coefficients live in a
//! `U256` so a single big modulus (the product of the whole chain) fits
//! without residue decomposition, and multiplication is schoolbook with the
//! negacyclic wrap X^DEGREE = -1. That keeps every operation transparent at
//! the cost of O(DEGREE^2) multiplies, which is the intended trade-off here.

use crate::math::{gaussian_integers, ternary_coefficients};
use crypto_bigint::{NonZero, U256, Zero};
use rand::Rng;
use std::ops::{AddAssign, MulAssign, Neg, SubAssign};

#[derive(Debug, Clone, PartialEq)]
pub struct RingPoly<const DEGREE: usize> {
    pub coeffs: [U256; DEGREE],
    modulus: NonZero<U256>,
}

impl<const DEGREE: usize> RingPoly<DEGREE> {
    pub fn zero(modulus: NonZero<U256>) -> Self {
        Self {
            coeffs: [U256::ZERO; DEGREE],
            modulus,
        }
    }

    /// Builds a polynomial from signed coefficients, mapping negatives to
    /// `q - |c|`. Missing trailing coefficients are zero.
    pub fn from_signed(coeffs: &[i64], modulus: NonZero<U256>) -> Self {
        let mut out = [U256::ZERO; DEGREE];
        for (slot, &c) in out.iter_mut().zip(coeffs.iter()) {
            *slot = signed_to_residue(c, &modulus);
        }
        Self {
            coeffs: out,
            modulus,
        }
    }

    /// Builds a polynomial from residues already reduced mod `modulus`.
    pub fn from_residues(coeffs: &[u64], modulus: NonZero<U256>) -> Self {
        let mut out = [U256::ZERO; DEGREE];
        for (slot, &c) in out.iter_mut().zip(coeffs.iter()) {
            *slot = U256::from(c).rem(&modulus);
        }
        Self {
            coeffs: out,
            modulus,
        }
    }

    pub fn modulus(&self) -> NonZero<U256> {
        self.modulus
    }

    /// Uniform polynomial over the full coefficient range.
    pub fn sample_uniform<R: Rng + ?Sized>(
        modulus: NonZero<U256>,
        rng: &mut R,
    ) -> Self {
        let mut coeffs = [U256::ZERO; DEGREE];
        for coeff in &mut coeffs {
            let words = [
                rng.random::<u64>(),
                rng.random::<u64>(),
                rng.random::<u64>(),
                rng.random::<u64>(),
            ];
            *coeff = U256::from_words(words).rem(&modulus);
        }
        Self { coeffs, modulus }
    }

    /// Rounded Gaussian polynomial with standard deviation `std_dev`.
    pub fn sample_gaussian<R: Rng + ?Sized>(
        std_dev: f64,
        modulus: NonZero<U256>,
        rng: &mut R,
    ) -> Self {
        let ints = gaussian_integers::<DEGREE, R>(std_dev, rng);
        Self::from_signed(&ints, modulus)
    }

    /// Sparse ternary polynomial with exactly `hamming_weight` entries in
    /// `{-1, 1}`.
    pub fn sample_ternary<R: Rng + ?Sized>(
        hamming_weight: usize,
        modulus: NonZero<U256>,
        rng: &mut R,
    ) -> Self {
        let ternary = ternary_coefficients::<DEGREE, R>(hamming_weight, rng);
        Self::from_signed(&ternary, modulus)
    }

    /// Multiplies every coefficient by a small scalar.
    pub fn scale_by_u64(&mut self, k: u64) {
        let k = U256::from(k).rem(&self.modulus);
        for coeff in &mut self.coeffs {
            *coeff = coeff.mul_mod(&k, &self.modulus);
        }
    }

    /// Multiplies every coefficient by a full-width scalar residue.
    pub fn scale_by(&mut self, k: &U256) {
        let k = k.rem(&self.modulus);
        for coeff in &mut self.coeffs {
            *coeff = coeff.mul_mod(&k, &self.modulus);
        }
    }

    /// Plain reduction into a divisor modulus of the current one.
    ///
    /// When `new_modulus` divides the current modulus this preserves the
    /// centered value of every coefficient, which is what level alignment
    /// relies on.
    pub fn reduce_to(&self, new_modulus: NonZero<U256>) -> Self {
        let mut coeffs = [U256::ZERO; DEGREE];
        for (out, &c) in coeffs.iter_mut().zip(self.coeffs.iter()) {
            *out = c.rem(&new_modulus);
        }
        Self {
            coeffs,
            modulus: new_modulus,
        }
    }

    /// Centered lift into a larger modulus: each coefficient keeps its
    /// centered value, re-expressed mod `target`.
    pub fn lift_centered(&self, target: NonZero<U256>) -> Self {
        let mut coeffs = [U256::ZERO; DEGREE];
        for (out, &c) in coeffs.iter_mut().zip(self.coeffs.iter()) {
            let (neg, abs) = centered_split(c, &self.modulus);
            *out = if neg {
                target.wrapping_sub(&abs)
            } else {
                abs
            };
        }
        Self {
            coeffs,
            modulus: target,
        }
    }

    /// Round-to-nearest division of every centered coefficient by `divisor`,
    /// mapped into `next_modulus`. This is the rescaling primitive.
    pub fn rescale_round(
        &self,
        divisor: NonZero<U256>,
        next_modulus: NonZero<U256>,
    ) -> Self {
        let mut coeffs = [U256::ZERO; DEGREE];
        for (out, &c) in coeffs.iter_mut().zip(self.coeffs.iter()) {
            let (neg, abs) = centered_split(c, &self.modulus);
            let scaled = round_div_nearest(abs, &divisor).rem(&next_modulus);
            *out = if neg && bool::from(!scaled.is_zero()) {
                next_modulus.wrapping_sub(&scaled)
            } else {
                scaled
            };
        }
        Self {
            coeffs,
            modulus: next_modulus,
        }
    }

    /// Applies the ring automorphism X -> X^g. `g` must be odd so the map
    /// permutes the negacyclic basis.
    pub fn automorphism(&self, g: usize) -> Self {
        debug_assert!(g % 2 == 1, "automorphism exponent must be odd");
        let two_n = 2 * DEGREE;
        let mut coeffs = [U256::ZERO; DEGREE];
        for (i, &c) in self.coeffs.iter().enumerate() {
            let e = (i * g) % two_n;
            if e < DEGREE {
                coeffs[e] = coeffs[e].add_mod(&c, &self.modulus);
            } else {
                coeffs[e - DEGREE] = coeffs[e - DEGREE].sub_mod(&c, &self.modulus);
            }
        }
        Self {
            coeffs,
            modulus: self.modulus,
        }
    }

    /// Largest centered coefficient magnitude. Used for noise estimates.
    pub fn max_centered_magnitude(&self) -> U256 {
        let mut max = U256::ZERO;
        for &c in &self.coeffs {
            let (_, abs) = centered_split(c, &self.modulus);
            if abs > max {
                max = abs;
            }
        }
        max
    }

    /// Centered coefficients as floats. Precision is capped at the f64
    /// mantissa, which is all the approximate decode path needs.
    pub fn to_f64_centered(&self) -> Vec<f64> {
        self.coeffs
            .iter()
            .map(|&c| {
                let (neg, abs) = centered_split(c, &self.modulus);
                let v = u256_to_f64(abs);
                if neg { -v } else { v }
            })
            .collect()
    }
}

impl<const DEGREE: usize> AddAssign<&Self> for RingPoly<DEGREE> {
    fn add_assign(&mut self, rhs: &Self) {
        assert_eq!(
            self.modulus, rhs.modulus,
            "cannot add polynomials with different moduli"
        );
        for i in 0..DEGREE {
            self.coeffs[i] = self.coeffs[i].add_mod(&rhs.coeffs[i], &self.modulus);
        }
    }
}

impl<const DEGREE: usize> SubAssign<&Self> for RingPoly<DEGREE> {
    fn sub_assign(&mut self, rhs: &Self) {
        assert_eq!(
            self.modulus, rhs.modulus,
            "cannot subtract polynomials with different moduli"
        );
        for i in 0..DEGREE {
            self.coeffs[i] = self.coeffs[i].sub_mod(&rhs.coeffs[i], &self.modulus);
        }
    }
}

impl<const DEGREE: usize> MulAssign<&Self> for RingPoly<DEGREE> {
    fn mul_assign(&mut self, rhs: &Self) {
        assert_eq!(
            self.modulus, rhs.modulus,
            "cannot multiply polynomials with different moduli"
        );

        // Schoolbook negacyclic convolution: X^DEGREE = -1.
        let mut result = [U256::ZERO; DEGREE];
        for i in 0..DEGREE {
            if bool::from(self.coeffs[i].is_zero()) {
                continue;
            }
            for j in 0..DEGREE {
                let product =
                    self.coeffs[i].mul_mod(&rhs.coeffs[j], &self.modulus);
                if i + j < DEGREE {
                    result[i + j] =
                        result[i + j].add_mod(&product, &self.modulus);
                } else {
                    let wrapped = (i + j) - DEGREE;
                    result[wrapped] =
                        result[wrapped].sub_mod(&product, &self.modulus);
                }
            }
        }
        self.coeffs = result;
    }
}

impl<const DEGREE: usize> Neg for RingPoly<DEGREE> {
    type Output = Self;

    fn neg(mut self) -> Self::Output {
        for coeff in &mut self.coeffs {
            if bool::from(!coeff.is_zero()) {
                *coeff = self.modulus.wrapping_sub(coeff);
            }
        }
        self
    }
}

/// Splits a residue into (is_negative, magnitude) around q/2.
pub(crate) fn centered_split(c: U256, q: &NonZero<U256>) -> (bool, U256) {
    let half = q.get() >> 1;
    if c > half {
        (true, q.wrapping_sub(&c))
    } else {
        (false, c)
    }
}

/// Round-to-nearest unsigned division.
pub(crate) fn round_div_nearest(value: U256, divisor: &NonZero<U256>) -> U256 {
    let half = divisor.get() >> 1;
    let (quotient, _) = value.saturating_add(&half).div_rem(divisor);
    quotient
}

/// Number of significant bits.
pub(crate) fn bit_len(value: &U256) -> u32 {
    256 - value.leading_zeros()
}

fn signed_to_residue(c: i64, q: &NonZero<U256>) -> U256 {
    if c >= 0 {
        U256::from(c as u64).rem(q)
    } else {
        let abs = U256::from(c.unsigned_abs()).rem(q);
        if bool::from(abs.is_zero()) {
            U256::ZERO
        } else {
            q.wrapping_sub(&abs)
        }
    }
}

fn u256_to_f64(value: U256) -> f64 {
    let bits = bit_len(&value);
    if bits == 0 {
        return 0.0;
    }
    if bits <= 53 {
        return value.as_words()[0] as f64;
    }
    let shift = bits - 53;
    let top = (value >> shift).as_words()[0] as f64;
    top * 2f64.powi(shift as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const DEGREE: usize = 8;

    fn modulus_bits(bits: u32) -> NonZero<U256> {
        let q = (U256::ONE << bits) - U256::ONE;
        NonZero::new(q).expect("modulus is nonzero")
    }

    #[test]
    fn from_signed_round_trips_negatives() {
        let q = modulus_bits(61);
        let poly = RingPoly::<DEGREE>::from_signed(&[-3, 5, 0, -1], q);
        let (neg, abs) = centered_split(poly.coeffs[0], &q);
        assert!(neg);
        assert_eq!(abs, U256::from(3u64));
        assert_eq!(poly.coeffs[1], U256::from(5u64));
        assert_eq!(poly.coeffs[2], U256::ZERO);
    }

    #[test]
    fn negacyclic_wraparound_negates() {
        let q = modulus_bits(61);
        // X^(DEGREE-1) * X = X^DEGREE = -1
        let mut a = RingPoly::<DEGREE>::from_signed(
            &[0, 0, 0, 0, 0, 0, 0, 1],
            q,
        );
        let b = RingPoly::<DEGREE>::from_signed(&[0, 1], q);
        a *= &b;
        let (neg, abs) = centered_split(a.coeffs[0], &q);
        assert!(neg);
        assert_eq!(abs, U256::ONE);
        for i in 1..DEGREE {
            assert_eq!(a.coeffs[i], U256::ZERO);
        }
    }

    #[test]
    fn multiplication_matches_manual_example() {
        let q = modulus_bits(61);
        // (1 + 2X)(3 + X) = 3 + 7X + 2X^2
        let mut a = RingPoly::<DEGREE>::from_signed(&[1, 2], q);
        let b = RingPoly::<DEGREE>::from_signed(&[3, 1], q);
        a *= &b;
        assert_eq!(a.coeffs[0], U256::from(3u64));
        assert_eq!(a.coeffs[1], U256::from(7u64));
        assert_eq!(a.coeffs[2], U256::from(2u64));
    }

    #[test]
    fn add_then_negate_cancels() {
        let q = modulus_bits(61);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let a = RingPoly::<DEGREE>::sample_uniform(q, &mut rng);
        let mut sum = a.clone();
        sum += &a.clone().neg();
        assert_eq!(sum, RingPoly::zero(q));
    }

    #[test]
    fn rescale_round_divides_centered_values() {
        let q = modulus_bits(100);
        let p = NonZero::new(U256::from(1000u64)).expect("nonzero");
        let next = modulus_bits(90);
        let poly = RingPoly::<DEGREE>::from_signed(&[12_501, -12_499, 499, -500], q);
        let scaled = poly.rescale_round(p, next);
        assert_eq!(scaled.coeffs[0], U256::from(13u64)); // 12.501 rounds up
        let (neg, abs) = centered_split(scaled.coeffs[1], &next);
        assert!(neg);
        assert_eq!(abs, U256::from(12u64)); // -12.499 rounds toward -12
        assert_eq!(scaled.coeffs[2], U256::ZERO); // 0.499 rounds down
        let (neg, abs) = centered_split(scaled.coeffs[3], &next);
        assert!(neg && abs == U256::ONE); // -0.5 rounds to -1 magnitude-wise
    }

    #[test]
    fn reduce_to_preserves_centered_values_for_divisor_modulus() {
        let p = U256::from(1_000_003u64);
        let q_small = NonZero::new(p).expect("nonzero");
        let q_big = NonZero::new(p.saturating_mul(&U256::from(999_983u64)))
            .expect("nonzero");
        let poly = RingPoly::<DEGREE>::from_signed(&[42, -17, 123_456], q_big);
        let reduced = poly.reduce_to(q_small);
        let expected = RingPoly::<DEGREE>::from_signed(&[42, -17, 123_456], q_small);
        assert_eq!(reduced, expected);
    }

    #[test]
    fn automorphism_permutes_with_sign() {
        let q = modulus_bits(61);
        // a = X, g = 3: X -> X^3
        let a = RingPoly::<DEGREE>::from_signed(&[0, 1], q);
        let mapped = a.automorphism(3);
        assert_eq!(mapped.coeffs[3], U256::ONE);
        // a = X^3, g = 3: X^9 = X^(9-8) * (-1) = -X
        let b = RingPoly::<DEGREE>::from_signed(&[0, 0, 0, 1], q);
        let mapped = b.automorphism(3);
        let (neg, abs) = centered_split(mapped.coeffs[1], &q);
        assert!(neg);
        assert_eq!(abs, U256::ONE);
    }

    #[test]
    fn ternary_sampler_respects_weight() {
        let q = modulus_bits(61);
        let mut rng = ChaCha20Rng::seed_from_u64(77);
        let poly = RingPoly::<64>::sample_ternary(20, q, &mut rng);
        let nonzero = poly
            .coeffs
            .iter()
            .filter(|c| bool::from(!c.is_zero()))
            .count();
        assert_eq!(nonzero, 20);
    }

    #[test]
    fn round_div_nearest_rounds_half_up() {
        let d = NonZero::new(U256::from(10u64)).expect("nonzero");
        assert_eq!(round_div_nearest(U256::from(44u64), &d), U256::from(4u64));
        assert_eq!(round_div_nearest(U256::from(45u64), &d), U256::from(5u64));
        assert_eq!(round_div_nearest(U256::from(46u64), &d), U256::from(5u64));
    }

    #[test]
    fn bit_len_matches_examples() {
        assert_eq!(bit_len(&U256::ZERO), 0);
        assert_eq!(bit_len(&U256::ONE), 1);
        assert_eq!(bit_len(&U256::from(255u64)), 8);
        assert_eq!(bit_len(&(U256::ONE << 100)), 101);
    }
}
