//! Digit-decomposition key switching.
//!
//! A switch key for a target polynomial T under secret s is the ladder
//!
//!   (b_i, a_i),  b_i = -(a_i * s) + noise_i + B^i * T   (mod q_top)
//!
//! with digit base B = 2^20. Applying the key to an operand w writes each
//! coefficient of w in base-B digits and folds the digit polynomials against
//! the ladder:
//!
//!   sum_i w_i * b_i  +  (sum_i w_i * a_i) * s  =  w * T + sum_i w_i * noise_i
//!
//! Every digit stays below B, so the folded noise grows with B and the digit
//! count instead of with q. The ladder is generated at the top modulus; at a
//! lower level both the key components and the relation reduce cleanly
//! because each level modulus divides the top one.

use crate::context::Context;
use crate::keys::SecretKey;
use crate::params::Scheme;
use crate::rings::{RingPoly, bit_len};
use crypto_bigint::{NonZero, U256};
use rand::Rng;

pub(crate) const DIGIT_BITS: u32 = 20;
const DIGIT_MASK: u64 = (1 << DIGIT_BITS) - 1;

pub(crate) fn digit_count(modulus: &NonZero<U256>) -> usize {
    bit_len(&modulus.get()).div_ceil(DIGIT_BITS) as usize
}

#[derive(Debug, Clone)]
pub struct KeySwitchKey<const DEGREE: usize> {
    components: Vec<(RingPoly<DEGREE>, RingPoly<DEGREE>)>,
}

impl<const DEGREE: usize> KeySwitchKey<DEGREE> {
    pub(crate) fn generate<R: Rng + ?Sized>(
        target: &RingPoly<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
        ctx: &Context<DEGREE>,
        rng: &mut R,
    ) -> Self {
        let q = ctx.top_modulus();
        let digits = digit_count(&q);
        let mut components = Vec::with_capacity(digits);

        for i in 0..digits {
            let a = RingPoly::sample_uniform(q, rng);
            let mut e = RingPoly::sample_gaussian(ctx.error_std_dev(), q, rng);
            if ctx.scheme() == Scheme::Bgv {
                e.scale_by_u64(ctx.plain_modulus());
            }

            let mut shifted = target.clone();
            shifted.scale_by(&(U256::ONE << (i as u32 * DIGIT_BITS)));

            let mut a_times_s = a.clone();
            a_times_s *= &secret_key.s;

            let mut b = -a_times_s;
            b += &e;
            b += &shifted;

            components.push((b, a));
        }

        Self { components }
    }

    /// Folds `operand * T` into a (b, a) pair at the operand's modulus.
    pub(crate) fn apply(
        &self,
        operand: &RingPoly<DEGREE>,
    ) -> (RingPoly<DEGREE>, RingPoly<DEGREE>) {
        let modulus = operand.modulus();
        let digits = digit_count(&modulus);
        debug_assert!(digits <= self.components.len());

        let mut out_b = RingPoly::zero(modulus);
        let mut out_a = RingPoly::zero(modulus);
        for (i, (b, a)) in self.components.iter().take(digits).enumerate() {
            let digit = extract_digit(operand, i as u32);

            let mut term = b.reduce_to(modulus);
            term *= &digit;
            out_b += &term;

            let mut term = a.reduce_to(modulus);
            term *= &digit;
            out_a += &term;
        }
        (out_b, out_a)
    }
}

/// Digit `index` of every coefficient, as a polynomial with entries in [0, B).
fn extract_digit<const DEGREE: usize>(
    poly: &RingPoly<DEGREE>,
    index: u32,
) -> RingPoly<DEGREE> {
    let shift = index * DIGIT_BITS;
    let mut digits = [0u64; DEGREE];
    for (d, &c) in digits.iter_mut().zip(poly.coeffs.iter()) {
        *d = (c >> shift).as_words()[0] & DIGIT_MASK;
    }
    RingPoly::from_residues(&digits, poly.modulus())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use crate::params::SchemeParameters;
    use crypto_bigint::Zero;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn ctx(scheme: Scheme) -> Context<8> {
        let params = SchemeParameters::<8>::builder(scheme).build().unwrap();
        build_context(params).unwrap()
    }

    #[test]
    fn digits_reassemble_the_coefficients() {
        let ctx = ctx(Scheme::Bfv);
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let poly = RingPoly::<8>::sample_uniform(ctx.top_modulus(), &mut rng);

        let digits = digit_count(&ctx.top_modulus());
        let mut rebuilt = [U256::ZERO; 8];
        for i in 0..digits {
            let digit = extract_digit(&poly, i as u32);
            for (acc, &d) in rebuilt.iter_mut().zip(digit.coeffs.iter()) {
                *acc = acc.saturating_add(&(d << (i as u32 * DIGIT_BITS)));
            }
        }
        assert_eq!(rebuilt, poly.coeffs);
    }

    #[test]
    fn switched_pair_tracks_operand_times_target() {
        let ctx = ctx(Scheme::Bfv);
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let sk = SecretKey::generate(&ctx, &mut rng);
        let target = RingPoly::<8>::sample_ternary(4, ctx.top_modulus(), &mut rng);
        let ksk = KeySwitchKey::generate(&target, &sk, &ctx, &mut rng);

        let operand = RingPoly::<8>::sample_uniform(ctx.top_modulus(), &mut rng);
        let (out_b, out_a) = ksk.apply(&operand);

        // out_b + out_a*s - operand*target should be only folded noise.
        let mut lhs = out_a;
        lhs *= &sk.s;
        lhs += &out_b;
        let mut expected = operand;
        expected *= &target;
        lhs -= &expected;

        let residual_bits = bit_len(&lhs.max_centered_magnitude());
        // digits * DEGREE * B * |e| stays far below 2^40 here.
        assert!(residual_bits <= 40, "residual has {residual_bits} bits");
    }

    #[test]
    fn switching_works_at_a_reduced_level() {
        let ctx = ctx(Scheme::Bfv);
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        let sk = SecretKey::generate(&ctx, &mut rng);
        let target = RingPoly::<8>::sample_ternary(4, ctx.top_modulus(), &mut rng);
        let ksk = KeySwitchKey::generate(&target, &sk, &ctx, &mut rng);

        let q0 = ctx.modulus_at(0);
        let operand = RingPoly::<8>::sample_uniform(q0, &mut rng);
        let (out_b, out_a) = ksk.apply(&operand);
        assert_eq!(out_b.modulus(), q0);

        let mut lhs = out_a;
        lhs *= &sk.at_level(&ctx, 0);
        lhs += &out_b;
        let mut expected = operand;
        expected *= &target.reduce_to(q0);
        lhs -= &expected;

        let residual_bits = bit_len(&lhs.max_centered_magnitude());
        assert!(residual_bits <= 40, "residual has {residual_bits} bits");
    }

    #[test]
    fn masked_noise_scheme_keeps_residual_divisible_by_t() {
        let ctx = ctx(Scheme::Bgv);
        let mut rng = ChaCha20Rng::seed_from_u64(41);
        let sk = SecretKey::generate(&ctx, &mut rng);
        let target = RingPoly::<8>::sample_ternary(4, ctx.top_modulus(), &mut rng);
        let ksk = KeySwitchKey::generate(&target, &sk, &ctx, &mut rng);

        let operand = RingPoly::<8>::sample_uniform(ctx.top_modulus(), &mut rng);
        let (out_b, out_a) = ksk.apply(&operand);

        let mut lhs = out_a;
        lhs *= &sk.s;
        lhs += &out_b;
        let mut expected = operand;
        expected *= &target;
        lhs -= &expected;

        let t = NonZero::new(U256::from(ctx.plain_modulus())).unwrap();
        for &c in &lhs.coeffs {
            let (_, abs) = crate::rings::centered_split(c, &ctx.top_modulus());
            assert!(bool::from(abs.rem(&t).is_zero()));
        }
    }
}
