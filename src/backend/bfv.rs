//! Exact scheme, scale-up variant: the plaintext rides the high bits.
//!
//! Encryption multiplies the message by delta = floor(q/t), decryption
//! recovers it as round(t*w/q) mod t. Ciphertext multiplication is the
//! scale-invariant tensor: the components are lifted to their centered
//! integer values, convolved exactly inside a wide odd extension modulus,
//! and each tensor component is scaled back by t/q with one rounding. No
//! modulus chain bookkeeping is visible to the caller; the cost of every
//! multiply is paid from the noise budget instead.

use crate::backend::{
    Ciphertext, SchemeBackend, add_ciphertexts, check_multiply_operands, decrypt_to_poly,
    encrypt_message, reference_exact, relinearize_ciphertext, sub_ciphertexts,
};
use crate::context::Context;
use crate::errors::{CapacityError, EvalError};
use crate::keys::{PublicKey, RelinearizationKey, SecretKey};
use crate::packing::{self, PackedPlaintext};
use crate::params::Scheme;
use crate::rings::{RingPoly, bit_len, centered_split, round_div_nearest};
use crypto_bigint::{NonZero, U256, Zero};
use rand::Rng;

pub struct BfvBackend;

/// Odd modulus wide enough to hold the centered tensor exactly: the product
/// coefficients stay below N * (q/2)^2, the d1 sum doubles that once.
fn extension_modulus<const DEGREE: usize>(q: &NonZero<U256>) -> NonZero<U256> {
    let bits = 2 * bit_len(&q.get()) + DEGREE.trailing_zeros() + 3;
    let value = (U256::ONE << bits) - U256::ONE;
    NonZero::new(value).expect("extension modulus is nonzero")
}

/// round(t * value / q) for one centered coefficient.
fn scale_by_t_over_q(abs: U256, t: u64, q: &NonZero<U256>) -> U256 {
    round_div_nearest(abs.saturating_mul(&U256::from(t)), q)
}

/// Maps a tensor component back into Z_q, rounding each centered
/// coefficient by t/q.
fn round_tensor_component<const DEGREE: usize>(
    component: &RingPoly<DEGREE>,
    t: u64,
    q: NonZero<U256>,
) -> RingPoly<DEGREE> {
    let source_modulus = component.modulus();
    let mut out = RingPoly::zero(q);
    for (slot, &c) in out.coeffs.iter_mut().zip(component.coeffs.iter()) {
        let (neg, abs) = centered_split(c, &source_modulus);
        let scaled = scale_by_t_over_q(abs, t, &q).rem(&q);
        *slot = if neg && bool::from(!scaled.is_zero()) {
            q.wrapping_sub(&scaled)
        } else {
            scaled
        };
    }
    out
}

impl<const DEGREE: usize> SchemeBackend<DEGREE> for BfvBackend {
    type Value = u64;

    fn scheme() -> Scheme {
        Scheme::Bfv
    }

    fn pack(
        ctx: &Context<DEGREE>,
        values: &[u64],
    ) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
        packing::pack_exact(ctx, values)
    }

    fn unpack(ctx: &Context<DEGREE>, plaintext: &PackedPlaintext<DEGREE>) -> Vec<u64> {
        packing::unpack_exact(ctx, plaintext)
    }

    fn encrypt<R: Rng + ?Sized>(
        ctx: &Context<DEGREE>,
        public_key: &PublicKey<DEGREE>,
        plaintext: &PackedPlaintext<DEGREE>,
        rng: &mut R,
    ) -> Ciphertext<DEGREE> {
        let q = ctx.top_modulus();
        let t = NonZero::new(U256::from(ctx.plain_modulus())).expect("plain modulus is nonzero");
        let (delta, _) = q.get().div_rem(&t);

        let mut message = plaintext.poly.clone();
        message.scale_by(&delta);
        let (c0, c1) = encrypt_message(ctx, public_key, &message, 1, rng);
        Ciphertext {
            c0,
            c1,
            c2: None,
            level: plaintext.level,
            scale: 1.0,
        }
    }

    fn decrypt(
        ctx: &Context<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> PackedPlaintext<DEGREE> {
        let w = decrypt_to_poly(ctx, secret_key, ciphertext);
        let q = w.modulus();
        let t = ctx.plain_modulus();
        let t_wide = NonZero::new(U256::from(t)).expect("plain modulus is nonzero");

        let mut residues = [0u64; DEGREE];
        for (slot, &c) in residues.iter_mut().zip(w.coeffs.iter()) {
            let (neg, abs) = centered_split(c, &q);
            let m = scale_by_t_over_q(abs, t, &q).rem(&t_wide).as_words()[0];
            *slot = if neg && m != 0 { t - m } else { m };
        }

        PackedPlaintext {
            poly: RingPoly::from_residues(&residues, q),
            scale: 1.0,
            slots: ctx.slot_capacity(),
            level: ciphertext.level,
        }
    }

    fn add(
        _ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        add_ciphertexts(lhs, rhs)
    }

    fn sub(
        _ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        sub_ciphertexts(lhs, rhs)
    }

    fn multiply(
        ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        check_multiply_operands(lhs, rhs)?;
        let q = lhs.c0.modulus();
        let wide = extension_modulus::<DEGREE>(&q);

        let a0 = lhs.c0.lift_centered(wide);
        let a1 = lhs.c1.lift_centered(wide);
        let b0 = rhs.c0.lift_centered(wide);
        let b1 = rhs.c1.lift_centered(wide);

        let mut d0 = a0.clone();
        d0 *= &b0;

        // Both cross terms are summed before the single rounding.
        let mut d1 = a0;
        d1 *= &b1;
        let mut cross = a1.clone();
        cross *= &b0;
        d1 += &cross;

        let mut d2 = a1;
        d2 *= &b1;

        let t = ctx.plain_modulus();
        Ok(Ciphertext {
            c0: round_tensor_component(&d0, t, q),
            c1: round_tensor_component(&d1, t, q),
            c2: Some(round_tensor_component(&d2, t, q)),
            level: lhs.level,
            scale: 1.0,
        })
    }

    fn relinearize(
        _ctx: &Context<DEGREE>,
        relin_key: &RelinearizationKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> Ciphertext<DEGREE> {
        relinearize_ciphertext(relin_key, ciphertext)
    }

    fn rescale_after_multiply(
        _ctx: &Context<DEGREE>,
        ciphertext: Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        Ok(ciphertext)
    }

    fn snap_scale(_ctx: &Context<DEGREE>, ciphertext: Ciphertext<DEGREE>) -> Ciphertext<DEGREE> {
        ciphertext
    }

    fn align_levels(
        _ctx: &Context<DEGREE>,
        lhs: Ciphertext<DEGREE>,
        rhs: Ciphertext<DEGREE>,
    ) -> (Ciphertext<DEGREE>, Ciphertext<DEGREE>) {
        (lhs, rhs)
    }

    fn reference(ctx: &Context<DEGREE>, x: &[u64], y: &[u64], z: &[u64]) -> Vec<u64> {
        reference_exact(ctx.plain_modulus(), x, y, z)
    }

    fn verify(computed: &[u64], reference: &[u64], _tolerance: f64) -> bool {
        computed == reference
    }

    fn noise_budget_bits(
        ctx: &Context<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> Option<u32> {
        let mut w = decrypt_to_poly(ctx, secret_key, ciphertext);
        let q_bits = bit_len(&w.modulus().get());
        w.scale_by_u64(ctx.plain_modulus());
        let residual_bits = bit_len(&w.max_centered_magnitude());
        Some(q_bits.saturating_sub(residual_bits + 1))
    }
}
