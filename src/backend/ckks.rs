//! Approximate scheme: fixed-point reals under a drifting scale.
//!
//! Slot values are embedded at scale 2^scale_bits and every multiplication
//! multiplies the scales of its operands. Rescaling divides the ciphertext
//! by the level's chain prime, which is close to 2^scale_bits but not equal
//! to it, so the tracked scale drifts off the power of two a little with
//! each rescale. Heterogeneous ciphertexts can only be added after their
//! scales are snapped back to the canonical value and their levels aligned;
//! the add itself enforces both.

use crate::backend::{
    Ciphertext, SchemeBackend, add_ciphertexts, check_multiply_operands, decrypt_to_poly,
    encrypt_message, reference_approx, relinearize_ciphertext, sub_ciphertexts,
    tensor_components, verify_approx,
};
use crate::context::Context;
use crate::errors::{CapacityError, EvalError};
use crate::keys::{PublicKey, RelinearizationKey, SecretKey};
use crate::packing::{self, PackedPlaintext};
use crate::params::Scheme;
use crypto_bigint::{NonZero, U256};
use rand::Rng;

pub struct CkksBackend;

fn switch_down<const DEGREE: usize>(
    ctx: &Context<DEGREE>,
    ciphertext: Ciphertext<DEGREE>,
    target: usize,
) -> Ciphertext<DEGREE> {
    if ciphertext.level == target {
        return ciphertext;
    }
    let q = ctx.modulus_at(target);
    Ciphertext {
        c0: ciphertext.c0.reduce_to(q),
        c1: ciphertext.c1.reduce_to(q),
        c2: ciphertext.c2.as_ref().map(|c2| c2.reduce_to(q)),
        level: target,
        scale: ciphertext.scale,
    }
}

impl<const DEGREE: usize> SchemeBackend<DEGREE> for CkksBackend {
    type Value = f64;

    fn scheme() -> Scheme {
        Scheme::Ckks
    }

    fn pack(
        ctx: &Context<DEGREE>,
        values: &[f64],
    ) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
        packing::pack_approx(ctx, values)
    }

    fn pack_with_scale(
        ctx: &Context<DEGREE>,
        values: &[f64],
        scale: Option<f64>,
    ) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
        packing::pack_approx_at(ctx, values, scale.unwrap_or_else(|| ctx.default_scale()))
    }

    fn unpack(_ctx: &Context<DEGREE>, plaintext: &PackedPlaintext<DEGREE>) -> Vec<f64> {
        packing::unpack_approx(plaintext)
    }

    fn encrypt<R: Rng + ?Sized>(
        ctx: &Context<DEGREE>,
        public_key: &PublicKey<DEGREE>,
        plaintext: &PackedPlaintext<DEGREE>,
        rng: &mut R,
    ) -> Ciphertext<DEGREE> {
        let (c0, c1) = encrypt_message(ctx, public_key, &plaintext.poly, 1, rng);
        Ciphertext {
            c0,
            c1,
            c2: None,
            level: plaintext.level,
            scale: plaintext.scale,
        }
    }

    fn decrypt(
        ctx: &Context<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> PackedPlaintext<DEGREE> {
        let w = decrypt_to_poly(ctx, secret_key, ciphertext);
        PackedPlaintext {
            poly: w,
            scale: ciphertext.scale,
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
        _ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        check_multiply_operands(lhs, rhs)?;
        if lhs.level == 0 {
            return Err(EvalError::LevelExhausted);
        }
        let (d0, d1, d2) = tensor_components(lhs, rhs);
        Ok(Ciphertext {
            c0: d0,
            c1: d1,
            c2: Some(d2),
            level: lhs.level,
            scale: lhs.scale * rhs.scale,
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
        ctx: &Context<DEGREE>,
        ciphertext: Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        if ciphertext.level == 0 {
            return Err(EvalError::LevelExhausted);
        }
        let prime = ctx.chain().scale_prime(ciphertext.level);
        let divisor =
            NonZero::new(U256::from(prime)).expect("chain primes are nonzero");
        let next_q = ctx.modulus_at(ciphertext.level - 1);

        Ok(Ciphertext {
            c0: ciphertext.c0.rescale_round(divisor, next_q),
            c1: ciphertext.c1.rescale_round(divisor, next_q),
            c2: ciphertext
                .c2
                .as_ref()
                .map(|c2| c2.rescale_round(divisor, next_q)),
            level: ciphertext.level - 1,
            scale: ciphertext.scale / prime as f64,
        })
    }

    fn snap_scale(
        ctx: &Context<DEGREE>,
        mut ciphertext: Ciphertext<DEGREE>,
    ) -> Ciphertext<DEGREE> {
        ciphertext.scale = ctx.default_scale();
        ciphertext
    }

    fn align_levels(
        ctx: &Context<DEGREE>,
        lhs: Ciphertext<DEGREE>,
        rhs: Ciphertext<DEGREE>,
    ) -> (Ciphertext<DEGREE>, Ciphertext<DEGREE>) {
        let target = lhs.level.min(rhs.level);
        (
            switch_down(ctx, lhs, target),
            switch_down(ctx, rhs, target),
        )
    }

    fn reference(_ctx: &Context<DEGREE>, x: &[f64], y: &[f64], z: &[f64]) -> Vec<f64> {
        reference_approx(x, y, z)
    }

    fn verify(computed: &[f64], reference: &[f64], tolerance: f64) -> bool {
        verify_approx(computed, reference, tolerance)
    }

    fn noise_budget_bits(
        _ctx: &Context<DEGREE>,
        _secret_key: &SecretKey<DEGREE>,
        _ciphertext: &Ciphertext<DEGREE>,
    ) -> Option<u32> {
        None
    }
}
