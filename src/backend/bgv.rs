//! Exact scheme, low-bits variant: the plaintext sits in the least
//! significant residue.
//!
//! Every noise term is a multiple of t, so the decrypted value reduces to
//! the message mod t directly. Ciphertext multiplication is the plain
//! tensor in Z_q with no rounding step: the product of two values of the
//! form m + t*e keeps that form. The cost shows up as faster noise growth
//! instead, and the same noise budget accounting applies.

use crate::backend::{
    Ciphertext, SchemeBackend, add_ciphertexts, check_multiply_operands, decrypt_to_poly,
    encrypt_message, reference_exact, relinearize_ciphertext, sub_ciphertexts, tensor_components,
};
use crate::context::Context;
use crate::errors::{CapacityError, EvalError};
use crate::keys::{PublicKey, RelinearizationKey, SecretKey};
use crate::packing::{self, PackedPlaintext};
use crate::params::Scheme;
use crate::rings::{RingPoly, bit_len, centered_split};
use crypto_bigint::{NonZero, U256};
use rand::Rng;

pub struct BgvBackend;

impl<const DEGREE: usize> SchemeBackend<DEGREE> for BgvBackend {
    type Value = u64;

    fn scheme() -> Scheme {
        Scheme::Bgv
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
        let (c0, c1) = encrypt_message(
            ctx,
            public_key,
            &plaintext.poly,
            ctx.plain_modulus(),
            rng,
        );
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
            let m = abs.rem(&t_wide).as_words()[0];
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
        _ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError> {
        check_multiply_operands(lhs, rhs)?;
        let (d0, d1, d2) = tensor_components(lhs, rhs);
        Ok(Ciphertext {
            c0: d0,
            c1: d1,
            c2: Some(d2),
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
        let w = decrypt_to_poly(ctx, secret_key, ciphertext);
        let q_bits = bit_len(&w.modulus().get());
        let magnitude_bits = bit_len(&w.max_centered_magnitude());
        Some(q_bits.saturating_sub(magnitude_bits + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use crate::keys::generate_keys;
    use crate::params::SchemeParameters;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup() -> (Context<8>, crate::keys::KeyBundle<8>, ChaCha20Rng) {
        let params = SchemeParameters::<8>::builder(Scheme::Bgv).build().unwrap();
        let ctx = build_context(params).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(777);
        let keys = generate_keys(&ctx, &mut rng);
        (ctx, keys, rng)
    }

    fn roundtrip(
        ctx: &Context<8>,
        keys: &crate::keys::KeyBundle<8>,
        ct: &Ciphertext<8>,
        len: usize,
    ) -> Vec<u64> {
        let mut decoded = BgvBackend::unpack(ctx, &BgvBackend::decrypt(ctx, &keys.secret, ct));
        decoded.truncate(len);
        decoded
    }

    #[test]
    fn fresh_ciphertext_roundtrips() {
        let (ctx, keys, mut rng) = setup();
        let values = [1u64, 0, 39, 40960, 12345, 6, 7, 8];
        let pt = BgvBackend::pack(&ctx, &values).unwrap();
        let ct = BgvBackend::encrypt(&ctx, &keys.public, &pt, &mut rng);
        assert_eq!(roundtrip(&ctx, &keys, &ct, 8), values);
    }

    #[test]
    fn addition_wraps_mod_t() {
        let (ctx, keys, mut rng) = setup();
        let a = [40000u64, 2];
        let b = [1000u64, 5];
        let ct_a = BgvBackend::encrypt(&ctx, &keys.public, &BgvBackend::pack(&ctx, &a).unwrap(), &mut rng);
        let ct_b = BgvBackend::encrypt(&ctx, &keys.public, &BgvBackend::pack(&ctx, &b).unwrap(), &mut rng);
        let sum = BgvBackend::add(&ctx, &ct_a, &ct_b).unwrap();
        assert_eq!(roundtrip(&ctx, &keys, &sum, 2), vec![39, 7]);
    }

    #[test]
    fn multiply_then_relinearize_gives_slot_products() {
        let (ctx, keys, mut rng) = setup();
        let a = [3u64, 202, 40960, 9];
        let b = [7u64, 203, 2, 11];
        let ct_a = BgvBackend::encrypt(&ctx, &keys.public, &BgvBackend::pack(&ctx, &a).unwrap(), &mut rng);
        let ct_b = BgvBackend::encrypt(&ctx, &keys.public, &BgvBackend::pack(&ctx, &b).unwrap(), &mut rng);

        let product = BgvBackend::multiply(&ctx, &ct_a, &ct_b).unwrap();
        assert!(product.needs_relinearization());
        let product = BgvBackend::relinearize(&ctx, &keys.relin, &product);

        // 40960 * 2 = 81920 = 40959 mod 40961.
        assert_eq!(
            roundtrip(&ctx, &keys, &product, 4),
            vec![21, 202 * 203 % 40961, 40959, 99]
        );
    }

    #[test]
    fn second_multiply_without_relinearization_is_refused() {
        let (ctx, keys, mut rng) = setup();
        let pt = BgvBackend::pack(&ctx, &[2, 3]).unwrap();
        let ct = BgvBackend::encrypt(&ctx, &keys.public, &pt, &mut rng);
        let product = BgvBackend::multiply(&ctx, &ct, &ct).unwrap();
        let err = BgvBackend::multiply(&ctx, &product, &ct).unwrap_err();
        assert!(matches!(err, EvalError::RelinearizationRequired { .. }));
    }

    #[test]
    fn multiplication_consumes_noise_budget() {
        let (ctx, keys, mut rng) = setup();
        let pt = BgvBackend::pack(&ctx, &[11, 22]).unwrap();
        let ct = BgvBackend::encrypt(&ctx, &keys.public, &pt, &mut rng);
        let fresh = BgvBackend::noise_budget_bits(&ctx, &keys.secret, &ct).unwrap();
        assert!(fresh > 20, "fresh budget {fresh} too small");

        let product = BgvBackend::multiply(&ctx, &ct, &ct).unwrap();
        let product = BgvBackend::relinearize(&ctx, &keys.relin, &product);
        let after = BgvBackend::noise_budget_bits(&ctx, &keys.secret, &product).unwrap();
        assert!(after < fresh, "budget did not decrease: {fresh} -> {after}");
        assert!(after > 0, "budget exhausted after one multiply");
    }

    #[test]
    fn out_of_range_inputs_alias_mod_t() {
        let (ctx, keys, mut rng) = setup();
        let pt = BgvBackend::pack(&ctx, &[40961 + 5]).unwrap();
        let ct = BgvBackend::encrypt(&ctx, &keys.public, &pt, &mut rng);
        assert_eq!(roundtrip(&ctx, &keys, &ct, 1), vec![5]);
    }
}
