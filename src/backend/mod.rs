//! Scheme backends.
//!
//! One trait, one unit struct per scheme. The trait surface covers the whole
//! lifecycle: packing, encryption, the homomorphic operations with their
//! bookkeeping, decryption, and the cleartext reference used for
//! verification. The evaluator drives the trait only, so operations a
//! numeric model does not need (rescaling, scale snapping, level alignment)
//! degrade to the identity for that model.
//!
//! Shared mechanics live here: component-wise addition, the tensor step,
//! relinearization, and the decryption accumulator are the same polynomial
//! algebra in all three schemes. The schemes differ in where the plaintext
//! sits relative to the noise, and that difference is confined to encrypt,
//! decrypt, and the multiply scaling.

pub mod bfv;
pub mod bgv;
pub mod ckks;

pub use bfv::BfvBackend;
pub use bgv::BgvBackend;
pub use ckks::CkksBackend;

use crate::context::Context;
use crate::errors::{CapacityError, EvalError};
use crate::keys::{PublicKey, RelinearizationKey, SecretKey};
use crate::math::primes::mul_mod;
use crate::packing::PackedPlaintext;
use crate::params::Scheme;
use crate::rings::RingPoly;
use rand::Rng;

/// Encrypted packed vector.
///
/// `c2` is present exactly between a multiplication and its
/// relinearization, which makes the relinearization requirement structural
/// instead of a flag to keep in sync.
#[derive(Debug, Clone)]
pub struct Ciphertext<const DEGREE: usize> {
    pub(crate) c0: RingPoly<DEGREE>,
    pub(crate) c1: RingPoly<DEGREE>,
    pub(crate) c2: Option<RingPoly<DEGREE>>,
    pub(crate) level: usize,
    pub(crate) scale: f64,
}

impl<const DEGREE: usize> Ciphertext<DEGREE> {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// True between a multiply and the relinearization that follows it.
    pub fn needs_relinearization(&self) -> bool {
        self.c2.is_some()
    }
}

pub trait SchemeBackend<const DEGREE: usize> {
    /// Slot value type: residues mod t for the exact model, reals for the
    /// approximate one.
    type Value: Copy + PartialEq + std::fmt::Debug;

    fn scheme() -> Scheme;

    fn pack(
        ctx: &Context<DEGREE>,
        values: &[Self::Value],
    ) -> Result<PackedPlaintext<DEGREE>, CapacityError>;

    /// Packs at an explicit encoding scale, falling back to the parameter
    /// default on `None`. The exact model has no encoding scale and ignores
    /// the override.
    fn pack_with_scale(
        ctx: &Context<DEGREE>,
        values: &[Self::Value],
        scale: Option<f64>,
    ) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
        let _ = scale;
        Self::pack(ctx, values)
    }

    fn unpack(ctx: &Context<DEGREE>, plaintext: &PackedPlaintext<DEGREE>) -> Vec<Self::Value>;

    fn encrypt<R: Rng + ?Sized>(
        ctx: &Context<DEGREE>,
        public_key: &PublicKey<DEGREE>,
        plaintext: &PackedPlaintext<DEGREE>,
        rng: &mut R,
    ) -> Ciphertext<DEGREE>;

    /// Total over well-formed ciphertexts. If the noise budget ran out
    /// upstream the output decodes to garbage rather than an error.
    fn decrypt(
        ctx: &Context<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> PackedPlaintext<DEGREE>;

    fn add(
        ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError>;

    fn sub(
        ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError>;

    fn multiply(
        ctx: &Context<DEGREE>,
        lhs: &Ciphertext<DEGREE>,
        rhs: &Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError>;

    /// Folds the degree-2 component back into (c0, c1). No-op on linear
    /// ciphertexts.
    fn relinearize(
        ctx: &Context<DEGREE>,
        relin_key: &RelinearizationKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> Ciphertext<DEGREE>;

    /// Divides out the level's scale prime and descends one level;
    /// `LevelExhausted` when no level is left below. Identity for the exact
    /// model.
    fn rescale_after_multiply(
        ctx: &Context<DEGREE>,
        ciphertext: Ciphertext<DEGREE>,
    ) -> Result<Ciphertext<DEGREE>, EvalError>;

    /// Resets the scale metadata to the context default, bit-exactly.
    /// Identity for the exact model.
    fn snap_scale(ctx: &Context<DEGREE>, ciphertext: Ciphertext<DEGREE>) -> Ciphertext<DEGREE>;

    /// Switches both ciphertexts down to the lower of their two levels.
    /// Identity for the exact model.
    fn align_levels(
        ctx: &Context<DEGREE>,
        lhs: Ciphertext<DEGREE>,
        rhs: Ciphertext<DEGREE>,
    ) -> (Ciphertext<DEGREE>, Ciphertext<DEGREE>);

    /// Cleartext e = y * (x + z), element-wise, in the backend's value
    /// domain.
    fn reference(
        ctx: &Context<DEGREE>,
        x: &[Self::Value],
        y: &[Self::Value],
        z: &[Self::Value],
    ) -> Vec<Self::Value>;

    /// Exact model ignores `tolerance` and demands bit equality.
    fn verify(computed: &[Self::Value], reference: &[Self::Value], tolerance: f64) -> bool;

    /// Remaining headroom before decryption fails, in bits. None for the
    /// approximate model, which degrades precision instead.
    fn noise_budget_bits(
        ctx: &Context<DEGREE>,
        secret_key: &SecretKey<DEGREE>,
        ciphertext: &Ciphertext<DEGREE>,
    ) -> Option<u32>;
}

/// Scales drift through rescaling, so equality is up to relative tolerance.
/// Snapped and fresh scales compare bit-identically; a rescaled-but-unsnapped
/// scale against a fresh one does not, which is the mismatch this is meant
/// to catch.
pub(crate) fn scales_compatible(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

fn check_component_alignment<const DEGREE: usize>(
    op: &'static str,
    lhs: &Ciphertext<DEGREE>,
    rhs: &Ciphertext<DEGREE>,
) -> Result<(), EvalError> {
    if lhs.level != rhs.level || !scales_compatible(lhs.scale, rhs.scale) {
        return Err(EvalError::ScaleMismatch {
            op,
            left_level: lhs.level,
            right_level: rhs.level,
            left_scale: lhs.scale,
            right_scale: rhs.scale,
        });
    }
    Ok(())
}

pub(crate) fn add_ciphertexts<const DEGREE: usize>(
    lhs: &Ciphertext<DEGREE>,
    rhs: &Ciphertext<DEGREE>,
) -> Result<Ciphertext<DEGREE>, EvalError> {
    check_component_alignment("add", lhs, rhs)?;
    let mut c0 = lhs.c0.clone();
    c0 += &rhs.c0;
    let mut c1 = lhs.c1.clone();
    c1 += &rhs.c1;
    let c2 = match (&lhs.c2, &rhs.c2) {
        (None, None) => None,
        (Some(l), Some(r)) => {
            let mut sum = l.clone();
            sum += r;
            Some(sum)
        }
        (Some(l), None) => Some(l.clone()),
        (None, Some(r)) => Some(r.clone()),
    };
    Ok(Ciphertext {
        c0,
        c1,
        c2,
        level: lhs.level,
        scale: lhs.scale,
    })
}

pub(crate) fn sub_ciphertexts<const DEGREE: usize>(
    lhs: &Ciphertext<DEGREE>,
    rhs: &Ciphertext<DEGREE>,
) -> Result<Ciphertext<DEGREE>, EvalError> {
    check_component_alignment("sub", lhs, rhs)?;
    let mut c0 = lhs.c0.clone();
    c0 -= &rhs.c0;
    let mut c1 = lhs.c1.clone();
    c1 -= &rhs.c1;
    let c2 = match (&lhs.c2, &rhs.c2) {
        (None, None) => None,
        (Some(l), Some(r)) => {
            let mut diff = l.clone();
            diff -= r;
            Some(diff)
        }
        (Some(l), None) => Some(l.clone()),
        (None, Some(r)) => Some(-r.clone()),
    };
    Ok(Ciphertext {
        c0,
        c1,
        c2,
        level: lhs.level,
        scale: lhs.scale,
    })
}

/// Operand checks shared by every multiply: linear inputs at one level.
pub(crate) fn check_multiply_operands<const DEGREE: usize>(
    lhs: &Ciphertext<DEGREE>,
    rhs: &Ciphertext<DEGREE>,
) -> Result<(), EvalError> {
    if lhs.c2.is_some() || rhs.c2.is_some() {
        return Err(EvalError::RelinearizationRequired { op: "multiply" });
    }
    if lhs.level != rhs.level {
        return Err(EvalError::ScaleMismatch {
            op: "multiply",
            left_level: lhs.level,
            right_level: rhs.level,
            left_scale: lhs.scale,
            right_scale: rhs.scale,
        });
    }
    Ok(())
}

/// (c0*c0', c0*c1' + c1*c0', c1*c1') at the operands' modulus.
pub(crate) fn tensor_components<const DEGREE: usize>(
    lhs: &Ciphertext<DEGREE>,
    rhs: &Ciphertext<DEGREE>,
) -> (RingPoly<DEGREE>, RingPoly<DEGREE>, RingPoly<DEGREE>) {
    let mut d0 = lhs.c0.clone();
    d0 *= &rhs.c0;

    let mut d1 = lhs.c0.clone();
    d1 *= &rhs.c1;
    let mut cross = lhs.c1.clone();
    cross *= &rhs.c0;
    d1 += &cross;

    let mut d2 = lhs.c1.clone();
    d2 *= &rhs.c1;

    (d0, d1, d2)
}

pub(crate) fn relinearize_ciphertext<const DEGREE: usize>(
    relin_key: &RelinearizationKey<DEGREE>,
    ciphertext: &Ciphertext<DEGREE>,
) -> Ciphertext<DEGREE> {
    match &ciphertext.c2 {
        None => ciphertext.clone(),
        Some(c2) => {
            let (fold_b, fold_a) = relin_key.apply(c2);
            let mut c0 = ciphertext.c0.clone();
            c0 += &fold_b;
            let mut c1 = ciphertext.c1.clone();
            c1 += &fold_a;
            Ciphertext {
                c0,
                c1,
                c2: None,
                level: ciphertext.level,
                scale: ciphertext.scale,
            }
        }
    }
}

/// c0 + c1*s (+ c2*s^2) at the ciphertext's level.
pub(crate) fn decrypt_to_poly<const DEGREE: usize>(
    ctx: &Context<DEGREE>,
    secret_key: &SecretKey<DEGREE>,
    ciphertext: &Ciphertext<DEGREE>,
) -> RingPoly<DEGREE> {
    let s = secret_key.at_level(ctx, ciphertext.level);
    let mut w = ciphertext.c1.clone();
    w *= &s;
    w += &ciphertext.c0;
    if let Some(c2) = &ciphertext.c2 {
        let mut s_squared = s.clone();
        s_squared *= &s;
        let mut term = c2.clone();
        term *= &s_squared;
        w += &term;
    }
    w
}

/// RLWE encryption of `message` under the public key: masks it with
/// (b*u + noise, a*u + noise). `noise_factor` is t for the scheme that keeps
/// its noise in multiples of t, 1 otherwise.
pub(crate) fn encrypt_message<const DEGREE: usize, R: Rng + ?Sized>(
    ctx: &Context<DEGREE>,
    public_key: &PublicKey<DEGREE>,
    message: &RingPoly<DEGREE>,
    noise_factor: u64,
    rng: &mut R,
) -> (RingPoly<DEGREE>, RingPoly<DEGREE>) {
    let q = ctx.top_modulus();
    let u = RingPoly::sample_ternary(ctx.hamming_weight(), q, rng);
    let mut e0 = RingPoly::sample_gaussian(ctx.error_std_dev(), q, rng);
    let mut e1 = RingPoly::sample_gaussian(ctx.error_std_dev(), q, rng);
    if noise_factor != 1 {
        e0.scale_by_u64(noise_factor);
        e1.scale_by_u64(noise_factor);
    }

    let mut c0 = public_key.b.clone();
    c0 *= &u;
    c0 += &e0;
    c0 += message;

    let mut c1 = public_key.a.clone();
    c1 *= &u;
    c1 += &e1;

    (c0, c1)
}

/// Element-wise (y * (x + z)) mod t.
pub(crate) fn reference_exact(t: u64, x: &[u64], y: &[u64], z: &[u64]) -> Vec<u64> {
    x.iter()
        .zip(y.iter())
        .zip(z.iter())
        .map(|((&x, &y), &z)| mul_mod(y % t, (x % t + z % t) % t, t))
        .collect()
}

/// Element-wise y * (x + z) over floats.
pub(crate) fn reference_approx(x: &[f64], y: &[f64], z: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(y.iter())
        .zip(z.iter())
        .map(|((&x, &y), &z)| y * (x + z))
        .collect()
}

/// Relative comparison with a floor of 1 so near-zero references do not blow
/// the ratio up.
pub(crate) fn verify_approx(computed: &[f64], reference: &[f64], tolerance: f64) -> bool {
    computed.len() == reference.len()
        && computed
            .iter()
            .zip(reference.iter())
            .all(|(&c, &r)| (c - r).abs() <= tolerance * r.abs().max(1.0))
}
