//! Packed plaintext vectors.
//!
//! A slot vector is stored as a single ring element together with the
//! metadata needed to invert the packing: the scale baked into the
//! coefficients, the live slot count, and the chain level whose modulus the
//! polynomial is reduced by. The same type carries both freshly packed
//! inputs and decryption results.

use crate::context::Context;
use crate::encoding::canonical;
use crate::errors::CapacityError;
use crate::rings::RingPoly;

#[derive(Debug, Clone)]
pub struct PackedPlaintext<const DEGREE: usize> {
    pub(crate) poly: RingPoly<DEGREE>,
    pub(crate) scale: f64,
    pub(crate) slots: usize,
    pub(crate) level: usize,
}

impl<const DEGREE: usize> PackedPlaintext<DEGREE> {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn level(&self) -> usize {
        self.level
    }
}

fn check_capacity(requested: usize, capacity: usize) -> Result<(), CapacityError> {
    if requested > capacity {
        return Err(CapacityError {
            requested,
            capacity,
        });
    }
    Ok(())
}

/// Batch-encodes integers mod t. Coefficients stay in [0, t); the encrypt
/// step decides how they enter the ciphertext.
pub(crate) fn pack_exact<const DEGREE: usize>(
    ctx: &Context<DEGREE>,
    values: &[u64],
) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
    check_capacity(values.len(), ctx.slot_capacity())?;
    let residues = ctx.batch_tables().encode(values);
    Ok(PackedPlaintext {
        poly: RingPoly::from_residues(&residues, ctx.top_modulus()),
        scale: 1.0,
        slots: values.len(),
        level: ctx.top_level(),
    })
}

pub(crate) fn unpack_exact<const DEGREE: usize>(
    ctx: &Context<DEGREE>,
    plaintext: &PackedPlaintext<DEGREE>,
) -> Vec<u64> {
    let residues: Vec<u64> = plaintext
        .poly
        .coeffs
        .iter()
        .map(|c| c.as_words()[0])
        .collect();
    let mut slots = ctx.batch_tables().decode(&residues);
    slots.truncate(plaintext.slots);
    slots
}

/// Embeds reals at the context's default scale.
pub(crate) fn pack_approx<const DEGREE: usize>(
    ctx: &Context<DEGREE>,
    values: &[f64],
) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
    pack_approx_at(ctx, values, ctx.default_scale())
}

/// Embeds reals at an explicit scale. The scale is recorded in the plaintext
/// so the decode path divides out exactly what was baked in.
pub(crate) fn pack_approx_at<const DEGREE: usize>(
    ctx: &Context<DEGREE>,
    values: &[f64],
    scale: f64,
) -> Result<PackedPlaintext<DEGREE>, CapacityError> {
    check_capacity(values.len(), ctx.slot_capacity())?;
    let coeffs = canonical::encode::<DEGREE>(values, scale);
    Ok(PackedPlaintext {
        poly: RingPoly::from_signed(&coeffs, ctx.top_modulus()),
        scale,
        slots: values.len(),
        level: ctx.top_level(),
    })
}

pub(crate) fn unpack_approx<const DEGREE: usize>(
    plaintext: &PackedPlaintext<DEGREE>,
) -> Vec<f64> {
    let centered = plaintext.poly.to_f64_centered();
    canonical::decode::<DEGREE>(&centered, plaintext.scale, plaintext.slots)
}
