//! Homomorphic evaluation of e = y * (x + z).
//!
//! Two branch topologies compute the same expression. The fused form adds
//! first and pays for a single multiplication; since x and z arrive freshly
//! encrypted at the same level and scale, the add needs no preparation. The
//! split form distributes the multiplication over the sum, which leaves two
//! independent product branches that each carry their own drifted scale and
//! consumed level. Before the final add those branches are snapped to the
//! canonical scale and switched to a common level; the backend's add then
//! accepts them. On the exact model the extra bookkeeping steps are
//! identities and the split form is just the distributed product.
//!
//! Relinearization is not optional in either topology. A product ciphertext
//! has three components, and feeding it to another multiply is refused by the
//! backend, so every multiply here folds back to linear form right away.

use crate::backend::{Ciphertext, SchemeBackend};
use crate::context::Context;
use crate::errors::EvalError;
use crate::keys::KeyBundle;

/// How the multiplication is arranged around the addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// (x + z) first, then one multiply by y.
    #[default]
    Fused,
    /// x*y and z*y as separate branches, realigned and added.
    Split,
}

/// Runs the expression over encrypted operands, keeping every intermediate
/// ciphertext combinable: products are relinearized immediately, and on the
/// approximate model each multiply is followed by a rescale.
///
/// The fused result keeps its true post-rescale scale, which the decode path
/// divides out exactly. Split branches give that up: their scales are reset
/// to the context default so the add sees bit-identical metadata, at a
/// relative error far below the encoding noise.
pub fn evaluate<const DEGREE: usize, B: SchemeBackend<DEGREE>>(
    ctx: &Context<DEGREE>,
    keys: &KeyBundle<DEGREE>,
    enc_x: &Ciphertext<DEGREE>,
    enc_y: &Ciphertext<DEGREE>,
    enc_z: &Ciphertext<DEGREE>,
    topology: Topology,
) -> Result<Ciphertext<DEGREE>, EvalError> {
    match topology {
        Topology::Fused => {
            let sum = B::add(ctx, enc_x, enc_z)?;
            let product = B::multiply(ctx, &sum, enc_y)?;
            let product = B::relinearize(ctx, &keys.relin, &product);
            B::rescale_after_multiply(ctx, product)
        }
        Topology::Split => {
            let xy = product_branch::<DEGREE, B>(ctx, keys, enc_x, enc_y)?;
            let zy = product_branch::<DEGREE, B>(ctx, keys, enc_z, enc_y)?;
            let (xy, zy) = B::align_levels(ctx, xy, zy);
            B::add(ctx, &xy, &zy)
        }
    }
}

/// One multiplicative branch: multiply, relinearize, rescale, snap.
fn product_branch<const DEGREE: usize, B: SchemeBackend<DEGREE>>(
    ctx: &Context<DEGREE>,
    keys: &KeyBundle<DEGREE>,
    lhs: &Ciphertext<DEGREE>,
    rhs: &Ciphertext<DEGREE>,
) -> Result<Ciphertext<DEGREE>, EvalError> {
    let product = B::multiply(ctx, lhs, rhs)?;
    let product = B::relinearize(ctx, &keys.relin, &product);
    let product = B::rescale_after_multiply(ctx, product)?;
    Ok(B::snap_scale(ctx, product))
}
