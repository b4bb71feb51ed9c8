//! Secret key: a sparse ternary polynomial s(X).
//!
//! Coefficients come from {-1, 0, 1} with a fixed Hamming weight. The key is
//! sampled at the top chain modulus; reductions to lower levels keep every
//! coefficient's centered value because each level modulus divides the top.

use crate::context::Context;
use crate::rings::RingPoly;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct SecretKey<const DEGREE: usize> {
    pub s: RingPoly<DEGREE>,
}

impl<const DEGREE: usize> SecretKey<DEGREE> {
    pub fn generate<R: Rng + ?Sized>(ctx: &Context<DEGREE>, rng: &mut R) -> Self {
        let s = RingPoly::sample_ternary(ctx.hamming_weight(), ctx.top_modulus(), rng);
        SecretKey { s }
    }

    /// Secret reduced to the modulus of `level`.
    pub(crate) fn at_level(&self, ctx: &Context<DEGREE>, level: usize) -> RingPoly<DEGREE> {
        self.s.reduce_to(ctx.modulus_at(level))
    }
}
