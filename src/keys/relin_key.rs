//! Relinearization key: a switch key for s^2.
//!
//! Multiplying two ciphertexts leaves a degree-2 component riding on s^2.
//! The relinearization key ladder satisfies b_i + a_i * s = B^i * s^2 + noise,
//! which lets the c2 term fold back into a (c0, c1) pair.

use crate::context::Context;
use crate::keys::common::KeySwitchKey;
use crate::keys::SecretKey;
use crate::rings::RingPoly;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct RelinearizationKey<const DEGREE: usize> {
    switch: KeySwitchKey<DEGREE>,
}

impl<const DEGREE: usize> RelinearizationKey<DEGREE> {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey<DEGREE>,
        ctx: &Context<DEGREE>,
        rng: &mut R,
    ) -> Self {
        let mut s_squared = secret_key.s.clone();
        s_squared *= &secret_key.s;
        let switch = KeySwitchKey::generate(&s_squared, secret_key, ctx, rng);
        Self { switch }
    }

    /// Folds `c2 * s^2` into a (b, a) pair at c2's modulus.
    pub(crate) fn apply(
        &self,
        c2: &RingPoly<DEGREE>,
    ) -> (RingPoly<DEGREE>, RingPoly<DEGREE>) {
        self.switch.apply(c2)
    }
}
