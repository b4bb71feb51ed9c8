//! Public key: one RLWE sample under the secret key.
//!
//! The noise term is what hides the secret. In the exact schemes the message
//! has to survive around it, so the two schemes place it differently: the
//! scale-up scheme keeps plain Gaussian noise and moves the message to the
//! high bits, the modulus-reduction scheme multiplies the noise by t so the
//! message stays intact in the low bits.

use crate::context::Context;
use crate::keys::SecretKey;
use crate::params::Scheme;
use crate::rings::RingPoly;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct PublicKey<const DEGREE: usize> {
    /// "b" component: b = -(a * s) + noise
    pub b: RingPoly<DEGREE>,
    /// "a" component: uniformly random
    pub a: RingPoly<DEGREE>,
}

impl<const DEGREE: usize> PublicKey<DEGREE> {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey<DEGREE>,
        ctx: &Context<DEGREE>,
        rng: &mut R,
    ) -> Self {
        let q = ctx.top_modulus();
        let a = RingPoly::sample_uniform(q, rng);
        let mut e = RingPoly::sample_gaussian(ctx.error_std_dev(), q, rng);
        if ctx.scheme() == Scheme::Bgv {
            e.scale_by_u64(ctx.plain_modulus());
        }

        let mut a_times_s = a.clone();
        a_times_s *= &secret_key.s;

        let mut b = -a_times_s;
        b += &e;

        PublicKey { b, a }
    }
}
