//! Rotation keys: switch keys for Galois images of the secret.
//!
//! Rotating packed slots by r steps applies the automorphism X -> X^g with
//! g = 3^r mod 2N to every ciphertext component. The result decrypts under
//! s(X^g), so each supported step needs a switch key mapping s(X^g) back to
//! s. Keys are generated per requested step; evaluation never consumes one
//! implicitly.

use crate::context::Context;
use crate::keys::common::KeySwitchKey;
use crate::keys::SecretKey;
use crate::math::primes::mod_pow;
use rand::Rng;
use std::collections::HashMap;

/// Galois element for a left rotation by `step` slots.
pub fn galois_element(step: usize, degree: usize) -> usize {
    let exponent = (step % (degree / 2)) as u64;
    mod_pow(3, exponent, 2 * degree as u64) as usize
}

#[derive(Debug, Clone)]
pub struct RotationKeySet<const DEGREE: usize> {
    keys: HashMap<usize, KeySwitchKey<DEGREE>>,
}

impl<const DEGREE: usize> RotationKeySet<DEGREE> {
    pub fn generate<R: Rng + ?Sized>(
        secret_key: &SecretKey<DEGREE>,
        ctx: &Context<DEGREE>,
        steps: &[usize],
        rng: &mut R,
    ) -> Self {
        let mut keys = HashMap::new();
        for &step in steps {
            let g = galois_element(step, DEGREE);
            let rotated_secret = secret_key.s.automorphism(g);
            let ksk = KeySwitchKey::generate(&rotated_secret, secret_key, ctx, rng);
            keys.insert(step, ksk);
        }
        Self { keys }
    }

    pub fn supports(&self, step: usize) -> bool {
        self.keys.contains_key(&step)
    }

    pub fn steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys.keys().copied()
    }

    pub fn key_for(&self, step: usize) -> Option<&KeySwitchKey<DEGREE>> {
        self.keys.get(&step)
    }
}
