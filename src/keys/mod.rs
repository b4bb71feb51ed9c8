pub mod common;
pub mod public_key;
pub mod relin_key;
pub mod rotation_key;
pub mod secret_key;

pub use common::KeySwitchKey;
pub use public_key::PublicKey;
pub use relin_key::RelinearizationKey;
pub use rotation_key::{RotationKeySet, galois_element};
pub use secret_key::SecretKey;

use crate::context::Context;
use rand::Rng;

/// Everything one party needs to run an evaluation end to end.
#[derive(Debug, Clone)]
pub struct KeyBundle<const DEGREE: usize> {
    pub public: PublicKey<DEGREE>,
    pub secret: SecretKey<DEGREE>,
    pub relin: RelinearizationKey<DEGREE>,
    pub rotation: Option<RotationKeySet<DEGREE>>,
}

/// Samples a fresh secret key and derives the public and relinearization
/// keys from it.
pub fn generate_keys<const DEGREE: usize, R: Rng + ?Sized>(
    ctx: &Context<DEGREE>,
    rng: &mut R,
) -> KeyBundle<DEGREE> {
    let secret = SecretKey::generate(ctx, rng);
    let public = PublicKey::generate(&secret, ctx, rng);
    let relin = RelinearizationKey::generate(&secret, ctx, rng);
    KeyBundle {
        public,
        secret,
        relin,
        rotation: None,
    }
}

/// Like [`generate_keys`], with rotation keys for the given slot steps.
pub fn generate_keys_with_rotations<const DEGREE: usize, R: Rng + ?Sized>(
    ctx: &Context<DEGREE>,
    steps: &[usize],
    rng: &mut R,
) -> KeyBundle<DEGREE> {
    let mut bundle = generate_keys(ctx, rng);
    bundle.rotation = Some(RotationKeySet::generate(&bundle.secret, ctx, steps, rng));
    bundle
}
