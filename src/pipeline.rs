//! End-to-end evaluation run with per-phase timings.
//!
//! One run is strictly sequential: context, key generation, pack + encrypt,
//! evaluate, decrypt + unpack, verify. Each phase's elapsed time is recorded
//! and handed back to the caller; nothing here prints. The context and key
//! bundle built for the run are dropped when it returns, so no key material
//! outlives the report.

use crate::backend::SchemeBackend;
use crate::context::build_context;
use crate::errors::HeError;
use crate::evaluate::{Topology, evaluate};
use crate::keys::generate_keys;
use crate::params::SchemeParameters;
use rand::Rng;
use std::time::{Duration, Instant};

/// Wall-clock cost of each phase of one run.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTimings {
    pub context: Duration,
    pub keygen: Duration,
    pub encrypt: Duration,
    pub evaluate: Duration,
    pub decrypt: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.context + self.keygen + self.encrypt + self.evaluate + self.decrypt
    }
}

/// Everything a driver needs to report on one run.
#[derive(Debug, Clone)]
pub struct PipelineReport<V> {
    /// Decoded result vector, truncated to the input length.
    pub computed: Vec<V>,
    /// Cleartext e = y * (x + z) in the backend's value domain.
    pub reference: Vec<V>,
    /// Whether `computed` matches `reference` within `tolerance`.
    pub verified: bool,
    pub timings: PhaseTimings,
    /// Exact model only: worst budget over the three fresh ciphertexts.
    pub budget_after_encrypt: Option<u32>,
    /// Exact model only: budget of the evaluation result.
    pub budget_after_eval: Option<u32>,
}

/// Runs the whole sequence for one input triple.
///
/// `tolerance` is the relative error bound for the approximate model; the
/// exact model ignores it and demands bit equality against the modular
/// reference.
pub fn run_pipeline<const DEGREE: usize, B, R>(
    params: SchemeParameters<DEGREE>,
    x: &[B::Value],
    y: &[B::Value],
    z: &[B::Value],
    topology: Topology,
    tolerance: f64,
    rng: &mut R,
) -> Result<PipelineReport<B::Value>, HeError>
where
    B: SchemeBackend<DEGREE>,
    R: Rng + ?Sized,
{
    let started = Instant::now();
    let ctx = build_context(params)?;
    let context_time = started.elapsed();

    let started = Instant::now();
    let keys = generate_keys(&ctx, rng);
    let keygen_time = started.elapsed();

    let started = Instant::now();
    let pt_x = B::pack(&ctx, x)?;
    let pt_y = B::pack(&ctx, y)?;
    let pt_z = B::pack(&ctx, z)?;
    let enc_x = B::encrypt(&ctx, &keys.public, &pt_x, rng);
    let enc_y = B::encrypt(&ctx, &keys.public, &pt_y, rng);
    let enc_z = B::encrypt(&ctx, &keys.public, &pt_z, rng);
    let encrypt_time = started.elapsed();

    let budget_after_encrypt = [&enc_x, &enc_y, &enc_z]
        .into_iter()
        .filter_map(|ct| B::noise_budget_bits(&ctx, &keys.secret, ct))
        .min();

    let started = Instant::now();
    let result = evaluate::<DEGREE, B>(&ctx, &keys, &enc_x, &enc_y, &enc_z, topology)?;
    let evaluate_time = started.elapsed();

    let budget_after_eval = B::noise_budget_bits(&ctx, &keys.secret, &result);

    let started = Instant::now();
    let mut computed = B::unpack(&ctx, &B::decrypt(&ctx, &keys.secret, &result));
    computed.truncate(x.len());
    let decrypt_time = started.elapsed();

    let reference = B::reference(&ctx, x, y, z);
    let verified = B::verify(&computed, &reference, tolerance);

    Ok(PipelineReport {
        computed,
        reference,
        verified,
        timings: PhaseTimings {
            context: context_time,
            keygen: keygen_time,
            encrypt: encrypt_time,
            evaluate: evaluate_time,
            decrypt: decrypt_time,
        },
        budget_after_encrypt,
        budget_after_eval,
    })
}
