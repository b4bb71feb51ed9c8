//! Approximate evaluation of e = y * (x + z), exercising the split branch
//! topology: x*y and z*y computed independently, rescaled, snapped to the
//! canonical scale, level-aligned, and only then added.
//!
//! Run with: cargo run --example approx_ckks

use he_eval_core::{Scheme, SchemeParameters, Topology, run_pipeline};
use he_eval_core::backend::CkksBackend;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const DEGREE: usize = 16;
const TOLERANCE: f64 = 1e-3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Approximate model, scale = 2^40, depth 2");

    let params = SchemeParameters::<DEGREE>::builder(Scheme::Ckks)
        .depth(2)
        .scale_bits(40)
        .build()?;
    let slots = params.slot_capacity();
    let mut rng = ChaCha20Rng::seed_from_u64(31415);

    let x: Vec<f64> = (0..slots).map(|_| rng.random_range(0.0..50.0)).collect();
    let y: Vec<f64> = (0..slots).map(|_| rng.random_range(0.0..50.0)).collect();
    let z: Vec<f64> = (0..slots).map(|_| rng.random_range(0.0..50.0)).collect();
    println!("📊 {slots} slots of reals in [0, 50)");

    for topology in [Topology::Fused, Topology::Split] {
        println!("\n▶️  topology: {topology:?}");
        let report = run_pipeline::<DEGREE, CkksBackend, _>(
            params.clone(),
            &x,
            &y,
            &z,
            topology,
            TOLERANCE,
            &mut rng,
        )?;

        let max_rel = report
            .computed
            .iter()
            .zip(report.reference.iter())
            .map(|(c, r)| (c - r).abs() / r.abs().max(1.0))
            .fold(0.0f64, f64::max);
        println!("   slot 0: {:.6} vs {:.6}", report.computed[0], report.reference[0]);
        println!("   max relative error: {max_rel:.3e}");
        println!(
            "   within {TOLERANCE:.0e}: {}",
            if report.verified { "✅" } else { "❌" }
        );

        let t = report.timings;
        println!("   ⏱️  evaluate {:?}, total {:?}", t.evaluate, t.total());
    }

    Ok(())
}
