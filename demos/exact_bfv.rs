//! Exact evaluation of e = y * (x + z) with the scale-up scheme.
//!
//! Run with: cargo run --example exact_bfv

use he_eval_core::{Scheme, SchemeParameters, Topology, run_pipeline};
use he_eval_core::backend::BfvBackend;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

const DEGREE: usize = 8;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔐 Exact model, scale-up scheme, t = 65537");

    let params = SchemeParameters::<DEGREE>::builder(Scheme::Bfv)
        .plain_modulus(65537)
        .build()?;
    println!(
        "✅ Parameters: degree {DEGREE}, chain {} bits",
        params.chain_total_bits()
    );

    let x = vec![1u64, 2, 3, 4, 5, 6, 7, 8];
    let y = vec![10u64, 14, 24, 23, 18, 9, 13, 7];
    let z = vec![1u64, 2, 3, 2, 1, 2, 1, 2];
    println!("📊 x = {x:?}");
    println!("📊 y = {y:?}");
    println!("📊 z = {z:?}");

    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let report =
        run_pipeline::<DEGREE, BfvBackend, _>(params, &x, &y, &z, Topology::Fused, 0.0, &mut rng)?;

    println!("\n🔓 e = y * (x + z) decrypted: {:?}", report.computed);
    println!("   cleartext reference:       {:?}", report.reference);
    println!(
        "   bit-exact match: {}",
        if report.verified { "✅" } else { "❌" }
    );

    if let (Some(fresh), Some(after)) = (report.budget_after_encrypt, report.budget_after_eval) {
        println!("\n🔋 noise budget: {fresh} bits fresh, {after} bits after evaluation");
    }

    let t = report.timings;
    println!("\n⏱️  context  {:?}", t.context);
    println!("⏱️  keygen   {:?}", t.keygen);
    println!("⏱️  encrypt  {:?}", t.encrypt);
    println!("⏱️  evaluate {:?}", t.evaluate);
    println!("⏱️  decrypt  {:?}", t.decrypt);
    println!("⏱️  total    {:?}", t.total());

    Ok(())
}
