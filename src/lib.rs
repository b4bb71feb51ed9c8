//! Homomorphic evaluation of e = y * (x + z) over packed vectors, under
//! three interchangeable scheme variants: two exact modular-integer schemes
//! and one approximate fixed-point scheme.
//!
//! The moving parts, in pipeline order:
//!
//! - [`params::SchemeParameters`] and [`context::build_context`] pick the
//!   modulus chain and slot layout, rejecting infeasible combinations.
//! - [`keys::generate_keys`] samples the secret, public, and
//!   relinearization keys for one run.
//! - Each backend in [`backend`] packs, encrypts, and exposes the
//!   homomorphic operations with their own bookkeeping rules.
//! - [`evaluate::evaluate`] runs the expression in either branch topology,
//!   keeping intermediate ciphertexts combinable.
//! - [`pipeline::run_pipeline`] drives the whole sequence and reports
//!   per-phase timings upward.
//!
//! The ring arithmetic is deliberately plain: one big-integer coefficient
//! polynomial type with schoolbook negacyclic multiplication. Degrees are
//! const generic, so a toy degree-8 ring and a degree-8192 ring share all
//! code.

pub mod backend;
pub mod context;
pub mod encoding;
pub mod errors;
pub mod evaluate;
pub mod keys;
pub mod math;
pub mod packing;
pub mod params;
pub mod pipeline;
pub mod rings;

pub use backend::{BfvBackend, BgvBackend, Ciphertext, CkksBackend, SchemeBackend};
pub use context::{Context, ModulusChain, build_context};
pub use errors::{CapacityError, EvalError, HeError, ParameterError};
pub use evaluate::{Topology, evaluate};
pub use keys::{KeyBundle, generate_keys, generate_keys_with_rotations};
pub use packing::PackedPlaintext;
pub use params::{NumericModel, Scheme, SchemeParameters, SecurityLevel};
pub use pipeline::{PhaseTimings, PipelineReport, run_pipeline};
pub use rings::RingPoly;
