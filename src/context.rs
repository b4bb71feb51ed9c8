//! Context construction: the modulus chain and the slot transform tables.

use crate::encoding::batch::BatchTables;
use crate::errors::ParameterError;
use crate::math::primes::{get_first_prime_down, get_first_prime_up};
use crate::params::{NumericModel, Scheme, SchemeParameters};
use crypto_bigint::{NonZero, U256};

/// The ladder of coefficient moduli q_0 < q_1 < ... < q_depth.
///
/// Level l uses q_l = base * p_1 * ... * p_l. Rescaling from level l divides
/// out p_l and descends to l-1; level alignment reduces into the smaller
/// modulus directly.
#[derive(Debug, Clone)]
pub struct ModulusChain {
    base_prime: u64,
    scale_primes: Vec<u64>,
    level_moduli: Vec<NonZero<U256>>,
}

impl ModulusChain {
    fn build<const DEGREE: usize>(
        params: &SchemeParameters<DEGREE>,
    ) -> Result<Self, ParameterError> {
        let n = DEGREE as u64;
        let mut base_prime = get_first_prime_up(params.base_bits, n);
        // The plaintext modulus must stay coprime to the chain.
        while base_prime == params.plain_modulus {
            base_prime = get_first_prime_up(params.base_bits + 1, n);
        }

        let mut scale_primes = Vec::with_capacity(params.depth);
        let mut cursor = get_first_prime_up(params.scale_bits, n);
        while scale_primes.len() < params.depth {
            if cursor != params.plain_modulus && cursor != base_prime {
                scale_primes.push(cursor);
            }
            if scale_primes.len() == params.depth {
                break;
            }
            cursor = get_first_prime_down(cursor, n).ok_or(
                ParameterError::ScalePrimesUnavailable {
                    needed: params.depth,
                    bits: params.scale_bits,
                    degree: DEGREE,
                },
            )?;
        }

        let mut level_moduli = Vec::with_capacity(params.depth + 1);
        let mut acc = U256::from(base_prime);
        level_moduli.push(NonZero::new(acc).expect("base prime is nonzero"));
        for &p in &scale_primes {
            acc = acc.saturating_mul(&U256::from(p));
            level_moduli.push(NonZero::new(acc).expect("chain product is nonzero"));
        }

        Ok(Self {
            base_prime,
            scale_primes,
            level_moduli,
        })
    }

    pub fn base_prime(&self) -> u64 {
        self.base_prime
    }

    /// Scale prime divided out when rescaling from `level`.
    pub fn scale_prime(&self, level: usize) -> u64 {
        assert!(level >= 1, "level 0 has no scale prime");
        self.scale_primes[level - 1]
    }

    pub fn modulus_at(&self, level: usize) -> NonZero<U256> {
        self.level_moduli[level]
    }

    pub fn top_level(&self) -> usize {
        self.level_moduli.len() - 1
    }
}

/// Process-wide handle for one parameter set. Owns the modulus chain and the
/// packing transform tables; keys and ciphertexts are only meaningful against
/// the context that produced them.
#[derive(Debug, Clone)]
pub struct Context<const DEGREE: usize> {
    params: SchemeParameters<DEGREE>,
    chain: ModulusChain,
    batch: Option<BatchTables>,
}

/// Validates `params` and derives the chain and transform tables.
pub fn build_context<const DEGREE: usize>(
    params: SchemeParameters<DEGREE>,
) -> Result<Context<DEGREE>, ParameterError> {
    params.validate()?;
    let chain = ModulusChain::build(&params)?;
    let batch = match params.numeric_model() {
        NumericModel::Exact => {
            Some(BatchTables::new(params.plain_modulus, DEGREE))
        }
        NumericModel::Approximate => None,
    };
    Ok(Context {
        params,
        chain,
        batch,
    })
}

impl<const DEGREE: usize> Context<DEGREE> {
    pub fn params(&self) -> &SchemeParameters<DEGREE> {
        &self.params
    }

    pub fn scheme(&self) -> Scheme {
        self.params.scheme
    }

    pub fn numeric_model(&self) -> NumericModel {
        self.params.numeric_model()
    }

    pub fn slot_capacity(&self) -> usize {
        self.params.slot_capacity()
    }

    pub fn chain(&self) -> &ModulusChain {
        &self.chain
    }

    pub fn top_level(&self) -> usize {
        self.chain.top_level()
    }

    pub fn top_modulus(&self) -> NonZero<U256> {
        self.chain.modulus_at(self.chain.top_level())
    }

    pub fn modulus_at(&self, level: usize) -> NonZero<U256> {
        self.chain.modulus_at(level)
    }

    pub fn plain_modulus(&self) -> u64 {
        self.params.plain_modulus
    }

    /// Default encoding scale for the approximate model.
    pub fn default_scale(&self) -> f64 {
        2f64.powi(self.params.scale_bits as i32)
    }

    pub fn error_std_dev(&self) -> f64 {
        self.params.error_std_dev
    }

    pub fn hamming_weight(&self) -> usize {
        self.params.hamming_weight
    }

    pub(crate) fn batch_tables(&self) -> &BatchTables {
        self.batch
            .as_ref()
            .expect("exact-model context always builds batch tables")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SecurityLevel;
    use crate::rings::bit_len;

    #[test]
    fn chain_moduli_grow_by_one_prime_per_level() {
        let params = SchemeParameters::<16>::builder(Scheme::Ckks)
            .depth(3)
            .build()
            .unwrap();
        let ctx = build_context(params).unwrap();
        assert_eq!(ctx.top_level(), 3);

        for level in 1..=3 {
            let below = ctx.modulus_at(level - 1).get();
            let here = ctx.modulus_at(level).get();
            let p = U256::from(ctx.chain().scale_prime(level));
            assert_eq!(below.saturating_mul(&p), here);
        }
    }

    #[test]
    fn scale_primes_are_distinct_and_near_target() {
        let params = SchemeParameters::<16>::builder(Scheme::Ckks)
            .depth(3)
            .scale_bits(40)
            .build()
            .unwrap();
        let ctx = build_context(params).unwrap();
        let mut seen = Vec::new();
        for level in 1..=3 {
            let p = ctx.chain().scale_prime(level);
            assert!(!seen.contains(&p), "duplicate chain prime {p}");
            let bits = 64 - p.leading_zeros();
            assert!((40..=42).contains(&bits), "prime {p} far from 2^40");
            seen.push(p);
        }
    }

    #[test]
    fn chain_avoids_the_plaintext_modulus() {
        // Scale primes at 16 bits would otherwise pick up 65537 itself.
        let params = SchemeParameters::<16>::builder(Scheme::Bfv)
            .scale_bits(16)
            .build()
            .unwrap();
        let ctx = build_context(params).unwrap();
        for level in 1..=ctx.top_level() {
            assert_ne!(ctx.chain().scale_prime(level), 65537);
        }
    }

    #[test]
    fn exact_context_builds_batch_tables() {
        let params = SchemeParameters::<16>::builder(Scheme::Bgv)
            .build()
            .unwrap();
        let ctx = build_context(params).unwrap();
        assert_eq!(ctx.batch_tables().plain_modulus(), 40961);
    }

    #[test]
    fn top_modulus_matches_requested_bit_sizes() {
        let params = SchemeParameters::<16>::builder(Scheme::Ckks)
            .depth(2)
            .base_bits(60)
            .scale_bits(40)
            .build()
            .unwrap();
        let ctx = build_context(params).unwrap();
        let total = bit_len(&ctx.top_modulus().get());
        assert!((140..=145).contains(&total), "got {total} bits");
    }

    #[test]
    fn invalid_params_are_rejected_before_chain_construction() {
        let params = SchemeParameters::<4096> {
            scheme: Scheme::Ckks,
            depth: 2,
            security: SecurityLevel::Bits128,
            plain_modulus: 0,
            scale_bits: 40,
            base_bits: 60,
            error_std_dev: 3.2,
            hamming_weight: 2048,
        };
        assert!(build_context(params).is_err());
    }
}
