//! Scheme parameters and their feasibility rules.

use crate::errors::ParameterError;
use crate::math::primes::is_batching_prime;

/// Numeric model a backend computes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericModel {
    /// Exact modular integers.
    Exact,
    /// Approximate fixed-point reals with a tracked scale.
    Approximate,
}

/// The three interchangeable scheme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Exact, scale-invariant encoding (plaintext carried as floor(q/t)*m).
    Bfv,
    /// Exact, least-significant-digit encoding (noise carried as t*e).
    Bgv,
    /// Approximate fixed-point with per-ciphertext scale and level.
    Ckks,
}

impl Scheme {
    pub fn numeric_model(self) -> NumericModel {
        match self {
            Scheme::Bfv | Scheme::Bgv => NumericModel::Exact,
            Scheme::Ckks => NumericModel::Approximate,
        }
    }
}

/// Homomorphic-encryption standard security target.
///
/// `None` disables the lattice-security check entirely and exists for toy
/// ring degrees in tests and walk-throughs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    None,
    Bits128,
    Bits192,
    Bits256,
}

impl SecurityLevel {
    pub fn bits(self) -> u32 {
        match self {
            SecurityLevel::None => 0,
            SecurityLevel::Bits128 => 128,
            SecurityLevel::Bits192 => 192,
            SecurityLevel::Bits256 => 256,
        }
    }

    /// Maximum total coefficient-modulus bits for a classical attacker, per
    /// the homomorphic encryption standard tables. `None` when the degree is
    /// below the smallest standardized row.
    pub fn max_total_bits(self, degree: usize) -> Option<u32> {
        let row = match degree {
            1024 => [27, 19, 14],
            2048 => [54, 37, 29],
            4096 => [109, 75, 58],
            8192 => [218, 152, 118],
            16384 => [438, 305, 237],
            32768 => [881, 611, 476],
            d if d > 32768 => return Some(u32::MAX),
            _ => return None,
        };
        match self {
            SecurityLevel::None => Some(u32::MAX),
            SecurityLevel::Bits128 => Some(row[0]),
            SecurityLevel::Bits192 => Some(row[1]),
            SecurityLevel::Bits256 => Some(row[2]),
        }
    }
}

/// Everything a context is built from. Immutable once validated.
#[derive(Debug, Clone)]
pub struct SchemeParameters<const DEGREE: usize> {
    pub scheme: Scheme,
    /// Number of scale primes above the base modulus; one multiplication
    /// level each for the approximate model.
    pub depth: usize,
    pub security: SecurityLevel,
    /// Plaintext modulus for the exact model. Ignored by Ckks.
    pub plain_modulus: u64,
    /// Bits per scale prime, and the default encoding scale exponent for the
    /// approximate model.
    pub scale_bits: u32,
    /// Bits of the base modulus at the bottom of the chain.
    pub base_bits: u32,
    pub error_std_dev: f64,
    pub hamming_weight: usize,
}

/// Coefficient budget of the shared 256-bit backing integer, with margin for
/// the key-switching digit ladder.
const COEFF_BUDGET_BITS: u32 = 250;

impl<const DEGREE: usize> SchemeParameters<DEGREE> {
    pub fn builder(scheme: Scheme) -> ParamsBuilder<DEGREE> {
        ParamsBuilder::new(scheme)
    }

    pub fn numeric_model(&self) -> NumericModel {
        self.scheme.numeric_model()
    }

    /// Logical values one packed plaintext can hold.
    pub fn slot_capacity(&self) -> usize {
        match self.numeric_model() {
            NumericModel::Exact => DEGREE,
            NumericModel::Approximate => DEGREE / 2,
        }
    }

    /// Total bits of the full modulus chain.
    pub fn chain_total_bits(&self) -> u32 {
        self.base_bits + self.depth as u32 * self.scale_bits
    }

    /// Scheme-specific cap on the chain size.
    ///
    /// The scale-invariant multiply lifts a tensor product into an auxiliary
    /// modulus of roughly 2|q| + log2(DEGREE) bits and then multiplies by the
    /// plaintext modulus, so Bfv must leave room for all of that inside the
    /// backing integer. The other schemes only ever square up to |q| plus the
    /// digit ladder.
    fn chain_limit_bits(&self) -> u32 {
        match self.scheme {
            Scheme::Bfv => {
                let log_n = DEGREE.trailing_zeros();
                let t_bits = 64 - self.plain_modulus.leading_zeros();
                (253 - log_n.min(32) - t_bits.min(64)) / 2
            }
            Scheme::Bgv | Scheme::Ckks => COEFF_BUDGET_BITS,
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        if !DEGREE.is_power_of_two() || DEGREE < 4 {
            return Err(ParameterError::InvalidRingDegree { degree: DEGREE });
        }
        if !self.error_std_dev.is_finite() || self.error_std_dev <= 0.0 {
            return Err(ParameterError::InvalidErrorStdDev {
                sigma: self.error_std_dev,
            });
        }
        if self.hamming_weight == 0 || self.hamming_weight > DEGREE {
            return Err(ParameterError::InvalidHammingWeight {
                weight: self.hamming_weight,
                degree: DEGREE,
            });
        }
        if self.base_bits < 30 || self.base_bits > 62 {
            return Err(ParameterError::ScaleBitsOutOfRange {
                bits: self.base_bits,
                min: 30,
                max: 62,
            });
        }
        let (min_scale, max_scale) = match self.numeric_model() {
            NumericModel::Exact => (2, 60),
            NumericModel::Approximate => (10, 60),
        };
        if self.scale_bits < min_scale || self.scale_bits > max_scale {
            return Err(ParameterError::ScaleBitsOutOfRange {
                bits: self.scale_bits,
                min: min_scale,
                max: max_scale,
            });
        }
        if self.numeric_model() == NumericModel::Approximate
            && self.scale_bits >= self.base_bits
        {
            // No decrypt headroom left above the scale.
            return Err(ParameterError::ScaleBitsOutOfRange {
                bits: self.scale_bits,
                min: min_scale,
                max: self.base_bits - 1,
            });
        }
        if self.numeric_model() == NumericModel::Exact {
            let congruence = 2 * DEGREE as u64;
            if !is_batching_prime(self.plain_modulus, DEGREE as u64) {
                return Err(ParameterError::PlainModulusNotBatching {
                    modulus: self.plain_modulus,
                    congruence,
                    degree: DEGREE,
                });
            }
        }

        let total_bits = self.chain_total_bits();
        let limit_bits = self.chain_limit_bits();
        if total_bits > limit_bits {
            return Err(ParameterError::ChainTooDeep {
                base_bits: self.base_bits,
                scale_bits: self.scale_bits,
                depth: self.depth,
                total_bits,
                limit_bits,
            });
        }

        if self.security != SecurityLevel::None {
            let cap = self.security.max_total_bits(DEGREE).ok_or(
                ParameterError::DegreeTooSmallForSecurity {
                    degree: DEGREE,
                    security_bits: self.security.bits(),
                },
            )?;
            if total_bits > cap {
                return Err(ParameterError::SecurityBudgetExceeded {
                    total_bits,
                    limit_bits: cap,
                    security_bits: self.security.bits(),
                    degree: DEGREE,
                });
            }
        }
        Ok(())
    }
}

/// Fluent construction with per-scheme defaults.
pub struct ParamsBuilder<const DEGREE: usize> {
    params: SchemeParameters<DEGREE>,
}

impl<const DEGREE: usize> ParamsBuilder<DEGREE> {
    pub fn new(scheme: Scheme) -> Self {
        let (plain_modulus, scale_bits) = match scheme {
            Scheme::Bfv => (65537, 20),
            Scheme::Bgv => (40961, 20),
            Scheme::Ckks => (0, 40),
        };
        Self {
            params: SchemeParameters {
                scheme,
                depth: 2,
                security: SecurityLevel::None,
                plain_modulus,
                scale_bits,
                base_bits: 60,
                error_std_dev: 3.2,
                hamming_weight: (DEGREE / 2).max(1),
            },
        }
    }

    pub fn depth(mut self, depth: usize) -> Self {
        self.params.depth = depth;
        self
    }

    pub fn security(mut self, security: SecurityLevel) -> Self {
        self.params.security = security;
        self
    }

    pub fn plain_modulus(mut self, plain_modulus: u64) -> Self {
        self.params.plain_modulus = plain_modulus;
        self
    }

    pub fn scale_bits(mut self, scale_bits: u32) -> Self {
        self.params.scale_bits = scale_bits;
        self
    }

    pub fn base_bits(mut self, base_bits: u32) -> Self {
        self.params.base_bits = base_bits;
        self
    }

    pub fn error_std_dev(mut self, sigma: f64) -> Self {
        self.params.error_std_dev = sigma;
        self
    }

    pub fn hamming_weight(mut self, weight: usize) -> Self {
        self.params.hamming_weight = weight;
        self
    }

    pub fn build(self) -> Result<SchemeParameters<DEGREE>, ParameterError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
