use thiserror::Error;

/// Rejected scheme parameters. Raised by validation before any key material
/// or ciphertext exists.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("ring degree {degree} must be a power of two >= 4")]
    InvalidRingDegree { degree: usize },

    #[error(
        "plaintext modulus {modulus} must be a prime congruent to 1 mod {congruence} \
         to support batching at ring degree {degree}"
    )]
    PlainModulusNotBatching {
        modulus: u64,
        congruence: u64,
        degree: usize,
    },

    #[error("scale bits {bits} outside supported range [{min}, {max}]")]
    ScaleBitsOutOfRange { bits: u32, min: u32, max: u32 },

    #[error(
        "modulus chain of {total_bits} bits (base {base_bits} + {depth} x {scale_bits}) \
         exceeds the {limit_bits}-bit coefficient budget for this scheme"
    )]
    ChainTooDeep {
        base_bits: u32,
        scale_bits: u32,
        depth: usize,
        total_bits: u32,
        limit_bits: u32,
    },

    #[error(
        "modulus chain of {total_bits} bits exceeds the {limit_bits}-bit cap for \
         {security_bits}-bit security at ring degree {degree}"
    )]
    SecurityBudgetExceeded {
        total_bits: u32,
        limit_bits: u32,
        security_bits: u32,
        degree: usize,
    },

    #[error("ring degree {degree} too small for {security_bits}-bit security")]
    DegreeTooSmallForSecurity { degree: usize, security_bits: u32 },

    #[error(
        "could not collect {needed} distinct scale primes of about {bits} bits \
         for ring degree {degree}"
    )]
    ScalePrimesUnavailable {
        needed: usize,
        bits: u32,
        degree: usize,
    },

    #[error("error standard deviation {sigma} must be finite and positive")]
    InvalidErrorStdDev { sigma: f64 },

    #[error("secret key hamming weight {weight} outside [1, {degree}]")]
    InvalidHammingWeight { weight: usize, degree: usize },
}

/// Input vector does not fit the packing layout.
#[derive(Debug, Error)]
#[error("{requested} values exceed the {capacity} available slots")]
pub struct CapacityError {
    pub requested: usize,
    pub capacity: usize,
}

/// Evaluator protocol violations. All of these are fatal for the current run;
/// retrying with the same inputs reproduces the same violation.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("multiplication requested at level 0, modulus chain is exhausted")]
    LevelExhausted,

    #[error("{op} on a degree-2 ciphertext, relinearize first")]
    RelinearizationRequired { op: &'static str },

    #[error(
        "operands are not aligned for {op}: \
         levels {left_level}/{right_level}, scales {left_scale:.4e}/{right_scale:.4e}"
    )]
    ScaleMismatch {
        op: &'static str,
        left_level: usize,
        right_level: usize,
        left_scale: f64,
        right_scale: f64,
    },
}

/// Any failure the evaluation pipeline can surface.
#[derive(Debug, Error)]
pub enum HeError {
    #[error("parameter validation failed: {0}")]
    Parameter(#[from] ParameterError),

    #[error("packing failed: {0}")]
    Capacity(#[from] CapacityError),

    #[error("evaluation failed: {0}")]
    Eval(#[from] EvalError),
}
