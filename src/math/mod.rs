pub mod primes;
pub mod sampling;

pub use primes::{is_batching_prime, is_prime, mod_pow, mul_mod};
pub use sampling::{gaussian_integers, ternary_coefficients};
