//! Slot transform for the exact numeric model.
//!
//! With a plaintext modulus t satisfying t = 1 (mod 2N), the field Z_t contains
//! a primitive 2N-th root of unity gamma, so X^N + 1 splits into N distinct
//! linear factors over Z_t. Evaluating a plaintext polynomial at the N odd
//! powers gamma^(2j+1) is then a ring isomorphism: polynomial multiplication
//! mod (X^N + 1, t) acts slot-wise on the evaluation vector.
//!
//! The transforms here are the O(N^2) evaluation and interpolation with
//! running root powers. Fine for the small degrees this crate targets.

use crate::math::primes::{mod_pow, mul_mod};

/// Precomputed root powers for one (t, N) pair.
#[derive(Debug, Clone)]
pub struct BatchTables {
    plain_modulus: u64,
    /// Primitive 2N-th root of unity mod t.
    root: u64,
    root_inv: u64,
    n_inv: u64,
    degree: usize,
}

fn add_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 + b as u128) % m as u128) as u64
}

impl BatchTables {
    /// Finds a primitive 2N-th root of unity mod t and derives the inverse
    /// tables. Callers must have validated t = 1 (mod 2N) and t prime.
    pub fn new(plain_modulus: u64, degree: usize) -> Self {
        let t = plain_modulus;
        let n = degree as u64;
        assert!(
            (t - 1) % (2 * n) == 0,
            "plaintext modulus {t} does not support degree {degree} batching"
        );

        let exponent = (t - 1) / (2 * n);
        let mut root = 0;
        for candidate in 2..t {
            let gamma = mod_pow(candidate, exponent, t);
            // gamma^N = -1 pins the order at exactly 2N.
            if mod_pow(gamma, n, t) == t - 1 {
                root = gamma;
                break;
            }
        }
        assert!(root != 0, "no primitive 2N-th root mod {t}");

        Self {
            plain_modulus: t,
            root,
            root_inv: mod_pow(root, t - 2, t),
            n_inv: mod_pow(n, t - 2, t),
            degree,
        }
    }

    pub fn plain_modulus(&self) -> u64 {
        self.plain_modulus
    }

    pub fn slot_count(&self) -> usize {
        self.degree
    }

    /// Interpolates slot values into plaintext coefficients:
    /// a_i = N^-1 * sum_j v_j * gamma^-(2j+1)i. Unused slots encode as zero.
    pub fn encode(&self, values: &[u64]) -> Vec<u64> {
        assert!(values.len() <= self.degree);
        let t = self.plain_modulus;
        let mut coeffs = vec![0u64; self.degree];

        // eta_j^-1 = root_inv^(2j+1), advanced by root_inv^2 per slot.
        let step = mul_mod(self.root_inv, self.root_inv, t);
        let mut eta_inv = self.root_inv;
        for &value in values {
            let v = value % t;
            let mut power = 1u64;
            for coeff in coeffs.iter_mut() {
                *coeff = add_mod(*coeff, mul_mod(v, power, t), t);
                power = mul_mod(power, eta_inv, t);
            }
            eta_inv = mul_mod(eta_inv, step, t);
        }

        for coeff in coeffs.iter_mut() {
            *coeff = mul_mod(*coeff, self.n_inv, t);
        }
        coeffs
    }

    /// Evaluates plaintext coefficients at the odd root powers:
    /// v_j = sum_i a_i * gamma^(2j+1)i.
    pub fn decode(&self, coeffs: &[u64]) -> Vec<u64> {
        assert!(coeffs.len() == self.degree);
        let t = self.plain_modulus;
        let mut values = vec![0u64; self.degree];

        let step = mul_mod(self.root, self.root, t);
        let mut eta = self.root;
        for value in values.iter_mut() {
            let mut power = 1u64;
            let mut acc = 0u64;
            for &coeff in coeffs {
                acc = add_mod(acc, mul_mod(coeff % t, power, t), t);
                power = mul_mod(power, eta, t);
            }
            *value = acc;
            eta = mul_mod(eta, step, t);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Plain negacyclic product mod t, for checking the slot isomorphism.
    fn negacyclic_mul(a: &[u64], b: &[u64], t: u64) -> Vec<u64> {
        let n = a.len();
        let mut out = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let prod = mul_mod(a[i], b[j], t);
                if i + j < n {
                    out[i + j] = add_mod(out[i + j], prod, t);
                } else {
                    out[i + j - n] = add_mod(out[i + j - n], t - prod, t);
                }
            }
        }
        out
    }

    #[test]
    fn root_has_order_exactly_two_n() {
        let tables = BatchTables::new(65537, 8);
        assert_eq!(mod_pow(tables.root, 8, 65537), 65536);
        assert_eq!(mod_pow(tables.root, 16, 65537), 1);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let tables = BatchTables::new(65537, 8);
        let values = [1u64, 2, 3, 4, 5, 6, 7, 8];
        let coeffs = tables.encode(&values);
        assert_eq!(tables.decode(&coeffs), values);
    }

    #[test]
    fn short_input_pads_remaining_slots_with_zero() {
        let tables = BatchTables::new(65537, 8);
        let coeffs = tables.encode(&[9, 11, 13]);
        let slots = tables.decode(&coeffs);
        assert_eq!(&slots[..3], &[9, 11, 13]);
        assert_eq!(&slots[3..], &[0; 5]);
    }

    #[test]
    fn values_reduce_modulo_t() {
        let tables = BatchTables::new(65537, 8);
        let coeffs = tables.encode(&[65537 + 5, 2 * 65537 + 1]);
        let slots = tables.decode(&coeffs);
        assert_eq!(slots[0], 5);
        assert_eq!(slots[1], 1);
    }

    #[test]
    fn ring_product_acts_slot_wise() {
        let t = 65537;
        let tables = BatchTables::new(t, 8);
        let x = [3u64, 1, 4, 1, 5, 9, 2, 6];
        let y = [2u64, 7, 1, 8, 2, 8, 1, 8];

        let product = negacyclic_mul(&tables.encode(&x), &tables.encode(&y), t);
        let slots = tables.decode(&product);

        for j in 0..8 {
            assert_eq!(slots[j], mul_mod(x[j], y[j], t), "slot {j}");
        }
    }

    #[test]
    fn alternate_modulus_and_degree() {
        let tables = BatchTables::new(40961, 16);
        let values: Vec<u64> = (0..16).map(|i| i * i + 7).collect();
        let coeffs = tables.encode(&values);
        assert_eq!(tables.decode(&coeffs), values);
    }
}
