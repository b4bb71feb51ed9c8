//! Prime search for plaintext and coefficient moduli.
//!
//! Batching a length-N vector into one plaintext requires a prime modulus
//! p = 1 (mod 2N): that condition guarantees Z_p contains a primitive 2N-th
//! root of unity, which is what the slot transform evaluates at. The modulus
//! chain construction reuses the same search to pick pairwise-distinct scale
//! primes near a requested bit size.
//!
//! Primality is Miller-Rabin with a fixed base set. For `u64` inputs the
//! chosen bases are known to make the test deterministic, so there is no
//! probabilistic caveat in this range.

// Deterministic for all n < 318,665,857,834,031,151,167,461, which covers u64.
// Source: https://miller-rabin.appspot.com/
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Computes `(a * b) mod modulus` using `u128` intermediate arithmetic.
pub fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mul_mod: modulus must be positive");
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// Computes `base^exp mod modulus` via binary exponentiation.
pub fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mod_pow: modulus must be positive");
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    assert!(n > 0, "decompose: n must be positive");
    let mut d = n;
    let mut r = 0;
    while d & 1 == 0 {
        d >>= 1;
        r += 1;
    }
    (d, r)
}

/// Returns `true` if `n` is prime.
///
/// Writes `n - 1` as `d * 2^r` with odd `d`, then for each fixed base `a`
/// checks that `a^d mod n` is `1` or `n - 1`, or reaches `n - 1` under
/// repeated squaring. Any base failing both checks witnesses compositeness.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Returns `true` when `p` is a batching-friendly prime for ring degree `n`,
/// i.e. `p` is prime and `p = 1 (mod 2n)`.
#[inline]
pub fn is_batching_prime(p: u64, n: u64) -> bool {
    assert!(n > 0, "is_batching_prime: n must be positive");
    let congruence = n
        .checked_mul(2)
        .expect("is_batching_prime: 2 * n must fit in u64");
    is_prime(p) && p % congruence == 1
}

/// Returns the smallest `x >= value` with `x % modulus == 1`.
fn snap_up_to_congruence(value: u64, modulus: u64) -> u64 {
    assert!(modulus > 1, "snap_up_to_congruence: modulus must be greater than 1");
    let remainder = value % modulus;
    if remainder == 1 {
        value
    } else {
        let delta = (modulus + 1 - remainder) % modulus;
        value
            .checked_add(delta)
            .expect("snap_up_to_congruence: overflow while stepping upward")
    }
}

/// Returns the largest `x <= value` with `x % modulus == 1`.
fn snap_down_to_congruence(value: u64, modulus: u64) -> u64 {
    assert!(
        modulus > 1,
        "snap_down_to_congruence: modulus must be greater than 1"
    );
    let remainder = value % modulus;
    let delta = (remainder + modulus - 1) % modulus;
    value
        .checked_sub(delta)
        .expect("snap_down_to_congruence: underflow while stepping downward")
}

/// Returns the first batching-friendly prime `p >= 2^bits` for ring degree `n`.
///
/// Only candidates `p = 1 (mod 2n)` are visited.
///
/// # Panics
///
/// Panics if `bits >= 64`, `n == 0`, or `2 * n` overflows `u64`.
pub fn get_first_prime_up(bits: u32, n: u64) -> u64 {
    assert!(bits < 64, "get_first_prime_up: bits must be less than 64");
    assert!(n > 0, "get_first_prime_up: n must be positive");

    let step = n
        .checked_mul(2)
        .expect("get_first_prime_up: 2 * n must fit in u64");
    let mut candidate = snap_up_to_congruence((1u64 << bits) + 1, step);

    loop {
        if is_prime(candidate) {
            return candidate;
        }
        candidate = candidate
            .checked_add(step)
            .expect("get_first_prime_up: overflow while stepping upward");
    }
}

/// Returns the largest batching-friendly prime `p < bound` for ring degree
/// `n`, or `None` if no such prime exists below `bound`.
pub fn get_first_prime_down(bound: u64, n: u64) -> Option<u64> {
    assert!(n > 0, "get_first_prime_down: n must be positive");
    if bound <= 2 {
        return None;
    }

    let step = n
        .checked_mul(2)
        .expect("get_first_prime_down: 2 * n must fit in u64");
    let mut candidate = snap_down_to_congruence(bound.saturating_sub(1), step);

    loop {
        if candidate <= 2 {
            return None;
        }
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_sub(step)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_primes_and_composites() {
        for p in [2u64, 3, 5, 7, 11, 13, 17, 19, 65537] {
            assert!(is_prime(p), "expected prime: {p}");
        }
        for c in [0u64, 1, 4, 9, 15, 65536, 982_451_654] {
            assert!(!is_prime(c), "expected composite: {c}");
        }
    }

    #[test]
    fn rejects_carmichael_numbers() {
        for &n in &[561u64, 1_105, 1_729, 3_215_031_751] {
            assert!(!is_prime(n), "expected composite: {n}");
        }
    }

    #[test]
    fn near_u64_limit() {
        assert!(!is_prime(u64::MAX));
        assert!(is_prime(18_446_744_073_709_551_557));
    }

    #[test]
    fn mul_mod_matches_widened_reference() {
        let a = u64::MAX - 11;
        let b = u64::MAX - 17;
        let modulus = 1_073_750_017u64;
        let expected = ((a as u128 * b as u128) % modulus as u128) as u64;
        assert_eq!(mul_mod(a, b, modulus), expected);
    }

    #[test]
    fn mod_pow_handles_edge_cases() {
        assert_eq!(mod_pow(2, 0, 17), 1);
        assert_eq!(mod_pow(5, 0, 1), 0);
        assert_eq!(mod_pow(0, 5, 17), 0);
        assert_eq!(mod_pow(7, 1, 19), 7);
    }

    #[test]
    fn batching_condition_holds_for_known_primes() {
        // 65537 = 2^16 + 1 batches any degree up to 32768.
        assert!(is_batching_prime(65537, 8));
        assert!(is_batching_prime(65537, 4096));
        // 40961 - 1 = 2^12 * 10, good up to degree 4096.
        assert!(is_batching_prime(40961, 4096));
        assert!(!is_batching_prime(40961, 8192));
        // Prime but wrong congruence class.
        assert!(!is_batching_prime(65539, 8));
        // Right congruence class but composite.
        assert!(!is_batching_prime(65536 * 2 + 1, 65536 / 2));
    }

    #[test]
    fn prime_up_returns_first_match() {
        let prime = get_first_prime_up(30, 1024);
        assert_eq!(prime, 1_073_750_017);
        assert!(is_batching_prime(prime, 1024));
    }

    #[test]
    fn prime_down_descends_below_bound() {
        let upper = get_first_prime_up(20, 1024);
        let below = get_first_prime_down(upper, 1024).unwrap();
        assert!(below < upper);
        assert!(is_batching_prime(below, 1024));

        assert_eq!(get_first_prime_down(2, 1024), None);
        assert_eq!(get_first_prime_down(1, 1024), None);
    }

    #[test]
    fn distinct_primes_for_chain_construction() {
        // Walking down from one prime must yield a strictly smaller one,
        // which is how the modulus chain picks pairwise distinct scale primes.
        let first = get_first_prime_up(40, 64);
        let second = get_first_prime_down(first, 64).unwrap();
        let third = get_first_prime_down(second, 64).unwrap();
        assert!(first > second && second > third);
        for p in [first, second, third] {
            assert!(is_batching_prime(p, 64));
        }
    }

    #[test]
    #[should_panic(expected = "get_first_prime_up: bits must be less than 64")]
    fn prime_up_panics_on_oversized_bits() {
        let _ = get_first_prime_up(64, 1024);
    }

    #[test]
    #[should_panic(expected = "mul_mod: modulus must be positive")]
    fn mul_mod_panics_on_zero_modulus() {
        let _ = mul_mod(5, 7, 0);
    }
}
