//! Low discrepancy building blocks for the per-point sample generator.

pub const PRIMES: [u32; 32] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53,
    59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131,
];

/// Radical inverse of `index` in the given base, in `[0, 1)`.
pub fn radical_inverse(base: u32, mut index: u64) -> f64 {
    let base = base as u64;
    let inv_base = 1.0 / base as f64;
    let mut inv_bi = inv_base;
    let mut reversed = 0.0;
    while index > 0 {
        let digit = index % base;
        reversed += digit as f64 * inv_bi;
        inv_bi *= inv_base;
        index /= base;
    }
    reversed
}

/// Halton sequence value of `index` in dimension `dim`. Dimensions past the prime table wrap.
pub fn halton(dim: usize, index: u64) -> f64 {
    radical_inverse(PRIMES[dim % PRIMES.len()], index)
}

/// Integer finalizer used to derive decorrelated seeds and rotations.
pub fn mix_bits(mut v: u64) -> u64 {
    v ^= v >> 31;
    v = v.wrapping_mul(0x7fb5_d329_728e_a185);
    v ^= v >> 27;
    v = v.wrapping_mul(0x81da_def4_bc2d_d44d);
    v ^= v >> 33;
    v
}

/// Map the hash of `(seed, dim)` to `[0, 1)`.
pub fn hash_to_unit(seed: u64, dim: u64) -> f64 {
    let h = mix_bits(seed ^ mix_bits(dim.wrapping_add(0x9e37_79b9_7f4a_7c15)));
    (h >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Fractional part, kept strictly below one.
pub fn mod1(x: f64) -> f64 {
    let f = x - x.floor();
    if f >= 1.0 { 0.0 } else { f }
}
