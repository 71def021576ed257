//! Seeded index selection with a close-to-uniform distribution.

/// 2^64 divided by the golden ratio, rounded to an odd integer.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Deterministically maps `seed` to an index in `[0, n)`.
///
/// The seed is scrambled with Fibonacci hashing and the 64-bit result is scaled into the
/// requested range with a multiply-shift reduction, which keeps consecutive seeds spread evenly
/// over every bucket regardless of whether `n` is a power of two. Returns `0` when `n == 0`.
pub fn select_index(seed: u64, n: usize) -> usize {
    if n == 0 {
        return 0;
    }

    let hashed = seed.wrapping_mul(GOLDEN_GAMMA);

    ((u128::from(hashed) * n as u128) >> 64) as usize
}
