//! Precomputed ascending prime table for open-addressing table sizing
//!
//! Every prime up to 1009, then a sparse run growing by roughly 25% per step.

use crate::hotspot::traits::{SensorError, SensorResult};

pub(crate) static PRIMES: &[usize] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307,
    311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419, 421,
    431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797,
    809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929,
    937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1277, 1597, 1997, 2503, 3137, 3923,
    4903, 6131, 7669, 9587, 11987, 14983, 18731, 23417, 29287, 36629, 45817, 57271, 71593, 89491,
    111863, 139831, 174799, 218509, 273149, 341443, 426841, 533573, 666979, 833737, 1042183,
    1302737, 1628441, 2035567, 2544463, 3180589, 3975749, 4969691, 6212113, 7765151, 9706447,
    12133061, 15166339, 18957929, 23697433, 29621807, 37027259, 46284079, 57855121, 72318907,
    90398647, 112998311, 141247903, 176559883, 220699859, 275874871, 344843621, 431054537,
    538818197, 673522757, 841903459, 1052379323, 1315474169, 1644342751, 2055428443,
];

/// Largest prime in the table
pub const MAX_TABLED_PRIME: usize = 2_055_428_443;

/// Smallest tabled prime `>= n`
///
/// Fails when `n` is zero or larger than [`MAX_TABLED_PRIME`].
pub fn next_prime(n: usize) -> SensorResult<usize> {
    if n < 1 || n > MAX_TABLED_PRIME {
        return Err(SensorError::invalid_argument(format!(
            "next_prime: {} outside 1..={}",
            n, MAX_TABLED_PRIME
        )));
    }

    let pos = match PRIMES.binary_search(&n) {
        Ok(pos) => pos,
        Err(pos) => pos,
    };
    Ok(PRIMES[pos])
}
