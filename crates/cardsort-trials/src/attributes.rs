//! Combinatorial helpers over the closed attribute space.
//!
//! Pure functions of their input plus the random source. Domains are never
//! empty in practice; an empty slice passed to [`uniform_pick`] panics.

use rand::Rng;

/// Coin flip used for every two-way randomization.
pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.random_bool(0.5)
}

/// The two domain values other than `excluded`, swapped with probability 1/2.
pub fn complement_values<T, R>(domain: &[T; 3], excluded: T, rng: &mut R) -> [T; 2]
where
    T: Copy + PartialEq,
    R: Rng + ?Sized,
{
    let mut rest = domain.iter().copied().filter(|v| *v != excluded);
    let (Some(a), Some(b)) = (rest.next(), rest.next()) else {
        unreachable!("excluded value must belong to a three-value domain")
    };
    if coin(rng) {
        [a, b]
    } else {
        [b, a]
    }
}

/// Fisher-Yates shuffle into a new array.
pub fn uniform_shuffle<T, R, const N: usize>(items: [T; N], rng: &mut R) -> [T; N]
where
    T: Copy,
    R: Rng + ?Sized,
{
    let mut out = items;
    for i in (1..N).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}

pub fn uniform_pick<T, R>(domain: &[T], rng: &mut R) -> T
where
    T: Copy,
    R: Rng + ?Sized,
{
    domain[rng.random_range(0..domain.len())]
}
