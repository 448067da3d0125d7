use core::iter::successors;
use num_bigint_dig::{prime::probably_prime, BigUint};
use num_traits::ToPrimitive;

mod prime;

pub use prime::{Prime, Shoup};

pub fn pow_mod(b: u64, e: u64, q: u64) -> u64 {
    let [b, e, q] = [b, e, q].map(BigUint::from);
    b.modpow(&e, &q).to_u64().unwrap()
}

pub fn inv_mod(a: u64, q: u64) -> Option<u64> {
    let inv = pow_mod(a, q - 2, q);
    (mul_mod(a, inv, q) == 1).then_some(inv)
}

pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

pub fn powers_mod(b: u64, q: u64) -> impl Iterator<Item = u64> {
    successors(Some(1), move |v| Some(mul_mod(*v, b, q)))
}

pub fn is_prime(q: u64) -> bool {
    q > 1 && probably_prime(&BigUint::from(q), 20)
}

/// Product of `moduli` as a big integer.
pub fn product<'a>(moduli: impl IntoIterator<Item = &'a Prime>) -> BigUint {
    moduli
        .into_iter()
        .fold(BigUint::from(1u64), |acc, q| acc * BigUint::from(**q))
}

/// Residue of `value` modulo `q`.
pub fn big_mod(value: &BigUint, q: &Prime) -> u64 {
    (value % BigUint::from(**q)).to_u64().unwrap()
}

pub fn two_adic_generator(q: u64, two_adicity: usize) -> u64 {
    assert_eq!((q - 1) % (1 << two_adicity), 0);
    pow_mod(multiplicative_generator(q), (q - 1) >> two_adicity, q)
}

/// Smallest quadratic non-residue, which is enough to generate the 2-Sylow
/// subgroup of `Z_q^*`.
pub fn multiplicative_generator(q: u64) -> u64 {
    let order = q - 1;
    (2..order)
        .find(|g| pow_mod(*g, order >> 1, q) == order)
        .unwrap()
}
