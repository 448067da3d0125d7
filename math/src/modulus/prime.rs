use crate::{izip_eq, modulus::is_prime};
use core::ops::Deref;
use rand::distributions::Uniform;

/// Word-sized NTT-friendly prime with Barrett and Montgomery constants.
///
/// Montgomery form uses `R = 2^64` and requires `q < 2^61`, so that lazy
/// Montgomery products stay below `2q` and sums of them fit a word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "SerdePrime", from = "SerdePrime")
)]
pub struct Prime {
    q: u64,
    q_half: u64,
    q_twice: u64,
    log_q: usize,
    barrett_mu: u128,
    barrett_alpha: usize,
    q_inv_neg: u64,
}

impl Prime {
    pub const MAX_BITS: usize = 61;

    pub const fn new(q: u64) -> Self {
        assert!(q > 2 && q & 1 == 1);
        assert!(q < 1 << Self::MAX_BITS);
        let log_q = q.next_power_of_two().ilog2() as usize;
        let barrett_mu = (1u128 << (log_q * 2 + 3)) / (q as u128);
        let barrett_alpha = log_q + 3;
        // Newton iteration doubles the number of correct low bits each step.
        let mut q_inv = 1u64;
        let mut i = 0;
        while i < 6 {
            q_inv = q_inv.wrapping_mul(2u64.wrapping_sub(q.wrapping_mul(q_inv)));
            i += 1;
        }
        Self {
            q,
            q_half: q >> 1,
            q_twice: q << 1,
            log_q,
            barrett_mu,
            barrett_alpha,
            q_inv_neg: q_inv.wrapping_neg(),
        }
    }

    /// Returns `None` when `q` is not an odd prime below `2^61`.
    pub fn try_new(q: u64) -> Option<Self> {
        (q > 2 && q < 1 << Self::MAX_BITS && is_prime(q)).then(|| Self::new(q))
    }

    #[inline(always)]
    pub fn bits(&self) -> usize {
        (u64::BITS - self.q.leading_zeros()) as usize
    }

    #[inline(always)]
    pub fn max(&self) -> u64 {
        self.q - 1
    }

    #[inline(always)]
    pub fn half(&self) -> u64 {
        self.q_half
    }

    #[inline(always)]
    pub fn twice(&self) -> u64 {
        self.q_twice
    }

    #[inline(always)]
    pub fn uniform_distribution(&self) -> Uniform<u64> {
        Uniform::new_inclusive(0, self.max())
    }

    #[inline(always)]
    pub fn center(&self, v: u64) -> i64 {
        if v >= self.q_half {
            -((self.q - v) as i64)
        } else {
            v as _
        }
    }

    #[inline(always)]
    pub fn from_i64(&self, v: i64) -> u64 {
        v.rem_euclid(self.q as _) as _
    }

    #[inline(always)]
    pub fn reduce(&self, a: u64) -> u64 {
        a % self.q
    }

    #[inline(always)]
    pub(crate) fn reduce_u128(&self, c: u128) -> u64 {
        // quotient estimate overflows u128 above 60 bits
        if self.log_q > 60 {
            return (c % self.q as u128) as u64;
        }
        // c / (2^{n + \beta})
        // note: \beta is assumed to -2
        let tmp = c >> (self.log_q - 2);
        // k = ((c / (2^{n + \beta})) * \mu) / 2^{\alpha - (-2)}
        let k = (tmp * self.barrett_mu) >> (self.barrett_alpha + 2);
        // c - k*p
        let tmp = k * (self.q as u128);

        let mut c = (c - tmp) as u64;
        self.reduce_once_assign(&mut c);
        c
    }

    #[inline(always)]
    pub fn reduce_once_assign(&self, a: &mut u64) {
        if *a >= self.q {
            *a -= self.q
        }
    }

    #[inline(always)]
    pub fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.q);
        if a != 0 {
            self.q - a
        } else {
            0
        }
    }

    #[inline(always)]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.q);
        debug_assert!(b < self.q);
        let mut c = a + b;
        self.reduce_once_assign(&mut c);
        c
    }

    #[inline(always)]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.q);
        debug_assert!(b < self.q);
        if a >= b {
            a - b
        } else {
            self.q + a - b
        }
    }

    /// Barrett product, inputs in `[0, 2q)`.
    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.q_twice);
        debug_assert!(b < self.q_twice);
        self.reduce_u128(a as u128 * b as u128)
    }

    #[inline(always)]
    pub fn prepare(&self, a: u64) -> Shoup {
        Shoup::new(a, self.q)
    }

    /// Shoup product, reduced to `[0, q)`.
    #[inline(always)]
    pub fn mul_prep(&self, a: u64, b: &Shoup) -> u64 {
        let mut c = b.mul(a, self.q);
        self.reduce_once_assign(&mut c);
        c
    }

    /// `a * 2^64 mod q`.
    #[inline(always)]
    pub fn mform(&self, a: u64) -> u64 {
        (((a as u128) << 64) % self.q as u128) as u64
    }

    /// `a * 2^-64 mod q`, valid for any word.
    #[inline(always)]
    pub fn inv_mform(&self, a: u64) -> u64 {
        self.mred(a, 1)
    }

    /// Montgomery product `a * b * 2^-64` in `[0, 2q)`, requires `a * b < q * 2^64`.
    #[inline(always)]
    pub fn mred_lazy(&self, a: u64, b: u64) -> u64 {
        let t = a as u128 * b as u128;
        let m = (t as u64).wrapping_mul(self.q_inv_neg);
        ((t + m as u128 * self.q as u128) >> 64) as u64
    }

    /// Montgomery product `a * b * 2^-64` in `[0, q)`.
    #[inline(always)]
    pub fn mred(&self, a: u64, b: u64) -> u64 {
        let mut c = self.mred_lazy(a, b);
        self.reduce_once_assign(&mut c);
        c
    }

    pub fn slice_reduce_assign(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|a| *a %= self.q);
    }

    pub fn slice_add_assign(&self, b: &mut [u64], a: &[u64]) {
        izip_eq!(b, a).for_each(|(b, a)| *b = self.add(*b, *a));
    }

    pub fn slice_scalar_mul_assign(&self, b: &mut [u64], a: u64) {
        let a = self.prepare(a % self.q);
        b.iter_mut().for_each(|b| *b = self.mul_prep(*b, &a));
    }

    pub fn slice_mform_assign(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|a| *a = self.mform(*a));
    }

    pub fn slice_inv_mform_assign(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|a| *a = self.inv_mform(*a));
    }

    /// `c = a * b * 2^-64`.
    pub fn slice_mul_mont(&self, c: &mut [u64], a: &[u64], b: &[u64]) {
        izip_eq!(c, a, b).for_each(|(c, a, b)| *c = self.mred(*a, *b));
    }

    /// `c += a * b * 2^-64`.
    pub fn slice_mul_mont_add_assign(&self, c: &mut [u64], a: &[u64], b: &[u64]) {
        izip_eq!(c, a, b).for_each(|(c, a, b)| *c = self.add(*c, self.mred(*a, *b)));
    }

    /// `c -= a * b * 2^-64`.
    pub fn slice_mul_mont_sub_assign(&self, c: &mut [u64], a: &[u64], b: &[u64]) {
        izip_eq!(c, a, b).for_each(|(c, a, b)| *c = self.sub(*c, self.mred(*a, *b)));
    }

    /// `c = a * b * 2^-64` in `[0, 2q)`.
    pub fn slice_mul_mont_lazy(&self, c: &mut [u64], a: &[u64], b: &[u64]) {
        izip_eq!(c, a, b).for_each(|(c, a, b)| *c = self.mred_lazy(*a, *b));
    }

    /// `c += a * b * 2^-64` without any reduction of `c`.
    pub fn slice_mul_mont_lazy_add_assign(&self, c: &mut [u64], a: &[u64], b: &[u64]) {
        izip_eq!(c, a, b).for_each(|(c, a, b)| *c += self.mred_lazy(*a, *b));
    }
}

#[cfg(any(test, feature = "dev"))]
impl Prime {
    pub fn gen(bits: usize, two_adicity: usize) -> Self {
        Self::gen_iter(bits, two_adicity).next().unwrap()
    }

    pub fn gen_iter(bits: usize, two_adicity: usize) -> impl Iterator<Item = Self> {
        assert!(bits > two_adicity);
        let min = 1 << (bits - two_adicity - 1);
        let max = min << 1;
        let candidates = (min..max).rev().map(move |hi| (hi << two_adicity) + 1);
        candidates
            .into_iter()
            .filter(|v| is_prime(*v))
            .map(Self::new)
    }
}

impl Deref for Prime {
    type Target = u64;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.q
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Shoup(u64, u64);

impl Shoup {
    #[inline(always)]
    pub fn new(v: u64, q: u64) -> Self {
        debug_assert!(v < q);
        let quotient = (((v as u128) << 64) / q as u128) as _;
        Self(v, quotient)
    }

    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub fn quotient(&self) -> u64 {
        self.1
    }

    /// Product in `[0, 2q)`.
    #[inline(always)]
    pub fn mul(&self, a: u64, q: u64) -> u64 {
        let t = ((self.quotient() as u128 * a as u128) >> 64) as _;
        (a.wrapping_mul(self.value())).wrapping_sub(q.wrapping_mul(t))
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SerdePrime {
    q: u64,
}

#[cfg(feature = "serde")]
impl From<SerdePrime> for Prime {
    fn from(value: SerdePrime) -> Self {
        Self::new(value.q)
    }
}

#[cfg(feature = "serde")]
impl From<Prime> for SerdePrime {
    fn from(value: Prime) -> Self {
        Self { q: value.q }
    }
}
