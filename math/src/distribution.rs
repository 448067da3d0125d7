use core::{convert::identity, iter::repeat_with};
use itertools::{izip, Itertools};
use num_traits::{FromPrimitive, PrimInt, Signed};
use rand::{
    distributions::{uniform::SampleUniform, Distribution, Uniform},
    Rng,
};
use rand_distr::StandardNormal;

pub trait DistributionSized<T> {
    fn sample_map_into<R: Rng, O>(self, out: &mut [O], f: impl Fn(T) -> O, rng: R);

    fn sample_into<R: Rng>(self, out: &mut [T], rng: R)
    where
        Self: Sized,
    {
        self.sample_map_into(out, identity, rng)
    }

    fn sample_vec<R: Rng>(self, n: usize, rng: R) -> Vec<T>;
}

/// Rounded Gaussian with standard deviation `sigma`, truncated at
/// `bound_factor * sigma` by rejection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gaussian {
    sigma: f64,
    bound: f64,
}

impl Gaussian {
    pub const DEFAULT_BOUND_FACTOR: f64 = 6.0;

    pub fn new(sigma: f64) -> Self {
        Self::with_bound_factor(sigma, Self::DEFAULT_BOUND_FACTOR)
    }

    pub fn with_bound_factor(sigma: f64, bound_factor: f64) -> Self {
        assert!(sigma > 0.0 && bound_factor > 0.0);
        Self {
            sigma,
            bound: (sigma * bound_factor).floor(),
        }
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }
}

impl<T: FromPrimitive> Distribution<T> for Gaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        let v = loop {
            let zscore: f64 = rng.sample(StandardNormal);
            let v = (self.sigma * zscore).round();
            if v.abs() <= self.bound {
                break v;
            }
        };
        FromPrimitive::from_f64(v).unwrap()
    }
}

/// Ternary vector with exactly `hamming_weight` non-zero entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ternary(pub usize);

impl<T: Signed> DistributionSized<T> for Ternary {
    fn sample_map_into<R: Rng, O>(self, out: &mut [O], f: impl Fn(T) -> O, mut rng: R) {
        let hamming_weight = self.0;
        assert!(hamming_weight <= out.len());
        out.fill_with(|| f(T::zero()));
        if hamming_weight == 0 {
            return;
        }
        let indices = {
            let insert = |set: &mut [u8], idx: usize| {
                let is_none = (set[idx / 8] & 1 << (idx % 8)) == 0;
                set[idx / 8] |= 1 << (idx % 8);
                is_none
            };
            let mut set = vec![0; out.len().div_ceil(8)];
            let mut count = 0;
            for idx in Uniform::new(0, out.len()).sample_iter(&mut rng) {
                count += insert(&mut set, idx) as usize;
                if count == hamming_weight {
                    break;
                }
            }
            set.into_iter().flat_map(into_bits).positions(identity)
        };
        izip!(indices, repeat_with(|| rng.next_u64()).flat_map(into_bits))
            .for_each(|(idx, bit)| out[idx] = f(if bit { T::one() } else { -T::one() }));
    }

    fn sample_vec<R: Rng>(self, n: usize, rng: R) -> Vec<T> {
        let mut out = repeat_with(T::zero).take(n).collect_vec();
        self.sample_into(&mut out, rng);
        out
    }
}

fn into_bits<T: PrimInt>(byte: T) -> impl Iterator<Item = bool> {
    (0..T::zero().count_zeros() as usize).map(move |i| (byte >> i) & T::one() == T::one())
}

macro_rules! impl_distribution_sized_by_distribution {
    ($t:ty $(where T: $bonud:ident)?) => {
        impl<T> DistributionSized<T> for $t
        where
            Self: Distribution<T>,
            $(T: $bonud)?
        {
            fn sample_map_into<R: Rng, O>(self, out: &mut [O], f: impl Fn(T) -> O, rng: R) {
                izip!(out, self.sample_iter(rng)).for_each(|(a, b)| *a = f(b));
            }

            fn sample_vec<R: Rng>(self, n: usize, rng: R) -> Vec<T>
            where
                Self: Sized,
            {
                self.sample_iter(rng).take(n).collect()
            }
        }
    };
}

impl_distribution_sized_by_distribution!(Gaussian);
impl_distribution_sized_by_distribution!(Uniform<T> where T: SampleUniform);

#[cfg(test)]
mod test {
    use crate::{
        distribution::{DistributionSized, Gaussian, Ternary},
        util::dev::Stats,
    };
    use num_traits::Zero;
    use rand::{
        distributions::{Distribution, Uniform},
        thread_rng,
    };

    #[test]
    fn ternary() {
        let mut rng = thread_rng();
        for n in (0..12).map(|log_n| 1 << log_n) {
            for _ in 0..n.min(100) {
                let hamming_weight = Uniform::new_inclusive(0, n).sample(&mut rng);
                let out: Vec<i64> = Ternary(hamming_weight).sample_vec(n, &mut rng);
                assert_eq!(out.iter().filter(|v| !v.is_zero()).count(), hamming_weight);
                assert!(out.iter().all(|v| v.abs() <= 1));
            }
        }
    }

    #[test]
    fn gaussian() {
        let mut rng = thread_rng();
        let gaussian = Gaussian::new(3.2);
        let samples: Vec<i64> = gaussian.sample_vec(1 << 16, &mut rng);
        let mut stats = Stats::default();
        stats.extend(samples);
        assert!(stats.max_abs() <= gaussian.bound());
        assert!((stats.std_dev() - 3.2).abs() < 0.1);

        let narrow = Gaussian::with_bound_factor(3.2, 1.0);
        let samples: Vec<i64> = narrow.sample_vec(1 << 12, &mut rng);
        assert!(samples.iter().all(|v| v.abs() <= 3));
    }
}
