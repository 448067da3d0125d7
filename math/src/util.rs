pub fn bit_reverse<T, V: AsMut<[T]>>(mut values: V) -> V {
    let n = values.as_mut().len();
    if n > 2 {
        assert!(n.is_power_of_two());
        let log_n = n.ilog2();
        for i in 0..n {
            let j = i.reverse_bits() >> (usize::BITS - log_n);
            if i < j {
                values.as_mut().swap(i, j)
            }
        }
    }
    values
}

/// `izip!` that checks equal lengths in debug builds.
#[macro_export]
macro_rules! izip_eq {
    (@closure $p:pat => $tup:expr) => {
        |$p| $tup
    };
    (@closure $p:pat => ($($tup:tt)*) , $_iter:expr $(, $tail:expr)*) => {
        $crate::izip_eq!(@closure ($p, b) => ($($tup)*, b) $(, $tail)*)
    };
    ($first:expr $(,)*) => {
        core::iter::IntoIterator::into_iter($first)
    };
    ($first:expr, $second:expr $(,)*) => {{
        #[cfg(debug_assertions)]
        { itertools::Itertools::zip_eq($crate::izip_eq!($first), $second) }
        #[cfg(not(debug_assertions))]
        { Iterator::zip($crate::izip_eq!($first), $second) }
    }};
    ($first:expr $(, $rest:expr)* $(,)*) => {{
        let t = $crate::izip_eq!($first);
        $(let t = $crate::izip_eq!(t, $rest);)*
        t.map($crate::izip_eq!(@closure a => (a) $(, $rest)*))
    }};
}

#[cfg(any(test, feature = "dev"))]
pub mod dev {
    use core::iter::Sum;
    use num_traits::AsPrimitive;

    /// Sample statistics, used to measure decryption noise in tests.
    #[derive(Clone, Debug)]
    pub struct Stats<T> {
        samples: Vec<T>,
    }

    impl<T> Default for Stats<T> {
        fn default() -> Self {
            Self {
                samples: Vec::new(),
            }
        }
    }

    impl<T: AsPrimitive<f64> + for<'a> Sum<&'a T>> Stats<T> {
        pub fn len(&self) -> usize {
            self.samples.len()
        }

        pub fn is_empty(&self) -> bool {
            self.samples.is_empty()
        }

        pub fn mean(&self) -> f64 {
            T::sum(self.samples.iter()).as_() / self.samples.len() as f64
        }

        pub fn variance(&self) -> f64 {
            let mean = self.mean();
            let diff_sq = |v: &T| {
                let diff = v.as_() - mean;
                diff * diff
            };
            f64::sum(self.samples.iter().map(diff_sq)) / self.samples.len() as f64
        }

        pub fn std_dev(&self) -> f64 {
            self.variance().sqrt()
        }

        pub fn max_abs(&self) -> f64 {
            self.samples
                .iter()
                .map(|v| v.as_().abs())
                .fold(0.0, f64::max)
        }

        pub fn push(&mut self, value: T) {
            self.samples.push(value);
        }

        pub fn extend(&mut self, iter: impl IntoIterator<Item = T>) {
            self.samples.extend(iter);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::util::{bit_reverse, dev::Stats};

    #[test]
    fn bit_reverse_permutation() {
        assert_eq!(bit_reverse(vec![0, 1, 2, 3, 4, 5, 6, 7]), [0, 4, 2, 6, 1, 5, 3, 7]);
        let values = (0..64).collect::<Vec<_>>();
        assert_eq!(bit_reverse(bit_reverse(values.clone())), values);
    }

    #[test]
    fn stats() {
        let mut stats = Stats::default();
        stats.extend([-2i64, 2, -2, 2]);
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.std_dev(), 2.0);
        assert_eq!(stats.max_abs(), 2.0);
    }
}
