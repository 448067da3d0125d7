use crate::{
    modulus::{inv_mod, powers_mod, two_adic_generator, Prime, Shoup},
    util::bit_reverse,
};
use itertools::izip;

/// Negacyclic NTT over `Z_q[X]/(X^N + 1)`.
#[derive(Clone, Debug)]
pub struct Ntt {
    q: u64,
    q_twice: u64,
    q_quart: u64,
    ring_size: usize,
    twiddle_bo: Vec<Shoup>,
    twiddle_bo_inv: Vec<Shoup>,
    n_inv: Shoup,
}

impl Ntt {
    pub fn new(q: &Prime, ring_size: usize) -> Self {
        assert!(ring_size.is_power_of_two());
        let q = **q;

        let g = two_adic_generator(q, ring_size.ilog2() as usize + 1);
        let [twiddle_bo, twiddle_bo_inv] = [g, inv_mod(g, q).unwrap()]
            .map(|b| powers_mod(b, q).take(ring_size).map(|v| Shoup::new(v, q)))
            .map(FromIterator::from_iter)
            .map(bit_reverse);
        let n_inv = Shoup::new(inv_mod(ring_size as _, q).unwrap(), q);

        Self {
            q,
            q_twice: q << 1,
            q_quart: q << 2,
            ring_size,
            twiddle_bo,
            twiddle_bo_inv,
            n_inv,
        }
    }

    pub fn ring_size(&self) -> usize {
        self.ring_size
    }

    /// Forward transform, input in `[0, 2q)`, output in `[0, q)`.
    pub fn forward(&self, a: &mut [u64]) {
        self.forward_lazy(a);
        a.iter_mut().for_each(|a| {
            if *a >= self.q {
                *a -= self.q
            }
        });
    }

    /// Forward transform, input in `[0, 2q)`, output in `[0, 2q)`.
    pub fn forward_lazy(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.ring_size);
        let log_n = a.len().ilog2();
        for layer in 0..log_n {
            let (m, size) = (1 << layer, 1 << (log_n - layer - 1));
            izip!(a.chunks_exact_mut(2 * size), &self.twiddle_bo[m..]).for_each(|(a, t)| {
                let (a, b) = a.split_at_mut(size);
                if layer == log_n - 1 {
                    izip!(a, b).for_each(|(a, b)| self.dit(a, b, t));
                } else {
                    izip!(a, b).for_each(|(a, b)| self.dit_lazy(a, b, t));
                }
            });
        }
    }

    /// Backward transform including the `N^-1` scaling, input in `[0, 2q)`,
    /// output in `[0, q)`.
    pub fn backward(&self, a: &mut [u64]) {
        debug_assert_eq!(a.len(), self.ring_size);
        let log_n = a.len().ilog2();
        for layer in (0..log_n).rev() {
            let (m, size) = (1 << layer, 1 << (log_n - layer - 1));
            izip!(a.chunks_exact_mut(2 * size), &self.twiddle_bo_inv[m..]).for_each(|(a, t)| {
                let (a, b) = a.split_at_mut(size);
                izip!(a, b).for_each(|(a, b)| self.dif(a, b, t));
            });
        }
        a.iter_mut().for_each(|a| {
            *a = self.n_inv.mul(*a, self.q);
            if *a >= self.q {
                *a -= self.q
            }
        });
    }

    #[inline(always)]
    fn reduce_twice_assign(&self, a: &mut u64) {
        if *a >= self.q_twice {
            *a -= self.q_twice
        }
    }

    #[inline(always)]
    fn dit_lazy(&self, a: &mut u64, b: &mut u64, t: &Shoup) {
        debug_assert!(*a < self.q_quart);
        debug_assert!(*b < self.q_quart);
        self.reduce_twice_assign(a);
        let bt = t.mul(*b, self.q);
        let c = *a + bt;
        let d = *a + self.q_twice - bt;
        *a = c;
        *b = d;
    }

    #[inline(always)]
    fn dit(&self, a: &mut u64, b: &mut u64, t: &Shoup) {
        debug_assert!(*a < self.q_quart);
        debug_assert!(*b < self.q_quart);
        self.reduce_twice_assign(a);
        let bt = t.mul(*b, self.q);
        let c = a.wrapping_add(bt);
        let d = a.wrapping_sub(bt);
        *a = (c).min(c.wrapping_sub(self.q_twice));
        *b = (d).min(d.wrapping_add(self.q_twice));
    }

    #[inline(always)]
    fn dif(&self, a: &mut u64, b: &mut u64, t: &Shoup) {
        debug_assert!(*a < self.q_twice);
        debug_assert!(*b < self.q_twice);
        let mut c = *a + *b;
        self.reduce_twice_assign(&mut c);
        let d = t.mul(*a + self.q_twice - *b, self.q);
        *a = c;
        *b = d;
    }
}

#[cfg(test)]
mod test {
    use crate::{modulus::Prime, poly::ntt::Ntt};
    use rand::{distributions::Distribution, thread_rng};

    fn negacyclic_mul(q: &Prime, a: &[u64], b: &[u64]) -> Vec<u64> {
        let n = a.len();
        let mut c = vec![0; n];
        for i in 0..n {
            for j in 0..n {
                let t = q.mul(a[i], b[j]);
                if i + j < n {
                    c[i + j] = q.add(c[i + j], t);
                } else {
                    c[i + j - n] = q.sub(c[i + j - n], t);
                }
            }
        }
        c
    }

    #[test]
    fn round_trip_and_product() {
        let mut rng = thread_rng();
        for log_n in 0..9 {
            let n = 1 << log_n;
            for bits in [20, 50, 61] {
                let q = Prime::gen(bits, log_n + 1);
                let ntt = Ntt::new(&q, n);
                let uniform = q.uniform_distribution();
                let a = uniform.sample_iter(&mut rng).take(n).collect::<Vec<_>>();
                let b = uniform.sample_iter(&mut rng).take(n).collect::<Vec<_>>();

                let mut c = a.clone();
                ntt.forward(&mut c);
                assert!(c.iter().all(|c| *c < *q));
                ntt.backward(&mut c);
                assert_eq!(c, a);

                let [mut a_ntt, mut b_ntt] = [a.clone(), b.clone()];
                ntt.forward(&mut a_ntt);
                ntt.forward(&mut b_ntt);
                let mut c = a_ntt
                    .iter()
                    .zip(&b_ntt)
                    .map(|(a, b)| q.mul(*a, *b))
                    .collect::<Vec<_>>();
                ntt.backward(&mut c);
                assert_eq!(c, negacyclic_mul(&q, &a, &b));
            }
        }
    }
}
