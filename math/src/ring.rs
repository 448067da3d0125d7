use crate::{
    izip_eq,
    modulus::{big_mod, product, Prime},
    poly::{ntt::Ntt, Domain, Poly, PolyQP},
};
use num_bigint_dig::BigUint;
use rand::{distributions::Distribution, RngCore};

pub mod basis;

/// `Z[X]/(X^N + 1)` over a chain of NTT-friendly primes.
///
/// Every operation takes the `level` it acts on; limbs above it are left
/// untouched.
#[derive(Clone, Debug)]
pub struct RnsRing {
    ring_size: usize,
    moduli: Vec<Prime>,
    ntts: Vec<Ntt>,
}

impl RnsRing {
    pub fn new(moduli: impl IntoIterator<Item = Prime>, ring_size: usize) -> Self {
        let moduli = Vec::from_iter(moduli);
        assert!(!moduli.is_empty());
        let ntts = moduli.iter().map(|q| Ntt::new(q, ring_size)).collect();
        Self {
            ring_size,
            moduli,
            ntts,
        }
    }

    #[inline(always)]
    pub fn ring_size(&self) -> usize {
        self.ring_size
    }

    #[inline(always)]
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    #[inline(always)]
    pub fn moduli(&self) -> &[Prime] {
        &self.moduli
    }

    #[inline(always)]
    pub fn modulus(&self, i: usize) -> &Prime {
        &self.moduli[i]
    }

    #[inline(always)]
    pub fn ntt(&self, i: usize) -> &Ntt {
        &self.ntts[i]
    }

    pub fn modulus_product(&self, level: usize) -> BigUint {
        product(&self.moduli[..=level])
    }

    /// Bit size of the largest modulus up to `level`.
    pub fn max_bits(&self, level: usize) -> usize {
        self.moduli[..=level].iter().map(Prime::bits).max().unwrap_or(0)
    }

    pub fn allocate(&self, level: usize, domain: Domain) -> Poly {
        assert!(level <= self.max_level());
        Poly::zero(self.ring_size, level, domain)
    }

    #[inline(always)]
    fn limbs<'a>(
        &'a self,
        level: usize,
        a: &'a Poly,
    ) -> impl Iterator<Item = (&'a Prime, &'a [u64])> {
        debug_assert!(a.level() >= level);
        izip_eq!(&self.moduli[..=level], &a.limbs()[..=level]).map(|(q, a)| (q, a.as_slice()))
    }

    pub fn forward_assign(&self, level: usize, a: &mut Poly) {
        a.assert_domain(Domain::Coefficient);
        izip_eq!(&self.ntts[..=level], &mut a.limbs_mut()[..=level])
            .for_each(|(ntt, a)| ntt.forward(a));
        a.set_domain(Domain::Evaluation);
    }

    pub fn backward_assign(&self, level: usize, a: &mut Poly) {
        a.assert_domain(Domain::Evaluation);
        izip_eq!(&self.ntts[..=level], &mut a.limbs_mut()[..=level])
            .for_each(|(ntt, a)| ntt.backward(a));
        a.set_domain(Domain::Coefficient);
    }

    pub fn forward(&self, level: usize, b: &mut Poly, a: &Poly) {
        b.copy_from(level, a);
        self.forward_assign(level, b);
    }

    pub fn backward(&self, level: usize, b: &mut Poly, a: &Poly) {
        b.copy_from(level, a);
        self.backward_assign(level, b);
    }

    pub fn reduce_assign(&self, level: usize, a: &mut Poly) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level])
            .for_each(|(q, a)| q.slice_reduce_assign(a));
    }

    pub fn add_assign(&self, level: usize, b: &mut Poly, a: &Poly) {
        assert_eq!(b.domain(), a.domain());
        izip_eq!(&mut b.limbs_mut()[..=level], self.limbs(level, a))
            .for_each(|(b, (q, a))| q.slice_add_assign(b, a));
    }

    pub fn scalar_mul_assign(&self, level: usize, a: &mut Poly, s: u64) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level])
            .for_each(|(q, a)| q.slice_scalar_mul_assign(a, s));
    }

    /// Multiplies by an arbitrary precision scalar, reduced per limb.
    pub fn scalar_mul_big_assign(&self, level: usize, a: &mut Poly, s: &BigUint) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level]).for_each(|(q, a)| {
            q.slice_scalar_mul_assign(a, big_mod(s, q))
        });
    }

    pub fn mform_assign(&self, level: usize, a: &mut Poly) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level])
            .for_each(|(q, a)| q.slice_mform_assign(a));
    }

    pub fn inv_mform_assign(&self, level: usize, a: &mut Poly) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level])
            .for_each(|(q, a)| q.slice_inv_mform_assign(a));
    }

    /// `c = a * b * 2^-64`, evaluation domain.
    pub fn mul_mont(&self, level: usize, c: &mut Poly, a: &Poly, b: &Poly) {
        self.mul_mont_with(level, c, a, b, Prime::slice_mul_mont)
    }

    pub fn mul_mont_add_assign(&self, level: usize, c: &mut Poly, a: &Poly, b: &Poly) {
        self.mul_mont_with(level, c, a, b, Prime::slice_mul_mont_add_assign)
    }

    pub fn mul_mont_sub_assign(&self, level: usize, c: &mut Poly, a: &Poly, b: &Poly) {
        self.mul_mont_with(level, c, a, b, Prime::slice_mul_mont_sub_assign)
    }

    /// `c = a * b * 2^-64` with output in `[0, 2q)`.
    pub fn mul_mont_lazy(&self, level: usize, c: &mut Poly, a: &Poly, b: &Poly) {
        self.mul_mont_with(level, c, a, b, Prime::slice_mul_mont_lazy)
    }

    /// `c += a * b * 2^-64` without reducing `c`.
    pub fn mul_mont_lazy_add_assign(&self, level: usize, c: &mut Poly, a: &Poly, b: &Poly) {
        self.mul_mont_with(level, c, a, b, Prime::slice_mul_mont_lazy_add_assign)
    }

    #[inline(always)]
    fn mul_mont_with(
        &self,
        level: usize,
        c: &mut Poly,
        a: &Poly,
        b: &Poly,
        f: impl Fn(&Prime, &mut [u64], &[u64], &[u64]),
    ) {
        a.assert_domain(Domain::Evaluation);
        b.assert_domain(Domain::Evaluation);
        izip_eq!(&mut c.limbs_mut()[..=level], self.limbs(level, a), &b.limbs()[..=level])
            .for_each(|(c, (q, a), b)| f(q, c, a, b));
        c.set_domain(Domain::Evaluation);
    }

    pub fn sample_uniform(&self, level: usize, a: &mut Poly, mut rng: impl RngCore) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level]).for_each(|(q, a)| {
            let uniform = q.uniform_distribution();
            a.iter_mut().for_each(|a| *a = uniform.sample(&mut rng));
        });
    }

    /// Writes signed coefficients into every limb, coefficient domain.
    pub fn set_small(&self, level: usize, a: &mut Poly, coeffs: &[i64]) {
        izip_eq!(&self.moduli[..=level], &mut a.limbs_mut()[..=level]).for_each(|(q, a)| {
            izip_eq!(a, coeffs).for_each(|(a, v)| *a = q.from_i64(*v));
        });
        a.set_domain(Domain::Coefficient);
    }
}

/// Pair of rings over the primary chain `Q` and the optional auxiliary chain
/// `P`, acting on [`PolyQP`].
#[derive(Clone, Debug)]
pub struct RingQP {
    q: RnsRing,
    p: Option<RnsRing>,
}

impl RingQP {
    pub fn new(q: RnsRing, p: Option<RnsRing>) -> Self {
        if let Some(p) = &p {
            assert_eq!(q.ring_size(), p.ring_size());
        }
        Self { q, p }
    }

    #[inline(always)]
    pub fn ring_size(&self) -> usize {
        self.q.ring_size()
    }

    #[inline(always)]
    pub fn q(&self) -> &RnsRing {
        &self.q
    }

    #[inline(always)]
    pub fn p(&self) -> Option<&RnsRing> {
        self.p.as_ref()
    }

    /// Auxiliary ring, panics when absent.
    #[track_caller]
    #[inline(always)]
    pub fn aux(&self) -> &RnsRing {
        self.p.as_ref().expect("missing auxiliary modulus chain")
    }

    pub fn allocate(&self, level_q: usize, level_p: Option<usize>, domain: Domain) -> PolyQP {
        let q = self.q.allocate(level_q, domain);
        let p = level_p.map(|level_p| self.aux().allocate(level_p, domain));
        PolyQP::new(q, p)
    }

    pub fn forward_assign(&self, level_q: usize, level_p: Option<usize>, a: &mut PolyQP) {
        self.q.forward_assign(level_q, a.q_mut());
        if let Some(level_p) = level_p {
            self.aux().forward_assign(level_p, a.aux_mut());
        }
    }

    pub fn backward_assign(&self, level_q: usize, level_p: Option<usize>, a: &mut PolyQP) {
        self.q.backward_assign(level_q, a.q_mut());
        if let Some(level_p) = level_p {
            self.aux().backward_assign(level_p, a.aux_mut());
        }
    }

    pub fn add_assign(&self, level_q: usize, level_p: Option<usize>, b: &mut PolyQP, a: &PolyQP) {
        self.q.add_assign(level_q, b.q_mut(), a.q());
        if let Some(level_p) = level_p {
            self.aux().add_assign(level_p, b.aux_mut(), a.aux());
        }
    }

    pub fn reduce_assign(&self, level_q: usize, level_p: Option<usize>, a: &mut PolyQP) {
        self.q.reduce_assign(level_q, a.q_mut());
        if let Some(level_p) = level_p {
            self.aux().reduce_assign(level_p, a.aux_mut());
        }
    }

    pub fn mform_assign(&self, level_q: usize, level_p: Option<usize>, a: &mut PolyQP) {
        self.q.mform_assign(level_q, a.q_mut());
        if let Some(level_p) = level_p {
            self.aux().mform_assign(level_p, a.aux_mut());
        }
    }

    pub fn inv_mform_assign(&self, level_q: usize, level_p: Option<usize>, a: &mut PolyQP) {
        self.q.inv_mform_assign(level_q, a.q_mut());
        if let Some(level_p) = level_p {
            self.aux().inv_mform_assign(level_p, a.aux_mut());
        }
    }

    pub fn mul_mont(
        &self,
        level_q: usize,
        level_p: Option<usize>,
        c: &mut PolyQP,
        a: &PolyQP,
        b: &PolyQP,
    ) {
        self.q.mul_mont(level_q, c.q_mut(), a.q(), b.q());
        if let Some(level_p) = level_p {
            self.aux().mul_mont(level_p, c.aux_mut(), a.aux(), b.aux());
        }
    }

    pub fn mul_mont_add_assign(
        &self,
        level_q: usize,
        level_p: Option<usize>,
        c: &mut PolyQP,
        a: &PolyQP,
        b: &PolyQP,
    ) {
        self.q.mul_mont_add_assign(level_q, c.q_mut(), a.q(), b.q());
        if let Some(level_p) = level_p {
            self.aux().mul_mont_add_assign(level_p, c.aux_mut(), a.aux(), b.aux());
        }
    }

    pub fn mul_mont_sub_assign(
        &self,
        level_q: usize,
        level_p: Option<usize>,
        c: &mut PolyQP,
        a: &PolyQP,
        b: &PolyQP,
    ) {
        self.q.mul_mont_sub_assign(level_q, c.q_mut(), a.q(), b.q());
        if let Some(level_p) = level_p {
            self.aux().mul_mont_sub_assign(level_p, c.aux_mut(), a.aux(), b.aux());
        }
    }

    pub fn mul_mont_lazy(
        &self,
        level_q: usize,
        level_p: Option<usize>,
        c: &mut PolyQP,
        a: &PolyQP,
        b: &PolyQP,
    ) {
        self.q.mul_mont_lazy(level_q, c.q_mut(), a.q(), b.q());
        if let Some(level_p) = level_p {
            self.aux().mul_mont_lazy(level_p, c.aux_mut(), a.aux(), b.aux());
        }
    }

    pub fn mul_mont_lazy_add_assign(
        &self,
        level_q: usize,
        level_p: Option<usize>,
        c: &mut PolyQP,
        a: &PolyQP,
        b: &PolyQP,
    ) {
        self.q.mul_mont_lazy_add_assign(level_q, c.q_mut(), a.q(), b.q());
        if let Some(level_p) = level_p {
            self.aux().mul_mont_lazy_add_assign(level_p, c.aux_mut(), a.aux(), b.aux());
        }
    }

    pub fn sample_uniform(
        &self,
        level_q: usize,
        level_p: Option<usize>,
        a: &mut PolyQP,
        mut rng: impl RngCore,
    ) {
        self.q.sample_uniform(level_q, a.q_mut(), &mut rng);
        if let Some(level_p) = level_p {
            self.aux().sample_uniform(level_p, a.aux_mut(), &mut rng);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        modulus::Prime,
        poly::{Domain, Poly},
        ring::RnsRing,
    };
    use num_bigint_dig::BigUint;
    use rand::thread_rng;

    fn ring(log_n: usize, bits: &[usize]) -> RnsRing {
        let mut primes = Prime::gen_iter(bits[0], log_n + 1);
        RnsRing::new(bits.iter().map(|_| primes.next().unwrap()), 1 << log_n)
    }

    #[test]
    fn montgomery_product_matches_plain() {
        let mut rng = thread_rng();
        let ring = ring(4, &[50, 50, 50]);
        let level = ring.max_level();
        let mut a = ring.allocate(level, Domain::Coefficient);
        let mut b = ring.allocate(level, Domain::Coefficient);
        ring.sample_uniform(level, &mut a, &mut rng);
        ring.sample_uniform(level, &mut b, &mut rng);
        ring.forward_assign(level, &mut a);
        ring.forward_assign(level, &mut b);

        let expected = Poly::from_limbs(
            (0..=level)
                .map(|i| {
                    let q = ring.modulus(i);
                    let (a, b) = (a.limb(i), b.limb(i));
                    a.iter().zip(b).map(|(a, b)| q.mul(*a, *b)).collect()
                })
                .collect(),
            Domain::Evaluation,
        );

        let mut b_mont = b.clone();
        ring.mform_assign(level, &mut b_mont);
        let mut c = ring.allocate(level, Domain::Evaluation);
        ring.mul_mont(level, &mut c, &a, &b_mont);
        assert_eq!(c, expected);

        let mut lazy = ring.allocate(level, Domain::Evaluation);
        ring.mul_mont_lazy(level, &mut lazy, &a, &b_mont);
        ring.mul_mont_lazy_add_assign(level, &mut lazy, &a, &b_mont);
        ring.reduce_assign(level, &mut lazy);
        let mut twice = expected.clone();
        ring.add_assign(level, &mut twice, &expected);
        assert_eq!(lazy, twice);

        ring.mul_mont_sub_assign(level, &mut twice, &a, &b_mont);
        assert_eq!(twice, expected);
    }

    #[test]
    fn level_restricted_ops() {
        let ring = ring(3, &[30, 30, 30]);
        let mut a = ring.allocate(2, Domain::Coefficient);
        ring.set_small(1, &mut a, &[-1, 2, 0, 0, 0, 0, 0, 3]);
        assert_eq!(a.limb(0)[0], ring.modulus(0).max());
        assert_eq!(a.limb(1)[7], 3);
        assert_eq!(a.limb(2), [0u64; 8]);

        ring.scalar_mul_big_assign(1, &mut a, &(BigUint::from(1u64) << 100usize));
        let big = BigUint::from(1u64) << 100usize;
        let q1 = BigUint::from(**ring.modulus(1));
        assert_eq!(BigUint::from(a.limb(1)[1]), (big * 2u64) % q1);
    }
}
