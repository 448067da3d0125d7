pub mod ntt;

/// Representation of the limbs of a [`Poly`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Domain {
    Coefficient,
    Evaluation,
}

/// Polynomial in RNS form, one limb per active modulus of a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Poly {
    limbs: Vec<Vec<u64>>,
    domain: Domain,
}

impl Poly {
    pub fn zero(ring_size: usize, level: usize, domain: Domain) -> Self {
        Self {
            limbs: vec![vec![0; ring_size]; level + 1],
            domain,
        }
    }

    pub fn from_limbs(limbs: Vec<Vec<u64>>, domain: Domain) -> Self {
        assert!(!limbs.is_empty());
        assert!(limbs.iter().all(|limb| limb.len() == limbs[0].len()));
        Self { limbs, domain }
    }

    #[inline(always)]
    pub fn level(&self) -> usize {
        self.limbs.len() - 1
    }

    #[inline(always)]
    pub fn ring_size(&self) -> usize {
        self.limbs[0].len()
    }

    #[inline(always)]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[inline(always)]
    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain
    }

    #[track_caller]
    #[inline(always)]
    pub fn assert_domain(&self, domain: Domain) {
        assert_eq!(self.domain, domain, "unexpected polynomial domain");
    }

    #[inline(always)]
    pub fn limb(&self, i: usize) -> &[u64] {
        &self.limbs[i]
    }

    #[inline(always)]
    pub fn limb_mut(&mut self, i: usize) -> &mut [u64] {
        &mut self.limbs[i]
    }

    #[inline(always)]
    pub fn limbs(&self) -> &[Vec<u64>] {
        &self.limbs
    }

    #[inline(always)]
    pub fn limbs_mut(&mut self) -> &mut [Vec<u64>] {
        &mut self.limbs
    }

    pub fn fill(&mut self, level: usize, value: u64) {
        self.limbs[..=level].iter_mut().for_each(|limb| limb.fill(value));
    }

    /// Copies limbs `0..=level` and the domain tag of `other`.
    pub fn copy_from(&mut self, level: usize, other: &Self) {
        self.limbs[..=level]
            .iter_mut()
            .zip(&other.limbs[..=level])
            .for_each(|(b, a)| b.copy_from_slice(a));
        self.domain = other.domain;
    }
}

/// Polynomial over the extended basis: primary chain `Q` and optional
/// auxiliary chain `P`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolyQP {
    q: Poly,
    p: Option<Poly>,
}

impl PolyQP {
    pub fn zero(ring_size: usize, level_q: usize, level_p: Option<usize>, domain: Domain) -> Self {
        Self {
            q: Poly::zero(ring_size, level_q, domain),
            p: level_p.map(|level_p| Poly::zero(ring_size, level_p, domain)),
        }
    }

    pub fn new(q: Poly, p: Option<Poly>) -> Self {
        if let Some(p) = &p {
            assert_eq!(q.ring_size(), p.ring_size());
            assert_eq!(q.domain(), p.domain());
        }
        Self { q, p }
    }

    #[inline(always)]
    pub fn level_q(&self) -> usize {
        self.q.level()
    }

    #[inline(always)]
    pub fn level_p(&self) -> Option<usize> {
        self.p.as_ref().map(Poly::level)
    }

    #[inline(always)]
    pub fn ring_size(&self) -> usize {
        self.q.ring_size()
    }

    #[inline(always)]
    pub fn domain(&self) -> Domain {
        self.q.domain()
    }

    pub fn set_domain(&mut self, domain: Domain) {
        self.q.set_domain(domain);
        if let Some(p) = &mut self.p {
            p.set_domain(domain);
        }
    }

    #[inline(always)]
    pub fn q(&self) -> &Poly {
        &self.q
    }

    #[inline(always)]
    pub fn q_mut(&mut self) -> &mut Poly {
        &mut self.q
    }

    #[inline(always)]
    pub fn p(&self) -> Option<&Poly> {
        self.p.as_ref()
    }

    #[inline(always)]
    pub fn q_p_mut(&mut self) -> (&mut Poly, Option<&mut Poly>) {
        (&mut self.q, self.p.as_mut())
    }

    /// Auxiliary component, panics when absent.
    #[track_caller]
    #[inline(always)]
    pub fn aux(&self) -> &Poly {
        self.p.as_ref().expect("missing auxiliary component")
    }

    #[track_caller]
    #[inline(always)]
    pub fn aux_mut(&mut self) -> &mut Poly {
        self.p.as_mut().expect("missing auxiliary component")
    }

    pub fn into_q_p(self) -> (Poly, Option<Poly>) {
        (self.q, self.p)
    }

    pub fn copy_from(&mut self, level_q: usize, level_p: Option<usize>, other: &Self) {
        self.q.copy_from(level_q, &other.q);
        if let Some(level_p) = level_p {
            self.aux_mut().copy_from(level_p, other.aux());
        }
    }
}
