use crate::parameters::Parameters;
use rand::RngCore;
use rgsw_math::{
    distribution::{DistributionSized, Ternary},
    poly::{Domain, Poly, PolyQP},
};

/// Ternary secret over both chains, kept in the evaluation domain and in
/// Montgomery form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretKey {
    value: PolyQP,
    ring_size: usize,
}

impl SecretKey {
    /// Samples a secret with the Hamming weight of `params`.
    pub fn sample(params: &Parameters, rng: impl RngCore) -> Self {
        let coeffs: Vec<i64> = Ternary(params.hamming_weight()).sample_vec(params.n(), rng);
        Self::from_coeffs(params, &coeffs)
    }

    pub fn from_coeffs(params: &Parameters, coeffs: &[i64]) -> Self {
        let ring = params.ring();
        let (level_q, level_p) = (params.max_level_q(), params.max_level_p());
        let mut value = ring.allocate(level_q, level_p, Domain::Coefficient);
        ring.q().set_small(level_q, value.q_mut(), coeffs);
        if let Some(level_p) = level_p {
            ring.aux().set_small(level_p, value.aux_mut(), coeffs);
        }
        ring.forward_assign(level_q, level_p, &mut value);
        ring.mform_assign(level_q, level_p, &mut value);
        Self {
            value,
            ring_size: coeffs.len(),
        }
    }

    pub fn ring_size(&self) -> usize {
        self.ring_size
    }

    pub fn value(&self) -> &PolyQP {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plaintext {
    value: Poly,
}

impl Plaintext {
    pub fn new(value: Poly) -> Self {
        Self { value }
    }

    pub fn allocate(params: &Parameters, level: usize) -> Self {
        Self::new(params.ring_q().allocate(level, Domain::Coefficient))
    }

    pub fn level(&self) -> usize {
        self.value.level()
    }

    pub fn domain(&self) -> Domain {
        self.value.domain()
    }

    pub fn value(&self) -> &Poly {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Poly {
        &mut self.value
    }
}

/// RLWE ciphertext `(c0, c1)` with `c0 + c1 * s = m + e`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    c0: Poly,
    c1: Poly,
}

impl Ciphertext {
    pub fn new(c0: Poly, c1: Poly) -> Self {
        assert_eq!(c0.level(), c1.level());
        assert_eq!(c0.domain(), c1.domain());
        Self { c0, c1 }
    }

    pub fn allocate(params: &Parameters, level: usize, domain: Domain) -> Self {
        let ring_q = params.ring_q();
        Self::new(ring_q.allocate(level, domain), ring_q.allocate(level, domain))
    }

    pub fn level(&self) -> usize {
        self.c0.level()
    }

    pub fn domain(&self) -> Domain {
        self.c0.domain()
    }

    pub fn c0(&self) -> &Poly {
        &self.c0
    }

    pub fn c1(&self) -> &Poly {
        &self.c1
    }

    pub fn c0_c1(&self) -> [&Poly; 2] {
        [&self.c0, &self.c1]
    }

    pub fn c0_c1_mut(&mut self) -> [&mut Poly; 2] {
        [&mut self.c0, &mut self.c1]
    }
}
