use crate::{
    error::Error,
    parameters::Parameters,
    rgsw::GadgetCiphertext,
    rlwe::{Plaintext, SecretKey},
    util::rng::ChaChaLweRng,
};
use rgsw_math::{
    distribution::{DistributionSized, Gaussian},
    poly::{Domain, Poly, PolyQP},
    ring::basis::BasisExtender,
};
use std::sync::Arc;
use tracing::debug;

/// Symmetric RGSW encryptor bound to one secret key.
///
/// Owns its samplers and scratch polynomials, so one instance serves one
/// thread at a time. [`Encryptor::shallow_copy`] gives an independent
/// instance sharing the read-only tables.
#[derive(Debug)]
pub struct Encryptor {
    params: Arc<Parameters>,
    sk: Arc<SecretKey>,
    extender: Option<Arc<BasisExtender>>,
    rng: ChaChaLweRng,
    gaussian: Gaussian,
    pt_times_p: Poly,
    err: Vec<i64>,
    err_qp: PolyQP,
}

impl Encryptor {
    pub fn new(params: Arc<Parameters>, sk: Arc<SecretKey>) -> Result<Self, Error> {
        let extender = params
            .ring_p()
            .map(|_| Arc::new(BasisExtender::new(params.ring())));
        let encryptor = Self::with_tables(params, sk, extender)?;
        debug!(
            n = encryptor.params.n(),
            q_count = encryptor.params.q_count(),
            p_count = encryptor.params.p_count(),
            "built rgsw encryptor"
        );
        Ok(encryptor)
    }

    fn with_tables(
        params: Arc<Parameters>,
        sk: Arc<SecretKey>,
        extender: Option<Arc<BasisExtender>>,
    ) -> Result<Self, Error> {
        if sk.ring_size() != params.n() {
            return Err(Error::RingDegreeMismatch {
                key: sk.ring_size(),
                params: params.n(),
            });
        }
        let ring = params.ring();
        let (level_q, level_p) = (params.max_level_q(), params.max_level_p());
        Ok(Self {
            rng: ChaChaLweRng::from_entropy(),
            gaussian: Gaussian::new(params.sigma()),
            pt_times_p: ring.q().allocate(level_q, Domain::Evaluation),
            err: vec![0; params.n()],
            err_qp: ring.allocate(level_q, level_p, Domain::Coefficient),
            params,
            sk,
            extender,
        })
    }

    /// Independent instance with the same key and tables, and fresh samplers
    /// and buffers.
    pub fn shallow_copy(&self) -> Self {
        Self {
            params: self.params.clone(),
            sk: self.sk.clone(),
            extender: self.extender.clone(),
            rng: ChaChaLweRng::from_entropy(),
            gaussian: self.gaussian,
            pt_times_p: self.pt_times_p.clone(),
            err: vec![0; self.err.len()],
            err_qp: self.err_qp.clone(),
        }
    }

    /// Shallow copy rebound to `sk`.
    pub fn with_key(&self, sk: Arc<SecretKey>) -> Result<Self, Error> {
        Self::with_tables(self.params.clone(), sk, self.extender.clone())
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    /// Overwrites every cell of `ct` with a fresh encryption of `pt`, or of
    /// zero when `pt` is `None`. Cells are left in Montgomery form in the
    /// domain `ct` was allocated with.
    pub fn encrypt(&mut self, pt: Option<&Plaintext>, ct: &mut GadgetCiphertext) {
        let (level_q, level_p, domain) = (ct.level_q(), ct.level_p(), ct.domain());
        let params = self.params.clone();
        let ring = params.ring();
        if let Some(pt) = pt {
            assert_eq!(pt.level(), level_q, "plaintext level differs from gadget level");
            self.scale_plaintext(pt, level_q, level_p, domain);
        }

        let group = level_p.map_or(1, |level_p| level_p + 1);
        let shift = 1u64 << params.log_base2();
        for j in 0..ct.decomp_bit() {
            for i in 0..ct.decomp_rns() {
                let [b0, a0, b1, a1] = ct.block_mut(i, j) else {
                    unreachable!()
                };
                self.encrypt_zero(level_q, level_p, domain, b0, a0);
                self.encrypt_zero(level_q, level_p, domain, b1, a1);
                if pt.is_some() {
                    // The last group may be short.
                    (i * group..((i + 1) * group).min(level_q + 1)).for_each(|u| {
                        let q = ring.q().modulus(u);
                        let m = self.pt_times_p.limb(u);
                        q.slice_add_assign(b0.q_mut().limb_mut(u), m);
                        q.slice_add_assign(a1.q_mut().limb_mut(u), m);
                    });
                }
                [b0, a0, b1, a1]
                    .into_iter()
                    .for_each(|cell| ring.mform_assign(level_q, level_p, cell));
            }
            if pt.is_some() {
                ring.q().scalar_mul_assign(level_q, &mut self.pt_times_p, shift);
            }
        }
    }

    /// `pt * P` in the domain of the gadget.
    fn scale_plaintext(
        &mut self,
        pt: &Plaintext,
        level_q: usize,
        level_p: Option<usize>,
        domain: Domain,
    ) {
        let ring = self.params.ring();
        let buf = &mut self.pt_times_p;
        buf.copy_from(level_q, pt.value());
        if let Some(level_p) = level_p {
            ring.q().scalar_mul_big_assign(level_q, buf, &ring.aux().modulus_product(level_p));
        }
        match (buf.domain(), domain) {
            (Domain::Coefficient, Domain::Evaluation) => ring.q().forward_assign(level_q, buf),
            (Domain::Evaluation, Domain::Coefficient) => ring.q().backward_assign(level_q, buf),
            _ => {}
        }
    }

    /// Writes `(b, a)` with `b + a * s = e` over `QP`.
    fn encrypt_zero(
        &mut self,
        level_q: usize,
        level_p: Option<usize>,
        domain: Domain,
        b: &mut PolyQP,
        a: &mut PolyQP,
    ) {
        let params = self.params.clone();
        let ring = params.ring();
        a.set_domain(Domain::Evaluation);
        ring.sample_uniform(level_q, level_p, a, self.rng.a());
        match domain {
            Domain::Evaluation => {
                Self::sample_error(
                    &params,
                    self.extender.as_deref(),
                    self.gaussian,
                    &mut self.err,
                    &mut self.rng,
                    level_q,
                    level_p,
                    b,
                );
                ring.forward_assign(level_q, level_p, b);
                ring.mul_mont_sub_assign(level_q, level_p, b, a, self.sk.value());
            }
            Domain::Coefficient => {
                b.q_mut().fill(level_q, 0);
                if let Some(level_p) = level_p {
                    b.aux_mut().fill(level_p, 0);
                }
                b.set_domain(Domain::Evaluation);
                ring.mul_mont_sub_assign(level_q, level_p, b, a, self.sk.value());
                ring.backward_assign(level_q, level_p, b);
                ring.backward_assign(level_q, level_p, a);
                Self::sample_error(
                    &params,
                    self.extender.as_deref(),
                    self.gaussian,
                    &mut self.err,
                    &mut self.rng,
                    level_q,
                    level_p,
                    &mut self.err_qp,
                );
                ring.add_assign(level_q, level_p, b, &self.err_qp);
            }
        }
    }

    /// Gaussian error over `Q`, extended to `P` by its centred lift, in the
    /// coefficient domain.
    #[allow(clippy::too_many_arguments)]
    fn sample_error(
        params: &Parameters,
        extender: Option<&BasisExtender>,
        gaussian: Gaussian,
        err: &mut [i64],
        rng: &mut ChaChaLweRng,
        level_q: usize,
        level_p: Option<usize>,
        out: &mut PolyQP,
    ) {
        let ring = params.ring();
        gaussian.sample_into(err, rng.noise());
        ring.q().set_small(level_q, out.q_mut(), err);
        if let Some(level_p) = level_p {
            let extender = extender.expect("missing basis extender");
            let (q, p) = out.q_p_mut();
            let p = p.expect("missing auxiliary component");
            extender.extend_small_norm_and_center(ring, level_p, q, p);
        }
    }
}
