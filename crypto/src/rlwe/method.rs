use crate::{
    parameters::Parameters,
    rlwe::{Ciphertext, Plaintext, SecretKey},
    util::rng::LweRng,
};
use rand::RngCore;
use rgsw_math::{
    distribution::{DistributionSized, Gaussian},
    poly::Domain,
};

/// Encrypts `pt` (or zero) into `ct` at the level of `ct`, output in the
/// evaluation domain.
pub fn sk_encrypt(
    params: &Parameters,
    sk: &SecretKey,
    pt: Option<&Plaintext>,
    ct: &mut Ciphertext,
    rng: &mut LweRng<impl RngCore, impl RngCore>,
) {
    let ring_q = params.ring_q();
    let level = ct.level();
    let e: Vec<i64> = Gaussian::new(params.sigma()).sample_vec(params.n(), rng.noise());
    let [c0, c1] = ct.c0_c1_mut();
    ring_q.set_small(level, c0, &e);
    ring_q.forward_assign(level, c0);
    c1.set_domain(Domain::Evaluation);
    ring_q.sample_uniform(level, c1, rng.a());
    ring_q.mul_mont_sub_assign(level, c0, c1, sk.value().q());
    if let Some(pt) = pt {
        assert_eq!(pt.level(), level);
        let mut m = pt.value().clone();
        if m.domain() == Domain::Coefficient {
            ring_q.forward_assign(level, &mut m);
        }
        ring_q.add_assign(level, c0, &m);
    }
}

/// Computes `c0 + c1 * s` into `pt` in the coefficient domain.
pub fn decrypt(params: &Parameters, sk: &SecretKey, ct: &Ciphertext, pt: &mut Plaintext) {
    let ring_q = params.ring_q();
    let level = ct.level();
    let [mut m, mut c1] = ct.c0_c1().map(Clone::clone);
    if ct.domain() == Domain::Coefficient {
        ring_q.forward_assign(level, &mut m);
        ring_q.forward_assign(level, &mut c1);
    }
    ring_q.mul_mont_add_assign(level, &mut m, &c1, sk.value().q());
    ring_q.backward_assign(level, &mut m);
    pt.value_mut().copy_from(level, &m);
}
