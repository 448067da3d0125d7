use crate::{
    parameters::{test::literal, Parameters, ParametersLiteral},
    rlwe::{self, Ciphertext, Plaintext, SecretKey},
    util::rng::{test::StdLweRng, LweRng},
};
use itertools::Itertools;
use num_bigint_dig::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};
use rand::{distributions::Uniform, Rng, RngCore};
use rgsw_math::{
    modulus::{big_mod, inv_mod, mul_mod, Prime},
    poly::Domain,
    util::dev::Stats,
};
use std::sync::Arc;

/// Test harness over one parameter set and one secret key, plaintexts
/// encode messages modulo `t` scaled by `floor(Q / t)`.
#[derive(Clone, Debug)]
pub(crate) struct Rlwe {
    params: Arc<Parameters>,
    sk: Arc<SecretKey>,
    t: u64,
}

impl Rlwe {
    pub fn new(literal: ParametersLiteral, t: u64) -> Self {
        let params = Parameters::new(literal).unwrap();
        let sk = SecretKey::sample(&params, rand::thread_rng());
        Self {
            params: Arc::new(params),
            sk: Arc::new(sk),
            t,
        }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn sk(&self) -> &Arc<SecretKey> {
        &self.sk
    }

    pub fn n(&self) -> usize {
        self.params.n()
    }

    pub fn sample_message(&self, rng: impl RngCore) -> Vec<u64> {
        rng.sample_iter(Uniform::new(0, self.t)).take(self.n()).collect()
    }

    fn modulus(&self, level: usize) -> BigUint {
        self.params.ring_q().modulus_product(level)
    }

    fn delta(&self, level: usize) -> BigUint {
        self.modulus(level) / BigUint::from(self.t)
    }

    pub fn encode(&self, level: usize, m: &[u64]) -> Plaintext {
        let ring_q = self.params.ring_q();
        let mut pt = Plaintext::allocate(&self.params, level);
        let m = m.iter().map(|m| *m as i64).collect_vec();
        ring_q.set_small(level, pt.value_mut(), &m);
        ring_q.scalar_mul_big_assign(level, pt.value_mut(), &self.delta(level));
        pt
    }

    /// Coefficients of `pt` lifted to `[0, Q)`.
    fn lift(&self, pt: &Plaintext) -> Vec<BigUint> {
        pt.value().assert_domain(Domain::Coefficient);
        let level = pt.level();
        let moduli = &self.params.ring_q().moduli()[..=level];
        (0..self.n())
            .map(|k| {
                let residues = pt.value().limbs()[..=level]
                    .iter()
                    .map(|limb| limb[k])
                    .collect_vec();
                crt(moduli, &residues)
            })
            .collect()
    }

    pub fn decode(&self, pt: &Plaintext) -> Vec<u64> {
        let big_q = self.modulus(pt.level());
        let t = BigUint::from(self.t);
        self.lift(pt)
            .into_iter()
            .map(|x| ((x * &t + (&big_q >> 1usize)) / &big_q % &t).to_u64().unwrap())
            .collect()
    }

    /// Centred distance between `pt` and the encoding of `m`.
    pub fn noise(&self, pt: &Plaintext, m: &[u64]) -> Stats<f64> {
        let big_q = BigInt::from_biguint(Sign::Plus, self.modulus(pt.level()));
        let delta = BigInt::from_biguint(Sign::Plus, self.delta(pt.level()));
        let mut stats = Stats::default();
        self.lift(pt).into_iter().zip_eq(m).for_each(|(x, m)| {
            let x = BigInt::from_biguint(Sign::Plus, x);
            let mut e = (x - &delta * BigInt::from(*m)) % &big_q;
            if e < BigInt::zero() {
                e += &big_q;
            }
            if &e + &e > big_q {
                e -= &big_q;
            }
            stats.push(e.to_f64().unwrap());
        });
        stats
    }

    pub fn sk_encrypt(
        &self,
        level: usize,
        m: Option<&[u64]>,
        rng: &mut LweRng<impl RngCore, impl RngCore>,
    ) -> Ciphertext {
        let mut ct = Ciphertext::allocate(&self.params, level, Domain::Evaluation);
        let pt = m.map(|m| self.encode(level, m));
        rlwe::sk_encrypt(&self.params, &self.sk, pt.as_ref(), &mut ct, rng);
        ct
    }

    pub fn decrypt(&self, ct: &Ciphertext) -> Plaintext {
        let mut pt = Plaintext::allocate(&self.params, ct.level());
        rlwe::decrypt(&self.params, &self.sk, ct, &mut pt);
        pt
    }

    /// Negacyclic product modulo `t`.
    pub fn message_poly_mul(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let n = self.n();
        let mut c = vec![0; n];
        for i in 0..n {
            for j in 0..n {
                let t = a[i] * b[j] % self.t;
                if i + j < n {
                    c[i + j] = (c[i + j] + t) % self.t;
                } else {
                    c[i + j - n] = (c[i + j - n] + self.t - t) % self.t;
                }
            }
        }
        c
    }
}

pub(crate) fn crt(moduli: &[Prime], residues: &[u64]) -> BigUint {
    let big_q = rgsw_math::modulus::product(moduli);
    moduli.iter().zip_eq(residues).fold(BigUint::zero(), |acc, (q, r)| {
        let hat = &big_q / BigUint::from(**q);
        let hat_inv = inv_mod(big_mod(&hat, q), **q).unwrap();
        (acc + hat * BigUint::from(mul_mod(*r, hat_inv, **q))) % &big_q
    })
}

#[test]
fn encrypt_decrypt() {
    let mut rng = StdLweRng::from_entropy();
    let cases: [(&[usize], &[usize]); 3] = [
        (&[20], &[]),
        (&[40, 40, 40], &[50]),
        (&[50, 50], &[55, 55]),
    ];
    for (q_bits, p_bits) in cases {
        let rlwe = Rlwe::new(literal(6, q_bits, p_bits, 8), 16);
        for level in 0..q_bits.len() {
            for _ in 0..10 {
                let m = rlwe.sample_message(rng.noise());
                let ct = rlwe.sk_encrypt(level, Some(&m), &mut rng);
                let pt = rlwe.decrypt(&ct);
                assert_eq!(rlwe.decode(&pt), m);
                assert!(rlwe.noise(&pt, &m).max_abs() <= 6.0 * ParametersLiteral::DEFAULT_SIGMA);
            }
        }
    }
}

#[test]
fn decrypt_coefficient_domain() {
    let mut rng = StdLweRng::from_entropy();
    let rlwe = Rlwe::new(literal(5, &[30, 30], &[], 8), 8);
    let m = rlwe.sample_message(rng.noise());
    let mut ct = rlwe.sk_encrypt(1, Some(&m), &mut rng);
    let ring_q = rlwe.params().ring_q();
    ct.c0_c1_mut().into_iter().for_each(|c| ring_q.backward_assign(1, c));
    assert_eq!(ct.domain(), Domain::Coefficient);
    assert_eq!(rlwe.decode(&rlwe.decrypt(&ct)), m);

    let zero = rlwe.sk_encrypt(0, None, &mut rng);
    assert_eq!(rlwe.decode(&rlwe.decrypt(&zero)), vec![0; rlwe.n()]);
}
