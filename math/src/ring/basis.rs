use crate::{
    izip_eq,
    modulus::{big_mod, inv_mod, product, Prime},
    poly::{Domain, Poly},
    ring::RingQP,
};
use itertools::Itertools;
use num_bigint_dig::BigUint;

/// Exact centred fast base conversion from the residues modulo `from` to the
/// residues modulo `to`.
///
/// For `x` given modulo `Q = prod(from)`, the output is the residue of the
/// representative of `x` in `(-Q/2, Q/2]`. The rounding of the overflow
/// count is done in `f64`, which is exact as long as no input limb is within
/// `len(from) * 2^-53` of the rounding boundary.
#[derive(Clone, Debug)]
pub struct BasisConverter {
    from: Vec<Prime>,
    to: Vec<Prime>,
    hat_inv: Vec<u64>,
    hat_mod_to: Vec<Vec<u64>>,
    prod_mod_to: Vec<u64>,
    from_inv_f64: Vec<f64>,
}

impl BasisConverter {
    /// Products of `from.len()` word residues must fit in a `u128`.
    pub const MAX_FROM: usize = 64;

    pub fn new(from: &[Prime], to: &[Prime]) -> Self {
        assert!(!from.is_empty() && from.len() <= Self::MAX_FROM);
        let big_q = product(from);
        let hat = from.iter().map(|q| &big_q / BigUint::from(**q)).collect_vec();
        let hat_inv = izip_eq!(&hat, from)
            .map(|(hat, q)| inv_mod(big_mod(hat, q), **q).unwrap())
            .collect();
        let hat_mod_to = to
            .iter()
            .map(|p| hat.iter().map(|hat| big_mod(hat, p)).collect())
            .collect();
        let prod_mod_to = to.iter().map(|p| big_mod(&big_q, p)).collect();
        let from_inv_f64 = from.iter().map(|q| 1.0 / **q as f64).collect();
        Self {
            from: from.to_vec(),
            to: to.to_vec(),
            hat_inv,
            hat_mod_to,
            prod_mod_to,
            from_inv_f64,
        }
    }

    /// Converts `inputs` (one limb per `from` modulus) into each output
    /// `(j, limb)`, where `j` indexes `to`.
    pub fn convert(&self, inputs: &[&[u64]], outputs: &mut [(usize, &mut [u64])]) {
        assert_eq!(inputs.len(), self.from.len());
        let mut y = [0u64; Self::MAX_FROM];
        let y = &mut y[..self.from.len()];
        let ring_size = inputs[0].len();
        for k in 0..ring_size {
            let mut v = 0.0;
            izip_eq!(&mut *y, inputs, &self.from, &self.hat_inv, &self.from_inv_f64).for_each(
                |(y, input, q, hat_inv, q_inv)| {
                    *y = q.mul(input[k], *hat_inv);
                    v += *y as f64 * q_inv;
                },
            );
            let v = v.round() as u64;
            outputs.iter_mut().for_each(|(j, out)| {
                let p = &self.to[*j];
                let acc = izip_eq!(&*y, &self.hat_mod_to[*j])
                    .map(|(y, hat)| *y as u128 * *hat as u128)
                    .sum::<u128>();
                let acc = (acc % **p as u128) as u64;
                let overflow = ((v as u128 * self.prod_mod_to[*j] as u128) % **p as u128) as u64;
                out[k] = p.sub(acc, overflow);
            });
        }
    }
}

/// Basis extension between the primary chain `Q` and the auxiliary chain `P`.
#[derive(Clone, Debug)]
pub struct BasisExtender {
    p_to_q: Vec<BasisConverter>,
    p_inv_mod_q: Vec<Vec<u64>>,
}

impl BasisExtender {
    pub fn new(ring: &RingQP) -> Self {
        let (q, p) = (ring.q().moduli(), ring.aux().moduli());
        let p_to_q = (0..p.len())
            .map(|level_p| BasisConverter::new(&p[..=level_p], q))
            .collect();
        let p_inv_mod_q = (0..p.len())
            .map(|level_p| {
                let big_p = product(&p[..=level_p]);
                q.iter()
                    .map(|q| inv_mod(big_mod(&big_p, q), **q).unwrap())
                    .collect()
            })
            .collect();
        Self {
            p_to_q,
            p_inv_mod_q,
        }
    }

    /// Lifts limb 0 of `a` (coefficient domain, small norm) to its centred
    /// representative and reduces it into the first `level_p + 1` limbs of
    /// `out`.
    pub fn extend_small_norm_and_center(
        &self,
        ring: &RingQP,
        level_p: usize,
        a: &Poly,
        out: &mut Poly,
    ) {
        a.assert_domain(Domain::Coefficient);
        let q0 = ring.q().modulus(0);
        izip_eq!(&ring.aux().moduli()[..=level_p], &mut out.limbs_mut()[..=level_p]).for_each(
            |(p, out)| izip_eq!(out, a.limb(0)).for_each(|(b, a)| *b = p.from_i64(q0.center(*a))),
        );
        out.set_domain(Domain::Coefficient);
    }

    /// Computes `round(a / P)` over `Q` from `a` given over `QP`, inputs and
    /// output in the evaluation domain. `buf` is scratch over `P`.
    #[allow(clippy::too_many_arguments)]
    pub fn mod_down_qp_to_q_ntt(
        &self,
        ring: &RingQP,
        level_q: usize,
        level_p: usize,
        a_q: &Poly,
        a_p: &Poly,
        out: &mut Poly,
        buf: &mut Poly,
    ) {
        a_q.assert_domain(Domain::Evaluation);
        a_p.assert_domain(Domain::Evaluation);
        ring.aux().backward(level_p, buf, a_p);

        {
            let inputs = buf.limbs()[..=level_p].iter().map(Vec::as_slice).collect_vec();
            let mut outputs = out.limbs_mut()[..=level_q]
                .iter_mut()
                .map(Vec::as_mut_slice)
                .enumerate()
                .collect_vec();
            self.p_to_q[level_p].convert(&inputs, &mut outputs);
        }
        out.set_domain(Domain::Coefficient);
        ring.q().forward_assign(level_q, out);

        izip_eq!(
            &ring.q().moduli()[..=level_q],
            &self.p_inv_mod_q[level_p][..=level_q],
            &mut out.limbs_mut()[..=level_q],
            &a_q.limbs()[..=level_q]
        )
        .for_each(|(q, p_inv, out, a)| {
            let p_inv = q.prepare(*p_inv);
            izip_eq!(out, a).for_each(|(out, a)| *out = q.mul_prep(q.sub(*a, *out), &p_inv));
        });
    }
}
