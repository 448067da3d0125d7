use crate::{
    izip_eq,
    poly::{Domain, Poly, PolyQP},
    ring::{basis::BasisConverter, RingQP},
};
use itertools::{chain, Itertools};

/// Splits coefficients into unsigned `log_base`-bit windows, least
/// significant first. `log_base == 0` disables the split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitDecomposer {
    log_base: usize,
    mask: u64,
}

impl DigitDecomposer {
    pub fn new(log_base: usize) -> Self {
        let mask = match log_base {
            0 | 64.. => u64::MAX,
            _ => (1 << log_base) - 1,
        };
        Self { log_base, mask }
    }

    #[inline(always)]
    pub fn log_base(&self) -> usize {
        self.log_base
    }

    /// Number of windows covering `bits` bits.
    pub fn level(&self, bits: usize) -> usize {
        match self.log_base {
            0 => 1,
            log_base => bits.div_ceil(log_base),
        }
    }

    #[inline(always)]
    pub fn digit(&self, a: u64, j: usize) -> u64 {
        let shift = j * self.log_base;
        if shift >= u64::BITS as usize {
            0
        } else {
            (a >> shift) & self.mask
        }
    }

    pub fn slice_digit(&self, b: &mut [u64], a: &[u64], j: usize) {
        izip_eq!(b, a).for_each(|(b, a)| *b = self.digit(*a, j));
    }
}

/// Single-group RNS gadget decomposition onto the extended basis `QP`.
///
/// With `alpha = level_p + 1`, group `i` covers the primary limbs
/// `[i * alpha, min((i + 1) * alpha, level_q + 1))`. Its residues are
/// extended exactly to every other active limb of `Q` and `P`.
#[derive(Clone, Debug)]
pub struct RnsDecomposer {
    q_count: usize,
    // [level_p][group][len - 1]
    converters: Vec<Vec<Vec<BasisConverter>>>,
}

impl RnsDecomposer {
    pub fn new(ring: &RingQP) -> Self {
        let (q, p) = (ring.q().moduli(), ring.aux().moduli());
        let to = chain(q, p).copied().collect_vec();
        let converters = (1..=p.len())
            .map(|alpha| {
                (0..q.len().div_ceil(alpha))
                    .map(|group| {
                        let start = group * alpha;
                        (1..=alpha.min(q.len() - start))
                            .map(|len| BasisConverter::new(&q[start..start + len], &to))
                            .collect()
                    })
                    .collect()
            })
            .collect();
        Self {
            q_count: q.len(),
            converters,
        }
    }

    /// Number of groups covering `level_q + 1` limbs.
    pub fn group_count(level_q: usize, level_p: usize) -> usize {
        (level_q + 1).div_ceil(level_p + 1)
    }

    /// Writes group `group` of `a` into `out` in the evaluation domain.
    /// `a_ntt` and `a_coeff` are the same polynomial in both domains.
    #[allow(clippy::too_many_arguments)]
    pub fn decompose_single(
        &self,
        ring: &RingQP,
        level_q: usize,
        level_p: usize,
        group: usize,
        a_ntt: &Poly,
        a_coeff: &Poly,
        out: &mut PolyQP,
    ) {
        a_ntt.assert_domain(Domain::Evaluation);
        a_coeff.assert_domain(Domain::Coefficient);
        let alpha = level_p + 1;
        let start = group * alpha;
        let end = (start + alpha).min(level_q + 1);
        assert!(start < end);
        let converter = &self.converters[level_p][group][end - start - 1];

        let (out_q, out_p) = out.q_p_mut();
        let out_p = out_p.expect("missing auxiliary component");
        {
            let inputs = a_coeff.limbs()[start..end].iter().map(Vec::as_slice).collect_vec();
            let q_outputs = out_q.limbs_mut()[..=level_q]
                .iter_mut()
                .enumerate()
                .filter(|(u, _)| !(start..end).contains(u));
            let p_outputs = out_p.limbs_mut()[..=level_p]
                .iter_mut()
                .enumerate()
                .map(|(v, limb)| (self.q_count + v, limb));
            let mut outputs = chain(q_outputs, p_outputs)
                .map(|(j, limb)| (j, limb.as_mut_slice()))
                .collect_vec();
            converter.convert(&inputs, &mut outputs);
        }

        (0..=level_q).for_each(|u| {
            if (start..end).contains(&u) {
                out_q.limb_mut(u).copy_from_slice(a_ntt.limb(u));
            } else {
                ring.q().ntt(u).forward(out_q.limb_mut(u));
            }
        });
        (0..=level_p).for_each(|v| ring.aux().ntt(v).forward(out_p.limb_mut(v)));
        out.set_domain(Domain::Evaluation);
    }
}
