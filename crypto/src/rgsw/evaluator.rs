use crate::{parameters::Parameters, rgsw::GadgetCiphertext, rlwe::Ciphertext};
use rgsw_math::{
    decomposer::{DigitDecomposer, RnsDecomposer},
    izip_eq,
    poly::{Domain, Poly, PolyQP},
    ring::{basis::BasisExtender, RingQP, RnsRing},
};
use std::sync::Arc;
use tracing::{debug, trace};

/// Largest modulus size for which the single limb path may sum every digit
/// product without reduction.
///
/// With `b`-bit moduli and `log_base >= 1` there are at most `b` digits per
/// half, so at most `2 * b` products below `(2^b - 1)^2` are summed.
pub const FAST_PATH_MAX_BITS: usize = fast_path_max_bits(u64::BITS);

const fn fast_path_max_bits(word_bits: u32) -> usize {
    let mut b = 1;
    loop {
        let next = b + 1;
        let max = (1u128 << next) - 1;
        if 2 * next as u128 * max * max >= 1u128 << word_bits {
            return b;
        }
        b = next;
    }
}

/// Algorithm selected by [`Evaluator::external_product`] for a gadget level
/// pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalProductPath {
    /// `level_q == 0`, at most one auxiliary limb and moduli of at most
    /// [`FAST_PATH_MAX_BITS`] bits: unreduced word accumulation.
    SingleLimbLazy,
    /// At most one auxiliary limb: digit decomposition of every limb.
    BitDecomposition,
    /// At least two auxiliary limbs: RNS group decomposition with lazy
    /// Montgomery accumulation.
    RnsDecomposition,
}

/// Counts the lazy products summed into an accumulator since its last
/// reduction.
///
/// Each lazy product is below `2q`, including the first one that sets the
/// accumulator. After a reduction the accumulator is below `q`. Between two
/// reductions it therefore holds less than `q + 2q * threshold` with
/// `threshold = (margin - 1) / 2`, and `2q * threshold <= q * (margin - 1)`
/// keeps that below `q * margin <= 2^64 - 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LazyReduction {
    threshold: u64,
    pending: u64,
}

impl LazyReduction {
    pub(crate) fn new(margin: u64) -> Self {
        Self {
            threshold: (margin.saturating_sub(1) >> 1).max(1),
            pending: 0,
        }
    }

    /// Records one more product, returns `true` when the accumulator must be
    /// reduced now.
    pub(crate) fn tick(&mut self) -> bool {
        self.pending += 1;
        if self.pending == self.threshold {
            self.pending = 0;
            true
        } else {
            false
        }
    }

    pub(crate) fn needs_flush(&self) -> bool {
        self.pending != 0
    }
}

#[derive(Clone, Debug)]
struct Buffers {
    decomp: PolyQP,
    acc: [PolyQP; 2],
    inv_ntt: [Poly; 2],
    ntt: [Poly; 2],
    digit: Vec<u64>,
    digit_ntt: PolyQP,
    mod_down: Option<Poly>,
}

impl Buffers {
    fn new(params: &Parameters) -> Self {
        let ring = params.ring();
        let (level_q, level_p) = (params.max_level_q(), params.max_level_p());
        let qp = || ring.allocate(level_q, level_p, Domain::Evaluation);
        let q = || ring.q().allocate(level_q, Domain::Evaluation);
        Self {
            decomp: qp(),
            acc: [qp(), qp()],
            inv_ntt: [q(), q()],
            ntt: [q(), q()],
            digit: vec![0; params.n()],
            digit_ntt: qp(),
            mod_down: level_p.map(|level_p| ring.aux().allocate(level_p, Domain::Evaluation)),
        }
    }
}

/// RLWE x RGSW external product.
///
/// Scratch space is owned by the instance, use [`Evaluator::shallow_copy`]
/// to get one per thread.
#[derive(Debug)]
pub struct Evaluator {
    params: Arc<Parameters>,
    extender: Option<Arc<BasisExtender>>,
    decomposer: Option<Arc<RnsDecomposer>>,
    fast_path_max_bits: usize,
    buffers: Buffers,
}

impl Evaluator {
    pub fn new(params: Arc<Parameters>) -> Self {
        let ring = params.ring();
        let extender = ring.p().map(|_| Arc::new(BasisExtender::new(ring)));
        let decomposer = ring.p().map(|_| Arc::new(RnsDecomposer::new(ring)));
        debug!(
            n = params.n(),
            q_count = params.q_count(),
            p_count = params.p_count(),
            "built rgsw evaluator"
        );
        Self {
            buffers: Buffers::new(&params),
            params,
            extender,
            decomposer,
            fast_path_max_bits: FAST_PATH_MAX_BITS,
        }
    }

    /// Shares the tables, reallocates the scratch space.
    pub fn shallow_copy(&self) -> Self {
        Self {
            params: self.params.clone(),
            extender: self.extender.clone(),
            decomposer: self.decomposer.clone(),
            fast_path_max_bits: self.fast_path_max_bits,
            buffers: Buffers::new(&self.params),
        }
    }

    pub fn params(&self) -> &Arc<Parameters> {
        &self.params
    }

    pub fn fast_path_max_bits(&self) -> usize {
        self.fast_path_max_bits
    }

    /// Lowers the modulus size bound of the single limb path, values above
    /// [`FAST_PATH_MAX_BITS`] are clamped.
    pub fn set_fast_path_max_bits(&mut self, bits: usize) {
        self.fast_path_max_bits = bits.min(FAST_PATH_MAX_BITS);
    }

    pub fn path_for(&self, level_q: usize, level_p: Option<usize>) -> ExternalProductPath {
        match level_p {
            Some(1..) => ExternalProductPath::RnsDecomposition,
            _ if level_q == 0
                && self.params.max_bit(level_q, level_p) <= self.fast_path_max_bits =>
            {
                ExternalProductPath::SingleLimbLazy
            }
            _ => ExternalProductPath::BitDecomposition,
        }
    }

    /// Writes `input x gadget` into `output`, in the evaluation domain at the
    /// level of the gadget.
    pub fn external_product(
        &mut self,
        input: &Ciphertext,
        gadget: &GadgetCiphertext,
        output: &mut Ciphertext,
    ) {
        assert_eq!(
            output.level(),
            gadget.level_q(),
            "output level differs from gadget level"
        );
        self.product_into_acc(input, gadget);
        self.write_output(gadget, output);
    }

    /// In-place [`Evaluator::external_product`].
    pub fn external_product_assign(&mut self, ct: &mut Ciphertext, gadget: &GadgetCiphertext) {
        self.product_into_acc(ct, gadget);
        self.write_output(gadget, ct);
    }

    fn product_into_acc(&mut self, input: &Ciphertext, gadget: &GadgetCiphertext) {
        let (level_q, level_p) = (gadget.level_q(), gadget.level_p());
        assert_eq!(input.level(), level_q, "input level differs from gadget level");
        assert_eq!(gadget.domain(), Domain::Evaluation, "gadget must be in the evaluation domain");
        let path = self.path_for(level_q, level_p);
        trace!(?path, level_q, ?level_p, "external product");
        match (path, level_p) {
            (ExternalProductPath::SingleLimbLazy, _) => self.single_limb_lazy(input, gadget),
            (ExternalProductPath::BitDecomposition, _) => self.bit_decomposition(input, gadget),
            (ExternalProductPath::RnsDecomposition, Some(level_p)) => {
                self.rns_decomposition(input, gadget, level_p)
            }
            (ExternalProductPath::RnsDecomposition, None) => unreachable!(),
        }
    }

    fn write_output(&mut self, gadget: &GadgetCiphertext, output: &mut Ciphertext) {
        let (level_q, level_p) = (gadget.level_q(), gadget.level_p());
        let ring = self.params.ring();
        let Buffers { acc, mod_down, .. } = &mut self.buffers;
        izip_eq!(output.c0_c1_mut(), acc.iter()).for_each(|(out, acc)| match level_p {
            Some(level_p) => {
                let extender = self.extender.as_deref().expect("missing basis extender");
                let buf = mod_down.as_mut().expect("missing auxiliary buffer");
                extender.mod_down_qp_to_q_ntt(ring, level_q, level_p, acc.q(), acc.aux(), out, buf);
            }
            None => out.copy_from(level_q, acc.q()),
        });
    }

    fn single_limb_lazy(&mut self, input: &Ciphertext, gadget: &GadgetCiphertext) {
        let level_p = gadget.level_p();
        let ring = self.params.ring();
        let decomposer = self.params.digit_decomposer();
        let Buffers {
            acc,
            inv_ntt,
            digit,
            digit_ntt,
            ..
        } = &mut self.buffers;

        acc.iter_mut().for_each(|acc| {
            acc.q_mut().fill(0, 0);
            if level_p.is_some() {
                acc.aux_mut().fill(0, 0);
            }
            acc.set_domain(Domain::Evaluation);
        });
        for (half, (c, coeff)) in izip_eq!(input.c0_c1(), inv_ntt.iter_mut()).enumerate() {
            to_coefficient(ring.q(), 0, c, coeff);
            for j in 0..gadget.decomp_bit() {
                digit_into(ring, 0, level_p, &decomposer, coeff.limb(0), j, digit, digit_ntt);
                for (col, acc) in acc.iter_mut().enumerate() {
                    let cell = gadget.cell(0, j, half, col);
                    slice_mul_add(acc.q_mut().limb_mut(0), digit_ntt.q().limb(0), cell.q().limb(0));
                    if level_p.is_some() {
                        let (acc_p, digit_p) = (acc.aux_mut().limb_mut(0), digit_ntt.aux().limb(0));
                        slice_mul_add(acc_p, digit_p, cell.aux().limb(0));
                    }
                }
            }
        }
        acc.iter_mut()
            .for_each(|acc| ring.inv_mform_assign(0, level_p, acc));
    }

    fn bit_decomposition(&mut self, input: &Ciphertext, gadget: &GadgetCiphertext) {
        let (level_q, level_p) = (gadget.level_q(), gadget.level_p());
        let ring = self.params.ring();
        let decomposer = self.params.digit_decomposer();
        let Buffers {
            acc,
            inv_ntt,
            digit,
            digit_ntt,
            ..
        } = &mut self.buffers;

        for (half, (c, coeff)) in izip_eq!(input.c0_c1(), inv_ntt.iter_mut()).enumerate() {
            to_coefficient(ring.q(), level_q, c, coeff);
            for i in 0..gadget.decomp_rns() {
                for j in 0..gadget.decomp_bit() {
                    let limb = coeff.limb(i);
                    digit_into(ring, level_q, level_p, &decomposer, limb, j, digit, digit_ntt);
                    let first = half == 0 && i == 0 && j == 0;
                    for (col, acc) in acc.iter_mut().enumerate() {
                        let cell = gadget.cell(i, j, half, col);
                        if first {
                            ring.mul_mont(level_q, level_p, acc, digit_ntt, cell);
                        } else {
                            ring.mul_mont_add_assign(level_q, level_p, acc, digit_ntt, cell);
                        }
                    }
                }
            }
        }
    }

    fn rns_decomposition(&mut self, input: &Ciphertext, gadget: &GadgetCiphertext, level_p: usize) {
        let level_q = gadget.level_q();
        let ring = self.params.ring();
        let decomposer = self.decomposer.as_deref().expect("missing rns decomposer");
        let Buffers {
            decomp,
            acc,
            inv_ntt,
            ntt,
            ..
        } = &mut self.buffers;

        let mut lazy_q = LazyReduction::new(self.params.qi_overflow_margin(level_q));
        let mut lazy_p = LazyReduction::new(self.params.pi_overflow_margin(level_p));
        let halves = izip_eq!(input.c0_c1(), ntt.iter_mut(), inv_ntt.iter_mut());
        for (half, (c, c_ntt, c_coeff)) in halves.enumerate() {
            to_evaluation(ring.q(), level_q, c, c_ntt);
            to_coefficient(ring.q(), level_q, c, c_coeff);
            for i in 0..gadget.decomp_rns() {
                decomposer.decompose_single(ring, level_q, level_p, i, c_ntt, c_coeff, decomp);
                for (col, acc) in acc.iter_mut().enumerate() {
                    let cell = gadget.cell(i, 0, half, col);
                    if half == 0 && i == 0 {
                        ring.mul_mont_lazy(level_q, Some(level_p), acc, decomp, cell);
                    } else {
                        ring.mul_mont_lazy_add_assign(level_q, Some(level_p), acc, decomp, cell);
                    }
                }
                if lazy_q.tick() {
                    trace!(level_q, "forced reduction of primary accumulators");
                    acc.iter_mut().for_each(|acc| ring.q().reduce_assign(level_q, acc.q_mut()));
                }
                if lazy_p.tick() {
                    trace!(level_p, "forced reduction of auxiliary accumulators");
                    acc.iter_mut().for_each(|acc| ring.aux().reduce_assign(level_p, acc.aux_mut()));
                }
            }
        }
        if lazy_q.needs_flush() {
            acc.iter_mut().for_each(|acc| ring.q().reduce_assign(level_q, acc.q_mut()));
        }
        if lazy_p.needs_flush() {
            acc.iter_mut().for_each(|acc| ring.aux().reduce_assign(level_p, acc.aux_mut()));
        }
    }
}

fn to_coefficient(ring: &RnsRing, level: usize, a: &Poly, out: &mut Poly) {
    match a.domain() {
        Domain::Coefficient => out.copy_from(level, a),
        Domain::Evaluation => ring.backward(level, out, a),
    }
}

fn to_evaluation(ring: &RnsRing, level: usize, a: &Poly, out: &mut Poly) {
    match a.domain() {
        Domain::Coefficient => ring.forward(level, out, a),
        Domain::Evaluation => out.copy_from(level, a),
    }
}

/// Digit `j` of the coefficient limb `source`, reduced and transformed into
/// every active limb of `out`.
#[allow(clippy::too_many_arguments)]
fn digit_into(
    ring: &RingQP,
    level_q: usize,
    level_p: Option<usize>,
    decomposer: &DigitDecomposer,
    source: &[u64],
    j: usize,
    digit: &mut [u64],
    out: &mut PolyQP,
) {
    decomposer.slice_digit(digit, source, j);
    let reduce_into = |ring: &RnsRing, level: usize, out: &mut Poly| {
        izip_eq!(&ring.moduli()[..=level], &mut out.limbs_mut()[..=level])
            .enumerate()
            .for_each(|(u, (q, limb))| {
                izip_eq!(&mut *limb, &*digit).for_each(|(b, a)| *b = q.reduce(*a));
                ring.ntt(u).forward(limb);
            });
    };
    reduce_into(ring.q(), level_q, out.q_mut());
    if let Some(level_p) = level_p {
        reduce_into(ring.aux(), level_p, out.aux_mut());
    }
    out.set_domain(Domain::Evaluation);
}

/// `c += a * b` on plain words.
fn slice_mul_add(c: &mut [u64], a: &[u64], b: &[u64]) {
    izip_eq!(c, a, b).for_each(|(c, a, b)| *c += a * b);
}

#[cfg(test)]
mod test {
    use crate::rgsw::evaluator::{fast_path_max_bits, LazyReduction, FAST_PATH_MAX_BITS};

    #[test]
    fn fast_path_bound() {
        assert_eq!(FAST_PATH_MAX_BITS, 29);
        let b = FAST_PATH_MAX_BITS as u128;
        assert!(2 * b * ((1 << b) - 1) * ((1 << b) - 1) < 1 << 64);
        let b = b + 1;
        assert!(2 * b * ((1 << b) - 1) * ((1 << b) - 1) >= 1 << 64);
        assert_eq!(fast_path_max_bits(32), 13);
    }

    #[test]
    fn lazy_reduction_schedule() {
        let mut lazy = LazyReduction::new(16);
        assert_eq!(lazy.threshold, 7);
        let forced = (0..20).filter(|_| lazy.tick()).count();
        assert_eq!(forced, 2);
        assert!(lazy.needs_flush());
        assert!(lazy.tick());
        assert!(!lazy.needs_flush());
    }

    #[test]
    fn lazy_reduction_small_margin() {
        for margin in [0, 1, 2, 3] {
            let mut lazy = LazyReduction::new(margin);
            assert!(lazy.tick());
            assert!(!lazy.needs_flush());
        }
        let mut lazy = LazyReduction::new(u64::MAX / ((1 << 61) - 1));
        assert_eq!(lazy.threshold, 3);
        assert!(!lazy.tick());
        assert!(!lazy.tick());
        assert!(lazy.tick());
    }

    #[test]
    fn lazy_reduction_bound_holds() {
        for bits in [40u32, 55, 60, 61] {
            let q = (1u64 << bits) - 1;
            let margin = u64::MAX / q;
            let lazy = LazyReduction::new(margin);
            let worst = q as u128 - 1 + lazy.threshold as u128 * (2 * q as u128 - 1);
            assert!(worst <= u64::MAX as u128);
        }
    }
}
