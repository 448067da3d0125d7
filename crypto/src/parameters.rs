use crate::error::Error;
use itertools::{chain, Itertools};
use rgsw_math::{
    decomposer::DigitDecomposer,
    modulus::Prime,
    ring::{RingQP, RnsRing},
};
use tracing::debug;

/// Plain configuration record, validated by [`Parameters::new`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParametersLiteral {
    pub log_n: usize,
    pub q: Vec<u64>,
    pub p: Vec<u64>,
    pub log_base2: usize,
    pub sigma: f64,
    pub hamming_weight: usize,
}

impl ParametersLiteral {
    pub const DEFAULT_SIGMA: f64 = 3.2;
}

#[derive(Clone, Debug)]
pub struct Parameters {
    literal: ParametersLiteral,
    ring: RingQP,
}

impl Parameters {
    pub const MAX_LOG_N: usize = 17;
    pub const MAX_LOG_BASE2: usize = 61;

    pub fn new(literal: ParametersLiteral) -> Result<Self, Error> {
        let log_n = literal.log_n;
        if !(1..=Self::MAX_LOG_N).contains(&log_n) {
            return Err(Error::InvalidRingDegree {
                log_n,
                max: Self::MAX_LOG_N,
            });
        }
        let n = 1 << log_n;
        if literal.q.is_empty() {
            return Err(Error::EmptyModulusChain);
        }
        let two_n = 2 * n;
        let primes = chain(&literal.q, &literal.p)
            .map(|modulus| {
                Prime::try_new(*modulus)
                    .filter(|_| modulus % two_n as u64 == 1)
                    .ok_or(Error::InvalidModulus {
                        modulus: *modulus,
                        two_n,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(modulus) = chain(&literal.q, &literal.p).duplicates().next() {
            return Err(Error::DuplicateModulus(*modulus));
        }
        if literal.log_base2 > Self::MAX_LOG_BASE2 {
            return Err(Error::InvalidLogBase {
                log_base: literal.log_base2,
                max: Self::MAX_LOG_BASE2,
            });
        }
        if !(literal.sigma > 0.0) {
            return Err(Error::InvalidSigma(literal.sigma));
        }
        if literal.hamming_weight > n {
            return Err(Error::InvalidHammingWeight {
                hamming_weight: literal.hamming_weight,
                n,
            });
        }

        let (q, p) = primes.split_at(literal.q.len());
        let ring_q = RnsRing::new(q.iter().copied(), n);
        let ring_p = (!p.is_empty()).then(|| RnsRing::new(p.iter().copied(), n));
        debug!(
            n,
            q_count = q.len(),
            p_count = p.len(),
            log_base2 = literal.log_base2,
            "built parameters"
        );
        Ok(Self {
            literal,
            ring: RingQP::new(ring_q, ring_p),
        })
    }

    pub fn literal(&self) -> &ParametersLiteral {
        &self.literal
    }

    pub fn n(&self) -> usize {
        1 << self.literal.log_n
    }

    pub fn log_n(&self) -> usize {
        self.literal.log_n
    }

    pub fn ring(&self) -> &RingQP {
        &self.ring
    }

    pub fn ring_q(&self) -> &RnsRing {
        self.ring.q()
    }

    pub fn ring_p(&self) -> Option<&RnsRing> {
        self.ring.p()
    }

    pub fn q_count(&self) -> usize {
        self.literal.q.len()
    }

    pub fn p_count(&self) -> usize {
        self.literal.p.len()
    }

    pub fn max_level_q(&self) -> usize {
        self.q_count() - 1
    }

    pub fn max_level_p(&self) -> Option<usize> {
        self.p_count().checked_sub(1)
    }

    pub fn log_base2(&self) -> usize {
        self.literal.log_base2
    }

    pub fn sigma(&self) -> f64 {
        self.literal.sigma
    }

    pub fn hamming_weight(&self) -> usize {
        self.literal.hamming_weight
    }

    pub fn digit_decomposer(&self) -> DigitDecomposer {
        DigitDecomposer::new(self.log_base2())
    }

    /// Bit size of the largest active modulus over both chains.
    pub fn max_bit(&self, level_q: usize, level_p: Option<usize>) -> usize {
        let bits_p = level_p.map_or(0, |level_p| self.ring.aux().max_bits(level_p));
        self.ring_q().max_bits(level_q).max(bits_p)
    }

    /// Number of RNS groups of the gadget at the level pair.
    pub fn decomp_rns(&self, level_q: usize, level_p: Option<usize>) -> usize {
        match level_p {
            None => level_q + 1,
            Some(level_p) => (level_q + 1).div_ceil(level_p + 1),
        }
    }

    /// Number of bit digits per RNS group at the level pair.
    pub fn decomp_bit(&self, level_q: usize, level_p: Option<usize>) -> usize {
        match (self.log_base2(), level_p) {
            (0, _) | (_, Some(1..)) => 1,
            _ => self
                .digit_decomposer()
                .level(self.max_bit(level_q, level_p)),
        }
    }

    /// Number of products of two residues below `q_i` that fit in a word.
    pub fn qi_overflow_margin(&self, level_q: usize) -> u64 {
        overflow_margin(&self.ring_q().moduli()[..=level_q])
    }

    pub fn pi_overflow_margin(&self, level_p: usize) -> u64 {
        overflow_margin(&self.ring.aux().moduli()[..=level_p])
    }
}

fn overflow_margin(moduli: &[Prime]) -> u64 {
    u64::MAX / moduli.iter().map(|q| **q).max().unwrap_or(1)
}

#[cfg(test)]
pub(crate) mod test {
    use crate::{
        error::Error,
        parameters::{Parameters, ParametersLiteral},
    };
    use itertools::Itertools;
    use rgsw_math::modulus::Prime;

    pub(crate) fn literal(
        log_n: usize,
        q_bits: &[usize],
        p_bits: &[usize],
        log_base2: usize,
    ) -> ParametersLiteral {
        let mut primes = Prime::gen_iter(q_bits[0], log_n + 1);
        let q = q_bits.iter().map(|_| *primes.next().unwrap()).collect_vec();
        let p = p_bits
            .first()
            .map(|bits| {
                Prime::gen_iter(*bits, log_n + 1)
                    .map(|p| *p)
                    .filter(|p| !q.contains(p))
                    .take(p_bits.len())
                    .collect_vec()
            })
            .unwrap_or_default();
        ParametersLiteral {
            log_n,
            q,
            p,
            log_base2,
            sigma: ParametersLiteral::DEFAULT_SIGMA,
            hamming_weight: 1 << (log_n - 1),
        }
    }

    #[test]
    fn validation() {
        let valid = literal(4, &[20], &[], 4);
        assert!(Parameters::new(valid.clone()).is_ok());

        let check = |f: fn(&mut ParametersLiteral), err: Error| {
            let mut literal = valid.clone();
            f(&mut literal);
            assert_eq!(Parameters::new(literal).unwrap_err(), err);
        };
        check(|l| l.log_n = 0, Error::InvalidRingDegree { log_n: 0, max: 17 });
        check(|l| l.log_n = 18, Error::InvalidRingDegree { log_n: 18, max: 17 });
        check(|l| l.q.clear(), Error::EmptyModulusChain);
        check(|l| l.q = vec![15], Error::InvalidModulus { modulus: 15, two_n: 32 });
        check(|l| l.q = vec![101], Error::InvalidModulus { modulus: 101, two_n: 32 });
        check(|l| l.p = l.q.clone(), Error::DuplicateModulus(valid.q[0]));
        check(|l| l.log_base2 = 62, Error::InvalidLogBase { log_base: 62, max: 61 });
        check(|l| l.sigma = 0.0, Error::InvalidSigma(0.0));
        check(|l| l.hamming_weight = 17, Error::InvalidHammingWeight { hamming_weight: 17, n: 16 });
    }

    #[test]
    fn decomposition_shape() {
        let params = Parameters::new(literal(4, &[20], &[], 4)).unwrap();
        assert_eq!(params.max_bit(0, None), 20);
        assert_eq!(params.decomp_rns(0, None), 1);
        assert_eq!(params.decomp_bit(0, None), 5);
        assert_eq!(params.max_level_p(), None);

        let params = Parameters::new(literal(5, &[40, 40, 40, 40, 40], &[50, 50], 7)).unwrap();
        assert_eq!(params.decomp_rns(4, None), 5);
        assert_eq!(params.decomp_rns(4, Some(0)), 5);
        assert_eq!(params.decomp_rns(4, Some(1)), 3);
        assert_eq!(params.decomp_rns(3, Some(1)), 2);
        assert_eq!(params.decomp_bit(4, None), 6);
        assert_eq!(params.decomp_bit(4, Some(0)), 8);
        assert_eq!(params.decomp_bit(4, Some(1)), 1);
        assert_eq!(params.max_level_p(), Some(1));
        let max_q = params.ring_q().moduli().iter().map(|q| **q).max().unwrap();
        assert_eq!(params.qi_overflow_margin(4), u64::MAX / max_q);

        let mut zero_base = literal(5, &[40, 40], &[], 0);
        zero_base.log_base2 = 0;
        let params = Parameters::new(zero_base).unwrap();
        assert_eq!(params.decomp_bit(1, None), 1);
    }
}
