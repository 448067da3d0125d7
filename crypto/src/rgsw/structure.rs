use crate::parameters::Parameters;
use rgsw_math::poly::{Domain, PolyQP};

/// RGSW ciphertext as an arena of `decomp_rns * decomp_bit` blocks.
///
/// Block `(i, j)` is `[[b0, a0], [b1, a1]]`, stored row-major as 4
/// consecutive cells. Each row is an RLWE encryption of zero over `QP`, and
/// the gadget digit `(i, j)` of the plaintext sits on the diagonal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GadgetCiphertext {
    level_q: usize,
    level_p: Option<usize>,
    decomp_rns: usize,
    decomp_bit: usize,
    cells: Vec<PolyQP>,
}

impl GadgetCiphertext {
    pub fn allocate(params: &Parameters, level_q: usize, level_p: Option<usize>) -> Self {
        Self::allocate_with_domain(params, level_q, level_p, Domain::Evaluation)
    }

    pub fn allocate_with_domain(
        params: &Parameters,
        level_q: usize,
        level_p: Option<usize>,
        domain: Domain,
    ) -> Self {
        let decomp_rns = params.decomp_rns(level_q, level_p);
        let decomp_bit = params.decomp_bit(level_q, level_p);
        let ring = params.ring();
        let cells = (0..decomp_rns * decomp_bit * 4)
            .map(|_| ring.allocate(level_q, level_p, domain))
            .collect();
        Self {
            level_q,
            level_p,
            decomp_rns,
            decomp_bit,
            cells,
        }
    }

    pub fn level_q(&self) -> usize {
        self.level_q
    }

    pub fn level_p(&self) -> Option<usize> {
        self.level_p
    }

    pub fn decomp_rns(&self) -> usize {
        self.decomp_rns
    }

    pub fn decomp_bit(&self) -> usize {
        self.decomp_bit
    }

    pub fn domain(&self) -> Domain {
        self.cells[0].domain()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[PolyQP] {
        &self.cells
    }

    #[inline(always)]
    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.decomp_rns && j < self.decomp_bit);
        (i * self.decomp_bit + j) * 4
    }

    #[inline(always)]
    pub fn cell(&self, i: usize, j: usize, row: usize, col: usize) -> &PolyQP {
        debug_assert!(row < 2 && col < 2);
        &self.cells[self.index(i, j) + row * 2 + col]
    }

    /// The 4 cells `[b0, a0, b1, a1]` of block `(i, j)`.
    pub fn block_mut(&mut self, i: usize, j: usize) -> &mut [PolyQP] {
        let start = self.index(i, j);
        &mut self.cells[start..start + 4]
    }
}
