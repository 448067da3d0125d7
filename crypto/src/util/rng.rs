use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Sampling streams of an encryption: `noise` feeds the Gaussian errors and
/// `a` feeds the uniform halves of zero encryptions over `Q` and `P`.
#[derive(Clone, Debug)]
pub struct LweRng<R1, R2> {
    noise: R1,
    a: R2,
}

/// Streams owned by each [`Encryptor`](crate::rgsw::Encryptor).
pub type ChaChaLweRng = LweRng<ChaCha20Rng, ChaCha20Rng>;

impl<R1: SeedableRng, R2: SeedableRng> LweRng<R1, R2> {
    /// Both streams seeded independently from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            noise: R1::from_entropy(),
            a: R2::from_entropy(),
        }
    }
}

impl<R1: RngCore, R2: RngCore> LweRng<R1, R2> {
    pub fn noise(&mut self) -> &mut R1 {
        &mut self.noise
    }

    pub fn a(&mut self) -> &mut R2 {
        &mut self.a
    }
}
