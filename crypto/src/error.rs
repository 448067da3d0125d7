use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error("log ring degree {log_n} outside 1..={max}")]
    InvalidRingDegree { log_n: usize, max: usize },
    #[error("primary modulus chain is empty")]
    EmptyModulusChain,
    #[error("modulus {modulus} is not a prime below 2^61 congruent to 1 mod {two_n}")]
    InvalidModulus { modulus: u64, two_n: usize },
    #[error("modulus {0} appears more than once")]
    DuplicateModulus(u64),
    #[error("log base {log_base} exceeds {max}")]
    InvalidLogBase { log_base: usize, max: usize },
    #[error("noise standard deviation {0} is not positive")]
    InvalidSigma(f64),
    #[error("hamming weight {hamming_weight} exceeds ring degree {n}")]
    InvalidHammingWeight { hamming_weight: usize, n: usize },
    #[error("secret key ring degree {key} does not match parameters ring degree {params}")]
    RingDegreeMismatch { key: usize, params: usize },
}
