pub mod decomposer;
pub mod distribution;
pub mod modulus;
pub mod poly;
pub mod ring;
pub mod util;
