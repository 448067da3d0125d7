pub mod error;
pub mod parameters;
pub mod rgsw;
pub mod rlwe;
pub mod util;

pub use error::Error;
pub use parameters::{Parameters, ParametersLiteral};
