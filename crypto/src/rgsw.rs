mod encryptor;
mod evaluator;
mod structure;


pub use encryptor::Encryptor;
pub use evaluator::{Evaluator, ExternalProductPath, FAST_PATH_MAX_BITS};
pub use structure::GadgetCiphertext;
