mod method;
mod structure;

#[cfg(test)]
pub(crate) mod test;

pub use method::{decrypt, sk_encrypt};
pub use structure::{Ciphertext, Plaintext, SecretKey};
