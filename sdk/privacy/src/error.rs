use thiserror::Error;
use tessera_wire::WireError;

#[derive(Debug, Error)]
pub enum PrivacyError {
    #[error("prime subset is empty")]
    EmptyPrimeSubset,

    #[error("prime index {index} out of range for a set of {len}")]
    PrimeIndexOutOfRange { index: usize, len: usize },

    #[error("duplicate prime at position {0}")]
    DuplicatePrime(usize),

    #[error("prime at position {index} has {bits} bits, need more than {required}")]
    PrimeTooSmall {
        index: usize,
        bits: u64,
        required: u64,
    },

    #[error("moduli are not pairwise coprime")]
    NotInvertible,

    #[error("reading prime must be at least 2")]
    InvalidPrime,

    #[error("invalid prime text on line {0}")]
    InvalidPrimeText(usize),

    #[error("malformed encrypted share: {0}")]
    Encoding(#[from] WireError),

    #[error("ciphertext length {0} is not a whole number of blocks")]
    InvalidCiphertextLength(usize),

    #[error("invalid commitment encoding")]
    InvalidCommitment,

    #[error("randomness unavailable: {0}")]
    Randomness(String),

    #[error("cipher failure: {0}")]
    Cipher(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
