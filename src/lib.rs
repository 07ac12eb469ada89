#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! SuiQ Falcon: a no_std Falcon signature core
//!
//! Key generation, signing and verification over NTRU lattices, plus the
//! compact limb codec used to hand public keys and signatures to a ledger
//! that only understands fixed-width unsigned integers.

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod compact;
pub mod falcon;

#[cfg(feature = "std")]
pub mod api;

// Re-export main types and functions
pub use falcon::{
    FalconParams, FALCON_512, FALCON_1024,
    SecretKey, PublicKey, generate_keypair,
    Signature, sign_deterministic, sign_with_rng,
    verify, SamplerZ, ShakeStream,
};

/// Common error types for the library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid parameter provided (unsupported degree, bad width)
    InvalidParameter,
    /// Polynomial lengths differ
    DimensionMismatch,
    /// A coefficient does not fit its declared range
    CoefficientOutOfRange,
    /// A polynomial has a zero NTT slot
    NonInvertible,
    /// An FFT slot underflowed to zero during division
    DivisionByZero,
    /// Compressed s2 does not fit the fixed signature length
    EncodingOverflow,
    /// Key generation hit its retry ceiling
    KeyGenExhausted,
    /// Signing hit its retry ceiling
    SignExhausted,
    /// Invalid signature format
    InvalidSignature,
    /// Invalid public key format
    InvalidPublicKey,
    /// Invalid secret key format
    InvalidSecretKey,
    /// Input is not valid hexadecimal
    InvalidHex,
    /// Random number generation failed
    RngError,
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied something unusable; never retried
    Parameter,
    /// A bounded internal retry loop gave up
    Exhausted,
    /// An encoded input could not be parsed
    Malformed,
    /// Arithmetic hit a non-invertible value
    NonInvertible,
    /// The randomness source failed
    Rng,
}

impl Error {
    /// Classify this error
    pub const fn kind(self) -> ErrorKind {
        match self {
            Error::InvalidParameter | Error::DimensionMismatch | Error::CoefficientOutOfRange => {
                ErrorKind::Parameter
            }
            Error::KeyGenExhausted | Error::SignExhausted | Error::EncodingOverflow => {
                ErrorKind::Exhausted
            }
            Error::NonInvertible | Error::DivisionByZero => ErrorKind::NonInvertible,
            Error::InvalidSignature
            | Error::InvalidPublicKey
            | Error::InvalidSecretKey
            | Error::InvalidHex => ErrorKind::Malformed,
            Error::RngError => ErrorKind::Rng,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidParameter => write!(f, "Invalid parameter"),
            Error::DimensionMismatch => write!(f, "Polynomial dimension mismatch"),
            Error::CoefficientOutOfRange => write!(f, "Coefficient out of range"),
            Error::NonInvertible => write!(f, "Polynomial is not invertible mod q"),
            Error::DivisionByZero => write!(f, "Division by zero in FFT domain"),
            Error::EncodingOverflow => write!(f, "Compressed signature exceeds maximum length"),
            Error::KeyGenExhausted => write!(f, "Key generation exhausted its retries"),
            Error::SignExhausted => write!(f, "Signing exhausted its retries"),
            Error::InvalidSignature => write!(f, "Invalid signature"),
            Error::InvalidPublicKey => write!(f, "Invalid public key"),
            Error::InvalidSecretKey => write!(f, "Invalid secret key"),
            Error::InvalidHex => write!(f, "Invalid hex string"),
            Error::RngError => write!(f, "Random number generation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<rand_core::Error> for Error {
    fn from(_: rand_core::Error) -> Self {
        Error::RngError
    }
}

impl From<hex::FromHexError> for Error {
    fn from(_: hex::FromHexError) -> Self {
        Error::InvalidHex
    }
}

/// Result type alias for operations that may fail
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_separate_parameters_from_exhaustion() {
        assert_eq!(Error::DimensionMismatch.kind(), ErrorKind::Parameter);
        assert_eq!(Error::CoefficientOutOfRange.kind(), ErrorKind::Parameter);
        assert_eq!(Error::KeyGenExhausted.kind(), ErrorKind::Exhausted);
        assert_eq!(Error::SignExhausted.kind(), ErrorKind::Exhausted);
        assert_eq!(Error::InvalidSignature.kind(), ErrorKind::Malformed);
        assert_eq!(Error::NonInvertible.kind(), ErrorKind::NonInvertible);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_error_display() {
        assert_eq!(Error::KeyGenExhausted.to_string(), "Key generation exhausted its retries");
        assert_eq!(Error::InvalidHex.to_string(), "Invalid hex string");
    }
}
