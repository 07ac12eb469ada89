//! Falcon signature core
//!
//! Key generation over NTRU lattices, fast-Fourier sampling for signing and
//! a modular verifier, parameterized by degree n = 2^logn with q = 12289.

pub mod params;
pub mod flr;
pub mod fft;
pub mod poly;
pub mod xof;
pub mod gaussian;
pub mod ntru;
pub mod falcon_tree;
pub mod compression;
pub mod signature;
pub mod verification;

// Re-export key types and functions
pub use params::{FalconParams, FALCON_512, FALCON_1024};
pub use poly::{IntPoly, ModqPoly};
pub use ntru::{SecretKey, PublicKey, generate_keypair};
pub use falcon_tree::FalconTree;
pub use gaussian::SamplerZ;
pub use compression::Signature;
pub use signature::{hash_to_point, sign_deterministic, sign_with_rng};
pub use verification::verify;
pub use xof::ShakeStream;
