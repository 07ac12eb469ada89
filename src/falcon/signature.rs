//! Falcon signature generation
//!
//! The message is hashed with a 40-byte salt onto a point of Z_q[x]/(x^n+1),
//! a short preimage (s1, s2) is sampled with the secret basis, and s2 is
//! compressed into the signature. Salt and sampler randomness come either
//! from a caller RNG or from a SHAKE256 stream keyed by the public key and
//! the message.

use crate::falcon::{
    compression::Signature, falcon_tree::FalconTree, gaussian::SamplerZ, ntru::SecretKey,
    params::*, poly::ModqPoly, xof::ShakeStream,
};
use crate::{Error, Result};
use log::debug;
use rand_core::{CryptoRng, RngCore};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Seed prefix of the deterministic signing stream
const DETERMINISTIC_SEED: [u8; 32] = [0x01; 32];

/// Domain byte separating the seed from the key material
const DETERMINISTIC_DOMAIN: u8 = 0x00;

/// Largest multiple of q below 2^16
const HASH_ACCEPT_BOUND: u16 = 5 * Q as u16;

/// Hash (salt, message) to a point of Z_q[x]/(x^n+1)
///
/// SHAKE256 output is read as 16-bit big-endian words; words of at least
/// 5q are skipped so the reduction mod q is unbiased.
pub fn hash_to_point(message: &[u8], salt: &[u8; SALT_LEN], params: FalconParams) -> ModqPoly {
    let mut stream = ShakeStream::new(&[salt, message]);
    let mut coeffs = Vec::with_capacity(params.n);
    let mut word = [0u8; 2];
    while coeffs.len() < params.n {
        stream.read(&mut word);
        let t = u16::from_be_bytes(word);
        if t < HASH_ACCEPT_BOUND {
            coeffs.push(t % Q as u16);
        }
    }
    ModqPoly {
        coeffs,
        logn: params.logn,
    }
}

/// SHAKE256 stream from which deterministic signing draws its salt and
/// its sampler bits
pub fn deterministic_stream(sk: &SecretKey, message: &[u8]) -> ShakeStream {
    let mut h_bytes = Vec::with_capacity(2 * sk.h.coeffs.len());
    for &c in &sk.h.coeffs {
        h_bytes.extend_from_slice(&c.to_be_bytes());
    }
    ShakeStream::new(&[&DETERMINISTIC_SEED, &[DETERMINISTIC_DOMAIN], &h_bytes, message])
}

/// Sign with a caller-supplied RNG for both the salt and the sampler
pub fn sign_with_rng<R: RngCore + CryptoRng>(
    sk: &SecretKey,
    message: &[u8],
    rng: &mut R,
) -> Result<Signature> {
    let mut salt = [0u8; SALT_LEN];
    rng.try_fill_bytes(&mut salt)?;
    sign_with_salt(sk, message, salt, rng)
}

/// Sign deterministically: the same key and message always give the same
/// signature bytes
pub fn sign_deterministic(sk: &SecretKey, message: &[u8]) -> Result<Signature> {
    let mut stream = deterministic_stream(sk, message);
    let mut salt = [0u8; SALT_LEN];
    stream.read(&mut salt);
    sign_with_salt(sk, message, salt, &mut stream)
}

fn sign_with_salt<R: RngCore>(
    sk: &SecretKey,
    message: &[u8],
    salt: [u8; SALT_LEN],
    rng: &mut R,
) -> Result<Signature> {
    let tree = FalconTree::new(sk)?;
    let params = tree.params;
    let sampler = SamplerZ::new(params.sigmin)?;
    let point = hash_to_point(message, &salt, params);

    for attempt in 1..=MAX_SIGN_ATTEMPTS {
        let (s1, s2) = tree.sample_preimage(&point, &sampler, rng)?;
        let norm = s1.norm_squared() + s2.norm_squared();
        if !params.norm_is_valid(norm) {
            debug!("signing attempt {}: norm {} above bound {}", attempt, norm, params.sig_bound);
            continue;
        }
        match Signature::new(params, salt, &s2.coeffs) {
            Ok(sig) => return Ok(sig),
            Err(Error::EncodingOverflow) => {
                debug!("signing attempt {}: compressed s2 too long", attempt);
            }
            Err(e) => return Err(e),
        }
    }
    Err(Error::SignExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::falcon::ntru::generate_keypair;
    use crate::falcon::verification::verify;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_hash_to_point_range_and_determinism() {
        let params = FALCON_512;
        let salt = [42u8; SALT_LEN];
        let a = hash_to_point(b"Test message", &salt, params);
        let b = hash_to_point(b"Test message", &salt, params);
        assert_eq!(a, b);
        assert_eq!(a.coeffs.len(), params.n);
        assert!(a.coeffs.iter().all(|&c| (c as u32) < Q));

        let c = hash_to_point(b"Test message", &[43u8; SALT_LEN], params);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sign_and_verify_small_degrees() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for logn in [4, 6, 8] {
            let params = FalconParams::from_logn(logn).unwrap();
            let (sk, pk) = generate_keypair(params, &mut rng).unwrap();
            let sig = sign_with_rng(&sk, b"hello", &mut rng).unwrap();
            let bytes = sig.to_bytes();
            assert_eq!(bytes.len(), params.sig_bytelen);
            assert!(verify(&pk, b"hello", &bytes));
            assert!(!verify(&pk, b"hellO", &bytes));
        }
    }

    #[test]
    fn test_deterministic_signatures_repeat() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let params = FalconParams::from_logn(6).unwrap();
        let (sk, pk) = generate_keypair(params, &mut rng).unwrap();

        let a = sign_deterministic(&sk, b"same message").unwrap();
        let b = sign_deterministic(&sk, b"same message").unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert!(verify(&pk, b"same message", &a.to_bytes()));

        let c = sign_deterministic(&sk, b"other message").unwrap();
        assert_ne!(a.salt, c.salt);
    }

    #[test]
    fn test_deterministic_salt_is_stream_prefix() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let params = FalconParams::from_logn(5).unwrap();
        let (sk, _) = generate_keypair(params, &mut rng).unwrap();
        let sig = sign_deterministic(&sk, b"msg").unwrap();

        let mut stream = deterministic_stream(&sk, b"msg");
        let mut salt = [0u8; SALT_LEN];
        stream.read(&mut salt);
        assert_eq!(sig.salt, salt);
    }
}
