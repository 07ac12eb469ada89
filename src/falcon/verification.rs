//! Falcon signature verification
//!
//! Recompute s1 = c - s2*h mod q from the hashed message and accept iff
//! the squared norm of (s1, s2) is within the bound. Every failure,
//! including malformed input, is a plain rejection.

use crate::falcon::{
    compression::Signature,
    ntru::PublicKey,
    poly::{reduce_mod_q, ModqPoly},
    signature::hash_to_point,
};
use crate::{Error, Result};
use log::debug;

/// Verify `signature` over `message`. Never panics and never errors.
pub fn verify(pk: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    match check(pk, message, signature) {
        Ok(()) => true,
        Err(e) => {
            debug!("signature rejected: {}", e);
            false
        }
    }
}

/// Verify with the reason for rejection
pub fn check(pk: &PublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let params = pk.params()?;
    if pk.h.coeffs.len() != params.n {
        return Err(Error::InvalidPublicKey);
    }
    let sig = Signature::from_bytes(signature)?;
    if sig.header != params.header() {
        return Err(Error::InvalidSignature);
    }
    let s2 = sig.s2()?;

    let c = hash_to_point(message, &sig.salt, params);
    let s2_modq = ModqPoly {
        coeffs: s2.iter().map(|&x| reduce_mod_q(x as i64)).collect(),
        logn: params.logn,
    };
    let s1 = c.sub(&s2_modq.ntt_mul(&pk.h)?)?.to_centered();

    let norm = s1.norm_squared() + s2.iter().map(|&x| (x as i64 * x as i64) as u64).sum::<u64>();
    if !params.norm_is_valid(norm) {
        return Err(Error::InvalidSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::falcon::{
        ntru::generate_keypair, params::*, signature::sign_with_rng,
    };
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn keypair_and_sig(logn: usize, seed: u64) -> (PublicKey, Vec<u8>) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let params = FalconParams::from_logn(logn).unwrap();
        let (sk, pk) = generate_keypair(params, &mut rng).unwrap();
        let sig = sign_with_rng(&sk, b"payload", &mut rng).unwrap();
        (pk, sig.to_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let (pk, sig) = keypair_and_sig(6, 21);
        assert_eq!(check(&pk, b"payload", &sig), Ok(()));
    }

    #[test]
    fn test_tampering_rejected() {
        let (pk, sig) = keypair_and_sig(6, 22);
        // flip the first salt byte and the first body byte
        for pos in [1, HEAD_LEN + SALT_LEN] {
            let mut bad = sig.clone();
            bad[pos] ^= 0x01;
            assert!(!verify(&pk, b"payload", &bad), "flip at {} accepted", pos);
        }
        let mut bad_header = sig.clone();
        bad_header[0] = 0x39;
        assert!(!verify(&pk, b"payload", &bad_header));
    }

    #[test]
    fn test_garbage_and_wrong_key_rejected() {
        let (pk, sig) = keypair_and_sig(5, 23);
        let (other_pk, _) = keypair_and_sig(5, 24);
        assert!(!verify(&other_pk, b"payload", &sig));
        assert!(!verify(&pk, b"payload", &[]));
        assert!(!verify(&pk, b"payload", &sig[..HEAD_LEN + SALT_LEN]));

        let mut rng = ChaCha8Rng::seed_from_u64(25);
        for _ in 0..50 {
            let len = rng.gen_range(0..2 * sig.len());
            let mut junk = vec![0u8; len];
            rng.fill(&mut junk[..]);
            if let Some(b) = junk.first_mut() {
                *b = 0x35;
            }
            assert!(!verify(&pk, b"payload", &junk));
        }
    }

    #[test]
    fn test_zero_signature_is_a_forgery() {
        // s2 = 0 leaves s1 = c, far above the bound
        let (pk, _) = keypair_and_sig(5, 26);
        let params = pk.params().unwrap();
        let sig = Signature::new(params, [7u8; SALT_LEN], &vec![0; params.n]).unwrap();
        assert_eq!(check(&pk, b"payload", &sig.to_bytes()), Err(Error::InvalidSignature));
    }
}
