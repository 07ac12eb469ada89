//! Caller-facing records and hex entry points
//!
//! Keys and signatures cross this boundary as serde records and hex
//! strings, ready to be turned into JSON. Compact limbs are rendered as
//! decimal strings because 256-bit values do not survive JSON numbers.

use crate::compact::{self, COEFFS_PER_LIMB};
use crate::falcon::{self, params::LOGN_512, FalconParams, IntPoly, PublicKey, SecretKey, Signature};
use crate::{Error, Result};
use num_bigint::BigUint;
use rand_core::{CryptoRng, OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret key as handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeyRecord {
    /// Ring degree
    pub n: usize,
    /// Secret polynomial f
    pub f: Vec<i32>,
    /// Secret polynomial g
    pub g: Vec<i32>,
    /// NTRU polynomial F
    #[serde(rename = "F")]
    pub big_f: Vec<i32>,
    /// NTRU polynomial G
    #[serde(rename = "G")]
    pub big_g: Vec<i32>,
}

/// Public key as handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    /// Ring degree
    pub n: usize,
    /// Coefficients of h in [0, q)
    pub pk: Vec<u16>,
}

/// Public key and signature in the fixed-width limb layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportBundle {
    /// NTT of h, packed, as decimal strings
    pub pk_compact: Vec<String>,
    /// s2 mod q, packed, as decimal strings
    pub s2_compact: Vec<String>,
    /// Signature salt, hex
    pub salt: String,
    /// Coefficients of h
    pub pk_raw: Vec<u16>,
    /// Coefficients of s2 mod q
    pub s2_raw: Vec<u16>,
    /// Coefficients of NTT(h)
    pub pk_ntt_raw: Vec<u16>,
}

/// Public key alone in the fixed-width limb layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyTransport {
    /// NTT of h, packed, as decimal strings
    pub pk_compact: Vec<String>,
    /// Coefficients of h
    pub pk_raw: Vec<u16>,
    /// Coefficients of NTT(h)
    pub pk_ntt_raw: Vec<u16>,
}

/// Coefficient arrays recovered from a [`TransportBundle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransport {
    /// Coefficients of NTT(h)
    pub pk_ntt: Vec<u16>,
    /// Coefficients of s2 mod q
    pub s2: Vec<u16>,
    /// Signature salt
    pub salt: Vec<u8>,
}

impl From<&SecretKey> for SecretKeyRecord {
    fn from(sk: &SecretKey) -> Self {
        Self {
            n: sk.f.degree(),
            f: sk.f.coeffs.clone(),
            g: sk.g.coeffs.clone(),
            big_f: sk.F.coeffs.clone(),
            big_g: sk.G.coeffs.clone(),
        }
    }
}

impl TryFrom<&SecretKeyRecord> for SecretKey {
    type Error = Error;

    fn try_from(record: &SecretKeyRecord) -> Result<Self> {
        let logn = FalconParams::from_n(record.n)
            .map_err(|_| Error::InvalidSecretKey)?
            .logn;
        let poly = |c: &Vec<i32>| IntPoly::from_coeffs(c.clone(), logn);
        SecretKey::from_polys(
            logn,
            poly(&record.f)?,
            poly(&record.g)?,
            poly(&record.big_f)?,
            poly(&record.big_g)?,
        )
        .map_err(|_| Error::InvalidSecretKey)
    }
}

impl From<&PublicKey> for PublicKeyRecord {
    fn from(pk: &PublicKey) -> Self {
        Self {
            n: pk.h.degree(),
            pk: pk.h.coeffs.clone(),
        }
    }
}

impl TryFrom<&PublicKeyRecord> for PublicKey {
    type Error = Error;

    fn try_from(record: &PublicKeyRecord) -> Result<Self> {
        if record.pk.len() != record.n {
            return Err(Error::InvalidPublicKey);
        }
        PublicKey::from_coeffs(record.pk.clone()).map_err(|_| Error::InvalidPublicKey)
    }
}

impl TransportBundle {
    /// Unpack the limbs back into coefficient arrays
    pub fn decode(&self) -> Result<DecodedTransport> {
        let n = self.pk_raw.len();
        let pk_ntt = compact::unpack_transport(&parse_limbs(&self.pk_compact)?, n)?;
        let s2 = compact::unpack_transport(&parse_limbs(&self.s2_compact)?, n)?;
        let salt = hex::decode(&self.salt)?;
        if salt.len() != falcon::params::SALT_LEN {
            return Err(Error::InvalidSignature);
        }
        Ok(DecodedTransport { pk_ntt, s2, salt })
    }
}

fn render_limbs(limbs: &[BigUint]) -> Vec<String> {
    limbs.iter().map(|l| l.to_str_radix(10)).collect()
}

fn parse_limbs(limbs: &[String]) -> Result<Vec<BigUint>> {
    limbs
        .iter()
        .map(|s| BigUint::parse_bytes(s.as_bytes(), 10).ok_or(Error::InvalidParameter))
        .collect()
}

/// Generate a Falcon-512 key pair from the operating system RNG
pub fn generate_keys() -> Result<(SecretKeyRecord, PublicKeyRecord)> {
    generate_keys_with_rng(LOGN_512, &mut OsRng)
}

/// Generate a key pair of degree 2^logn from the given RNG
pub fn generate_keys_with_rng<R: RngCore + CryptoRng>(
    logn: usize,
    rng: &mut R,
) -> Result<(SecretKeyRecord, PublicKeyRecord)> {
    let params = FalconParams::from_logn(logn).ok_or(Error::InvalidParameter)?;
    let (sk, pk) = falcon::generate_keypair(params, rng)?;
    Ok(((&sk).into(), (&pk).into()))
}

/// Sign a hex-encoded message deterministically, returning signature hex
pub fn sign(sk: &SecretKeyRecord, message_hex: &str) -> Result<String> {
    let message = hex::decode(message_hex)?;
    let sk = SecretKey::try_from(sk)?;
    let sig = falcon::sign_deterministic(&sk, &message)?;
    Ok(hex::encode(sig.to_bytes()))
}

/// Verify a hex signature over a hex message. Malformed input is `false`.
pub fn verify(pk: &PublicKeyRecord, message_hex: &str, signature_hex: &str) -> bool {
    let (Ok(message), Ok(signature)) = (hex::decode(message_hex), hex::decode(signature_hex))
    else {
        return false;
    };
    match PublicKey::try_from(pk) {
        Ok(pk) => falcon::verify(&pk, &message, &signature),
        Err(_) => false,
    }
}

/// Repack a public key and signature for fixed-width integer transport
pub fn compress_for_transport(pk: &PublicKeyRecord, signature_hex: &str) -> Result<TransportBundle> {
    let public = PublicKey::try_from(pk)?;
    let sig = Signature::from_bytes(&hex::decode(signature_hex)?)?;
    if sig.header != public.params()?.header() {
        return Err(Error::InvalidSignature);
    }
    let s2_raw: Vec<u16> = sig
        .s2()?
        .into_iter()
        .map(|c| falcon::poly::reduce_mod_q(c as i64))
        .collect();
    let pk_ntt_raw = public.h.ntt().coeffs;

    Ok(TransportBundle {
        pk_compact: render_limbs(&compact::pack_transport(&pk_ntt_raw)?),
        s2_compact: render_limbs(&compact::pack_transport(&s2_raw)?),
        salt: hex::encode(sig.salt),
        pk_raw: public.h.coeffs,
        s2_raw,
        pk_ntt_raw,
    })
}

/// Repack a public key alone for fixed-width integer transport
pub fn compress_public_key(pk: &PublicKeyRecord) -> Result<PublicKeyTransport> {
    let public = PublicKey::try_from(pk)?;
    let pk_ntt_raw = public.h.ntt().coeffs;
    Ok(PublicKeyTransport {
        pk_compact: render_limbs(&compact::pack_transport(&pk_ntt_raw)?),
        pk_raw: public.h.coeffs,
        pk_ntt_raw,
    })
}

/// Limbs in the transport layout for a degree-n polynomial
pub fn transport_limbs(n: usize) -> usize {
    (n + COEFFS_PER_LIMB - 1) / COEFFS_PER_LIMB
}
