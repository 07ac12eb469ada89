//! Signature encoding
//!
//! s2 is stored with the Falcon compression: per coefficient one sign bit,
//! the seven low bits of the magnitude, then the high part in unary (that
//! many zeros and a terminating one). Bits are packed MSB first and the body
//! is zero-padded to a fixed length. The envelope is header || salt || body.

use crate::falcon::params::*;
use crate::{Error, Result};

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// MSB-first bit sink with a hard byte limit
struct BitWriter {
    out: Vec<u8>,
    limit: usize,
    acc: u32,
    acc_len: u8,
}

impl BitWriter {
    fn new(limit: usize) -> Self {
        Self {
            out: Vec::with_capacity(limit),
            limit,
            acc: 0,
            acc_len: 0,
        }
    }

    fn write(&mut self, value: u32, num_bits: u8) -> Result<()> {
        debug_assert!(num_bits <= 8);
        let mask = (1u32 << num_bits) - 1;
        self.acc = (self.acc << num_bits) | (value & mask);
        self.acc_len += num_bits;
        while self.acc_len >= 8 {
            self.acc_len -= 8;
            if self.out.len() >= self.limit {
                return Err(Error::EncodingOverflow);
            }
            self.out.push((self.acc >> self.acc_len) as u8);
            self.acc &= (1u32 << self.acc_len) - 1;
        }
        Ok(())
    }

    /// Flush the partial byte and zero-pad to the limit
    fn finish(mut self) -> Result<Vec<u8>> {
        if self.acc_len > 0 {
            if self.out.len() >= self.limit {
                return Err(Error::EncodingOverflow);
            }
            self.out.push((self.acc << (8 - self.acc_len)) as u8);
        }
        self.out.resize(self.limit, 0);
        Ok(self.out)
    }
}

/// MSB-first bit source over a byte slice
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    acc_len: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            acc_len: 0,
        }
    }

    fn read(&mut self, num_bits: u8) -> Result<u32> {
        while self.acc_len < num_bits {
            let byte = *self.data.get(self.pos).ok_or(Error::InvalidSignature)?;
            self.acc = (self.acc << 8) | byte as u32;
            self.pos += 1;
            self.acc_len += 8;
        }
        self.acc_len -= num_bits;
        let value = (self.acc >> self.acc_len) & ((1u32 << num_bits) - 1);
        self.acc &= (1u32 << self.acc_len) - 1;
        Ok(value)
    }

    /// Leftover bits and bytes must all be zero
    fn check_padding(&self) -> Result<()> {
        if self.acc != 0 || self.data[self.pos..].iter().any(|&b| b != 0) {
            return Err(Error::InvalidSignature);
        }
        Ok(())
    }
}

/// Compress s2 into exactly `slen` bytes
pub fn compress_s2(s2: &[i32], slen: usize) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new(slen);
    for &coeff in s2 {
        if coeff < -COEFF_BOUND || coeff > COEFF_BOUND {
            return Err(Error::EncodingOverflow);
        }
        let sign = (coeff < 0) as u32;
        let magnitude = coeff.unsigned_abs();
        writer.write((sign << 7) | (magnitude & 0x7F), 8)?;
        for _ in 0..(magnitude >> 7) {
            writer.write(0, 1)?;
        }
        writer.write(1, 1)?;
    }
    writer.finish()
}

/// Decompress `n` coefficients, rejecting every non-canonical encoding
pub fn decompress_s2(data: &[u8], n: usize) -> Result<Vec<i32>> {
    let mut reader = BitReader::new(data);
    let mut s2 = Vec::with_capacity(n);
    for _ in 0..n {
        let low = reader.read(8)?;
        let negative = low & 0x80 != 0;
        let mut magnitude = low & 0x7F;
        while reader.read(1)? == 0 {
            magnitude += 0x80;
            if magnitude > COEFF_BOUND as u32 {
                return Err(Error::InvalidSignature);
            }
        }
        if negative && magnitude == 0 {
            return Err(Error::InvalidSignature);
        }
        let magnitude = magnitude as i32;
        s2.push(if negative { -magnitude } else { magnitude });
    }
    reader.check_padding()?;
    Ok(s2)
}

/// Falcon signature: header byte, salt and compressed s2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// 0x30 + logn
    pub header: u8,
    /// Salt hashed together with the message
    pub salt: [u8; SALT_LEN],
    /// Compressed s2 body, zero-padded
    pub compressed_s2: Vec<u8>,
}

impl Signature {
    /// Compress s2 into a full-length signature for `params`
    pub fn new(params: FalconParams, salt: [u8; SALT_LEN], s2: &[i32]) -> Result<Self> {
        if s2.len() != params.n {
            return Err(Error::DimensionMismatch);
        }
        let compressed_s2 = compress_s2(s2, params.compressed_len())?;
        Ok(Self {
            header: params.header(),
            salt,
            compressed_s2,
        })
    }

    /// Parameter set named by the header
    pub fn params(&self) -> Result<FalconParams> {
        let logn = self.header.checked_sub(0x30).ok_or(Error::InvalidSignature)?;
        FalconParams::from_logn(logn as usize).ok_or(Error::InvalidSignature)
    }

    /// Serialize as header || salt || body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEAD_LEN + SALT_LEN + self.compressed_s2.len());
        bytes.push(self.header);
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.compressed_s2);
        bytes
    }

    /// Parse a signature. Bodies shorter than the padded length are accepted
    /// so long as they decode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() <= HEAD_LEN + SALT_LEN {
            return Err(Error::InvalidSignature);
        }
        let header = bytes[0];
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[HEAD_LEN..HEAD_LEN + SALT_LEN]);
        let sig = Self {
            header,
            salt,
            compressed_s2: bytes[HEAD_LEN + SALT_LEN..].to_vec(),
        };
        if bytes.len() > sig.params()?.sig_bytelen {
            return Err(Error::InvalidSignature);
        }
        Ok(sig)
    }

    /// Decompressed s2
    pub fn s2(&self) -> Result<Vec<i32>> {
        decompress_s2(&self.compressed_s2, self.params()?.n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encoding() {
        // 1 -> 0000_0001 1, -130 -> 1000_0010 01
        let body = compress_s2(&[1, -130], 3).unwrap();
        assert_eq!(body, vec![0b0000_0001, 0b1100_0001, 0b0010_0000]);
        assert_eq!(decompress_s2(&body, 2).unwrap(), vec![1, -130]);
    }

    #[test]
    fn test_boundary_values() {
        let s2 = vec![COEFF_BOUND, -COEFF_BOUND, 0, 1, -1, 127, -128];
        let body = compress_s2(&s2, 64).unwrap();
        assert_eq!(body.len(), 64);
        assert_eq!(decompress_s2(&body, s2.len()).unwrap(), s2);
    }

    #[test]
    fn test_overflow() {
        assert_eq!(compress_s2(&[COEFF_BOUND + 1], 64), Err(Error::EncodingOverflow));
        assert_eq!(compress_s2(&[-COEFF_BOUND - 1], 64), Err(Error::EncodingOverflow));
        // eight 9-bit codes need 9 bytes
        assert_eq!(compress_s2(&[0; 8], 8), Err(Error::EncodingOverflow));
        assert!(compress_s2(&[0; 8], 9).is_ok());
    }

    #[test]
    fn test_rejects_non_canonical() {
        // negative zero
        assert_eq!(decompress_s2(&[0x80, 0x80], 1), Err(Error::InvalidSignature));
        // truncated
        assert_eq!(decompress_s2(&[0x01], 1), Err(Error::InvalidSignature));
        // non-zero padding bit in the last byte
        assert_eq!(decompress_s2(&[0x01, 0xC0], 1), Err(Error::InvalidSignature));
        // non-zero trailing byte
        assert_eq!(decompress_s2(&[0x01, 0x80, 0x01], 1), Err(Error::InvalidSignature));
        // magnitude beyond the bound: sixteen zeros in the unary part
        assert_eq!(decompress_s2(&[0x00, 0x00, 0x00, 0x80], 1), Err(Error::InvalidSignature));
    }

    #[test]
    fn test_envelope() {
        let params = FalconParams::from_logn(4).unwrap();
        let s2: Vec<i32> = (0..params.n as i32).map(|i| i * 7 - 50).collect();
        let sig = Signature::new(params, [9u8; SALT_LEN], &s2).unwrap();
        let bytes = sig.to_bytes();
        assert_eq!(bytes.len(), params.sig_bytelen);
        assert_eq!(bytes[0], 0x34);

        let parsed = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, sig);
        assert_eq!(parsed.s2().unwrap(), s2);

        assert!(Signature::from_bytes(&bytes[..HEAD_LEN + SALT_LEN]).is_err());
        let mut long = bytes.clone();
        long.push(0);
        assert!(Signature::from_bytes(&long).is_err());
        let mut bad_header = bytes;
        bad_header[0] = 0x20;
        assert!(Signature::from_bytes(&bad_header).is_err());
    }
}
