//! Compact limb codec
//!
//! Packs bounded unsigned coefficients into wide unsigned integers so a
//! polynomial can be handed to a consumer that only stores fixed-width
//! words. The coefficients form one little-endian bitstream: coefficient i
//! occupies stream bits [i*b, (i+1)*b) and limb k holds stream bits
//! [k*L, (k+1)*L). The last limb is zero above the final coefficient.

use crate::{Error, Result};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Bits per coefficient in the transport layout
pub const TRANSPORT_BITS: usize = 16;

/// Bits per limb in the transport layout
pub const LIMB_BITS: usize = 256;

/// Coefficients carried by one transport limb
pub const COEFFS_PER_LIMB: usize = LIMB_BITS / TRANSPORT_BITS;

/// Widest coefficient the codec accepts
pub const MAX_COEFF_BITS: usize = 32;

fn check_widths(bits_per_coeff: usize, limb_bits: usize) -> Result<()> {
    if bits_per_coeff == 0 || bits_per_coeff > MAX_COEFF_BITS || limb_bits == 0 {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

/// Number of limbs needed for `count` coefficients
pub fn limb_count(count: usize, bits_per_coeff: usize, limb_bits: usize) -> usize {
    if limb_bits == 0 {
        return 0;
    }
    (count * bits_per_coeff + limb_bits - 1) / limb_bits
}

/// Pack `coeffs`, each below 2^bits_per_coeff, into limbs of `limb_bits`
pub fn pack(coeffs: &[u32], bits_per_coeff: usize, limb_bits: usize) -> Result<Vec<BigUint>> {
    check_widths(bits_per_coeff, limb_bits)?;
    let mut limbs = vec![BigUint::zero(); limb_count(coeffs.len(), bits_per_coeff, limb_bits)];

    for (i, &c) in coeffs.iter().enumerate() {
        if bits_per_coeff < MAX_COEFF_BITS && (c >> bits_per_coeff) != 0 {
            return Err(Error::CoefficientOutOfRange);
        }
        let mut value = c as u64;
        let mut start = i * bits_per_coeff;
        let mut remaining = bits_per_coeff;
        // a coefficient may straddle two limbs
        while remaining > 0 {
            let (limb, offset) = (start / limb_bits, start % limb_bits);
            let take = remaining.min(limb_bits - offset);
            let piece = value & ((1u64 << take) - 1);
            limbs[limb] |= BigUint::from(piece) << offset;
            value >>= take;
            start += take;
            remaining -= take;
        }
    }
    Ok(limbs)
}

/// Recover `count` coefficients from limbs produced by [`pack`]
pub fn unpack(
    limbs: &[BigUint],
    bits_per_coeff: usize,
    limb_bits: usize,
    count: usize,
) -> Result<Vec<u32>> {
    check_widths(bits_per_coeff, limb_bits)?;
    let expected = limb_count(count, bits_per_coeff, limb_bits);
    if limbs.len() != expected {
        return Err(Error::InvalidParameter);
    }
    if let Some(last) = limbs.last() {
        let used = count * bits_per_coeff - (expected - 1) * limb_bits;
        if last.bits() > used as u64 {
            return Err(Error::InvalidParameter);
        }
    }
    if limbs.iter().any(|l| l.bits() > limb_bits as u64) {
        return Err(Error::InvalidParameter);
    }

    let mut coeffs = Vec::with_capacity(count);
    for i in 0..count {
        let mut value = 0u64;
        let mut start = i * bits_per_coeff;
        let mut filled = 0;
        while filled < bits_per_coeff {
            let (limb, offset) = (start / limb_bits, start % limb_bits);
            let take = (bits_per_coeff - filled).min(limb_bits - offset);
            let mask = BigUint::from((1u64 << take) - 1);
            let piece = ((&limbs[limb] >> offset) & mask)
                .to_u64()
                .ok_or(Error::InvalidParameter)?;
            value |= piece << filled;
            start += take;
            filled += take;
        }
        coeffs.push(value as u32);
    }
    Ok(coeffs)
}

/// Pack coefficients in the 16-bit, 256-bit-limb transport layout
pub fn pack_transport(coeffs: &[u16]) -> Result<Vec<BigUint>> {
    let widened: Vec<u32> = coeffs.iter().map(|&c| c as u32).collect();
    pack(&widened, TRANSPORT_BITS, LIMB_BITS)
}

/// Inverse of [`pack_transport`]
pub fn unpack_transport(limbs: &[BigUint], count: usize) -> Result<Vec<u16>> {
    Ok(unpack(limbs, TRANSPORT_BITS, LIMB_BITS, count)?
        .into_iter()
        .map(|c| c as u16)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_small_layout() {
        let limbs = pack(&[1, 2, 3], 4, 8).unwrap();
        assert_eq!(limbs, vec![BigUint::from(0x21u32), BigUint::from(3u32)]);
        assert_eq!(unpack(&limbs, 4, 8, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_straddling_coefficient() {
        // stream 0b110_101: limb0 = 0b0101, limb1 = 0b11
        let limbs = pack(&[5, 6], 3, 4).unwrap();
        assert_eq!(limbs, vec![BigUint::from(5u32), BigUint::from(3u32)]);
        assert_eq!(unpack(&limbs, 3, 4, 2).unwrap(), vec![5, 6]);
    }

    #[test]
    fn test_transport_layout_for_512() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let coeffs: Vec<u16> = (0..512).map(|_| rng.gen_range(0..12289)).collect();
        let limbs = pack_transport(&coeffs).unwrap();
        assert_eq!(limbs.len(), 32);
        assert!(limbs.iter().all(|l| l.bits() <= LIMB_BITS as u64));

        // limb k holds coefficients 16k .. 16k+15, lowest first
        let mut expected = BigUint::zero();
        for (j, &c) in coeffs[16..32].iter().enumerate() {
            expected |= BigUint::from(c) << (16 * j);
        }
        assert_eq!(limbs[1], expected);
        assert_eq!(unpack_transport(&limbs, 512).unwrap(), coeffs);
    }

    #[test]
    fn test_rejects_wide_coefficients_and_bad_widths() {
        assert_eq!(pack(&[16], 4, 8), Err(Error::CoefficientOutOfRange));
        assert_eq!(pack(&[1], 0, 8), Err(Error::InvalidParameter));
        assert_eq!(pack(&[1], 4, 0), Err(Error::InvalidParameter));
        assert_eq!(pack(&[1], 33, 64), Err(Error::InvalidParameter));
        assert!(pack(&[u32::MAX], 32, 48).is_ok());
    }

    #[test]
    fn test_unpack_rejects_malformed_limbs() {
        let limbs = pack(&[1, 2, 3], 4, 8).unwrap();
        // wrong limb count
        assert_eq!(unpack(&limbs[..1], 4, 8, 3), Err(Error::InvalidParameter));
        // limb wider than declared
        let wide = vec![BigUint::from(0x1FFu32), BigUint::from(3u32)];
        assert_eq!(unpack(&wide, 4, 8, 3), Err(Error::InvalidParameter));
        // garbage above the last coefficient
        let padded = vec![BigUint::from(0x21u32), BigUint::from(0x13u32)];
        assert_eq!(unpack(&padded, 4, 8, 3), Err(Error::InvalidParameter));
    }

    #[test]
    fn test_empty_input() {
        assert!(pack(&[], 16, 256).unwrap().is_empty());
        assert!(unpack(&[], 16, 256, 0).unwrap().is_empty());
    }
}
