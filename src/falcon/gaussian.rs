//! Discrete Gaussian sampling over the integers
//!
//! The Falcon SamplerZ: a half-Gaussian base sampler for sigma_max = 1.8205
//! read from a reverse cumulative table, a random sign flip, and Bernoulli
//! rejection against exp(-x) evaluated in fixed point. The table lookup is
//! constant time.

use crate::falcon::flr;
use crate::{Error, Result};
use rand_core::RngCore;
use subtle::{ConditionallySelectable, ConstantTimeEq, ConstantTimeLess};

/// Standard deviation of the base sampler
pub const MAX_SIGMA: f64 = 1.8205;

/// 1 / (2 * MAX_SIGMA^2)
const INV_2SIGMA2: f64 = 1.0 / (2.0 * MAX_SIGMA * MAX_SIGMA);

const LN2: f64 = 0.69314718056;
const ILN2: f64 = 1.44269504089;

/// Draws without acceptance before the RNG is considered broken
const MAX_REJECTIONS: usize = 1024;

/// Reverse cumulative distribution of the half-Gaussian, scaled by 2^72
const RCDT: [u128; 18] = [
    3024686241123004913666,
    1564742784480091954050,
    636254429462080897535,
    199560484645026482916,
    47667343854657281903,
    8595902006365044063,
    1163297957344668388,
    117656387352093658,
    8867391802663976,
    496969357462633,
    20680885154299,
    638331848991,
    14602316184,
    247426747,
    3104126,
    28824,
    198,
    1,
];

/// Polynomial approximation of exp(-x) on [0, ln 2], 2^63 fixed point
const C: [u64; 13] = [
    0x00000004741183A3,
    0x00000036548CFC06,
    0x0000024FDCBF140A,
    0x0000171D939DE045,
    0x0000D00CF58F6F84,
    0x000680681CF796E3,
    0x002D82D8305B0FEA,
    0x011111110E066FD0,
    0x0555555555070F00,
    0x155555555581FF00,
    0x400000000002B400,
    0x7FFFFFFFFFFF4800,
    0x8000000000000000,
];

/// Half-Gaussian sample in [0, 18] from 72 random bits
fn base_sampler<R: RngCore>(rng: &mut R) -> Result<i32> {
    let mut buf = [0u8; 9];
    rng.try_fill_bytes(&mut buf)?;
    let mut lo_bytes = [0u8; 8];
    lo_bytes.copy_from_slice(&buf[..8]);
    let u_lo = u64::from_le_bytes(lo_bytes);
    let u_hi = buf[8] as u64;

    let mut z0 = 0u32;
    for &elt in RCDT.iter() {
        let e_hi = (elt >> 64) as u64;
        let e_lo = elt as u64;
        let less = u_hi.ct_lt(&e_hi) | (u_hi.ct_eq(&e_hi) & u_lo.ct_lt(&e_lo));
        z0 += u32::conditional_select(&0, &1, less);
    }
    Ok(z0 as i32)
}

/// ccs * exp(-x) * 2^64 for x in [0, ln 2]
fn approx_exp(x: f64, ccs: f64) -> u128 {
    let two63 = (1u64 << 63) as f64;
    let z = (x * two63) as u128;
    let mut y = C[0] as u128;
    for &elt in C[1..].iter() {
        y = (elt as u128).wrapping_sub((z * y) >> 63);
    }
    let z = ((ccs * two63) as u128) << 1;
    (z * y) >> 63
}

/// Bernoulli trial with success probability ccs * exp(-x)
fn ber_exp<R: RngCore>(rng: &mut R, x: f64, ccs: f64) -> Result<bool> {
    let s = flr::floor(x * ILN2);
    let r = x - s * LN2;
    let s = (s as u32).min(63);
    let z = (approx_exp(r, ccs).saturating_sub(1) >> s) as u64;

    let mut w = 0i32;
    let mut byte = [0u8; 1];
    for i in (0..=56).rev().step_by(8) {
        rng.try_fill_bytes(&mut byte)?;
        w = byte[0] as i32 - ((z >> i) & 0xFF) as i32;
        if w != 0 {
            break;
        }
    }
    Ok(w < 0)
}

/// Falcon integer sampler with a fixed minimum standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerZ {
    /// Smallest sigma this sampler will be asked for
    pub sigmin: f64,
}

impl SamplerZ {
    /// Create a sampler for the given sigmin
    pub fn new(sigmin: f64) -> Result<Self> {
        if !sigmin.is_finite() || sigmin <= 0.0 || sigmin > MAX_SIGMA {
            return Err(Error::InvalidParameter);
        }
        Ok(Self { sigmin })
    }

    /// Sample z from the discrete Gaussian centered on `center` with
    /// standard deviation `sigma`, 0 < sigma <= MAX_SIGMA
    pub fn sample<R: RngCore>(&self, rng: &mut R, center: f64, sigma: f64) -> Result<i32> {
        if !sigma.is_finite() || sigma <= 0.0 || sigma > MAX_SIGMA {
            return Err(Error::InvalidParameter);
        }
        if !center.is_finite() || flr::abs(center) > (1u32 << 30) as f64 {
            return Err(Error::InvalidParameter);
        }

        let s = flr::floor(center);
        let r = center - s;
        let dss = 1.0 / (2.0 * sigma * sigma);
        // a leaf sigma may land a rounding error below sigmin
        let ccs = (self.sigmin / sigma).min(1.0);

        let mut byte = [0u8; 1];
        for _ in 0..MAX_REJECTIONS {
            let z0 = base_sampler(rng)?;
            rng.try_fill_bytes(&mut byte)?;
            let b = (byte[0] & 1) as i32;
            let z = b + (2 * b - 1) * z0;
            let zr = z as f64 - r;
            let x = zr * zr * dss - (z0 * z0) as f64 * INV_2SIGMA2;
            if ber_exp(rng, x, ccs)? {
                return Ok(z + s as i32);
            }
        }
        Err(Error::RngError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Feeds a fixed byte forever
    struct ConstRng(u8);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            u32::from_le_bytes([self.0; 4])
        }
        fn next_u64(&mut self) -> u64 {
            u64::from_le_bytes([self.0; 8])
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
            dest.fill(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_base_sampler_extremes() {
        // u = 0 lies below every table entry
        assert_eq!(base_sampler(&mut ConstRng(0)).unwrap(), 18);
        // u = 2^72 - 1 lies above every table entry
        assert_eq!(base_sampler(&mut ConstRng(0xFF)).unwrap(), 0);
    }

    #[test]
    fn test_approx_exp_endpoints() {
        let two64 = 18446744073709551616.0f64;
        let at_zero = approx_exp(0.0, 1.0) as f64 / two64;
        assert!((at_zero - 1.0).abs() < 1e-12);
        let at_ln2 = approx_exp(LN2, 1.0) as f64 / two64;
        assert!((at_ln2 - 0.5).abs() < 1e-9);
        let scaled = approx_exp(0.3, 0.75) as f64 / two64;
        assert!((scaled - 0.75 * (-0.3f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_empirical_moments() {
        let sampler = SamplerZ::new(1.2778336969128337).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        for &(center, sigma) in &[(0.0, 1.5), (-3.25, 1.7), (12.5, 1.3)] {
            let count = 50000;
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for _ in 0..count {
                let z = sampler.sample(&mut rng, center, sigma).unwrap() as f64;
                sum += z;
                sum_sq += (z - center) * (z - center);
            }
            let mean = sum / count as f64;
            let var = sum_sq / count as f64;
            assert!((mean - center).abs() < 0.05, "mean {} for center {}", mean, center);
            assert!((var - sigma * sigma).abs() < 0.1, "variance {} for sigma {}", var, sigma);
        }
    }

    #[test]
    fn test_same_stream_same_samples() {
        let sampler = SamplerZ::new(1.2).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(1);
        let mut b = ChaCha8Rng::seed_from_u64(1);
        for i in 0..200 {
            let c = i as f64 * 0.37 - 30.0;
            assert_eq!(
                sampler.sample(&mut a, c, 1.5).unwrap(),
                sampler.sample(&mut b, c, 1.5).unwrap()
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range_sigma() {
        let sampler = SamplerZ::new(1.2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(sampler.sample(&mut rng, 0.0, 0.0), Err(Error::InvalidParameter));
        assert_eq!(sampler.sample(&mut rng, 0.0, -1.5), Err(Error::InvalidParameter));
        assert_eq!(sampler.sample(&mut rng, 0.0, 2.0), Err(Error::InvalidParameter));
        assert_eq!(sampler.sample(&mut rng, f64::NAN, 1.5), Err(Error::InvalidParameter));
        assert!(SamplerZ::new(0.0).is_err());
        assert!(SamplerZ::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_stuck_rng_is_reported() {
        let sampler = SamplerZ::new(1.2).unwrap();
        // all-ones bytes never fall below the acceptance threshold
        assert_eq!(sampler.sample(&mut ConstRng(0xFF), 0.0, 1.5), Err(Error::RngError));
    }
}
