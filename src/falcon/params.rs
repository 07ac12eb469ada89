//! Falcon parameter sets and constants
//!
//! One entry per supported degree, n = 2 up to n = 1024. Only 512 and 1024
//! are meant for real use; the small degrees keep tests fast.

use crate::{Error, Result};

/// Logarithmic degree for Falcon-512
pub const LOGN_512: usize = 9;

/// Logarithmic degree for Falcon-1024
pub const LOGN_1024: usize = 10;

/// Prime modulus q used by every parameter set
pub const Q: u32 = 12289;

/// Smallest supported logarithmic degree
pub const MIN_LOGN: usize = 1;

/// Maximum supported logarithmic degree
pub const MAX_LOGN: usize = 10;

/// Maximum polynomial degree
pub const MAX_N: usize = 1 << MAX_LOGN;

/// Signature header length in bytes
pub const HEAD_LEN: usize = 1;

/// Salt size for hash-to-point in bytes
pub const SALT_LEN: usize = 40;

/// Largest absolute s2 coefficient the signature codec accepts
pub const COEFF_BOUND: i32 = 2047;

/// Maximum attempts for key generation before giving up
pub const MAX_KEYGEN_ATTEMPTS: usize = 1000;

/// Maximum attempts for signing before giving up
pub const MAX_SIGN_ATTEMPTS: usize = 1000;

/// Standard deviation of the f and g coefficients, sqrt(q / 8192) * 1.17
pub const KEYGEN_SIGMA: f64 = 1.43300980528773;

/// Upper bound on the Gram-Schmidt norm of a key, 1.17^2 * q
pub const KEYGEN_GS_BOUND: f64 = 1.17 * 1.17 * Q as f64;

/// Falcon parameter set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FalconParams {
    /// Logarithmic degree (logn)
    pub logn: usize,
    /// Polynomial degree (n = 2^logn)
    pub n: usize,
    /// Prime modulus
    pub q: u32,
    /// Standard deviation of the signing Gaussian
    pub sigma: f64,
    /// Smallest leaf standard deviation fed to the sampler
    pub sigmin: f64,
    /// Squared norm bound on (s1, s2)
    pub sig_bound: u64,
    /// Serialized signature length in bytes
    pub sig_bytelen: usize,
}

const fn entry(logn: usize, sigma: f64, sigmin: f64, sig_bound: u64, sig_bytelen: usize) -> FalconParams {
    FalconParams {
        logn,
        n: 1 << logn,
        q: Q,
        sigma,
        sigmin,
        sig_bound,
        sig_bytelen,
    }
}

/// Falcon-512 parameter set (NIST security level 1)
pub const FALCON_512: FalconParams =
    entry(LOGN_512, 165.7366171829776, 1.2778336969128337, 34034726, 666);

/// Falcon-1024 parameter set (NIST security level 5)
pub const FALCON_1024: FalconParams =
    entry(LOGN_1024, 168.38857144654395, 1.298280334344292, 70265242, 1280);

const PARAMS: [FalconParams; MAX_LOGN] = [
    entry(1, 144.81253976308423, 1.1165085072329104, 101498, 44),
    entry(2, 146.83798833523608, 1.1321247692325274, 208714, 47),
    entry(3, 148.83587593064718, 1.147528535373367, 428865, 52),
    entry(4, 151.78340713845503, 1.170254078853483, 892039, 63),
    entry(5, 154.6747794602761, 1.1925466358390344, 1852696, 82),
    entry(6, 157.51308555044122, 1.2144300507766141, 3842630, 122),
    entry(7, 160.30114421975344, 1.235926056771981, 7959734, 200),
    entry(8, 163.04153322607107, 1.2570545284063217, 16468416, 356),
    FALCON_512,
    FALCON_1024,
];

impl FalconParams {
    /// Get the parameter set for the given logarithmic degree
    pub const fn from_logn(logn: usize) -> Option<Self> {
        if logn < MIN_LOGN || logn > MAX_LOGN {
            return None;
        }
        Some(PARAMS[logn - 1])
    }

    /// Get the parameter set for a degree n, which must be a power of two
    pub fn from_n(n: usize) -> Result<Self> {
        if !n.is_power_of_two() {
            return Err(Error::InvalidParameter);
        }
        Self::from_logn(n.trailing_zeros() as usize).ok_or(Error::InvalidParameter)
    }

    /// Signature header byte, 0x30 + logn
    pub const fn header(self) -> u8 {
        0x30 + self.logn as u8
    }

    /// Room left for the compressed s2 after header and salt
    pub const fn compressed_len(self) -> usize {
        self.sig_bytelen - HEAD_LEN - SALT_LEN
    }

    /// Check if a given norm squared is within the signature bound
    pub fn norm_is_valid(self, norm_squared: u64) -> bool {
        norm_squared <= self.sig_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_logn() {
        for logn in MIN_LOGN..=MAX_LOGN {
            let params = FalconParams::from_logn(logn).unwrap();
            assert_eq!(params.logn, logn);
            assert_eq!(params.n, 1 << logn);
            assert!(params.sigmin < params.sigma);
        }
        assert!(FalconParams::from_logn(0).is_none());
        assert!(FalconParams::from_logn(11).is_none());
    }

    #[test]
    fn test_falcon_512_constants() {
        let params = FalconParams::from_n(512).unwrap();
        assert_eq!(params, FALCON_512);
        assert_eq!(params.header(), 0x39);
        assert_eq!(params.compressed_len(), 625);
        assert!(params.norm_is_valid(34034726));
        assert!(!params.norm_is_valid(34034727));
    }

    #[test]
    fn test_from_n_rejects_bad_degrees() {
        assert_eq!(FalconParams::from_n(500), Err(Error::InvalidParameter));
        assert_eq!(FalconParams::from_n(2048), Err(Error::InvalidParameter));
        assert_eq!(FalconParams::from_n(1), Err(Error::InvalidParameter));
        assert_eq!(FalconParams::from_n(0), Err(Error::InvalidParameter));
    }
}
