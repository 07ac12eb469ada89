//! Polynomial arithmetic over Z[x]/(x^n + 1) and Z_q[x]/(x^n + 1)
//!
//! `ModqPoly` carries the exact modular arithmetic the verifier and the
//! public key depend on, including the number-theoretic transform.
//! `IntPoly` holds the small signed polynomials of the secret key and the
//! signature.

use crate::falcon::fft::{self, Complex};
use crate::falcon::params::*;
use crate::{Error, Result};
use zeroize::Zeroize;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Generator of the multiplicative subgroup of order 2048 in Z_q
const ROOT_2048: u32 = 7;

/// Polynomial with small signed integer coefficients
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
pub struct IntPoly {
    /// Coefficients, lowest degree first
    pub coeffs: Vec<i32>,
    /// Logarithmic degree
    pub logn: usize,
}

/// Polynomial with coefficients modulo q, each in [0, q)
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
pub struct ModqPoly {
    /// Coefficients, lowest degree first
    pub coeffs: Vec<u16>,
    /// Logarithmic degree
    pub logn: usize,
}

#[inline]
fn mq_add(a: u16, b: u16) -> u16 {
    ((a as u32 + b as u32) % Q) as u16
}

#[inline]
fn mq_sub(a: u16, b: u16) -> u16 {
    ((a as u32 + Q - b as u32) % Q) as u16
}

#[inline]
fn mq_mul(a: u16, b: u16) -> u16 {
    ((a as u32 * b as u32) % Q) as u16
}

fn mq_pow(base: u16, mut exp: u32) -> u16 {
    let mut result = 1u16;
    let mut base = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mq_mul(result, base);
        }
        base = mq_mul(base, base);
        exp >>= 1;
    }
    result
}

/// Reduce any signed integer into [0, q)
#[inline]
pub fn reduce_mod_q(x: i64) -> u16 {
    x.rem_euclid(Q as i64) as u16
}

/// Lift a value in [0, q) to the centered range [-(q-1)/2, (q-1)/2]
#[inline]
pub fn center_mod_q(x: u16) -> i32 {
    let x = x as i32;
    if x > (Q as i32 - 1) / 2 {
        x - Q as i32
    } else {
        x
    }
}

fn check_logn(logn: usize) -> Result<()> {
    if logn > MAX_LOGN {
        return Err(Error::InvalidParameter);
    }
    Ok(())
}

impl IntPoly {
    /// Create the zero polynomial of degree 2^logn
    pub fn new(logn: usize) -> Self {
        let n = 1 << logn;
        Self {
            coeffs: vec![0; n],
            logn,
        }
    }

    /// Create polynomial from coefficient vector
    pub fn from_coeffs(coeffs: Vec<i32>, logn: usize) -> Result<Self> {
        check_logn(logn)?;
        if coeffs.len() != 1 << logn {
            return Err(Error::DimensionMismatch);
        }
        Ok(Self { coeffs, logn })
    }

    /// Get polynomial degree
    pub fn degree(&self) -> usize {
        1 << self.logn
    }

    /// Reduce every coefficient modulo q
    pub fn to_modq(&self) -> ModqPoly {
        let coeffs = self.coeffs.iter().map(|&x| reduce_mod_q(x as i64)).collect();
        ModqPoly {
            coeffs,
            logn: self.logn,
        }
    }

    /// Coefficients as floats
    pub fn to_f64(&self) -> Vec<f64> {
        self.coeffs.iter().map(|&x| x as f64).collect()
    }

    /// FFT representation (n/2 complex slots)
    pub fn to_fft(&self) -> Result<Vec<Complex>> {
        fft::fft(&self.to_f64())
    }

    /// Squared Euclidean norm of the coefficient vector
    pub fn norm_squared(&self) -> u64 {
        self.coeffs
            .iter()
            .map(|&x| (x as i64 * x as i64) as u64)
            .sum()
    }

    /// Largest absolute coefficient
    pub fn max_abs(&self) -> u32 {
        self.coeffs.iter().map(|x| x.unsigned_abs()).max().unwrap_or(0)
    }

    /// Add two polynomials
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a.checked_add(b))
    }

    /// Subtract two polynomials
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a.checked_sub(b))
    }

    /// Negate polynomial
    pub fn neg(&self) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|&x| x.wrapping_neg()).collect(),
            logn: self.logn,
        }
    }

    /// Exact negacyclic product over the integers
    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.logn != other.logn {
            return Err(Error::DimensionMismatch);
        }
        let n = self.degree();
        let mut acc = vec![0i64; n];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in other.coeffs.iter().enumerate() {
                let prod = a as i64 * b as i64;
                let k = i + j;
                if k < n {
                    acc[k] += prod;
                } else {
                    acc[k - n] -= prod;
                }
            }
        }
        let coeffs = acc
            .into_iter()
            .map(|x| i32::try_from(x).map_err(|_| Error::CoefficientOutOfRange))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            coeffs,
            logn: self.logn,
        })
    }

    fn zip_with(&self, other: &Self, op: impl Fn(i32, i32) -> Option<i32>) -> Result<Self> {
        if self.logn != other.logn || self.coeffs.len() != other.coeffs.len() {
            return Err(Error::DimensionMismatch);
        }
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| op(a, b).ok_or(Error::CoefficientOutOfRange))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            coeffs,
            logn: self.logn,
        })
    }
}

impl ModqPoly {
    /// Create the zero polynomial of degree 2^logn
    pub fn new(logn: usize) -> Self {
        let n = 1 << logn;
        Self {
            coeffs: vec![0; n],
            logn,
        }
    }

    /// Create polynomial from coefficient vector, each coefficient in [0, q)
    pub fn from_coeffs(coeffs: Vec<u16>, logn: usize) -> Result<Self> {
        check_logn(logn)?;
        if coeffs.len() != 1 << logn {
            return Err(Error::DimensionMismatch);
        }
        if coeffs.iter().any(|&c| c as u32 >= Q) {
            return Err(Error::CoefficientOutOfRange);
        }
        Ok(Self { coeffs, logn })
    }

    /// Get polynomial degree
    pub fn degree(&self) -> usize {
        1 << self.logn
    }

    /// Coefficient-wise addition mod q
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, mq_add)
    }

    /// Coefficient-wise subtraction mod q
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, mq_sub)
    }

    /// Negation mod q
    pub fn neg(&self) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|&c| mq_sub(0, c)).collect(),
            logn: self.logn,
        }
    }

    /// Schoolbook negacyclic product, O(n^2)
    pub fn mul(&self, other: &Self) -> Result<Self> {
        if self.logn != other.logn {
            return Err(Error::DimensionMismatch);
        }
        let n = self.degree();
        let mut result = vec![0u16; n];
        for (i, &a) in self.coeffs.iter().enumerate() {
            for (j, &b) in other.coeffs.iter().enumerate() {
                let prod = mq_mul(a, b);
                let k = i + j;
                if k < n {
                    result[k] = mq_add(result[k], prod);
                } else {
                    result[k - n] = mq_sub(result[k - n], prod);
                }
            }
        }
        Ok(Self {
            coeffs: result,
            logn: self.logn,
        })
    }

    /// Product through the NTT, O(n log n)
    pub fn ntt_mul(&self, other: &Self) -> Result<Self> {
        if self.logn != other.logn {
            return Err(Error::DimensionMismatch);
        }
        let a = self.ntt();
        let b = other.ntt();
        a.zip_with(&b, mq_mul).map(|c| c.intt())
    }

    /// Forward NTT; the result is in bit-reversed evaluation order
    pub fn ntt(&self) -> Self {
        let mut coeffs = self.coeffs.clone();
        ntt_forward(&mut coeffs, self.logn);
        Self {
            coeffs,
            logn: self.logn,
        }
    }

    /// Inverse NTT of a bit-reversed evaluation vector
    pub fn intt(&self) -> Self {
        let mut coeffs = self.coeffs.clone();
        ntt_inverse(&mut coeffs, self.logn);
        Self {
            coeffs,
            logn: self.logn,
        }
    }

    /// True when every NTT slot is nonzero
    pub fn is_invertible(&self) -> bool {
        self.ntt().coeffs.iter().all(|&c| c != 0)
    }

    /// Inverse in Z_q[x]/(x^n + 1) by pointwise inversion of the NTT slots
    pub fn inverse_mod_q(&self) -> Result<Self> {
        let mut slots = self.ntt();
        for c in slots.coeffs.iter_mut() {
            if *c == 0 {
                return Err(Error::NonInvertible);
            }
            *c = mq_pow(*c, Q - 2);
        }
        Ok(slots.intt())
    }

    /// Quotient self / other mod q
    pub fn div_mod_q(&self, other: &Self) -> Result<Self> {
        if self.logn != other.logn {
            return Err(Error::DimensionMismatch);
        }
        let mut num = self.ntt();
        let den = other.ntt();
        for (a, &b) in num.coeffs.iter_mut().zip(&den.coeffs) {
            if b == 0 {
                return Err(Error::NonInvertible);
            }
            *a = mq_mul(*a, mq_pow(b, Q - 2));
        }
        Ok(num.intt())
    }

    /// Centered signed representative of every coefficient
    pub fn to_centered(&self) -> IntPoly {
        IntPoly {
            coeffs: self.coeffs.iter().map(|&c| center_mod_q(c)).collect(),
            logn: self.logn,
        }
    }

    fn zip_with(&self, other: &Self, op: fn(u16, u16) -> u16) -> Result<Self> {
        if self.logn != other.logn || self.coeffs.len() != other.coeffs.len() {
            return Err(Error::DimensionMismatch);
        }
        let coeffs = self
            .coeffs
            .iter()
            .zip(&other.coeffs)
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(Self {
            coeffs,
            logn: self.logn,
        })
    }
}

/// Powers of psi and psi^-1 in bit-reversed order, plus n^-1 mod q
struct NttTables {
    psi_rev: Vec<u16>,
    psi_inv_rev: Vec<u16>,
    n_inv: u16,
}

impl NttTables {
    fn new(logn: usize) -> Self {
        let n = 1usize << logn;
        // psi is a primitive 2n-th root of unity
        let psi = mq_pow(ROOT_2048 as u16, (MAX_N / n) as u32);
        let psi_inv = mq_pow(psi, Q - 2);
        let mut psi_rev = vec![0u16; n];
        let mut psi_inv_rev = vec![0u16; n];
        let mut pow = 1u16;
        let mut pow_inv = 1u16;
        for i in 0..n {
            let r = bit_reverse(i, logn);
            psi_rev[r] = pow;
            psi_inv_rev[r] = pow_inv;
            pow = mq_mul(pow, psi);
            pow_inv = mq_mul(pow_inv, psi_inv);
        }
        Self {
            psi_rev,
            psi_inv_rev,
            n_inv: mq_pow(n as u16, Q - 2),
        }
    }
}

fn bit_reverse(x: usize, bits: usize) -> usize {
    if bits == 0 {
        return 0;
    }
    x.reverse_bits() >> (usize::BITS as usize - bits)
}

/// Cooley-Tukey forward NTT, in place, natural order in, bit-reversed out
pub fn ntt_forward(coeffs: &mut [u16], logn: usize) {
    let n = coeffs.len();
    let tables = NttTables::new(logn);
    let mut t = n;
    let mut m = 1;
    while m < n {
        t >>= 1;
        for i in 0..m {
            let j1 = 2 * i * t;
            let s = tables.psi_rev[m + i];
            for j in j1..j1 + t {
                let u = coeffs[j];
                let v = mq_mul(coeffs[j + t], s);
                coeffs[j] = mq_add(u, v);
                coeffs[j + t] = mq_sub(u, v);
            }
        }
        m <<= 1;
    }
}

/// Gentleman-Sande inverse NTT, in place, bit-reversed in, natural order out
pub fn ntt_inverse(coeffs: &mut [u16], logn: usize) {
    let n = coeffs.len();
    let tables = NttTables::new(logn);
    let mut t = 1;
    let mut m = n;
    while m > 1 {
        let h = m >> 1;
        let mut j1 = 0;
        for i in 0..h {
            let s = tables.psi_inv_rev[h + i];
            for j in j1..j1 + t {
                let u = coeffs[j];
                let v = coeffs[j + t];
                coeffs[j] = mq_add(u, v);
                coeffs[j + t] = mq_mul(mq_sub(u, v), s);
            }
            j1 += 2 * t;
        }
        t <<= 1;
        m = h;
    }
    for c in coeffs.iter_mut() {
        *c = mq_mul(*c, tables.n_inv);
    }
}
