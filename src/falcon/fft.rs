//! Complex FFT over R[x]/(x^n + 1)
//!
//! A real polynomial of degree n is represented by its values at the n/2
//! roots of x^n + 1 lying in the upper half plane; the other half are their
//! conjugates. Slots are kept in the order produced by the even/odd split,
//! so `split_fft` and `merge_fft` are the tree steps fast-Fourier sampling
//! walks down and back up.

use crate::falcon::flr;
use crate::{Error, Result};
use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Complex number
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Complex {
    /// Create a new complex number
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    /// Create complex zero
    pub const fn zero() -> Self {
        Complex { re: 0.0, im: 0.0 }
    }

    /// Create complex from real part only
    pub const fn from_real(re: f64) -> Self {
        Complex { re, im: 0.0 }
    }

    /// e^(i*theta)
    pub fn from_angle(theta: f64) -> Self {
        let (im, re) = flr::sin_cos(theta);
        Complex { re, im }
    }

    /// Complex conjugate
    pub fn conj(self) -> Self {
        Complex {
            re: self.re,
            im: -self.im,
        }
    }

    /// Magnitude squared |z|^2
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Multiply by a real scalar
    pub fn scale(self, k: f64) -> Self {
        Complex {
            re: self.re * k,
            im: self.im * k,
        }
    }

    /// Division, failing when the divisor is zero or the quotient is not finite
    pub fn try_div(self, rhs: Complex) -> Result<Self> {
        let den = rhs.norm_sqr();
        if den == 0.0 || !den.is_finite() {
            return Err(Error::DivisionByZero);
        }
        let num = self * rhs.conj();
        let q = Complex::new(num.re / den, num.im / den);
        if !q.re.is_finite() || !q.im.is_finite() {
            return Err(Error::DivisionByZero);
        }
        Ok(q)
    }
}

impl core::ops::Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl core::ops::Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl core::ops::Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        // (a + bi)(c + di) = (ac - bd) + (ad + bc)i
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl core::ops::Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

/// Position of slot `k` of a degree-`n` transform: the slot holds the
/// value at exp(i*pi*(2r + 1)/n) where r is the returned index
fn root_index(n: usize, k: usize) -> usize {
    if n <= 2 {
        return 0;
    }
    let r = root_index(n >> 1, k >> 1);
    if k & 1 == 0 {
        r
    } else {
        (n >> 1) - 1 - r
    }
}

/// Twiddles used when merging two degree-n/2 halves into degree n
fn merge_roots(n: usize) -> Vec<Complex> {
    (0..n / 4)
        .map(|j| {
            let r = root_index(n / 2, j);
            Complex::from_angle(PI * (2 * r + 1) as f64 / n as f64)
        })
        .collect()
}

/// FFT of a real polynomial, n >= 2, n a power of two
pub fn fft(coeffs: &[f64]) -> Result<Vec<Complex>> {
    let n = coeffs.len();
    if n < 2 || !n.is_power_of_two() {
        return Err(Error::InvalidParameter);
    }
    if n == 2 {
        return Ok(vec_of(Complex::new(coeffs[0], coeffs[1])));
    }
    let even: Vec<f64> = coeffs.iter().step_by(2).copied().collect();
    let odd: Vec<f64> = coeffs.iter().skip(1).step_by(2).copied().collect();
    merge_fft(&fft(&even)?, &fft(&odd)?)
}

/// Inverse FFT back to real coefficients
pub fn ifft(slots: &[Complex]) -> Result<Vec<f64>> {
    let half = slots.len();
    if half == 0 || !half.is_power_of_two() {
        return Err(Error::InvalidParameter);
    }
    if half == 1 {
        let mut out = Vec::with_capacity(2);
        out.push(slots[0].re);
        out.push(slots[0].im);
        return Ok(out);
    }
    let (f0, f1) = split_fft(slots)?;
    let even = ifft(&f0)?;
    let odd = ifft(&f1)?;
    let mut out = Vec::with_capacity(2 * half);
    for (a, b) in even.into_iter().zip(odd) {
        out.push(a);
        out.push(b);
    }
    Ok(out)
}

/// Split f(x) = f0(x^2) + x f1(x^2) in the FFT domain
///
/// Needs at least two slots; a single slot already is f0 + i f1.
pub fn split_fft(slots: &[Complex]) -> Result<(Vec<Complex>, Vec<Complex>)> {
    let half = slots.len();
    if half < 2 || !half.is_power_of_two() {
        return Err(Error::InvalidParameter);
    }
    let roots = merge_roots(2 * half);
    let mut f0 = Vec::with_capacity(half / 2);
    let mut f1 = Vec::with_capacity(half / 2);
    for (j, &alpha) in roots.iter().enumerate() {
        let a = slots[2 * j];
        let b = slots[2 * j + 1].conj();
        f0.push((a + b).scale(0.5));
        f1.push(((a - b) * alpha.conj()).scale(0.5));
    }
    Ok((f0, f1))
}

/// Inverse of [`split_fft`]
pub fn merge_fft(f0: &[Complex], f1: &[Complex]) -> Result<Vec<Complex>> {
    if f0.len() != f1.len() {
        return Err(Error::DimensionMismatch);
    }
    let quarter = f0.len();
    if quarter == 0 || !quarter.is_power_of_two() {
        return Err(Error::InvalidParameter);
    }
    let roots = merge_roots(4 * quarter);
    let mut out = Vec::with_capacity(2 * quarter);
    for (j, &alpha) in roots.iter().enumerate() {
        let t = alpha * f1[j];
        out.push(f0[j] + t);
        out.push((f0[j] - t).conj());
    }
    Ok(out)
}

fn vec_of(c: Complex) -> Vec<Complex> {
    let mut v = Vec::with_capacity(1);
    v.push(c);
    v
}

fn zip_slots(
    a: &[Complex],
    b: &[Complex],
    op: impl Fn(Complex, Complex) -> Complex,
) -> Result<Vec<Complex>> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch);
    }
    Ok(a.iter().zip(b).map(|(&x, &y)| op(x, y)).collect())
}

/// Pointwise sum
pub fn add_fft(a: &[Complex], b: &[Complex]) -> Result<Vec<Complex>> {
    zip_slots(a, b, |x, y| x + y)
}

/// Pointwise difference
pub fn sub_fft(a: &[Complex], b: &[Complex]) -> Result<Vec<Complex>> {
    zip_slots(a, b, |x, y| x - y)
}

/// Pointwise product, i.e. ring multiplication
pub fn mul_fft(a: &[Complex], b: &[Complex]) -> Result<Vec<Complex>> {
    zip_slots(a, b, |x, y| x * y)
}

/// Pointwise quotient
pub fn div_fft(a: &[Complex], b: &[Complex]) -> Result<Vec<Complex>> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch);
    }
    a.iter().zip(b).map(|(&x, &y)| x.try_div(y)).collect()
}

/// Hermitian adjoint f*(x) = f(1/x)
pub fn adj_fft(a: &[Complex]) -> Vec<Complex> {
    a.iter().map(|c| c.conj()).collect()
}

/// Multiply every slot by a real scalar
pub fn scale_fft(a: &[Complex], k: f64) -> Vec<Complex> {
    a.iter().map(|c| c.scale(k)).collect()
}

/// Ring product of two real polynomials via the FFT
pub fn mul_real(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    ifft(&mul_fft(&fft(a)?, &fft(b)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_real(rng: &mut ChaCha8Rng, n: usize) -> Vec<f64> {
        (0..n).map(|_| rng.gen_range(-4096.0..4096.0)).collect()
    }

    fn schoolbook(a: &[f64], b: &[f64]) -> Vec<f64> {
        let n = a.len();
        let mut out = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                if i + j < n {
                    out[i + j] += a[i] * b[j];
                } else {
                    out[i + j - n] -= a[i] * b[j];
                }
            }
        }
        out
    }

    fn relative_error(x: &[f64], y: &[f64]) -> f64 {
        let diff: f64 = x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum();
        let norm: f64 = x.iter().map(|a| a * a).sum();
        flr::sqrt(diff / norm)
    }

    #[test]
    fn test_fft_roundtrip_precision() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        for n in [256, 512, 1024] {
            let x = random_real(&mut rng, n);
            let slots = fft(&x).unwrap();
            assert_eq!(slots.len(), n / 2);
            let back = ifft(&slots).unwrap();
            assert!(relative_error(&x, &back) < 1e-9);
        }
    }

    #[test]
    fn test_degree_two_slot() {
        let slots = fft(&[3.0, -5.0]).unwrap();
        assert_eq!(slots, vec![Complex::new(3.0, -5.0)]);
        assert_eq!(ifft(&slots).unwrap(), vec![3.0, -5.0]);
    }

    #[test]
    fn test_product_is_negacyclic_convolution() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for n in [2, 4, 8, 64, 512] {
            let a: Vec<f64> = (0..n).map(|_| rng.gen_range(-20i32..20) as f64).collect();
            let b: Vec<f64> = (0..n).map(|_| rng.gen_range(-20i32..20) as f64).collect();
            let fast = mul_real(&a, &b).unwrap();
            let slow = schoolbook(&a, &b);
            for (x, y) in fast.iter().zip(&slow) {
                assert!((x - y).abs() < 1e-6, "n = {}: {} vs {}", n, x, y);
            }
        }
    }

    #[test]
    fn test_split_merge_inverse() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for n in [4, 16, 128] {
            let x = random_real(&mut rng, n);
            let slots = fft(&x).unwrap();
            let (f0, f1) = split_fft(&slots).unwrap();
            let merged = merge_fft(&f0, &f1).unwrap();
            for (a, b) in slots.iter().zip(&merged) {
                assert!((*a - *b).norm_sqr() < 1e-12);
            }
            // split really is the even/odd decomposition
            let even: Vec<f64> = x.iter().step_by(2).copied().collect();
            let back = ifft(&f0).unwrap();
            assert!(relative_error(&even, &back) < 1e-9);
        }
    }

    #[test]
    fn test_adjoint_matches_reversal() {
        // f*(x) = f0 - f_{n-1} x - ... - f_1 x^{n-1}
        let f = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let adj = ifft(&adj_fft(&fft(&f).unwrap())).unwrap();
        let expected = vec![1.0, -8.0, -7.0, -6.0, -5.0, -4.0, -3.0, -2.0];
        assert!(relative_error(&expected, &adj) < 1e-12);
    }

    #[test]
    fn test_division() {
        let a = vec![Complex::new(1.0, 1.0), Complex::new(2.0, 0.0)];
        let b = vec![Complex::new(0.0, 1.0), Complex::new(4.0, 0.0)];
        let q = div_fft(&a, &b).unwrap();
        assert_eq!(q[0], Complex::new(1.0, -1.0));
        assert_eq!(q[1], Complex::new(0.5, 0.0));

        let z = vec![Complex::new(1.0, 0.0), Complex::zero()];
        assert_eq!(div_fft(&a, &z), Err(Error::DivisionByZero));
        assert_eq!(div_fft(&a, &z[..1]), Err(Error::DimensionMismatch));
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert_eq!(fft(&[1.0]), Err(Error::InvalidParameter));
        assert_eq!(fft(&[1.0, 2.0, 3.0]), Err(Error::InvalidParameter));
        assert_eq!(ifft(&[]), Err(Error::InvalidParameter));
        assert!(split_fft(&[Complex::zero()]).is_err());
    }
}
