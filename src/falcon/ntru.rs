//! NTRU key generation
//!
//! Samples short f and g, rejects bases of poor Gram-Schmidt quality or with
//! f not invertible mod q, then solves f*G - g*F = q exactly over the
//! integers by descending through field norms and lifting back with
//! Babai reduction at every level.

use crate::falcon::fft::{self, Complex};
use crate::falcon::flr;
use crate::falcon::gaussian::SamplerZ;
use crate::falcon::params::*;
use crate::falcon::poly::{IntPoly, ModqPoly};
use crate::{Error, Result};
use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand_core::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Reduction rounds per recursion level before the candidate is dropped
const MAX_REDUCE_ROUNDS: usize = 10_000;

/// Falcon secret key
#[allow(non_snake_case)]
#[derive(Debug, Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    /// Logarithmic degree
    pub logn: usize,
    /// Secret polynomial f
    pub f: IntPoly,
    /// Secret polynomial g
    pub g: IntPoly,
    /// NTRU polynomial F (f*G - g*F = q)
    pub F: IntPoly,
    /// NTRU polynomial G (f*G - g*F = q)
    pub G: IntPoly,
    /// Public polynomial h = g/f mod q
    pub h: ModqPoly,
}

/// Falcon public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    /// Logarithmic degree
    pub logn: usize,
    /// Public polynomial h = g/f mod q
    pub h: ModqPoly,
}

/// Why a key candidate was thrown away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    GramSchmidtNorm,
    NotInvertible,
    Unsolvable,
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Rejection::GramSchmidtNorm => write!(f, "Gram-Schmidt norm above bound"),
            Rejection::NotInvertible => write!(f, "f not invertible mod q"),
            Rejection::Unsolvable => write!(f, "NTRU equation unsolvable"),
        }
    }
}

impl SecretKey {
    /// Rebuild a secret key from its four polynomials, checking the NTRU
    /// equation and recomputing h
    #[allow(non_snake_case)]
    pub fn from_polys(logn: usize, f: IntPoly, g: IntPoly, F: IntPoly, G: IntPoly) -> Result<Self> {
        FalconParams::from_logn(logn).ok_or(Error::InvalidParameter)?;
        if [&f, &g, &F, &G].iter().any(|p| p.logn != logn || p.coeffs.len() != 1 << logn) {
            return Err(Error::DimensionMismatch);
        }
        let lhs = f.mul(&G)?.sub(&g.mul(&F)?)?;
        let q_const = lhs.coeffs[0] == Q as i32 && lhs.coeffs[1..].iter().all(|&c| c == 0);
        if !q_const {
            return Err(Error::InvalidSecretKey);
        }
        let h = g.to_modq().div_mod_q(&f.to_modq())?;
        Ok(Self { logn, f, g, F, G, h })
    }

    /// Matching public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            logn: self.logn,
            h: self.h.clone(),
        }
    }

    /// Parameter set of this key
    pub fn params(&self) -> Result<FalconParams> {
        FalconParams::from_logn(self.logn).ok_or(Error::InvalidSecretKey)
    }
}

impl PublicKey {
    /// Wrap a public polynomial given as coefficients in [0, q)
    pub fn from_coeffs(coeffs: Vec<u16>) -> Result<Self> {
        let params = FalconParams::from_n(coeffs.len())?;
        let h = ModqPoly::from_coeffs(coeffs, params.logn)?;
        Ok(Self {
            logn: params.logn,
            h,
        })
    }

    /// Parameter set of this key
    pub fn params(&self) -> Result<FalconParams> {
        FalconParams::from_logn(self.logn).ok_or(Error::InvalidPublicKey)
    }
}

/// Generate a Falcon key pair
pub fn generate_keypair<R: RngCore>(
    params: FalconParams,
    rng: &mut R,
) -> Result<(SecretKey, PublicKey)> {
    let sampler = SamplerZ::new(KEYGEN_SIGMA - 0.001)?;

    for attempt in 1..=MAX_KEYGEN_ATTEMPTS {
        let f = gen_poly(params, &sampler, rng)?;
        let g = gen_poly(params, &sampler, rng)?;

        let (big_f, big_g) = match check_and_solve(&f, &g) {
            Ok(solution) => solution,
            Err(reason) => {
                debug!("key generation attempt {} rejected: {}", attempt, reason);
                continue;
            }
        };

        let sk = SecretKey::from_polys(params.logn, f, g, big_f, big_g)?;
        debug!("key generation succeeded after {} attempt(s)", attempt);
        let pk = sk.public_key();
        return Ok((sk, pk));
    }

    Err(Error::KeyGenExhausted)
}

#[allow(non_snake_case)]
fn check_and_solve(f: &IntPoly, g: &IntPoly) -> core::result::Result<(IntPoly, IntPoly), Rejection> {
    match gs_norm(f, g) {
        Ok(norm) if norm <= KEYGEN_GS_BOUND => {}
        _ => return Err(Rejection::GramSchmidtNorm),
    }
    if !f.to_modq().is_invertible() {
        return Err(Rejection::NotInvertible);
    }

    let fb: Vec<BigInt> = f.coeffs.iter().map(|&c| BigInt::from(c)).collect();
    let gb: Vec<BigInt> = g.coeffs.iter().map(|&c| BigInt::from(c)).collect();
    let (F, G) = ntru_solve(&fb, &gb)?;

    let to_poly = |v: Vec<BigInt>| -> core::result::Result<IntPoly, Rejection> {
        let coeffs = v
            .iter()
            .map(|c| c.to_i32().ok_or(Rejection::Unsolvable))
            .collect::<core::result::Result<Vec<_>, _>>()?;
        IntPoly::from_coeffs(coeffs, f.logn).map_err(|_| Rejection::Unsolvable)
    };
    Ok((to_poly(F)?, to_poly(G)?))
}

/// Short polynomial whose coefficients sum 4096/n draws of D_{Z, KEYGEN_SIGMA}
fn gen_poly<R: RngCore>(params: FalconParams, sampler: &SamplerZ, rng: &mut R) -> Result<IntPoly> {
    let n = params.n;
    let k = 4096 / n;
    let mut coeffs = vec![0i32; n];
    for c in coeffs.iter_mut() {
        for _ in 0..k {
            *c += sampler.sample(rng, 0.0, KEYGEN_SIGMA)?;
        }
    }
    IntPoly::from_coeffs(coeffs, params.logn)
}

/// Squared Gram-Schmidt norm of the NTRU basis spanned by (f, g)
pub fn gs_norm(f: &IntPoly, g: &IntPoly) -> Result<f64> {
    let sqnorm_fg = (f.norm_squared() + g.norm_squared()) as f64;

    let f_fft = f.to_fft()?;
    let g_fft = g.to_fft()?;
    let ffgg: Vec<Complex> = f_fft
        .iter()
        .zip(&g_fft)
        .map(|(a, b)| Complex::from_real(a.norm_sqr() + b.norm_sqr()))
        .collect();
    let ft = fft::ifft(&fft::div_fft(&fft::adj_fft(&g_fft), &ffgg)?)?;
    let gt = fft::ifft(&fft::div_fft(&fft::adj_fft(&f_fft), &ffgg)?)?;
    let q = Q as f64;
    let sqnorm_tilde = q * q * ft.iter().chain(&gt).map(|x| x * x).sum::<f64>();

    Ok(if sqnorm_fg > sqnorm_tilde { sqnorm_fg } else { sqnorm_tilde })
}

/// Solve f*G - g*F = q over Z[x]/(x^n + 1)
#[allow(non_snake_case)]
fn ntru_solve(f: &[BigInt], g: &[BigInt]) -> core::result::Result<(Vec<BigInt>, Vec<BigInt>), Rejection> {
    let n = f.len();
    if n == 1 {
        let (d, u, v) = xgcd(&f[0], &g[0]);
        if !d.is_one() {
            return Err(Rejection::Unsolvable);
        }
        let q = BigInt::from(Q);
        return Ok((vec![-(&q * v)], vec![q * u]));
    }

    let fp = field_norm(f);
    let gp = field_norm(g);
    let (Fp, Gp) = ntru_solve(&fp, &gp)?;
    let F = karamul(&lift(&Fp), &galois_conjugate(g));
    let G = karamul(&lift(&Gp), &galois_conjugate(f));
    reduce(f, g, F, G)
}

/// Extended Euclid: (d, u, v) with a*u + b*v = d
fn xgcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut r0, mut r1) = (a.clone(), b.clone());
    let (mut x0, mut x1) = (BigInt::one(), BigInt::zero());
    let (mut y0, mut y1) = (BigInt::zero(), BigInt::one());
    while !r1.is_zero() {
        let quot = &r0 / &r1;
        let r2 = &r0 - &quot * &r1;
        r0 = core::mem::replace(&mut r1, r2);
        let x2 = &x0 - &quot * &x1;
        x0 = core::mem::replace(&mut x1, x2);
        let y2 = &y0 - &quot * &y1;
        y0 = core::mem::replace(&mut y1, y2);
    }
    if r0.is_negative() {
        (-r0, -x0, -y0)
    } else {
        (r0, x0, y0)
    }
}

/// N(a)(x^2) = a(x) * a(-x), projected to degree n/2
fn field_norm(a: &[BigInt]) -> Vec<BigInt> {
    let n2 = a.len() / 2;
    let ae: Vec<BigInt> = a.iter().step_by(2).cloned().collect();
    let ao: Vec<BigInt> = a.iter().skip(1).step_by(2).cloned().collect();
    let ae_sq = karamul(&ae, &ae);
    let ao_sq = karamul(&ao, &ao);
    let mut res = ae_sq;
    for i in 0..n2 - 1 {
        res[i + 1] -= &ao_sq[i];
    }
    res[0] += &ao_sq[n2 - 1];
    res
}

/// a(x) -> a(x^2)
fn lift(a: &[BigInt]) -> Vec<BigInt> {
    let mut res = vec![BigInt::zero(); 2 * a.len()];
    for (i, c) in a.iter().enumerate() {
        res[2 * i] = c.clone();
    }
    res
}

/// a(x) -> a(-x)
fn galois_conjugate(a: &[BigInt]) -> Vec<BigInt> {
    a.iter()
        .enumerate()
        .map(|(i, c)| if i % 2 == 0 { c.clone() } else { -c })
        .collect()
}

/// Karatsuba product, full length 2n
fn karatsuba(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    if n == 1 {
        return vec![&a[0] * &b[0], BigInt::zero()];
    }
    let n2 = n / 2;
    let (a0, a1) = a.split_at(n2);
    let (b0, b1) = b.split_at(n2);
    let ax: Vec<BigInt> = a0.iter().zip(a1).map(|(x, y)| x + y).collect();
    let bx: Vec<BigInt> = b0.iter().zip(b1).map(|(x, y)| x + y).collect();
    let a0b0 = karatsuba(a0, b0);
    let a1b1 = karatsuba(a1, b1);
    let mut axbx = karatsuba(&ax, &bx);
    for i in 0..n {
        axbx[i] -= &a0b0[i] + &a1b1[i];
    }
    let mut ab = vec![BigInt::zero(); 2 * n];
    for i in 0..n {
        ab[i] += &a0b0[i];
        ab[i + n] += &a1b1[i];
        ab[i + n2] += &axbx[i];
    }
    ab
}

/// Product in Z[x]/(x^n + 1)
fn karamul(a: &[BigInt], b: &[BigInt]) -> Vec<BigInt> {
    let n = a.len();
    let ab = karatsuba(a, b);
    (0..n).map(|i| &ab[i] - &ab[i + n]).collect()
}

/// Bit length rounded up to whole bytes
fn bitsize(a: &BigInt) -> u64 {
    (a.bits() + 7) / 8 * 8
}

fn max_bitsize(polys: &[&[BigInt]]) -> u64 {
    polys
        .iter()
        .flat_map(|p| p.iter())
        .map(bitsize)
        .fold(53, u64::max)
}

/// Top 53 significant bits as floats, FFT-transformed
fn adjusted_fft(a: &[BigInt], shift: u64) -> core::result::Result<Vec<Complex>, Rejection> {
    let floats = a
        .iter()
        .map(|c| (c >> shift as usize).to_f64().ok_or(Rejection::Unsolvable))
        .collect::<core::result::Result<Vec<f64>, _>>()?;
    fft::fft(&floats).map_err(|_| Rejection::Unsolvable)
}

/// Babai-reduce (F, G) against (f, g)
#[allow(non_snake_case)]
fn reduce(
    f: &[BigInt],
    g: &[BigInt],
    mut F: Vec<BigInt>,
    mut G: Vec<BigInt>,
) -> core::result::Result<(Vec<BigInt>, Vec<BigInt>), Rejection> {
    let n = f.len();
    let size = max_bitsize(&[f, g]);
    let fa = adjusted_fft(f, size - 53)?;
    let ga = adjusted_fft(g, size - 53)?;
    let den = fft::add_fft(
        &fft::mul_fft(&fa, &fft::adj_fft(&fa)).map_err(|_| Rejection::Unsolvable)?,
        &fft::mul_fft(&ga, &fft::adj_fft(&ga)).map_err(|_| Rejection::Unsolvable)?,
    )
    .map_err(|_| Rejection::Unsolvable)?;

    for round in 0..MAX_REDUCE_ROUNDS {
        let big_size = max_bitsize(&[F.as_slice(), G.as_slice()]);
        if big_size < size {
            return Ok((F, G));
        }
        let Fa = adjusted_fft(&F, big_size - 53)?;
        let Ga = adjusted_fft(&G, big_size - 53)?;
        let k = (|| -> Result<Vec<f64>> {
            let num = fft::add_fft(
                &fft::mul_fft(&Fa, &fft::adj_fft(&fa))?,
                &fft::mul_fft(&Ga, &fft::adj_fft(&ga))?,
            )?;
            fft::ifft(&fft::div_fft(&num, &den)?)
        })()
        .map_err(|_| Rejection::Unsolvable)?;

        let k: Vec<BigInt> = k.iter().map(|&x| BigInt::from(flr::round_ties_to_even(x))).collect();
        if k.iter().all(|c| c.is_zero()) {
            return Ok((F, G));
        }
        trace!("reduce n={} round={} size={} Size={}", n, round, size, big_size);

        let fk = karamul(f, &k);
        let gk = karamul(g, &k);
        let shift = (big_size - size) as usize;
        for i in 0..n {
            F[i] -= &fk[i] << shift;
            G[i] -= &gk[i] << shift;
        }
    }
    Err(Rejection::Unsolvable)
}
