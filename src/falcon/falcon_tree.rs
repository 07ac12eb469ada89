//! Falcon tree and fast-Fourier sampling
//!
//! The secret basis B = [[g, -f], [G, -F]] is kept in FFT form. Its Gram
//! matrix is decomposed by ffLDL into a binary tree whose internal nodes hold
//! the L10 factor of each 2x2 block and whose leaves hold the per-coordinate
//! standard deviation sigma / sqrt(D). Sampling walks the same tree.

use crate::falcon::fft::{self, Complex};
use crate::falcon::flr;
use crate::falcon::gaussian::SamplerZ;
use crate::falcon::ntru::SecretKey;
use crate::falcon::params::*;
use crate::falcon::poly::{IntPoly, ModqPoly};
use crate::{Error, Result};
use rand_core::RngCore;

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};

/// ffLDL tree of a self-adjoint 2x2 Gram matrix
#[derive(Debug, Clone)]
pub enum LdlTree {
    /// L10 factor and the trees of the two diagonal blocks
    Node {
        /// Off-diagonal factor of L, FFT form
        l10: Vec<Complex>,
        /// Tree of D00
        left: Box<LdlTree>,
        /// Tree of D11
        right: Box<LdlTree>,
    },
    /// Standard deviation for one coordinate pair
    Leaf(f64),
}

impl LdlTree {
    /// ffLDL of [[g00, g01], [adj(g01), g11]] with leaves normalized by sigma
    pub fn build(g00: &[Complex], g01: &[Complex], g11: &[Complex], sigma: f64) -> Result<Self> {
        let l10 = fft::div_fft(&fft::adj_fft(g01), g00)?;
        let l10_sq = fft::mul_fft(&l10, &fft::adj_fft(&l10))?;
        let d11 = fft::sub_fft(g11, &fft::mul_fft(&l10_sq, g00)?)?;

        let (left, right) = if g00.len() == 1 {
            (leaf(g00[0], sigma)?, leaf(d11[0], sigma)?)
        } else {
            let (a0, a1) = fft::split_fft(g00)?;
            let (b0, b1) = fft::split_fft(&d11)?;
            (
                LdlTree::build(&a0, &a1, &a0, sigma)?,
                LdlTree::build(&b0, &b1, &b0, sigma)?,
            )
        };
        Ok(LdlTree::Node {
            l10,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Visit every leaf sigma, left to right
    pub fn leaves(&self, out: &mut Vec<f64>) {
        match self {
            LdlTree::Node { left, right, .. } => {
                left.leaves(out);
                right.leaves(out);
            }
            LdlTree::Leaf(sigma) => out.push(*sigma),
        }
    }
}

fn leaf(d: Complex, sigma: f64) -> Result<LdlTree> {
    if !(d.re > 0.0) {
        return Err(Error::DivisionByZero);
    }
    Ok(LdlTree::Leaf(sigma / flr::sqrt(d.re)))
}

/// Sample (z0, z1) close to (t0, t1) under the lattice described by `tree`
fn ff_sampling<R: RngCore>(
    t0: &[Complex],
    t1: &[Complex],
    tree: &LdlTree,
    sampler: &SamplerZ,
    rng: &mut R,
) -> Result<(Vec<Complex>, Vec<Complex>)> {
    let LdlTree::Node { l10, left, right } = tree else {
        return Err(Error::InvalidParameter);
    };
    let z1 = sample_subtree(t1, right, sampler, rng)?;
    let t0b = fft::add_fft(t0, &fft::mul_fft(&fft::sub_fft(t1, &z1)?, l10)?)?;
    let z0 = sample_subtree(&t0b, left, sampler, rng)?;
    Ok((z0, z1))
}

fn sample_subtree<R: RngCore>(
    t: &[Complex],
    tree: &LdlTree,
    sampler: &SamplerZ,
    rng: &mut R,
) -> Result<Vec<Complex>> {
    match tree {
        LdlTree::Leaf(sigma) => {
            if t.len() != 1 {
                return Err(Error::DimensionMismatch);
            }
            let re = sampler.sample(rng, t[0].re, *sigma)?;
            let im = sampler.sample(rng, t[0].im, *sigma)?;
            let mut z = Vec::with_capacity(1);
            z.push(Complex::new(re as f64, im as f64));
            Ok(z)
        }
        LdlTree::Node { .. } => {
            let (a, b) = fft::split_fft(t)?;
            let (z0, z1) = ff_sampling(&a, &b, tree, sampler, rng)?;
            fft::merge_fft(&z0, &z1)
        }
    }
}

/// Signing-time view of a secret key
#[derive(Debug, Clone)]
pub struct FalconTree {
    /// Parameter set
    pub params: FalconParams,
    b00: Vec<Complex>,
    b01: Vec<Complex>,
    b10: Vec<Complex>,
    b11: Vec<Complex>,
    tree: LdlTree,
}

impl FalconTree {
    /// Expand a secret key into its FFT basis and normalized ffLDL tree
    pub fn new(sk: &SecretKey) -> Result<Self> {
        let params = sk.params()?;
        let b00 = sk.g.to_fft()?;
        let b01 = sk.f.neg().to_fft()?;
        let b10 = sk.G.to_fft()?;
        let b11 = sk.F.neg().to_fft()?;

        // Gram matrix B * B^*
        let gram = |x0: &[Complex], x1: &[Complex], y0: &[Complex], y1: &[Complex]| {
            fft::add_fft(
                &fft::mul_fft(x0, &fft::adj_fft(y0))?,
                &fft::mul_fft(x1, &fft::adj_fft(y1))?,
            )
        };
        let g00 = gram(&b00, &b01, &b00, &b01)?;
        let g01 = gram(&b00, &b01, &b10, &b11)?;
        let g11 = gram(&b10, &b11, &b10, &b11)?;

        let tree = LdlTree::build(&g00, &g01, &g11, params.sigma)?;
        Ok(Self {
            params,
            b00,
            b01,
            b10,
            b11,
            tree,
        })
    }

    /// The normalized ffLDL tree
    pub fn tree(&self) -> &LdlTree {
        &self.tree
    }

    /// Short (s1, s2) with s1 + s2*h = point mod q
    pub fn sample_preimage<R: RngCore>(
        &self,
        point: &ModqPoly,
        sampler: &SamplerZ,
        rng: &mut R,
    ) -> Result<(IntPoly, IntPoly)> {
        let logn = self.params.logn;
        let point_int = IntPoly {
            coeffs: point.coeffs.iter().map(|&c| c as i32).collect(),
            logn,
        };
        let c = point_int.to_fft()?;
        let q = Q as f64;

        let t0 = fft::scale_fft(&fft::mul_fft(&c, &self.b11)?, 1.0 / q);
        let t1 = fft::scale_fft(&fft::mul_fft(&c, &self.b01)?, -1.0 / q);

        let (z0, z1) = ff_sampling(&t0, &t1, &self.tree, sampler, rng)?;

        let v0 = fft::add_fft(&fft::mul_fft(&z0, &self.b00)?, &fft::mul_fft(&z1, &self.b10)?)?;
        let v1 = fft::add_fft(&fft::mul_fft(&z0, &self.b01)?, &fft::mul_fft(&z1, &self.b11)?)?;
        let v0 = round_poly(&fft::ifft(&v0)?, logn)?;
        let v1 = round_poly(&fft::ifft(&v1)?, logn)?;

        let s1 = point_int.sub(&v0)?;
        let s2 = v1.neg();
        Ok((s1, s2))
    }
}

fn round_poly(coeffs: &[f64], logn: usize) -> Result<IntPoly> {
    let rounded = coeffs
        .iter()
        .map(|&x| {
            let r = flr::round_ties_to_even(x);
            i32::try_from(r).map_err(|_| Error::CoefficientOutOfRange)
        })
        .collect::<Result<Vec<_>>>()?;
    IntPoly::from_coeffs(rounded, logn)
}
