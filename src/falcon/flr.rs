//! Floating-point helpers
//!
//! `core` has no transcendental functions, so every float operation the FFT,
//! sampler and key generator need goes through here and lands on `std` or
//! `libm` depending on the build.

/// Square root
#[inline]
pub fn sqrt(x: f64) -> f64 {
    #[cfg(feature = "std")]
    let result = x.sqrt();

    #[cfg(not(feature = "std"))]
    let result = libm::sqrt(x);

    result
}

/// Largest integer not above `x`
#[inline]
pub fn floor(x: f64) -> f64 {
    #[cfg(feature = "std")]
    let result = x.floor();

    #[cfg(not(feature = "std"))]
    let result = libm::floor(x);

    result
}

/// Absolute value
#[inline]
pub fn abs(x: f64) -> f64 {
    #[cfg(feature = "std")]
    let result = x.abs();

    #[cfg(not(feature = "std"))]
    let result = libm::fabs(x);

    result
}

/// Sine and cosine of `x`
#[inline]
pub fn sin_cos(x: f64) -> (f64, f64) {
    #[cfg(feature = "std")]
    let result = x.sin_cos();

    #[cfg(not(feature = "std"))]
    let result = libm::sincos(x);

    result
}

/// Round to the nearest integer, ties to even
#[inline]
pub fn round_ties_to_even(x: f64) -> i64 {
    #[cfg(feature = "std")]
    let result = x.round_ties_even();

    #[cfg(not(feature = "std"))]
    let result = libm::rint(x);

    result as i64
}
