//! SHAKE256 output as a seedable random byte stream
//!
//! Deterministic signing expands a seed into one long SHAKE256 stream and
//! feeds both the salt and every sampler draw from it. Wrapping the XOF
//! reader as an `RngCore` lets the sampler stay generic over its source.

use rand_core::{impls, CryptoRng, RngCore};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256, Shake256Reader,
};

/// Byte stream read from an absorbed SHAKE256 state
pub struct ShakeStream {
    reader: Shake256Reader,
}

impl ShakeStream {
    /// Absorb every part in order, then switch to squeezing
    pub fn new(parts: &[&[u8]]) -> Self {
        let mut hasher = Shake256::default();
        for part in parts {
            hasher.update(part);
        }
        Self {
            reader: hasher.finalize_xof(),
        }
    }

    /// Squeeze the next `out.len()` bytes
    pub fn read(&mut self, out: &mut [u8]) {
        self.reader.read(out);
    }
}

impl core::fmt::Debug for ShakeStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShakeStream").finish_non_exhaustive()
    }
}

impl RngCore for ShakeStream {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.reader.read(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.reader.read(dest);
        Ok(())
    }
}

impl CryptoRng for ShakeStream {}
