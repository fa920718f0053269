use primitive_types::H256;
use rand_core::{CryptoRng, RngCore};

use crate::hash::keccak256;

/// Keccak-chained pseudo-random stream for non-consensus IVs.
///
/// Owned by whichever component needs IVs and threaded through
/// explicitly; the consensus path never reads it. The internal state
/// advances as `m ← keccak256(m)` and each draw returns `keccak256(~m)`
/// so the state itself is never exposed.
pub struct NonceStream {
    value: H256,
}

impl NonceStream {
    pub fn seeded<T>(csprng: &mut T) -> Self
    where
        T: CryptoRng + RngCore,
    {
        let mut seed = [0u8; 32];
        csprng.fill_bytes(&mut seed);
        NonceStream { value: H256(seed) }
    }

    pub fn next(&mut self) -> H256 {
        self.value = keccak256(self.value.as_bytes());
        let mut inverted = [0u8; 32];
        for (out, byte) in inverted.iter_mut().zip(self.value.as_bytes()) {
            *out = !byte;
        }
        keccak256(&inverted)
    }
}
