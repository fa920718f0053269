pub mod bls;
pub mod ecdsa;
mod error;
pub mod hash;
pub mod nonce;

pub use error::Error;

use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

pub const SECRET_KEY_LENGTH: usize = 32;

/// 32-byte secret scalar, shared by both signature schemes.
///
/// The valid range depends on the scheme: `[1, n-1]` over the secp256k1
/// group order for ECDSA, over the BLS12-381 scalar field order for BLS.
/// Range checks happen where the scalar is used, not here.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Secret([u8; SECRET_KEY_LENGTH]);

impl Secret {
    pub fn generate<T>(csprng: &mut T) -> Self
    where
        T: CryptoRng + RngCore,
    {
        let mut bytes = [0u8; SECRET_KEY_LENGTH];
        csprng.fill_bytes(&mut bytes);
        Secret(bytes)
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; SECRET_KEY_LENGTH]) -> Self {
        Secret(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; SECRET_KEY_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.ct_eq(&[0u8; SECRET_KEY_LENGTH]).into()
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Secret {}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    fn test_secret_equality() {
        let mut csprng = ChaCha20Rng::seed_from_u64(1);
        let a = Secret::generate(&mut csprng);
        let b = Secret::generate(&mut csprng);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_detection() {
        assert!(Secret::from_bytes([0u8; 32]).is_zero());
        assert!(!Secret::from_bytes([1u8; 32]).is_zero());
    }
}
