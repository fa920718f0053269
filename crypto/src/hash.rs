use primitive_types::H256;
use rand_core::{CryptoRng, RngCore};
use tiny_keccak::{Hasher, Keccak};

use crate::{Error, Secret};

/// Keccak-256 with the original padding rule, not FIPS-202 SHA3-256.
/// Every consensus hash in the protocol goes through this function.
pub fn keccak256(input: &[u8]) -> H256 {
    keccak256_concat(&[input])
}

/// Keccak-256 over the concatenation of `parts`, without building an
/// intermediate buffer.
pub fn keccak256_concat(parts: &[&[u8]]) -> H256 {
    let mut out = [0u8; 32];
    let mut keccak = Keccak::v256();
    for part in parts {
        keccak.update(part);
    }
    keccak.finalize(&mut out);
    H256(out)
}

/// Keyed hash used by the key-derivation path: `keccak256(nonce ‖ key)`.
pub fn sha3mac(nonce: &[u8], key: &[u8]) -> H256 {
    keccak256_concat(&[nonce, key])
}

/// Derives `H(H(r ‖ k) ^ h)` over a fresh random `r`.
///
/// Errors with `InvalidState` when any of the inputs or the output is
/// zero, which would indicate a broken RNG or caller bug.
pub fn kdf<T>(secret: &Secret, hash: &H256, csprng: &mut T) -> Result<H256, Error>
where
    T: CryptoRng + RngCore,
{
    let r = Secret::generate(csprng);
    let mut s = sha3mac(r.as_bytes(), secret.as_bytes());
    for (byte, mask) in s.as_bytes_mut().iter_mut().zip(hash.as_bytes()) {
        *byte ^= mask;
    }
    let s = keccak256(s.as_bytes());

    if s.is_zero() || hash.is_zero() || secret.is_zero() {
        return Err(Error::InvalidState);
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    fn test_keccak256_vectors() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex::encode(keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
        assert_eq!(
            hex::encode(keccak256(b"The quick brown fox jumps over the lazy dog")),
            "4d741b6f1eb29cb2a9b9911c82f56fa8d73b04959d3d9d222895df6c0b28aa15"
        );
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        let whole = keccak256(b"stake modifier chain");
        let parts = keccak256_concat(&[b"stake ", b"modifier", b" chain"]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn test_sha3mac_is_concat_hash() {
        let mac = sha3mac(b"nonce", b"key material");
        assert_eq!(mac, keccak256(b"noncekey material"));
    }

    #[test]
    fn test_kdf_output_depends_on_randomness() {
        let mut csprng = ChaCha20Rng::seed_from_u64(7);
        let secret = Secret::generate(&mut csprng);
        let hash = keccak256(b"message");

        let first = kdf(&secret, &hash, &mut csprng).unwrap();
        let second = kdf(&secret, &hash, &mut csprng).unwrap();
        assert_ne!(first, second);
        assert!(!first.is_zero());
    }

    #[test]
    fn test_kdf_rejects_zero_inputs() {
        let mut csprng = ChaCha20Rng::seed_from_u64(7);
        let secret = Secret::from_bytes([0u8; 32]);
        let hash = keccak256(b"message");
        assert!(kdf(&secret, &hash, &mut csprng).is_err());
    }
}
