//! Recoverable ECDSA over secp256k1, used for transaction
//! authentication. Every signature produced here is canonicalized to
//! low-s; callers that must accept only one encoding per message gate
//! on `Signature::is_low_s`.

use k256::ecdsa::{RecoveryId, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use primitive_types::{H160, H256, U256};

use crate::hash::keccak256;
use crate::{Error, Secret};

pub const PUBLIC_KEY_LENGTH: usize = 64;
pub const SIGNATURE_LENGTH: usize = 65;

/// secp256k1 group order n.
const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

fn curve_order() -> U256 {
    U256::from_big_endian(&CURVE_ORDER)
}

/// Uncompressed secp256k1 point with the 0x04 header stripped.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Public([u8; PUBLIC_KEY_LENGTH]);

impl Public {
    /// Parses 64 bytes and checks that they name a point on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(Error::InvalidPublic);
        }
        let mut out = [0u8; PUBLIC_KEY_LENGTH];
        out.copy_from_slice(bytes);
        let public = Public(out);
        public.to_verifying_key()?;
        Ok(public)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    fn to_verifying_key(&self) -> Result<VerifyingKey, Error> {
        let mut sec1 = [0u8; PUBLIC_KEY_LENGTH + 1];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(&self.0);
        VerifyingKey::from_sec1_bytes(&sec1).map_err(|_| Error::InvalidPublic)
    }
}

impl From<VerifyingKey> for Public {
    fn from(key: VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_LENGTH];
        out.copy_from_slice(&point.as_bytes()[1..]);
        Public(out)
    }
}

impl std::fmt::Debug for Public {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Public(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

/// Recoverable signature in `r ‖ s ‖ v` form with `v ∈ {0, 1}` after
/// canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: H256,
    pub s: H256,
    pub v: u8,
}

impl Signature {
    pub fn from_bytes(bytes: &[u8; SIGNATURE_LENGTH]) -> Self {
        Signature {
            r: H256::from_slice(&bytes[..32]),
            s: H256::from_slice(&bytes[32..64]),
            v: bytes[64],
        }
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(self.r.as_bytes());
        out[32..64].copy_from_slice(self.s.as_bytes());
        out[64] = self.v;
        out
    }

    /// `v ≤ 1 ∧ 0 < r < n ∧ 0 < s < n`.
    pub fn is_valid(&self) -> bool {
        let n = curve_order();
        let r = U256::from_big_endian(self.r.as_bytes());
        let s = U256::from_big_endian(self.s.as_bytes());
        self.v <= 1 && !r.is_zero() && r < n && !s.is_zero() && s < n
    }

    /// `s ≤ n/2`.
    pub fn is_low_s(&self) -> bool {
        U256::from_big_endian(self.s.as_bytes()) <= curve_order() / 2
    }
}

fn signing_key(secret: &Secret) -> Result<SigningKey, Error> {
    SigningKey::from_bytes(k256::FieldBytes::from_slice(secret.as_bytes()))
        .map_err(|_| Error::InvalidSecret)
}

/// Derives the public key, failing for a zero or over-order secret.
pub fn to_public(secret: &Secret) -> Result<Public, Error> {
    let key = signing_key(secret)?;
    Ok(Public::from(*key.verifying_key()))
}

/// Deterministic RFC 6979 signature over a 32-byte message hash.
///
/// A high-s signature is mapped to `(n - s, v ⊕ 1)` before returning,
/// so the output always satisfies both validity and low-s invariants.
pub fn sign(secret: &Secret, message: &H256) -> Result<Signature, Error> {
    let key = signing_key(secret)?;
    let (mut sig, recovery) = key.sign_prehash_recoverable(message.as_bytes())?;
    let mut v = recovery.to_byte();
    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        v ^= 1;
    }

    let bytes = sig.to_bytes();
    Ok(Signature {
        r: H256::from_slice(&bytes[..32]),
        s: H256::from_slice(&bytes[32..]),
        v,
    })
}

/// Recovers the signing public key. Fails if `v > 3`, if the scalars
/// do not parse, or if no point can be recovered.
pub fn recover(signature: &Signature, message: &H256) -> Result<Public, Error> {
    if signature.v > 3 {
        return Err(Error::InvalidSignature);
    }

    // The backend only accepts a normalized s; the fold to
    // `(n - s, v ^ 1)` recovers the same key by point negation.
    let n = curve_order();
    let s_value = U256::from_big_endian(signature.s.as_bytes());
    let (s, v) = if s_value > n / 2 && s_value < n {
        let mut folded = [0u8; 32];
        (n - s_value).to_big_endian(&mut folded);
        (H256(folded), signature.v ^ 1)
    } else {
        (signature.s, signature.v)
    };

    let recovery = RecoveryId::from_byte(v).ok_or(Error::InvalidSignature)?;
    let sig = k256::ecdsa::Signature::from_scalars(
        *k256::FieldBytes::from_slice(signature.r.as_bytes()),
        *k256::FieldBytes::from_slice(s.as_bytes()),
    )
    .map_err(|_| Error::InvalidSignature)?;
    let key = VerifyingKey::recover_from_prehash(message.as_bytes(), &sig, recovery)
        .map_err(|_| Error::InvalidSignature)?;
    Ok(Public::from(key))
}

/// Recover-and-compare verification.
pub fn verify(public: &Public, signature: &Signature, message: &H256) -> bool {
    match recover(signature, message) {
        Ok(recovered) => &recovered == public,
        Err(_) => false,
    }
}

/// ECDH agreement: multiplies the peer point by the local secret and
/// returns the x-coordinate of the result. Invalid peer points are
/// rejected before any scalar operation runs.
pub fn agree(secret: &Secret, peer: &Public) -> Result<Secret, Error> {
    let key = signing_key(secret)?;
    let mut sec1 = [0u8; PUBLIC_KEY_LENGTH + 1];
    sec1[0] = 0x04;
    sec1[1..].copy_from_slice(peer.as_bytes());
    let peer = k256::PublicKey::from_sec1_bytes(&sec1).map_err(|_| Error::InvalidPublic)?;

    let shared = k256::ecdh::diffie_hellman(key.as_nonzero_scalar(), peer.as_affine());
    let mut out = [0u8; 32];
    out.copy_from_slice(shared.raw_secret_bytes().as_slice());
    Ok(Secret::from_bytes(out))
}

/// `right160(keccak256(public))`.
pub fn to_address(public: &Public) -> H160 {
    let hash = keccak256(public.as_bytes());
    H160::from_slice(&hash.as_bytes()[12..])
}

/// Address of the contract created by `from` at `nonce`:
/// `right160(keccak256(rlp([from, nonce])))`.
pub fn contract_address(from: &H160, nonce: &U256) -> H160 {
    let mut stream = rlp::RlpStream::new_list(2);
    stream.append(from).append(nonce);
    let hash = keccak256(&stream.out());
    H160::from_slice(&hash.as_bytes()[12..])
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use super::*;

    fn secret_one() -> Secret {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        Secret::from_bytes(bytes)
    }

    #[test]
    fn test_known_public_and_address() {
        let public = to_public(&secret_one()).unwrap();
        assert_eq!(
            hex::encode(public.as_bytes()),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        assert_eq!(
            hex::encode(to_address(&public)),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_rejects_out_of_range_secrets() {
        assert!(to_public(&Secret::from_bytes([0u8; 32])).is_err());
        assert!(to_public(&Secret::from_bytes(CURVE_ORDER)).is_err());
        assert!(to_public(&Secret::from_bytes([0xff; 32])).is_err());
    }

    #[test]
    fn test_sign_recover_roundtrip() {
        let mut csprng = ChaCha20Rng::seed_from_u64(11);
        for round in 0u64..16 {
            let secret = Secret::generate(&mut csprng);
            let public = to_public(&secret).unwrap();
            let message = keccak256(&round.to_be_bytes());

            let sig = sign(&secret, &message).unwrap();
            assert!(sig.is_valid(), "round {}", round);
            assert!(sig.is_low_s(), "round {}", round);
            assert_eq!(recover(&sig, &message).unwrap(), public);
            assert!(verify(&public, &sig, &message));
        }
    }

    #[test]
    fn test_sign_is_deterministic() {
        let secret = secret_one();
        let message = keccak256(b"deterministic");
        assert_eq!(
            sign(&secret, &message).unwrap().to_bytes(),
            sign(&secret, &message).unwrap().to_bytes()
        );
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let mut csprng = ChaCha20Rng::seed_from_u64(13);
        let secret = Secret::generate(&mut csprng);
        let other = to_public(&Secret::generate(&mut csprng)).unwrap();
        let message = keccak256(b"payload");
        let sig = sign(&secret, &message).unwrap();
        assert!(!verify(&other, &sig, &message));
    }

    #[test]
    fn test_recover_rejects_bad_v() {
        let secret = secret_one();
        let message = keccak256(b"payload");
        let mut sig = sign(&secret, &message).unwrap();
        sig.v = 4;
        assert!(recover(&sig, &message).is_err());
    }

    #[test]
    fn test_malleable_twin_recovers_same_key() {
        let secret = secret_one();
        let message = keccak256(b"payload");
        let sig = sign(&secret, &message).unwrap();

        let n = curve_order();
        let s = U256::from_big_endian(sig.s.as_bytes());
        let mut flipped_s = [0u8; 32];
        (n - s).to_big_endian(&mut flipped_s);
        let flipped = Signature {
            r: sig.r,
            s: H256(flipped_s),
            v: sig.v ^ 1,
        };

        // The twin is not canonical, but it is still a valid signature
        // over the same message by the same key.
        assert!(!flipped.is_low_s());
        let public = to_public(&secret).unwrap();
        assert_eq!(recover(&flipped, &message).unwrap(), public);
        assert!(verify(&public, &flipped, &message));
    }

    #[test]
    fn test_agree_is_symmetric() {
        let mut csprng = ChaCha20Rng::seed_from_u64(17);
        let a = Secret::generate(&mut csprng);
        let b = Secret::generate(&mut csprng);
        let pub_a = to_public(&a).unwrap();
        let pub_b = to_public(&b).unwrap();

        assert_eq!(agree(&a, &pub_b).unwrap(), agree(&b, &pub_a).unwrap());
    }

    #[test]
    fn test_agree_rejects_invalid_point() {
        let secret = secret_one();
        // x = 5 has no point with the encoded y on the curve.
        let bogus = Public([5u8; 64]);
        assert!(agree(&secret, &bogus).is_err());
    }

    #[test]
    fn test_public_from_bytes_validates_point() {
        let good = to_public(&secret_one()).unwrap();
        assert!(Public::from_bytes(good.as_bytes()).is_ok());
        assert!(Public::from_bytes(&[5u8; 64]).is_err());
        assert!(Public::from_bytes(&[0u8; 63]).is_err());
    }

    #[test]
    fn test_signature_byte_roundtrip() {
        let sig = sign(&secret_one(), &keccak256(b"wire")).unwrap();
        assert_eq!(Signature::from_bytes(&sig.to_bytes()), sig);
    }

    #[test]
    fn test_contract_address_differs_by_nonce() {
        let from = to_address(&to_public(&secret_one()).unwrap());
        let a = contract_address(&from, &U256::zero());
        let b = contract_address(&from, &U256::one());
        assert_ne!(a, b);
    }
}
