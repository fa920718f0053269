//! Deterministic BLS signatures over BLS12-381, the scheme behind both
//! the stake lottery and block authorship. Public keys live in G2
//! (96 bytes compressed), signatures in G1 (48 bytes compressed).
//!
//! The point hashed to is derived from `keccak256(domain ‖ public ‖
//! message)` pushed through the standard SSWU hash-to-G1. `domain` is a
//! deployment prefix carried in chain configuration; two nodes only
//! produce compatible signatures when it matches.

use blst::min_sig::{PublicKey as BlstPublic, SecretKey as BlstSecret, Signature as BlstSignature};
use blst::BLST_ERROR;
use primitive_types::{H160, H256};
use rand_core::{CryptoRng, RngCore};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

use crate::hash::{keccak256, keccak256_concat};
use crate::{Error, Secret};

pub const PUBLIC_KEY_LENGTH: usize = 96;
pub const SIGNATURE_POINT_LENGTH: usize = 48;

/// Ciphersuite tag for the hash-to-G1 step. The deployment prefix
/// travels in the message digest, not here.
const DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// Compressed G2 point. A plain byte container: genesis headers carry
/// an all-zero key, so validity is checked where the key is used.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Public([u8; PUBLIC_KEY_LENGTH]);

impl Public {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(Error::InvalidPublic);
        }
        let mut out = [0u8; PUBLIC_KEY_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Public(out))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Whether the bytes decompress to a point in the right subgroup.
    pub fn is_valid(&self) -> bool {
        BlstPublic::key_validate(&self.0).is_ok()
    }
}

impl Default for Public {
    fn default() -> Self {
        Public([0u8; PUBLIC_KEY_LENGTH])
    }
}

impl std::fmt::Debug for Public {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bls::Public(")?;
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

impl Encodable for Public {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

impl Decodable for Public {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        rlp.decoder().decode_value(|bytes| {
            Public::from_bytes(bytes).map_err(|_| DecoderError::RlpInvalidLength)
        })
    }
}

/// A G1 signature point bound to the public key that produced it.
/// Wire form is the RLP 2-list `[point, public_key]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    point: [u8; SIGNATURE_POINT_LENGTH],
    public: Public,
}

impl Signature {
    pub fn new(point: [u8; SIGNATURE_POINT_LENGTH], public: Public) -> Self {
        Signature { point, public }
    }

    #[inline]
    pub fn point(&self) -> &[u8; SIGNATURE_POINT_LENGTH] {
        &self.point
    }

    #[inline]
    pub fn public(&self) -> &Public {
        &self.public
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature {
            point: [0u8; SIGNATURE_POINT_LENGTH],
            public: Public::default(),
        }
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bls::Signature(")?;
        for byte in &self.point[..8] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

struct Point<'a>(&'a [u8; SIGNATURE_POINT_LENGTH]);

impl Encodable for Point<'_> {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(self.0);
    }
}

impl Encodable for Signature {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&Point(&self.point));
        s.append(&self.public);
    }
}

impl Decodable for Signature {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let point_bytes: Vec<u8> = rlp.val_at(0)?;
        if point_bytes.len() != SIGNATURE_POINT_LENGTH {
            return Err(DecoderError::RlpInvalidLength);
        }
        let mut point = [0u8; SIGNATURE_POINT_LENGTH];
        point.copy_from_slice(&point_bytes);
        let public = rlp.val_at(1)?;
        Ok(Signature { point, public })
    }
}

/// Signing keypair for the sealer.
#[derive(Clone)]
pub struct KeyPair {
    secret: Secret,
    public: Public,
}

impl KeyPair {
    pub fn generate<T>(csprng: &mut T) -> Self
    where
        T: CryptoRng + RngCore,
    {
        let mut ikm = [0u8; 32];
        csprng.fill_bytes(&mut ikm);
        let key = BlstSecret::key_gen(&ikm, &[]).expect("32 bytes of IKM");
        KeyPair {
            secret: Secret::from_bytes(key.to_bytes()),
            public: Public(key.sk_to_pk().to_bytes()),
        }
    }

    pub fn from_secret(secret: Secret) -> Result<Self, Error> {
        let public = to_public(&secret)?;
        Ok(KeyPair { secret, public })
    }

    #[inline]
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    #[inline]
    pub fn public(&self) -> &Public {
        &self.public
    }

    pub fn address(&self) -> H160 {
        to_address(&self.public)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish()
    }
}

fn secret_key(secret: &Secret) -> Result<BlstSecret, Error> {
    BlstSecret::from_bytes(secret.as_bytes()).map_err(|_| Error::InvalidSecret)
}

/// Derives the G2 public key, failing for a zero or over-order scalar.
pub fn to_public(secret: &Secret) -> Result<Public, Error> {
    let key = secret_key(secret)?;
    Ok(Public(key.sk_to_pk().to_bytes()))
}

/// Minter account address: `right160(keccak256(public))`.
pub fn to_address(public: &Public) -> H160 {
    let hash = keccak256(public.as_bytes());
    H160::from_slice(&hash.as_bytes()[12..])
}

fn signing_digest(domain: &[u8], public: &Public, message: &H256) -> H256 {
    keccak256_concat(&[domain, public.as_bytes(), message.as_bytes()])
}

/// Deterministic signature: a pure scalar multiplication of the hashed
/// point, no random blinding. Grinding resistance of the stake lottery
/// depends on this.
pub fn sign(secret: &Secret, message: &H256, domain: &[u8]) -> Result<Signature, Error> {
    let key = secret_key(secret)?;
    let public = Public(key.sk_to_pk().to_bytes());
    let digest = signing_digest(domain, &public, message);
    let point = key.sign(digest.as_bytes(), DST, &[]);
    Ok(Signature {
        point: point.to_bytes(),
        public,
    })
}

/// Pairing check `e(sig, G2) == e(hash_to_g1(pub, msg), pub)`.
pub fn verify(public: &Public, signature: &Signature, message: &H256, domain: &[u8]) -> bool {
    let key = match BlstPublic::from_bytes(public.as_bytes()) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let point = match BlstSignature::from_bytes(signature.point()) {
        Ok(point) => point,
        Err(_) => return false,
    };
    let digest = signing_digest(domain, public, message);
    point.verify(true, digest.as_bytes(), DST, &[], &key, true) == BLST_ERROR::BLST_SUCCESS
}
