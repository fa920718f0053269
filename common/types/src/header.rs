//! Block header with the four stake-seal fields.
//!
//! The RLP schema is consensus-critical and frozen: seventeen fields in
//! the order written by `rlp_append`, with `hash_without_seal` covering
//! exactly the first thirteen.

use crypto::bls;
use crypto::hash::keccak256;
use primitive_types::{H160, H256, U256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

pub const BLOOM_LENGTH: usize = 256;

/// 2048-bit log bloom, carried for schema compatibility with the
/// execution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bloom(pub [u8; BLOOM_LENGTH]);

impl Default for Bloom {
    fn default() -> Self {
        Bloom([0u8; BLOOM_LENGTH])
    }
}

impl Encodable for Bloom {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(&self.0);
    }
}

impl Decodable for Bloom {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        rlp.decoder().decode_value(|bytes| {
            if bytes.len() != BLOOM_LENGTH {
                return Err(DecoderError::RlpInvalidLength);
            }
            let mut out = [0u8; BLOOM_LENGTH];
            out.copy_from_slice(bytes);
            Ok(Bloom(out))
        })
    }
}

/// Typed view over the seventeen header fields. Only the sealer and
/// `populate_from_parent` mutate a header once it is built; readers are
/// total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub parent_hash: H256,
    /// Legacy slot, always zero on the wire.
    pub unused: u64,
    pub coinbase: H160,
    pub state_root: H256,
    pub transactions_root: H256,
    pub receipts_root: H256,
    pub log_bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: U256,
    pub extra_data: Vec<u8>,
    // seal
    pub stake_modifier: H256,
    pub public_key: bls::Public,
    pub stake_signature: bls::Signature,
    pub block_signature: bls::Signature,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            parent_hash: H256::zero(),
            unused: 0,
            coinbase: H160::zero(),
            state_root: H256::zero(),
            transactions_root: H256::zero(),
            receipts_root: H256::zero(),
            log_bloom: Bloom::default(),
            difficulty: U256::zero(),
            number: 0,
            gas_limit: U256::zero(),
            gas_used: U256::zero(),
            timestamp: U256::zero(),
            extra_data: Vec::new(),
            stake_modifier: H256::zero(),
            public_key: bls::Public::default(),
            stake_signature: bls::Signature::default(),
            block_signature: bls::Signature::default(),
        }
    }
}

impl Header {
    fn append_without_seal(&self, s: &mut RlpStream) {
        s.append(&self.parent_hash);
        s.append(&self.unused);
        s.append(&self.coinbase);
        s.append(&self.state_root);
        s.append(&self.transactions_root);
        s.append(&self.receipts_root);
        s.append(&self.log_bloom);
        s.append(&self.difficulty);
        s.append(&self.number);
        s.append(&self.gas_limit);
        s.append(&self.gas_used);
        s.append(&self.timestamp);
        s.append(&self.extra_data);
    }

    /// Hash of the fully sealed header, the block identity.
    pub fn hash(&self) -> H256 {
        keccak256(&rlp::encode(self))
    }

    /// Hash over the thirteen pre-seal fields. This is what the block
    /// signature signs, so the seal can never cover itself.
    pub fn hash_without_seal(&self) -> H256 {
        let mut s = RlpStream::new_list(13);
        self.append_without_seal(&mut s);
        keccak256(&s.out())
    }

    pub fn rlp_bytes(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }
}

impl Encodable for Header {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(17);
        self.append_without_seal(s);
        s.append(&self.stake_modifier);
        s.append(&self.public_key);
        s.append(&self.stake_signature);
        s.append(&self.block_signature);
    }
}

impl Decodable for Header {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 17 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(Header {
            parent_hash: rlp.val_at(0)?,
            unused: rlp.val_at(1)?,
            coinbase: rlp.val_at(2)?,
            state_root: rlp.val_at(3)?,
            transactions_root: rlp.val_at(4)?,
            receipts_root: rlp.val_at(5)?,
            log_bloom: rlp.val_at(6)?,
            difficulty: rlp.val_at(7)?,
            number: rlp.val_at(8)?,
            gas_limit: rlp.val_at(9)?,
            gas_used: rlp.val_at(10)?,
            timestamp: rlp.val_at(11)?,
            extra_data: rlp.val_at(12)?,
            stake_modifier: rlp.val_at(13)?,
            public_key: rlp.val_at(14)?,
            stake_signature: rlp.val_at(15)?,
            block_signature: rlp.val_at(16)?,
        })
    }
}
