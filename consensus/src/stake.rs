//! The stake-seal arithmetic: the chained stake modifier, the lottery
//! message, and the stake-weighted boundary.

use crypto::bls;
use crypto::hash::{keccak256, keccak256_concat};
use primitive_types::{H256, U256, U512};

/// Next link of the modifier chain:
/// `keccak256(parent_modifier ‖ public ‖ stake_sig_point)`. Binds a
/// block's randomness to its entire ancestor chain.
pub fn child_stake_modifier(
    parent_modifier: &H256,
    public: &bls::Public,
    stake_signature: &bls::Signature,
) -> H256 {
    keccak256_concat(&[
        parent_modifier.as_bytes(),
        public.as_bytes(),
        stake_signature.point(),
    ])
}

/// What a would-be sealer signs for the lottery at a given timestamp:
/// `keccak256(parent_modifier ‖ u256_be(timestamp))`.
pub fn stake_message(parent_modifier: &H256, timestamp: U256) -> H256 {
    let mut ts = [0u8; 32];
    timestamp.to_big_endian(&mut ts);
    keccak256_concat(&[parent_modifier.as_bytes(), &ts])
}

/// The lottery ticket: hash of the stake signature point.
pub fn stake_signature_hash(signature: &bls::Signature) -> H256 {
    keccak256(signature.point())
}

/// Stake-weighted target `(2^256 / difficulty) · balance`, saturating
/// at `U256::MAX`. Zero difficulty and zero balance both yield a zero
/// boundary that no ticket can meet.
pub fn boundary(difficulty: U256, balance: U256) -> U256 {
    if difficulty.is_zero() {
        return U256::zero();
    }
    let per_unit = (U512::one() << 256) / U512::from(difficulty);
    let target = per_unit.saturating_mul(U512::from(balance));
    if target >= U512::one() << 256 {
        return U256::MAX;
    }
    let mut bytes = [0u8; 64];
    target.to_big_endian(&mut bytes);
    U256::from_big_endian(&bytes[32..])
}

/// Does this ticket fall under the target?
pub fn meets_boundary(ticket: &H256, target: U256) -> bool {
    U256::from_big_endian(ticket.as_bytes()) <= target
}

#[cfg(test)]
mod tests {
    use crypto::Secret;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    fn test_modifier_chain_is_order_sensitive() {
        let mut csprng = ChaCha20Rng::seed_from_u64(31);
        let pair = bls::KeyPair::generate(&mut csprng);
        let sig = bls::sign(pair.secret(), &keccak256(b"m"), b"testnet").unwrap();

        let a = child_stake_modifier(&keccak256(b"parent a"), pair.public(), &sig);
        let b = child_stake_modifier(&keccak256(b"parent b"), pair.public(), &sig);
        assert_ne!(a, b);
    }

    #[test]
    fn test_stake_message_binds_timestamp() {
        let modifier = keccak256(b"modifier");
        let a = stake_message(&modifier, U256::from(1_000_000u64));
        let b = stake_message(&modifier, U256::from(1_000_001u64));
        assert_ne!(a, b);
        // Equal inputs hash equal; the message must be reproducible on
        // the verifying side.
        assert_eq!(a, stake_message(&modifier, U256::from(1_000_000u64)));
    }

    #[test]
    fn test_boundary_scales_with_balance() {
        let difficulty = U256::from(1_048_576u64);
        let small = boundary(difficulty, U256::from(1_000u64));
        let large = boundary(difficulty, U256::from(1_000_000u64));
        assert!(small < large);
        assert_eq!(large, small * 1_000u64);
    }

    #[test]
    fn test_boundary_shrinks_with_difficulty() {
        let balance = U256::from(1_000_000u64);
        assert!(boundary(U256::from(2_048u64), balance) < boundary(U256::from(1_024u64), balance));
    }

    #[test]
    fn test_boundary_edge_cases() {
        assert_eq!(boundary(U256::zero(), U256::from(5u64)), U256::zero());
        assert_eq!(boundary(U256::from(7u64), U256::zero()), U256::zero());
        // A whale's boundary saturates instead of wrapping.
        let whale = U256::one() << 240;
        assert_eq!(boundary(U256::from(1_048_576u64), whale), U256::MAX);
    }

    #[test]
    fn test_unit_difficulty_unit_balance() {
        // 2^256 / 1 saturates the 256-bit store on its own.
        assert_eq!(boundary(U256::one(), U256::one()), U256::MAX);
        // Difficulty 2 with unit balance leaves 2^255.
        assert_eq!(boundary(U256::from(2u64), U256::one()), U256::one() << 255);
    }

    #[test]
    fn test_zero_balance_key_never_meets_boundary() {
        let secret = Secret::from_bytes({
            let mut b = [0u8; 32];
            b[31] = 3;
            b
        });
        let pair = bls::KeyPair::from_secret(secret).unwrap();
        let message = stake_message(&H256::zero(), U256::from(1_000_001u64));
        let sig = bls::sign(pair.secret(), &message, b"testnet").unwrap();
        let ticket = stake_signature_hash(&sig);
        assert!(!meets_boundary(
            &ticket,
            boundary(U256::from(1_048_576u64), U256::zero())
        ));
    }
}
