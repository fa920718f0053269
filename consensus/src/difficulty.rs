//! Per-block difficulty retarget driven solely by the parent timestamp
//! gap. Byzantium-style adjustment with no bomb.

use std::cmp;

use num_bigint::{BigInt, Sign};
use primitive_types::U256;

use crate::error::Error;

fn to_bigint(value: U256) -> BigInt {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

fn to_u256(value: &BigInt) -> U256 {
    let (_, bytes) = value.to_bytes_be();
    U256::from_big_endian(&bytes)
}

/// Expected difficulty of a block at `number` with `timestamp`, given
/// its parent's timestamp and difficulty:
///
/// ```text
/// adj    = max(1 - (timestamp - parent_timestamp) / 9, -99)
/// target = parent_difficulty + parent_difficulty / 2048 * adj
/// ```
///
/// clamped to `[minimum_difficulty, 2^256 - 1]`. The subtraction is
/// signed and every division truncates toward zero, with the divisions
/// applied before the adjustment multiplier. Block 0 has no parent gap
/// to retarget from.
pub fn calculate_difficulty(
    number: u64,
    timestamp: U256,
    parent_timestamp: U256,
    parent_difficulty: U256,
    minimum_difficulty: U256,
) -> Result<U256, Error> {
    if number == 0 {
        return Err(Error::GenesisBlockCannotBeCalculated);
    }

    let gap = to_bigint(timestamp) - to_bigint(parent_timestamp);
    let adjustment = cmp::max(BigInt::from(1) - gap / 9, BigInt::from(-99));

    let parent = to_bigint(parent_difficulty);
    let target: BigInt = &parent + &parent / 2048 * adjustment;

    let floor = to_bigint(minimum_difficulty);
    let ceiling = to_bigint(U256::MAX);
    Ok(to_u256(&target.clamp(floor, ceiling)))
}
