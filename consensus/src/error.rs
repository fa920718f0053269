use primitive_types::{H256, U256};
use thiserror::Error;

/// First-failure verification errors, in envelope-then-seal order.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid difficulty: expected {expected}, got {got}")]
    InvalidDifficulty { expected: U256, got: U256 },
    #[error("invalid gas limit: min {min}, got {got}, max {max}")]
    InvalidGasLimit { min: U256, got: U256, max: U256 },
    #[error("extra data too big: max {max}, got {got}")]
    ExtraDataTooBig { max: usize, got: usize },
    #[error("seal predicate failed for {hash:?} at difficulty {difficulty}")]
    InvalidBlockNonce { hash: H256, difficulty: U256 },
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("intrinsic gas too low: required {required}, got {got}")]
    OutOfGasIntrinsic { required: U256, got: U256 },
    #[error("block gas limit reached: available {available}, got {got}")]
    BlockGasLimitReached { available: U256, got: U256 },
    #[error("difficulty of the genesis block cannot be calculated")]
    GenesisBlockCannotBeCalculated,
    #[error("internal invariant violated: {0}")]
    InvalidState(&'static str),
}
