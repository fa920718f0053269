pub mod difficulty;
pub mod engine;
mod error;
pub mod sealer;
pub mod stake;

pub use engine::{engine_for, NoProof, StakeSeal, GAS_FLOOR_TARGET};
pub use error::Error;
pub use sealer::SealEvent;
