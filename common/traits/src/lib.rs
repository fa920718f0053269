use anyhow::Result;
use primitive_types::{H160, U256};

use types::header::Header;
use types::params::ChainParams;
use types::tx::Transaction;
use types::{ImportRequirements, Strictness};

/// Account balances at historical heights. Backed by the state trie in
/// a full node, by fixtures in tests. The seal engine only ever reads
/// the balance of a minter at the parent height.
pub trait BalanceReader: Send + Sync {
    fn balance_at(&self, address: H160, number: u64) -> Result<U256>;
}

/// Capability set of a seal engine, selected when chain params load.
///
/// Verification methods are pure over their inputs and run on caller
/// threads; `generate_seal` hands work to the engine's background
/// sealer and returns immediately.
pub trait SealEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn params(&self) -> &ChainParams;

    /// Is `header` a valid successor of `parent`? Envelope checks run
    /// first, then the seal predicate; the first failure is returned as
    /// a typed `consensus` error.
    fn verify(&self, strictness: Strictness, header: &Header, parent: &Header) -> Result<()>;

    /// Pre-flight checks for importing `tx` into a block under
    /// `header`, with `gas_used` gas already consumed.
    fn verify_transaction(
        &self,
        requirements: ImportRequirements,
        tx: &Transaction,
        header: &Header,
        gas_used: U256,
    ) -> Result<()>;

    /// Fills the parent-derived fields of a fresh candidate header.
    fn populate_from_parent(&self, header: &mut Header, parent: &Header) -> Result<()>;

    /// Starts sealing `candidate` on top of `parent`. A request while a
    /// previous one is still generating is dropped.
    fn generate_seal(&self, candidate: Header, parent: Header);

    /// Cooperatively stops an in-flight seal generation.
    fn cancel_generation(&self);

    /// External orchestration decides when to call `generate_seal`.
    fn should_seal(&self) -> bool {
        true
    }

    fn sealers(&self) -> Vec<String> {
        vec!["cpu".to_string()]
    }
}
