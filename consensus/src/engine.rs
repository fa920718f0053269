//! The seal engines. `StakeSeal` is the production engine: a
//! stake-weighted signature lottery over BLS keys. `NoProof` keeps the
//! envelope checks and skips the lottery, for development chains.

use std::cmp;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crypto::bls;
use primitive_types::U256;
use traits::{BalanceReader, SealEngine};
use types::header::Header;
use types::params::{ChainParams, EngineKind};
use types::tx::{Schedule, Transaction};
use types::{ImportRequirements, Strictness};

use crate::difficulty::calculate_difficulty;
use crate::error::Error;
use crate::sealer::{SealEvent, Sealer};
use crate::stake::{
    boundary, child_stake_modifier, meets_boundary, stake_message, stake_signature_hash,
};

/// Default gas-floor target for child gas limits.
pub const GAS_FLOOR_TARGET: u64 = 3_141_562;

/// Builds the engine a chain spec asks for.
pub fn engine_for(
    params: ChainParams,
    balances: Arc<dyn BalanceReader>,
    events: UnboundedSender<SealEvent>,
) -> Arc<dyn SealEngine> {
    match params.engine {
        EngineKind::StakeSeal => Arc::new(StakeSeal::new(params, balances, events)),
        EngineKind::NoProof => Arc::new(NoProof::new(params, events)),
    }
}

/// The four-conjunct seal predicate. Free-standing so the sealer can
/// self-check a freshly generated seal with the same code the import
/// path runs.
pub(crate) fn verify_seal(
    params: &ChainParams,
    balances: &dyn BalanceReader,
    header: &Header,
    parent: &Header,
) -> Result<(), Error> {
    let failed = || Error::InvalidBlockNonce {
        hash: header.hash_without_seal(),
        difficulty: header.difficulty,
    };

    if header.number != parent.number + 1 {
        return Err(failed());
    }

    let minter = bls::to_address(&header.public_key);
    let balance = balances
        .balance_at(minter, header.number - 1)
        .map_err(|_| failed())?;

    let ticket = stake_signature_hash(&header.stake_signature);
    let meets_bounds = meets_boundary(&ticket, boundary(header.difficulty, balance));

    let modifier_correct = header.stake_modifier
        == child_stake_modifier(
            &parent.stake_modifier,
            &header.public_key,
            &header.stake_signature,
        );

    let stake_signature_ok = bls::verify(
        &header.public_key,
        &header.stake_signature,
        &stake_message(&parent.stake_modifier, header.timestamp),
        &params.seal_domain,
    );

    let block_signature_ok = bls::verify(
        &header.public_key,
        &header.block_signature,
        &header.hash_without_seal(),
        &params.seal_domain,
    );

    if meets_bounds && modifier_correct && stake_signature_ok && block_signature_ok {
        Ok(())
    } else {
        debug!(
            number = header.number,
            meets_bounds, modifier_correct, stake_signature_ok, block_signature_ok,
            "seal predicate rejected header"
        );
        Err(failed())
    }
}

/// Envelope checks shared by both engines: the chain-absolute bounds
/// plus continuity against the parent. Seal-independent.
fn verify_envelope(
    params: &ChainParams,
    strictness: Strictness,
    header: &Header,
    parent: &Header,
    check_retarget: bool,
) -> Result<(), Error> {
    if strictness != Strictness::CheckNothingNew {
        if header.difficulty < params.minimum_difficulty {
            return Err(Error::InvalidDifficulty {
                expected: params.minimum_difficulty,
                got: header.difficulty,
            });
        }
        if header.gas_limit < params.min_gas_limit || header.gas_limit > params.max_gas_limit {
            return Err(Error::InvalidGasLimit {
                min: params.min_gas_limit,
                got: header.gas_limit,
                max: params.max_gas_limit,
            });
        }
        if header.number != 0 && header.extra_data.len() > params.maximum_extra_data_size {
            return Err(Error::ExtraDataTooBig {
                max: params.maximum_extra_data_size,
                got: header.extra_data.len(),
            });
        }
    }

    if header.number != parent.number + 1 {
        return Err(Error::InvalidBlockNonce {
            hash: header.hash_without_seal(),
            difficulty: header.difficulty,
        });
    }

    if check_retarget {
        let expected = calculate_difficulty(
            header.number,
            header.timestamp,
            parent.timestamp,
            parent.difficulty,
            params.minimum_difficulty,
        )?;
        if header.difficulty != expected {
            return Err(Error::InvalidDifficulty {
                expected,
                got: header.difficulty,
            });
        }
    }

    let delta = parent.gas_limit / params.gas_limit_bound_divisor;
    if header.gas_limit < params.min_gas_limit
        || header.gas_limit > params.max_gas_limit
        || header.gas_limit <= parent.gas_limit - delta
        || header.gas_limit >= parent.gas_limit + delta
    {
        return Err(Error::InvalidGasLimit {
            min: parent.gas_limit - delta,
            got: header.gas_limit,
            max: parent.gas_limit + delta,
        });
    }

    Ok(())
}

/// Transaction pre-flight shared by both engines. The only place the
/// engine touches transactions.
fn verify_transaction(
    params: &ChainParams,
    schedule: &Schedule,
    requirements: ImportRequirements,
    tx: &Transaction,
    header: &Header,
    gas_used: U256,
) -> Result<(), Error> {
    if requirements.transaction_signatures {
        if let Some(chain_id) = tx.chain_id {
            if chain_id != params.chain_id {
                return Err(Error::InvalidTransaction(format!(
                    "bound to chain {}, this chain is {}",
                    chain_id, params.chain_id
                )));
            }
        }
    }

    if requirements.transaction_basic {
        let required = tx.base_gas_required(schedule);
        if required > tx.gas {
            return Err(Error::OutOfGasIntrinsic {
                required,
                got: tx.gas,
            });
        }
    }

    if gas_used.saturating_add(tx.gas) > header.gas_limit {
        return Err(Error::BlockGasLimitReached {
            available: header.gas_limit.saturating_sub(gas_used),
            got: tx.gas,
        });
    }

    Ok(())
}

fn child_gas_limit(params: &ChainParams, parent: &Header, gas_floor_target: Option<U256>) -> U256 {
    let floor = gas_floor_target.unwrap_or_else(|| U256::from(GAS_FLOOR_TARGET));
    let gas_limit = parent.gas_limit;
    let divisor = params.gas_limit_bound_divisor;
    if gas_limit < floor {
        cmp::min(floor, gas_limit + gas_limit / divisor - 1)
    } else {
        cmp::max(
            floor,
            gas_limit - gas_limit / divisor + 1 + (parent.gas_used * 6 / 5) / divisor,
        )
    }
}

/// Stake-weighted seal engine.
pub struct StakeSeal {
    params: ChainParams,
    balances: Arc<dyn BalanceReader>,
    sealer: Sealer,
}

impl StakeSeal {
    pub fn new(
        params: ChainParams,
        balances: Arc<dyn BalanceReader>,
        events: UnboundedSender<SealEvent>,
    ) -> Self {
        let sealer = Sealer::new(params.clone(), balances.clone(), events);
        StakeSeal {
            params,
            balances,
            sealer,
        }
    }

    /// Registers a keypair the sealer may seal with. Serialize calls
    /// with seal starts externally; the set is read-only while a seal
    /// attempt runs.
    pub fn register_keypair(&self, keypair: bls::KeyPair) {
        self.sealer.register_keypair(keypair);
    }

    pub fn is_generating(&self) -> bool {
        self.sealer.is_generating()
    }

    /// Gas cost table at `number`. A single fork so far.
    pub fn schedule(&self, _number: u64) -> Schedule {
        Schedule::default()
    }

    pub fn verify_seal(&self, header: &Header, parent: &Header) -> Result<(), Error> {
        verify_seal(&self.params, self.balances.as_ref(), header, parent)
    }

    pub fn child_gas_limit(&self, parent: &Header, gas_floor_target: Option<U256>) -> U256 {
        child_gas_limit(&self.params, parent, gas_floor_target)
    }
}

impl SealEngine for StakeSeal {
    fn name(&self) -> &'static str {
        "StakeSeal"
    }

    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn verify(&self, strictness: Strictness, header: &Header, parent: &Header) -> Result<()> {
        verify_envelope(&self.params, strictness, header, parent, true)?;

        let check_seal =
            strictness == Strictness::CheckEverything || strictness == Strictness::QuickNonce;
        if check_seal && !header.parent_hash.is_zero() {
            self.verify_seal(header, parent)?;
        }
        Ok(())
    }

    fn verify_transaction(
        &self,
        requirements: ImportRequirements,
        tx: &Transaction,
        header: &Header,
        gas_used: U256,
    ) -> Result<()> {
        verify_transaction(
            &self.params,
            &self.schedule(header.number),
            requirements,
            tx,
            header,
            gas_used,
        )?;
        Ok(())
    }

    fn populate_from_parent(&self, header: &mut Header, parent: &Header) -> Result<()> {
        header.parent_hash = parent.hash();
        header.number = parent.number + 1;
        header.gas_limit = self.child_gas_limit(parent, None);
        Ok(())
    }

    fn generate_seal(&self, candidate: Header, parent: Header) {
        self.sealer.generate(candidate, parent);
    }

    fn cancel_generation(&self) {
        self.sealer.cancel();
    }
}

/// Envelope-only engine: no lottery, seals are whatever the candidate
/// already carries.
pub struct NoProof {
    params: ChainParams,
    events: UnboundedSender<SealEvent>,
}

impl NoProof {
    pub fn new(params: ChainParams, events: UnboundedSender<SealEvent>) -> Self {
        NoProof { params, events }
    }
}

impl SealEngine for NoProof {
    fn name(&self) -> &'static str {
        "NoProof"
    }

    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn verify(&self, strictness: Strictness, header: &Header, parent: &Header) -> Result<()> {
        verify_envelope(&self.params, strictness, header, parent, false)?;
        Ok(())
    }

    fn verify_transaction(
        &self,
        requirements: ImportRequirements,
        tx: &Transaction,
        header: &Header,
        gas_used: U256,
    ) -> Result<()> {
        verify_transaction(
            &self.params,
            &Schedule::default(),
            requirements,
            tx,
            header,
            gas_used,
        )?;
        Ok(())
    }

    fn populate_from_parent(&self, header: &mut Header, parent: &Header) -> Result<()> {
        header.parent_hash = parent.hash();
        header.number = parent.number + 1;
        header.gas_limit = child_gas_limit(&self.params, parent, None);
        Ok(())
    }

    fn generate_seal(&self, candidate: Header, _parent: Header) {
        let event = SealEvent {
            number: candidate.number,
            hash: candidate.hash(),
            encoded: candidate.rlp_bytes(),
        };
        if self.events.send(event).is_err() {
            debug!("seal event receiver dropped");
        }
    }

    fn cancel_generation(&self) {}
}
