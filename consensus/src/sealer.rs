//! Background sealer: walks the `(timestamp, key)` space until some
//! registered key draws a stake signature under the boundary, then
//! emits the sealed header.

use std::cmp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use primitive_types::{H256, U256};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crypto::bls;
use traits::BalanceReader;
use types::header::Header;
use types::params::ChainParams;

use crate::difficulty::calculate_difficulty;
use crate::engine::verify_seal;
use crate::error::Error;
use crate::stake::{
    boundary, child_stake_modifier, meets_boundary, stake_message, stake_signature_hash,
};

/// Wall-clock poll interval while the candidate timestamp is in the
/// future.
const CLOCK_POLL: Duration = Duration::from_millis(100);

/// A sealed header ready for chain import.
#[derive(Debug, Clone)]
pub struct SealEvent {
    pub number: u64,
    pub hash: H256,
    pub encoded: Vec<u8>,
}

pub struct Sealer {
    params: ChainParams,
    balances: Arc<dyn BalanceReader>,
    keypairs: Arc<RwLock<Vec<bls::KeyPair>>>,
    events: UnboundedSender<SealEvent>,
    generating: Arc<AtomicBool>,
    /// Single-slot "currently sealing" header.
    sealing: Arc<Mutex<Option<Header>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Sealer {
    pub fn new(
        params: ChainParams,
        balances: Arc<dyn BalanceReader>,
        events: UnboundedSender<SealEvent>,
    ) -> Self {
        Sealer {
            params,
            balances,
            keypairs: Arc::new(RwLock::new(Vec::new())),
            events,
            generating: Arc::new(AtomicBool::new(false)),
            sealing: Arc::new(Mutex::new(None)),
            worker: Mutex::new(None),
        }
    }

    pub fn register_keypair(&self, keypair: bls::KeyPair) {
        self.keypairs.write().unwrap().push(keypair);
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Starts sealing `candidate` on top of `parent`. If a previous
    /// request is still generating, this one is dropped; the first
    /// request wins.
    pub fn generate(&self, candidate: Header, parent: Header) {
        if self.generating.swap(true, Ordering::AcqRel) {
            debug!(
                number = candidate.number,
                "seal generation already in flight, dropping request"
            );
            return;
        }

        *self.sealing.lock().unwrap() = Some(candidate);

        // The previous worker has finished (the flag was down); reap it
        // before spawning its replacement.
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }

        let worker = SealWorker {
            params: self.params.clone(),
            balances: self.balances.clone(),
            keypairs: self.keypairs.clone(),
            events: self.events.clone(),
            generating: self.generating.clone(),
            sealing: self.sealing.clone(),
        };
        let handle = thread::spawn(move || worker.run(parent));
        *self.worker.lock().unwrap() = Some(handle);
    }

    /// Requests a cooperative stop. The worker notices at its next
    /// clock poll or key iteration; a nearly complete win may still
    /// emit its event.
    pub fn cancel(&self) {
        self.generating.store(false, Ordering::Release);
    }
}

impl Drop for Sealer {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

struct SealWorker {
    params: ChainParams,
    balances: Arc<dyn BalanceReader>,
    keypairs: Arc<RwLock<Vec<bls::KeyPair>>>,
    events: UnboundedSender<SealEvent>,
    generating: Arc<AtomicBool>,
    sealing: Arc<Mutex<Option<Header>>>,
}

impl SealWorker {
    fn run(self, parent: Header) {
        let number = parent.number + 1;
        info!(number, "⚒ seal worker running");

        let mut timestamp = cmp::max(U256::from(utc_now()), parent.timestamp + U256::one());
        while self.generating.load(Ordering::Acquire) {
            while self.generating.load(Ordering::Acquire) && timestamp > U256::from(utc_now()) {
                thread::sleep(CLOCK_POLL);
            }
            if !self.generating.load(Ordering::Acquire) {
                break;
            }

            let difficulty = {
                let mut slot = self.sealing.lock().unwrap();
                let sealing = match slot.as_mut() {
                    Some(sealing) => sealing,
                    None => break,
                };
                sealing.timestamp = timestamp;
                match calculate_difficulty(
                    sealing.number,
                    timestamp,
                    parent.timestamp,
                    parent.difficulty,
                    self.params.minimum_difficulty,
                ) {
                    Ok(difficulty) => {
                        sealing.difficulty = difficulty;
                        difficulty
                    }
                    Err(err) => {
                        warn!(%err, "abandoning seal attempt");
                        self.generating.store(false, Ordering::Release);
                        return;
                    }
                }
            };

            let keypairs = self.keypairs.read().unwrap().clone();
            for keypair in &keypairs {
                if !self.generating.load(Ordering::Acquire) {
                    return;
                }
                // A zero-balance key gets a zero boundary and can never
                // win, but testing it is cheap.
                let balance = match self.balances.balance_at(keypair.address(), number - 1) {
                    Ok(balance) => balance,
                    Err(err) => {
                        warn!(%err, address = ?keypair.address(), "balance lookup failed");
                        continue;
                    }
                };

                let message = stake_message(&parent.stake_modifier, timestamp);
                let stake_signature =
                    match bls::sign(keypair.secret(), &message, &self.params.seal_domain) {
                        Ok(signature) => signature,
                        Err(err) => {
                            warn!(%err, "stake signing failed, skipping key");
                            continue;
                        }
                    };

                let ticket = stake_signature_hash(&stake_signature);
                if meets_boundary(&ticket, boundary(difficulty, balance)) {
                    self.submit(&parent, keypair, stake_signature);
                    return;
                }
            }

            timestamp += U256::one();
        }
        debug!(number, "seal worker stopped");
    }

    /// Fills the seal, self-checks it, and emits the encoded header.
    /// The submit lock is released and the generating flag cleared
    /// before the event escapes, so a listener may request the next
    /// seal from inside its event handler.
    fn submit(&self, parent: &Header, keypair: &bls::KeyPair, stake_signature: bls::Signature) {
        let event = {
            let mut slot = self.sealing.lock().unwrap();
            let sealing = match slot.as_mut() {
                Some(sealing) => sealing,
                None => {
                    self.generating.store(false, Ordering::Release);
                    return;
                }
            };

            sealing.stake_modifier = child_stake_modifier(
                &parent.stake_modifier,
                keypair.public(),
                &stake_signature,
            );
            sealing.public_key = *keypair.public();
            sealing.stake_signature = stake_signature;

            let block_signature = match bls::sign(
                keypair.secret(),
                &sealing.hash_without_seal(),
                &self.params.seal_domain,
            ) {
                Ok(signature) => signature,
                Err(err) => {
                    warn!(%err, "block signing failed, abandoning seal");
                    self.generating.store(false, Ordering::Release);
                    return;
                }
            };
            sealing.block_signature = block_signature;

            // A failure here is an internal invariant violation, not a
            // bad block from a peer. Nothing leaves the engine.
            if verify_seal(&self.params, self.balances.as_ref(), sealing, parent).is_err() {
                let err = Error::InvalidState("generated seal failed verification");
                warn!(%err, "abandoning seal");
                self.generating.store(false, Ordering::Release);
                return;
            }

            SealEvent {
                number: sealing.number,
                hash: sealing.hash(),
                encoded: sealing.rlp_bytes(),
            }
        };

        self.generating.store(false, Ordering::Release);
        info!(number = event.number, hash = ?event.hash, "⚒ sealed block");
        if self.events.send(event).is_err() {
            debug!("seal event receiver dropped");
        }
    }
}

fn utc_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
