use primitive_types::{H160, U256};

/// Recipient side of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Call(H160),
}

/// The projection of a transaction the seal engine cares about. Signing
/// and execution live with the pool and the VM.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas: U256,
    pub action: Action,
    pub value: U256,
    pub data: Vec<u8>,
    /// Replay-protection binding; `None` for pre-fork signatures.
    pub chain_id: Option<u64>,
}

impl Transaction {
    /// Intrinsic gas floor under `schedule`: the base charge plus the
    /// per-byte calldata charges.
    pub fn base_gas_required(&self, schedule: &Schedule) -> U256 {
        let base = match self.action {
            Action::Create => schedule.tx_create_gas,
            Action::Call(_) => schedule.tx_gas,
        };
        let mut gas = U256::from(base);
        for byte in &self.data {
            let charge = if *byte == 0 {
                schedule.tx_data_zero_gas
            } else {
                schedule.tx_data_non_zero_gas
            };
            gas = gas.saturating_add(U256::from(charge));
        }
        gas
    }
}

/// Gas cost table for the active fork.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub tx_gas: u64,
    pub tx_create_gas: u64,
    pub tx_data_zero_gas: u64,
    pub tx_data_non_zero_gas: u64,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            tx_gas: 21_000,
            tx_create_gas: 53_000,
            tx_data_zero_gas: 4,
            tx_data_non_zero_gas: 68,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(data: Vec<u8>) -> Transaction {
        Transaction {
            nonce: U256::zero(),
            gas_price: U256::one(),
            gas: U256::from(100_000u64),
            action: Action::Call(H160::repeat_byte(1)),
            value: U256::zero(),
            data,
            chain_id: Some(1),
        }
    }

    #[test]
    fn test_plain_call_costs_base_gas() {
        let schedule = Schedule::default();
        assert_eq!(
            call(Vec::new()).base_gas_required(&schedule),
            U256::from(21_000u64)
        );
    }

    #[test]
    fn test_create_costs_more_than_call() {
        let schedule = Schedule::default();
        let mut tx = call(Vec::new());
        tx.action = Action::Create;
        assert_eq!(tx.base_gas_required(&schedule), U256::from(53_000u64));
    }

    #[test]
    fn test_data_bytes_priced_by_content() {
        let schedule = Schedule::default();
        // Two zero bytes and three non-zero bytes.
        let tx = call(vec![0, 0, 1, 2, 3]);
        let expected = 21_000 + 2 * 4 + 3 * 68;
        assert_eq!(tx.base_gas_required(&schedule), U256::from(expected));
    }
}
