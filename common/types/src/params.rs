use primitive_types::U256;

/// Which seal engine a chain runs; resolved once when the chain spec is
/// loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Stake-weighted signature lottery, the production engine.
    StakeSeal,
    /// Envelope checks only, for development chains.
    NoProof,
}

/// Consensus parameters of a chain deployment.
#[derive(Debug, Clone)]
pub struct ChainParams {
    pub chain_id: u64,
    pub minimum_difficulty: U256,
    pub min_gas_limit: U256,
    pub max_gas_limit: U256,
    pub gas_limit_bound_divisor: U256,
    pub maximum_extra_data_size: usize,
    /// Deployment prefix mixed into the BLS hash-to-curve digest. Nodes
    /// with different prefixes produce mutually invalid seals, so this
    /// is part of chain identity. Historically derived from the node's
    /// data-directory basename; the embedding node may override it.
    pub seal_domain: Vec<u8>,
    pub engine: EngineKind,
}

impl ChainParams {
    pub fn with_seal_domain(mut self, domain: impl Into<Vec<u8>>) -> Self {
        self.seal_domain = domain.into();
        self
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn chain_params(&self) -> ChainParams {
        match self {
            Network::Mainnet => ChainParams {
                chain_id: 1,
                minimum_difficulty: U256::from(131_072u64),
                min_gas_limit: U256::from(5_000u64),
                max_gas_limit: U256::from(0x7fff_ffff_ffff_ffffu64),
                gas_limit_bound_divisor: U256::from(1_024u64),
                maximum_extra_data_size: 32,
                seal_domain: b"mainnet".to_vec(),
                engine: EngineKind::StakeSeal,
            },
            Network::Testnet => ChainParams {
                chain_id: 2,
                minimum_difficulty: U256::from(131_072u64),
                min_gas_limit: U256::from(5_000u64),
                max_gas_limit: U256::from(0x7fff_ffff_ffff_ffffu64),
                gas_limit_bound_divisor: U256::from(1_024u64),
                maximum_extra_data_size: 32,
                seal_domain: b"testnet".to_vec(),
                engine: EngineKind::StakeSeal,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_networks_have_distinct_identities() {
        let mainnet = Network::Mainnet.chain_params();
        let testnet = Network::Testnet.chain_params();
        assert_ne!(mainnet.chain_id, testnet.chain_id);
        assert_ne!(mainnet.seal_domain, testnet.seal_domain);
    }

    #[test]
    fn test_seal_domain_override() {
        let params = Network::Testnet
            .chain_params()
            .with_seal_domain(&b"node-data-dir"[..]);
        assert_eq!(params.seal_domain, b"node-data-dir");
    }

    #[test]
    fn test_gas_bounds_are_ordered() {
        let params = Network::Mainnet.chain_params();
        assert!(params.min_gas_limit < params.max_gas_limit);
        assert!(!params.gas_limit_bound_divisor.is_zero());
    }
}
