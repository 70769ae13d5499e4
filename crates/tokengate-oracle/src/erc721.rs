//! ERC-721 balance oracle

use std::time::Duration;

use async_trait::async_trait;
use tokengate_common::{
    config::ChainSettings, AccountAddress, OracleError, OwnershipResult, U256,
};
use tracing::{debug, instrument};

use crate::rpc::JsonRpcClient;
use crate::OwnershipOracle;

/// `bytes4(keccak256("balanceOf(address)"))`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Calldata for `balanceOf(owner)`
pub fn encode_balance_of(owner: &AccountAddress) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&BALANCE_OF_SELECTOR);
    data.extend_from_slice(&owner.to_abi_word());
    data
}

/// Decode a single `uint256` return value
pub fn decode_uint256(data: &[u8]) -> Result<U256, OracleError> {
    if data.is_empty() {
        return Err(OracleError::ContractError(
            "empty return data (is the contract deployed on this network?)".to_string(),
        ));
    }
    if data.len() != 32 {
        return Err(OracleError::ContractError(format!(
            "expected a 32-byte uint256, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_big_endian(data))
}

/// Ownership oracle backed by an ERC-721 contract's `balanceOf`
pub struct Erc721Oracle {
    rpc: JsonRpcClient,
    contract: AccountAddress,
}

impl Erc721Oracle {
    /// Create an oracle for `contract` on the node at `rpc_url`
    pub fn new(
        rpc_url: impl Into<String>,
        contract: AccountAddress,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        Ok(Self {
            rpc: JsonRpcClient::new(rpc_url, timeout)?,
            contract,
        })
    }

    /// Create an oracle from loaded chain settings
    pub fn from_settings(settings: &ChainSettings) -> Result<Self, OracleError> {
        Self::new(settings.rpc_url.clone(), settings.contract, settings.timeout)
    }
}

#[async_trait]
impl OwnershipOracle for Erc721Oracle {
    #[instrument(skip(self), fields(contract = %self.contract, owner = %address))]
    async fn query_ownership(
        &self,
        address: &AccountAddress,
    ) -> Result<OwnershipResult, OracleError> {
        let data = self
            .rpc
            .eth_call(&self.contract, &encode_balance_of(address))
            .await?;
        let balance = decode_uint256(&data)?;
        debug!(%balance, "balanceOf returned");
        Ok(OwnershipResult::new(balance))
    }
}
