//! # Tokengate Oracle
//!
//! Answers one question: does an account hold at least one token of the
//! configured collection?
//!
//! ## Components
//!
//! - [`OwnershipOracle`]: the capability the verification handler depends on
//! - [`Erc721Oracle`]: `balanceOf` over EVM JSON-RPC (`eth_call`)
//! - [`rpc::JsonRpcClient`]: bounded JSON-RPC 2.0 transport
//!
//! Every call is a single attempt. Transport failures and timeouts surface as
//! [`OracleError::Unreachable`], reverts and undecodable replies as
//! [`OracleError::ContractError`].

pub mod erc721;
pub mod rpc;

pub use erc721::{decode_uint256, encode_balance_of, Erc721Oracle, BALANCE_OF_SELECTOR};
pub use rpc::JsonRpcClient;

use async_trait::async_trait;
use tokengate_common::{AccountAddress, OracleError, OwnershipResult};

/// Read-only ownership query against an external ledger
#[async_trait]
pub trait OwnershipOracle: Send + Sync {
    /// Count the units of the configured asset `address` holds
    ///
    /// `address` is already validated; implementations only report transport
    /// and contract-level failures.
    async fn query_ownership(&self, address: &AccountAddress)
        -> Result<OwnershipResult, OracleError>;
}
