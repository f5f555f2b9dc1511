//! Client for the on-chain poll contract.
//!
//! Reads go through `eth_call`; writes are built, signed with the caller's
//! key and submitted as raw transactions. Nothing is retried.

pub mod abi;
pub mod artifact;
pub mod client;
pub mod contract;
pub mod error;

pub use alloy_primitives::{Address, B256};
pub use alloy_signer_local::PrivateKeySigner;

pub use artifact::{ArtifactError, ContractArtifact};
pub use client::{ChainClient, ChainConfig, DEFAULT_GAS_LIMIT};
pub use contract::{PollContract, signer_from_key};
pub use error::ChainError;
