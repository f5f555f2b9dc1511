use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;

use chainpoll_types::models::Poll;

use crate::error::ChainError;

/// Operations the HTTP layer performs against the poll contract.
#[async_trait]
pub trait PollContract: Send + Sync {
    /// Every poll on the contract, in index order.
    async fn list_polls(&self) -> Result<Vec<Poll>, ChainError>;

    async fn get_poll(&self, poll_id: u64) -> Result<Poll, ChainError>;

    async fn has_voted(&self, poll_id: u64, voter: Address) -> Result<bool, ChainError>;

    /// Vote counters for each option of the poll, in option order.
    async fn results(&self, poll_id: u64) -> Result<Vec<u64>, ChainError>;

    /// Submits a `createPoll` transaction and returns its hash without waiting
    /// for inclusion.
    async fn create_poll(
        &self,
        signer: &PrivateKeySigner,
        question: &str,
        options: &[String],
    ) -> Result<B256, ChainError>;

    /// Submits a `vote` transaction and waits for a successful receipt.
    async fn cast_vote(
        &self,
        signer: &PrivateKeySigner,
        poll_id: u64,
        option_id: u64,
    ) -> Result<B256, ChainError>;
}

/// Parses a caller-supplied hex private key. The error never echoes the input.
pub fn signer_from_key(key: &str) -> Result<PrivateKeySigner, ChainError> {
    key.trim()
        .parse::<PrivateKeySigner>()
        .map_err(|_| ChainError::InvalidSignature("private key is not a valid secp256k1 key".into()))
}
