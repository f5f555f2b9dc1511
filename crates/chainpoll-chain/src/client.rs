use std::path::PathBuf;

use alloy_eips::eip2718::Encodable2718;
use alloy_network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

use chainpoll_types::models::Poll;

use crate::abi::PollAbi;
use crate::artifact::ContractArtifact;
use crate::contract::PollContract;
use crate::error::ChainError;

pub const DEFAULT_GAS_LIMIT: u64 = 2_000_000;

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub artifact_path: PathBuf,
    /// When unset, the address recorded in the artifact for the node's network
    /// id is used.
    pub contract_address: Option<Address>,
    pub gas_limit: u64,
}

/// Connection to a JSON-RPC node bound to one deployed poll contract.
pub struct ChainClient {
    provider: DynProvider,
    abi: PollAbi,
    address: Address,
    chain_id: u64,
    gas_limit: u64,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("gas_limit", &self.gas_limit)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Loads the artifact, connects to the node and resolves the contract
    /// address. Fails if the node does not answer `eth_chainId`.
    pub async fn connect(config: &ChainConfig) -> anyhow::Result<Self> {
        let artifact = ContractArtifact::load(&config.artifact_path)?;
        let abi = PollAbi::from_abi(&artifact.abi)?;

        let provider = ProviderBuilder::new()
            .connect(&config.rpc_url)
            .await
            .with_context(|| format!("invalid RPC URL {}", config.rpc_url))?
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .with_context(|| format!("failed to connect to {}", config.rpc_url))?;

        let address = match config.contract_address {
            Some(address) => address,
            None => {
                let network_id = provider
                    .get_net_version()
                    .await
                    .context("failed to query net_version")?;
                artifact.deployed_address(network_id)?
            }
        };

        info!(
            "Connected to chain {} at {}, poll contract {}",
            chain_id, config.rpc_url, address
        );

        Ok(Self::with_provider(
            provider,
            abi,
            address,
            chain_id,
            config.gas_limit,
        ))
    }

    pub(crate) fn with_provider(
        provider: DynProvider,
        abi: PollAbi,
        address: Address,
        chain_id: u64,
        gas_limit: u64,
    ) -> Self {
        Self {
            provider,
            abi,
            address,
            chain_id,
            gas_limit,
        }
    }

    async fn call(&self, input: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .with_to(self.address)
            .with_input(input);

        self.provider
            .call(tx)
            .await
            .map_err(ChainError::from_transport)
    }

    /// Builds a legacy transaction to the contract with the sender's pending
    /// nonce and the fixed gas limit, signs it locally and submits it raw.
    async fn submit(
        &self,
        signer: &PrivateKeySigner,
        input: Bytes,
    ) -> Result<PendingTransactionBuilder<Ethereum>, ChainError> {
        let from = signer.address();

        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(ChainError::from_transport)?;
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(ChainError::from_transport)?;

        let tx = self.legacy_request(from, input, nonce, gas_price);

        let wallet = EthereumWallet::from(signer.clone());
        let envelope = tx
            .build(&wallet)
            .await
            .map_err(|e| ChainError::InvalidSignature(e.to_string()))?;

        debug!("Submitting transaction from {} with nonce {}", from, nonce);

        self.provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(ChainError::from_transport)
    }

    fn legacy_request(
        &self,
        from: Address,
        input: Bytes,
        nonce: u64,
        gas_price: u128,
    ) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(from)
            .with_to(self.address)
            .with_input(input)
            .with_nonce(nonce)
            .with_gas_limit(self.gas_limit)
            .with_gas_price(gas_price)
            .with_chain_id(self.chain_id)
    }
}

/// Maps a mined receipt's status onto the vote outcome. A failed transaction
/// that consumed its whole gas limit ran out of gas.
fn receipt_outcome(
    tx_hash: B256,
    success: bool,
    gas_used: u64,
    gas_limit: u64,
) -> Result<B256, ChainError> {
    if success {
        return Ok(tx_hash);
    }

    let msg = format!("vote transaction {tx_hash} failed");
    Err(if gas_used >= gas_limit {
        ChainError::OutOfGas(msg)
    } else {
        ChainError::ExecutionReverted(msg)
    })
}

#[async_trait]
impl PollContract for ChainClient {
    async fn list_polls(&self) -> Result<Vec<Poll>, ChainError> {
        let data = self.call(self.abi.encode_get_all_polls()?).await?;
        let count = self.abi.decode_questions(&data)?.len() as u64;

        let mut polls = Vec::with_capacity(count as usize);
        for id in 0..count {
            polls.push(self.get_poll(id).await?);
        }
        Ok(polls)
    }

    async fn get_poll(&self, poll_id: u64) -> Result<Poll, ChainError> {
        let data = self.call(self.abi.encode_get_poll(poll_id)?).await?;
        self.abi.decode_poll(poll_id, &data)
    }

    async fn has_voted(&self, poll_id: u64, voter: Address) -> Result<bool, ChainError> {
        let data = self
            .call(self.abi.encode_has_user_voted(poll_id, voter)?)
            .await?;
        self.abi.decode_has_voted(&data)
    }

    async fn results(&self, poll_id: u64) -> Result<Vec<u64>, ChainError> {
        let data = self.call(self.abi.encode_get_results(poll_id)?).await?;
        self.abi.decode_results(&data)
    }

    async fn create_poll(
        &self,
        signer: &PrivateKeySigner,
        question: &str,
        options: &[String],
    ) -> Result<B256, ChainError> {
        let input = self.abi.encode_create_poll(question, options)?;
        let pending = self.submit(signer, input).await?;
        Ok(*pending.tx_hash())
    }

    async fn cast_vote(
        &self,
        signer: &PrivateKeySigner,
        poll_id: u64,
        option_id: u64,
    ) -> Result<B256, ChainError> {
        let input = self.abi.encode_vote(poll_id, option_id)?;
        let pending = self.submit(signer, input).await?;
        let tx_hash = *pending.tx_hash();

        let receipt = pending
            .get_receipt()
            .await
            .map_err(ChainError::from_pending)?;

        receipt_outcome(tx_hash, receipt.status(), receipt.gas_used, self.gas_limit)
    }
}
