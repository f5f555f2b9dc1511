//! Contract build artifacts.
//!
//! Accepts the JSON emitted by Truffle (`build/contracts/<Name>.json`) and
//! Foundry (`out/<Name>.sol/<Name>.json`). Only `abi` is required; the Truffle
//! `networks` map is used to find the deployed address when none is configured.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid artifact JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("contract ABI has no function `{0}`")]
    MissingFunction(&'static str),

    #[error("artifact has no deployment for network {0}")]
    NotDeployed(u64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkDeployment {
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractArtifact {
    #[serde(rename = "contractName", default)]
    pub contract_name: Option<String>,
    pub abi: JsonAbi,
    /// Keyed by network id as a decimal string.
    #[serde(default)]
    pub networks: HashMap<String, NetworkDeployment>,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let artifact = Self::parse(&contents)?;
        debug!(
            "Loaded artifact {} ({} functions) from {}",
            artifact.contract_name.as_deref().unwrap_or("<unnamed>"),
            artifact.abi.functions.len(),
            path.display()
        );
        Ok(artifact)
    }

    pub fn parse(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn deployed_address(&self, network_id: u64) -> Result<Address, ArtifactError> {
        self.networks
            .get(&network_id.to_string())
            .map(|d| d.address)
            .ok_or(ArtifactError::NotDeployed(network_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use std::io::Write;

    const FIXTURE: &str = include_str!("../fixtures/PollingSystem.json");

    #[test]
    fn parses_truffle_artifact() {
        let artifact = ContractArtifact::parse(FIXTURE).unwrap();

        assert_eq!(artifact.contract_name.as_deref(), Some("PollingSystem"));
        assert!(artifact.abi.function("createPoll").is_some());
        assert_eq!(
            artifact.deployed_address(5777).unwrap(),
            address!("e770e47C8fee273117a8e5A14a2D6E863CaAf483")
        );
    }

    #[test]
    fn missing_network_is_reported() {
        let artifact = ContractArtifact::parse(FIXTURE).unwrap();
        let err = artifact.deployed_address(1).unwrap_err();
        assert!(matches!(err, ArtifactError::NotDeployed(1)));
    }

    #[test]
    fn foundry_artifact_without_networks() {
        let json = r#"{ "abi": [], "bytecode": { "object": "0x" } }"#;
        let artifact = ContractArtifact::parse(json).unwrap();
        assert!(artifact.networks.is_empty());
        assert!(artifact.contract_name.is_none());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let artifact = ContractArtifact::load(file.path()).unwrap();
        assert_eq!(artifact.abi.functions.len(), 6);
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = ContractArtifact::load(Path::new("/nonexistent/PollingSystem.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/PollingSystem.json"));
    }
}
