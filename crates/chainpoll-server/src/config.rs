use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::info;
use zeroize::Zeroizing;

use chainpoll_api::session::DEFAULT_TOKEN_TTL_MINUTES;
use chainpoll_chain::{Address, ChainConfig, DEFAULT_GAS_LIMIT};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// One week.
const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: Zeroizing<String>,
    pub token_ttl_minutes: i64,
    pub mongodb_url: String,
    pub db_name: String,
    pub chain: ChainConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = Zeroizing::new(lookup("CHAINPOLL_JWT_SECRET").unwrap_or_default());
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHAINPOLL_JWT_SECRET is unset or still a placeholder");
        }

        let mongodb_url = lookup("MONGODB_URL").context("MONGODB_URL must be set")?;

        let token_ttl_minutes = parse_or(
            &lookup,
            "CHAINPOLL_TOKEN_TTL_MINUTES",
            DEFAULT_TOKEN_TTL_MINUTES,
        )?;
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&token_ttl_minutes) {
            bail!(
                "CHAINPOLL_TOKEN_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}, got {token_ttl_minutes}"
            );
        }

        let contract_address = lookup("CHAINPOLL_CONTRACT_ADDRESS")
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<Address>()
                    .with_context(|| format!("invalid CHAINPOLL_CONTRACT_ADDRESS {s}"))
            })
            .transpose()?;

        Ok(Self {
            host: or_default(&lookup, "CHAINPOLL_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "CHAINPOLL_PORT", 8000)?,
            jwt_secret,
            token_ttl_minutes,
            mongodb_url,
            db_name: or_default(&lookup, "CHAINPOLL_DB_NAME", "polls_app"),
            chain: ChainConfig {
                rpc_url: or_default(&lookup, "CHAINPOLL_RPC_URL", "http://127.0.0.1:7545"),
                artifact_path: PathBuf::from(or_default(
                    &lookup,
                    "CHAINPOLL_CONTRACT_ARTIFACT",
                    "../build/contracts/PollingSystem.json",
                )),
                contract_address,
                gas_limit: parse_or(&lookup, "CHAINPOLL_GAS_LIMIT", DEFAULT_GAS_LIMIT)?,
            },
        })
    }
}

fn or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} value {raw:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CHAINPOLL_JWT_SECRET", "a-real-secret-value"),
        ("MONGODB_URL", "mongodb://localhost:27017"),
    ];

    #[test]
    fn defaults_match_local_ganache_setup() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.token_ttl_minutes, 30);
        assert_eq!(config.db_name, "polls_app");
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:7545");
        assert_eq!(config.chain.gas_limit, 2_000_000);
        assert!(config.chain.contract_address.is_none());
        assert!(config.chain.artifact_path.ends_with("PollingSystem.json"));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = REQUIRED.to_vec();
        vars.extend_from_slice(&[
            ("CHAINPOLL_PORT", "9000"),
            ("CHAINPOLL_GAS_LIMIT", "300000"),
            ("CHAINPOLL_CONTRACT_ADDRESS", "0xe770e47C8fee273117a8e5A14a2D6E863CaAf483"),
        ]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.chain.gas_limit, 300_000);
        assert!(config.chain.contract_address.is_some());
    }

    #[test]
    fn placeholder_or_missing_secret_is_rejected() {
        let err = Config::from_lookup(lookup(&[("MONGODB_URL", "mongodb://x")])).err().unwrap();
        assert!(err.to_string().contains("CHAINPOLL_JWT_SECRET"));

        let err = Config::from_lookup(lookup(&[
            ("MONGODB_URL", "mongodb://x"),
            ("CHAINPOLL_JWT_SECRET", "dev-secret-change-me"),
        ]))
        .err().unwrap();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn missing_mongodb_url_is_rejected() {
        let err = Config::from_lookup(lookup(&[("CHAINPOLL_JWT_SECRET", "s3cret")])).err().unwrap();
        assert!(err.to_string().contains("MONGODB_URL"));
    }

    #[test]
    fn malformed_numbers_name_the_variable() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("CHAINPOLL_PORT", "eighty"));

        let err = Config::from_lookup(lookup(&vars)).err().unwrap();
        assert!(err.to_string().contains("CHAINPOLL_PORT"));
    }

    #[test]
    fn token_ttl_outside_bounds_is_rejected() {
        for bad in ["0", "-5", "10081", "9223372036854775807"] {
            let mut vars = REQUIRED.to_vec();
            vars.push(("CHAINPOLL_TOKEN_TTL_MINUTES", bad));

            let err = Config::from_lookup(lookup(&vars)).err().unwrap();
            assert!(err.to_string().contains("CHAINPOLL_TOKEN_TTL_MINUTES"), "{bad}");
        }

        let mut vars = REQUIRED.to_vec();
        vars.push(("CHAINPOLL_TOKEN_TTL_MINUTES", "10080"));
        assert_eq!(Config::from_lookup(lookup(&vars)).unwrap().token_ttl_minutes, 10_080);
    }
}
