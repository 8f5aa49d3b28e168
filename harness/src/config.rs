use std::{str::FromStr, sync::OnceLock, time::Duration};

use creditext::{types::Blockchain, Balance, POINT_01_CTC};
use url::Url;

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Settings shared by the live tests, read once from `CREDITCOIN_*` variables.
///
/// Unset variables fall back to a local development node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub api_url: Url,
    pub ethereum_node_url: Url,
    pub ethereum_chain: Blockchain,
    /// Lower bound the fee of any standard extrinsic must reach.
    pub minimum_txn_fee: Balance,
    /// Make `//Alice` an authority before tests that need one.
    pub execute_setup_authority: bool,
    /// Accept addresses registered by a previous run instead of failing.
    pub reuse_existing_addresses: bool,
    pub network_long_name: String,
    pub network_short_name: String,
    pub verification_timeout: Duration,
}

impl TestConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            api_url: parse("CREDITCOIN_API_URL", var("CREDITCOIN_API_URL", "ws://127.0.0.1:9944"))?,
            ethereum_node_url: parse(
                "CREDITCOIN_ETHEREUM_NODE_URL",
                var("CREDITCOIN_ETHEREUM_NODE_URL", "http://localhost:8545"),
            )?,
            ethereum_chain: parse(
                "CREDITCOIN_ETHEREUM_CHAIN",
                var("CREDITCOIN_ETHEREUM_CHAIN", "ethereum"),
            )?,
            minimum_txn_fee: parse(
                "CREDITCOIN_MINIMUM_TXN_FEE",
                var("CREDITCOIN_MINIMUM_TXN_FEE", &POINT_01_CTC.to_string()),
            )?,
            execute_setup_authority: parse_flag(
                "CREDITCOIN_EXECUTE_SETUP_AUTHORITY",
                var("CREDITCOIN_EXECUTE_SETUP_AUTHORITY", "true"),
            )?,
            reuse_existing_addresses: parse_flag(
                "CREDITCOIN_REUSE_EXISTING_ADDRESSES",
                var("CREDITCOIN_REUSE_EXISTING_ADDRESSES", "false"),
            )?,
            network_long_name: var("CREDITCOIN_NETWORK_LONG_NAME", "Development"),
            network_short_name: var("CREDITCOIN_NETWORK_SHORT_NAME", "dev"),
            verification_timeout: Duration::from_secs(parse(
                "CREDITCOIN_VERIFICATION_TIMEOUT_SECS",
                var("CREDITCOIN_VERIFICATION_TIMEOUT_SECS", "180"),
            )?),
        })
    }

    /// The process-wide config, read from the environment on first use.
    ///
    /// Panics on invalid values, as no test can run without a config.
    pub fn get() -> &'static TestConfig {
        static CONFIG: OnceLock<TestConfig> = OnceLock::new();
        CONFIG.get_or_init(|| TestConfig::from_env().expect("test configuration should be valid"))
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse().map_err(|err: T::Err| ConfigError {
        key,
        reason: err.to_string(),
        value,
    })
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError {
            key,
            reason: "expected a boolean".to_string(),
            value,
        }),
    }
}
