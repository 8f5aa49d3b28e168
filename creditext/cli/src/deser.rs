//! Parsers for CLI arguments that are not plain `FromStr` values.
use std::{path::PathBuf, str::FromStr};

use creditext::types::ExternalAddress;
use subxt::{ext::sp_core::ecdsa, utils::H160};

/// JSON argument, given inline or as a path prepended with `@`.
pub(crate) trait ParseablePath: serde::de::DeserializeOwned {
    fn parse_json(src: &str) -> Result<Self, anyhow::Error> {
        Ok(if let Some(stripped) = src.strip_prefix('@') {
            let path = PathBuf::from_str(stripped)?.canonicalize()?;
            let file = std::fs::File::open(path)?;
            let mut buffered_file = std::io::BufReader::new(file);
            serde_json::from_reader(&mut buffered_file)
        } else {
            serde_json::from_str(src)
        }?)
    }
}

impl<T> ParseablePath for T where T: serde::de::DeserializeOwned {}

/// Hex bytes, with or without a `0x` prefix.
pub(crate) fn parse_hex(src: &str) -> Result<ExternalAddress, hex::FromHexError> {
    hex::decode(src.strip_prefix("0x").unwrap_or(src))
}

pub(crate) fn parse_evm_address(src: &str) -> Result<H160, anyhow::Error> {
    let bytes = parse_hex(src)?;
    anyhow::ensure!(
        bytes.len() == 20,
        "EVM addresses are 20 bytes long, got {}",
        bytes.len()
    );
    Ok(H160::from_slice(&bytes))
}

/// Compressed secp256k1 public key, as hex.
pub(crate) fn parse_ecdsa_public(src: &str) -> Result<ecdsa::Public, anyhow::Error> {
    let bytes: [u8; 33] = parse_hex(src)?.try_into().map_err(|bytes: Vec<u8>| {
        anyhow::anyhow!(
            "compressed ECDSA public keys are 33 bytes long, got {}",
            bytes.len()
        )
    })?;
    Ok(ecdsa::Public::from_raw(bytes))
}

/// Removes the `_` from the input before calling [`parse`](std::str::FromStr::parse).
pub(crate) fn parse_without_underscore<T>(s: &str) -> Result<T, T::Err>
where
    T: std::str::FromStr,
{
    s.replace('_', "").parse()
}
