use std::borrow::Cow;

use codec::{Decode, Encode};
use subxt::utils::H160;

use super::ExternalAddress;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct EvmChainId(#[codec(compact)] pub u64);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct EvmInfo {
    pub chain_id: EvmChainId,
}

/// External chain an address, transfer or currency lives on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Blockchain {
    Evm(EvmInfo),
}

impl Blockchain {
    pub const fn evm(chain_id: u64) -> Blockchain {
        Blockchain::Evm(EvmInfo {
            chain_id: EvmChainId(chain_id),
        })
    }

    // Chain IDs from chainlist.org and Luniverse's documentation
    pub const ETHEREUM: Blockchain = Blockchain::evm(1);
    pub const RINKEBY: Blockchain = Blockchain::evm(4);
    pub const LUNIVERSE_TESTNET: Blockchain = Blockchain::evm(1635501961136826136);
    pub const LUNIVERSE: Blockchain = Blockchain::evm(3158073271666164067);

    pub fn chain_id(&self) -> EvmChainId {
        match self {
            Blockchain::Evm(info) => info.chain_id,
        }
    }

    /// Bytes prefixed to external keys when deriving identifiers.
    ///
    /// Known chains keep their legacy names so identifiers stay stable,
    /// any other EVM chain is keyed as `evm-<chain id>`.
    pub fn as_bytes(&self) -> Cow<'static, [u8]> {
        match *self {
            Blockchain::ETHEREUM => Cow::Borrowed(b"ethereum"),
            Blockchain::RINKEBY => Cow::Borrowed(b"rinkeby"),
            Blockchain::LUNIVERSE | Blockchain::LUNIVERSE_TESTNET => Cow::Borrowed(b"luniverse"),
            Blockchain::Evm(EvmInfo { chain_id }) => {
                Cow::Owned(format!("evm-{}", chain_id.0).into_bytes())
            }
        }
    }
}

impl std::str::FromStr for Blockchain {
    type Err = String;

    /// Parses a well-known chain name (case-insensitive) or a numeric EVM chain id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ethereum" => Ok(Blockchain::ETHEREUM),
            "rinkeby" => Ok(Blockchain::RINKEBY),
            "luniverse" => Ok(Blockchain::LUNIVERSE),
            "luniverse-testnet" => Ok(Blockchain::LUNIVERSE_TESTNET),
            other => other
                .strip_prefix("evm-")
                .unwrap_or(other)
                .parse::<u64>()
                .map(Blockchain::evm)
                .map_err(|_| format!("unknown blockchain: {s}")),
        }
    }
}

impl std::fmt::Display for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.as_bytes()))
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum EvmTransferKind {
    Erc20,
    Ethless,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum TransferKind {
    Evm(EvmTransferKind),
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum EvmCurrencyType {
    SmartContract(#[serde(with = "hex")] ExternalAddress, Vec<EvmTransferKind>),
}

/// A currency loans can be denominated in.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum Currency {
    Evm(EvmCurrencyType, EvmInfo),
}

impl Currency {
    /// An ERC-20 style contract on the given EVM chain.
    pub fn smart_contract(
        address: ExternalAddress,
        kinds: Vec<EvmTransferKind>,
        blockchain: Blockchain,
    ) -> Self {
        let Blockchain::Evm(info) = blockchain;
        Currency::Evm(EvmCurrencyType::SmartContract(address, kinds), info)
    }
}

/// A contract the off-chain workers watch for coin collection or GATE swaps.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct DeployedContract {
    pub address: H160,
    pub chain: Blockchain,
}
