//! Content-derived identifiers.
//!
//! Every record the Creditcoin pallet stores is keyed by a hash the client can
//! compute on its own, so callers never need to read an identifier back from the
//! chain before using it. All hashes are `blake2_256`, the runtime's hasher.

use std::{fmt, str::FromStr};

use codec::{Decode, Encode};
use subxt::{ext::sp_core::hashing::blake2_256, utils::H256};

use crate::{
    types::{Blockchain, Currency},
    BlockNumber,
};

#[derive(Debug, thiserror::Error)]
pub enum ParseIdError {
    #[error("invalid hash: {0}")]
    Hash(#[from] hex::FromHexError),
    #[error("hash must be 32 bytes long, got {0}")]
    Length(usize),
    #[error("expected `<block>-<hash>`")]
    MissingSeparator,
    #[error("invalid block number: {0}")]
    Block(#[from] std::num::ParseIntError),
}

fn parse_hash(src: &str) -> Result<H256, ParseIdError> {
    let bytes = hex::decode(src.strip_prefix("0x").unwrap_or(src))?;
    if bytes.len() != 32 {
        return Err(ParseIdError::Length(bytes.len()));
    }
    Ok(H256::from_slice(&bytes))
}

fn concat_hash(parts: &[&[u8]]) -> H256 {
    H256(blake2_256(&parts.concat()))
}

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Encode,
            Decode,
            scale_encode::EncodeAsType,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub H256);

        impl $name {
            pub fn hash(&self) -> &H256 {
                &self.0
            }
        }

        impl From<H256> for $name {
            fn from(hash: H256) -> Self {
                Self(hash)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0.as_bytes()))
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hash(s).map(Self)
            }
        }
    };
}

macro_rules! order_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Default,
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
        pub struct $name(pub BlockNumber, pub H256);

        impl $name {
            /// Block after which the order expires, also the first storage key.
            pub fn expiration_block(&self) -> BlockNumber {
                self.0
            }

            pub fn hash(&self) -> &H256 {
                &self.1
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-0x{}", self.0, hex::encode(self.1.as_bytes()))
            }
        }

        /// Parses the `<block>-<hash>` form produced by [`Display`](fmt::Display).
        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (block, hash) = s.split_once('-').ok_or(ParseIdError::MissingSeparator)?;
                Ok(Self(block.parse()?, parse_hash(hash)?))
            }
        }
    };
}

hash_id!(
    /// Key of a registered external address.
    AddressId
);
hash_id!(
    /// Key of an external-chain transfer.
    TransferId
);
hash_id!(CollectedCoinsId);
hash_id!(
    /// Key of a GATE burn, derived like [`CollectedCoinsId`].
    BurnGateId
);
hash_id!(CurrencyId);

order_id!(AskOrderId);
order_id!(BidOrderId);
order_id!(OfferId);
order_id!(DealOrderId);

impl AddressId {
    pub fn new(blockchain: &Blockchain, external_address: &[u8]) -> Self {
        Self(concat_hash(&[blockchain.as_bytes().as_ref(), external_address]))
    }
}

impl TransferId {
    pub fn new(blockchain: &Blockchain, blockchain_tx_id: &[u8]) -> Self {
        Self(concat_hash(&[blockchain.as_bytes().as_ref(), blockchain_tx_id]))
    }
}

impl CollectedCoinsId {
    /// `contract_chain` is the chain the collection contract is deployed on.
    pub fn new(contract_chain: &Blockchain, blockchain_tx_id: &[u8]) -> Self {
        Self(concat_hash(&[contract_chain.as_bytes().as_ref(), blockchain_tx_id]))
    }
}

impl BurnGateId {
    /// `contract_chain` is the chain the GATE contract is deployed on.
    pub fn new(contract_chain: &Blockchain, blockchain_tx_id: &[u8]) -> Self {
        Self(concat_hash(&[contract_chain.as_bytes().as_ref(), blockchain_tx_id]))
    }
}

impl CurrencyId {
    pub fn new(currency: &Currency) -> Self {
        match currency {
            Currency::Evm(crate::types::EvmCurrencyType::SmartContract(address, _), info) => {
                Self(H256(blake2_256(&(address, info.chain_id).encode())))
            }
        }
    }
}

impl AskOrderId {
    pub fn new(expiration_block: BlockNumber, guid: &[u8]) -> Self {
        Self(expiration_block, H256(blake2_256(guid)))
    }
}

impl BidOrderId {
    pub fn new(expiration_block: BlockNumber, guid: &[u8]) -> Self {
        Self(expiration_block, H256(blake2_256(guid)))
    }
}

impl OfferId {
    pub fn new(expiration_block: BlockNumber, ask: &AskOrderId, bid: &BidOrderId) -> Self {
        Self(
            expiration_block,
            concat_hash(&[ask.hash().as_bytes(), bid.hash().as_bytes()]),
        )
    }
}

impl DealOrderId {
    pub fn new(expiration_block: BlockNumber, offer: &OfferId) -> Self {
        Self(expiration_block, H256(blake2_256(offer.hash().as_bytes())))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::EvmTransferKind;

    const EXTERNAL_ADDRESS: &str = "a3ee21c306a700e682abcdfe9baa6a08f3820419";

    #[test]
    fn address_id_hashes_chain_name_and_address() {
        let address = hex::decode(EXTERNAL_ADDRESS).unwrap();
        let mut preimage = b"ethereum".to_vec();
        preimage.extend_from_slice(&address);

        assert_eq!(
            AddressId::new(&Blockchain::ETHEREUM, &address),
            AddressId(H256(blake2_256(&preimage)))
        );
    }

    #[test]
    fn ids_depend_on_blockchain() {
        let tx_hash = [0xab; 32];
        assert_ne!(
            TransferId::new(&Blockchain::ETHEREUM, &tx_hash),
            TransferId::new(&Blockchain::RINKEBY, &tx_hash)
        );
        // Both Luniverse networks share the legacy key
        assert_eq!(
            TransferId::new(&Blockchain::LUNIVERSE, &tx_hash),
            TransferId::new(&Blockchain::LUNIVERSE_TESTNET, &tx_hash)
        );
    }

    #[test]
    fn transfer_and_collected_coins_ids_agree() {
        let tx_hash = [7u8; 32];
        assert_eq!(
            TransferId::new(&Blockchain::ETHEREUM, &tx_hash).0,
            CollectedCoinsId::new(&Blockchain::ETHEREUM, &tx_hash).0
        );
    }

    #[test]
    fn burn_gate_id_is_keyed_on_the_contract_chain() {
        let tx_hash = [9u8; 32];
        assert_eq!(
            BurnGateId::new(&Blockchain::ETHEREUM, &tx_hash).0,
            CollectedCoinsId::new(&Blockchain::ETHEREUM, &tx_hash).0
        );
        assert_ne!(
            BurnGateId::new(&Blockchain::ETHEREUM, &tx_hash),
            BurnGateId::new(&Blockchain::RINKEBY, &tx_hash)
        );
    }

    #[test]
    fn order_ids_chain_through_hashes() {
        let ask = AskOrderId::new(100, b"ask-guid");
        let bid = BidOrderId::new(100, b"bid-guid");
        assert_eq!(ask.hash(), &H256(blake2_256(b"ask-guid")));

        let offer = OfferId::new(120, &ask, &bid);
        let mut preimage = ask.1.as_bytes().to_vec();
        preimage.extend_from_slice(bid.1.as_bytes());
        assert_eq!(offer, OfferId(120, H256(blake2_256(&preimage))));

        let deal = DealOrderId::new(130, &offer);
        assert_eq!(deal, DealOrderId(130, H256(blake2_256(offer.1.as_bytes()))));
    }

    #[test]
    fn currency_id_ignores_transfer_kinds() {
        let address = hex::decode(EXTERNAL_ADDRESS).unwrap();
        let erc20 = Currency::smart_contract(
            address.clone(),
            vec![EvmTransferKind::Erc20],
            Blockchain::ETHEREUM,
        );
        let both = Currency::smart_contract(
            address.clone(),
            vec![EvmTransferKind::Erc20, EvmTransferKind::Ethless],
            Blockchain::ETHEREUM,
        );
        let rinkeby =
            Currency::smart_contract(address, vec![EvmTransferKind::Erc20], Blockchain::RINKEBY);

        assert_eq!(CurrencyId::new(&erc20), CurrencyId::new(&both));
        assert_ne!(CurrencyId::new(&erc20), CurrencyId::new(&rinkeby));
    }

    #[test]
    fn parse_displayed_ids() {
        let deal = DealOrderId::new(42, &OfferId(10, H256::repeat_byte(1)));
        assert_eq!(deal.to_string().parse::<DealOrderId>().unwrap(), deal);

        let address = AddressId(H256::repeat_byte(0xcd));
        assert_eq!(address.to_string().parse::<AddressId>().unwrap(), address);

        assert!(matches!(
            "0x1234".parse::<TransferId>(),
            Err(ParseIdError::Length(2))
        ));
        assert!(matches!(
            "0x00".parse::<OfferId>(),
            Err(ParseIdError::MissingSeparator)
        ));
    }
}
