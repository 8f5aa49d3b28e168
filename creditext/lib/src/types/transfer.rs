use codec::{Decode, Encode};

use super::{Blockchain, DeployedContract, ExternalAddress, ExternalTxId, Moment, TransferKind, U256};
use crate::{
    ids::{AddressId, DealOrderId},
    AccountId, Balance, BlockNumber,
};

/// A transfer on an external chain, as recorded by the runtime.
///
/// `is_processed` flips once the transfer is consumed by `fund_deal_order`
/// or `close_deal_order`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub struct Transfer {
    pub blockchain: Blockchain,
    pub kind: TransferKind,
    pub from: AddressId,
    pub to: AddressId,
    pub deal_order_id: DealOrderId,
    pub amount: U256,
    pub tx_id: ExternalTxId,
    pub block: BlockNumber,
    pub is_processed: bool,
    pub account_id: AccountId,
    pub timestamp: Option<Moment>,
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
#[allow(clippy::upper_case_acronyms)]
pub enum ContractType {
    GCRE,
    GATE,
}

/// Coins minted after the authority verified a burn on the external chain.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub struct CollectedCoins {
    pub to: AddressId,
    pub amount: Balance,
    pub tx_id: ExternalTxId,
    pub contract_type: ContractType,
}

/// A collection request waiting for the authority.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct UnverifiedCollectedCoins {
    pub to: ExternalAddress,
    pub tx_id: ExternalTxId,
    pub contract: DeployedContract,
}

/// Burn proof accepted by `request_collect_coins_v2`: the burning EVM
/// address and the burn transaction hash, tagged with the burnt token.
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
#[allow(clippy::upper_case_acronyms)]
pub enum TokenContract {
    GCRE(ExternalAddress, ExternalTxId),
    GATE(ExternalAddress, ExternalTxId),
}

impl TokenContract {
    pub fn contract_type(&self) -> ContractType {
        match self {
            TokenContract::GCRE(..) => ContractType::GCRE,
            TokenContract::GATE(..) => ContractType::GATE,
        }
    }

    pub fn evm_address(&self) -> &ExternalAddress {
        match self {
            TokenContract::GCRE(address, _) | TokenContract::GATE(address, _) => address,
        }
    }

    pub fn tx_id(&self) -> &ExternalTxId {
        match self {
            TokenContract::GCRE(_, tx_id) | TokenContract::GATE(_, tx_id) => tx_id,
        }
    }
}

/// CTC paid out of the GATE faucet for a verified burn.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub struct BurnedGate {
    pub to: AddressId,
    pub amount: Balance,
    pub tx_id: ExternalTxId,
}

/// A GATE burn waiting for the authority.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct UnverifiedBurnGate {
    pub to: ExternalAddress,
    pub tx_id: ExternalTxId,
    pub contract: DeployedContract,
}
