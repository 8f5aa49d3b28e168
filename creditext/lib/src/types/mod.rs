//! Runtime types, mirroring the SCALE layout of the Creditcoin pallet.

mod address;
mod loan_terms;
mod orders;
mod platform;
mod tasks;
mod transfer;
mod u256;

pub use address::{
    signature_from_hex, Address, LegacySighash, OwnershipProof, ParseSignatureError,
};
pub use loan_terms::{Duration, InterestRate, InterestType, LoanTerms};
pub use orders::{AskOrder, BidOrder, DealOrder, Moment, Offer};
pub use platform::{
    Blockchain, Currency, DeployedContract, EvmChainId, EvmCurrencyType, EvmInfo, EvmTransferKind,
    TransferKind,
};
pub use tasks::{TaskId, TaskOutput, VerificationFailureCause};
pub use transfer::{
    BurnedGate, CollectedCoins, ContractType, TokenContract, Transfer, UnverifiedBurnGate,
    UnverifiedCollectedCoins,
};
pub use u256::{ParseU256Error, U256};

/// Address on an external chain, raw bytes (20 for EVM accounts).
pub type ExternalAddress = Vec<u8>;

/// Transaction hash on an external chain.
pub type ExternalTxId = Vec<u8>;
