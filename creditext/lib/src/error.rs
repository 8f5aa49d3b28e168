use std::{fmt, time::Duration};

use crate::types::VerificationFailureCause;

/// Errors surfaced by [`Client`](crate::Client) and its extension traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The extrinsic was included but its dispatch failed.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The extrinsic succeeded but did not emit the event the caller relies on.
    #[error("expected event {pallet}.{event} was not emitted")]
    MissingEvent {
        pallet: &'static str,
        event: &'static str,
    },

    #[error("failed to decode event {pallet}.{event}: {source}")]
    EventDecoding {
        pallet: &'static str,
        event: &'static str,
        #[source]
        source: codec::Error,
    },

    /// The extrinsic emitted the expected event, but about a different record.
    #[error("{pallet}.{event} refers to {found}, expected {expected}")]
    EventMismatch {
        pallet: &'static str,
        event: &'static str,
        expected: String,
        found: String,
    },

    /// A record the chain reported as written is not in storage.
    #[error("{entry} record {key} not found")]
    MissingRecord { entry: &'static str, key: String },

    /// The authority reported the real-world effect as invalid.
    #[error("verification of {id} failed: {}", DisplayCause(.cause))]
    VerificationFailed {
        id: String,
        cause: Option<VerificationFailureCause>,
    },

    /// No terminal verification state was observed in time.
    #[error("verification of {id} did not complete within {timeout:?}")]
    VerificationTimeout { id: String, timeout: Duration },

    /// A status or event stream ended before reaching a terminal state.
    #[error("subscription closed before a terminal state was reached")]
    SubscriptionClosed,

    /// The transaction pool refused the extrinsic.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Subxt(#[from] subxt::Error),

    #[error(transparent)]
    Codec(#[from] codec::Error),
}

impl Error {
    /// The module error behind a dispatch failure, if that is what this is.
    pub fn module_error(&self) -> Option<&ModuleError> {
        match self {
            Error::Dispatch(DispatchError::Module(module)) => Some(module),
            _ => None,
        }
    }
}

struct DisplayCause<'a>(&'a Option<VerificationFailureCause>);

impl fmt::Display for DisplayCause<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(cause) => write!(f, "{cause}"),
            None => f.write_str("unknown cause"),
        }
    }
}

/// Decoded reason an included extrinsic reverted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    Module(ModuleError),
    /// Any non-module error, in its raw stringified form.
    #[error("{0}")]
    Other(String),
}

/// A pallet error resolved through the chain metadata.
///
/// Displays as `section.Name: docs`, where `section` is the lower camel case
/// pallet name, e.g. `creditcoin.AddressAlreadyRegistered`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleError {
    pub pallet: String,
    pub name: String,
    pub docs: String,
}

impl ModuleError {
    pub fn section(&self) -> String {
        let mut chars = self.pallet.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// `section.Name`, without the docs.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.section(), self.name)
    }

    /// Typed view of errors raised by the Creditcoin pallet.
    pub fn creditcoin_error(&self) -> Option<CreditcoinError> {
        if self.pallet != "Creditcoin" {
            return None;
        }
        self.name.parse().ok()
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())?;
        if !self.docs.is_empty() {
            write!(f, ": {}", self.docs)?;
        }
        Ok(())
    }
}

macro_rules! creditcoin_errors {
    ($($name:ident),* $(,)?) => {
        /// Errors declared by the Creditcoin pallet.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CreditcoinError {
            $($name,)*
        }

        impl CreditcoinError {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(CreditcoinError::$name => stringify!($name),)*
                }
            }
        }

        impl std::str::FromStr for CreditcoinError {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(CreditcoinError::$name),)*
                    other => Err(format!("unknown Creditcoin error: {other}")),
                }
            }
        }
    };
}

creditcoin_errors!(
    AddressAlreadyRegistered,
    AddressAlreadyRegisteredByCaller,
    AddressBlockchainMismatch,
    AddressFormatNotSupported,
    AlreadyAuthority,
    AskBidMismatch,
    AskOrderExpired,
    BidOrderExpired,
    BurnGATEFaucetNotSet,
    BurnGATEInsufficientFaucetBalance,
    CollectCoinsAlreadyRegistered,
    CurrencyAlreadyRegistered,
    DealNotFunded,
    DealOrderAlreadyClosed,
    DealOrderAlreadyFunded,
    DealOrderAlreadyLocked,
    DealOrderExpired,
    DealOrderMustBeLocked,
    DuplicateDealOrder,
    DuplicateId,
    DuplicateOffer,
    EthSignExternalAddressGenerationFailed,
    EthSignPublicKeyRecoveryFailed,
    GuidAlreadyUsed,
    InsufficientAuthority,
    InvalidSignature,
    InvalidTermLength,
    LegacyBalanceKeeperMissing,
    LegacyWalletNotFound,
    MalformedDealOrder,
    MalformedExternalAddress,
    MalformedTransfer,
    NoLocalAcctForSignedTx,
    NonExistentAddress,
    NonExistentAskOrder,
    NonExistentBidOrder,
    NonExistentDealOrder,
    NonExistentOffer,
    NonExistentTransfer,
    NotAddressOwner,
    NotAnAuthority,
    NotBorrower,
    NotLegacyWalletOwner,
    NotLender,
    OffchainSignedTxFailed,
    OfferExpired,
    OwnershipNotSatisfied,
    PersonalSignExternalAddressGenerationFailed,
    PersonalSignPublicKeyRecoveryFailed,
    RepaymentOrderNonZeroGain,
    RepaymentOrderUnsupported,
    SameOwner,
    TransferAccountMismatch,
    TransferAlreadyProcessed,
    TransferAlreadyRegistered,
    TransferAmountInsufficient,
    TransferAmountMismatch,
    TransferDealOrderMismatch,
    UnsupportedBlockchain,
    UnsupportedTransferKind,
);

impl fmt::Display for CreditcoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
