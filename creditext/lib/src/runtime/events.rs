//! Typed views of the runtime events the SDK consumes.

use codec::{Decode, DecodeAll, Encode};

use crate::{
    error::Error,
    ids::{
        AddressId, AskOrderId, BidOrderId, BurnGateId, CollectedCoinsId, CurrencyId, DealOrderId,
        OfferId, TransferId,
    },
    types::{
        Address, AskOrder, BidOrder, BurnedGate, CollectedCoins, Currency, DealOrder,
        LegacySighash, Offer, Transfer, UnverifiedBurnGate, UnverifiedCollectedCoins,
        VerificationFailureCause,
    },
    AccountId, Balance,
};

/// An event with a fixed `(pallet, variant)` key and a SCALE-encoded payload.
pub trait RuntimeEvent: Decode {
    const PALLET: &'static str;
    const EVENT: &'static str;
}

/// An undecoded event, as emitted by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub pallet: String,
    pub variant: String,
    /// SCALE-encoded event fields.
    pub fields: Vec<u8>,
}

impl EventRecord {
    pub fn new<E>(event: &E) -> Self
    where
        E: RuntimeEvent + Encode,
    {
        Self {
            pallet: E::PALLET.to_string(),
            variant: E::EVENT.to_string(),
            fields: event.encode(),
        }
    }

    pub fn is<E: RuntimeEvent>(&self) -> bool {
        self.pallet == E::PALLET && self.variant == E::EVENT
    }

    /// Decode the record as `E`, `None` if it is a different event.
    ///
    /// The whole payload must be consumed.
    pub fn as_event<E: RuntimeEvent>(&self) -> Option<Result<E, Error>> {
        if !self.is::<E>() {
            return None;
        }
        Some(
            E::decode_all(&mut self.fields.as_slice()).map_err(|source| Error::EventDecoding {
                pallet: E::PALLET,
                event: E::EVENT,
                source,
            }),
        )
    }
}

macro_rules! runtime_events {
    ($pallet:literal: $($event:ident),* $(,)?) => {
        $(
            impl RuntimeEvent for $event {
                const PALLET: &'static str = $pallet;
                const EVENT: &'static str = stringify!($event);
            }
        )*
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AddressRegistered(pub AddressId, pub Address);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AskOrderAdded(pub AskOrderId, pub AskOrder);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BidOrderAdded(pub BidOrderId, pub BidOrder);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct OfferAdded(pub OfferId, pub Offer);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DealOrderAdded(pub DealOrderId, pub DealOrder);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DealOrderFunded(pub DealOrderId);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DealOrderLocked(pub DealOrderId);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DealOrderClosed(pub DealOrderId);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct LoanExempted(pub DealOrderId);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferRegistered(pub TransferId, pub Transfer);

/// The authority confirmed the transfer, the record is in `Transfers`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferVerified(pub TransferId);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferProcessed(pub TransferId);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TransferFailedVerification(pub TransferId, pub VerificationFailureCause);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct LegacyWalletClaimed(pub AccountId, pub LegacySighash, pub Balance);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CollectCoinsRegistered(pub CollectedCoinsId, pub UnverifiedCollectedCoins);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CollectedCoinsMinted(pub CollectedCoinsId, pub CollectedCoins);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CollectCoinsFailedVerification(pub CollectedCoinsId, pub VerificationFailureCause);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BurnGATERegistered(pub BurnGateId, pub UnverifiedBurnGate);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BurnedGATEMinted(pub BurnGateId, pub BurnedGate);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BurnGATEFailedVerification(pub BurnGateId, pub VerificationFailureCause);

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct CurrencyRegistered(pub CurrencyId, pub Currency);

runtime_events!(
    "Creditcoin":
    AddressRegistered,
    AskOrderAdded,
    BidOrderAdded,
    OfferAdded,
    DealOrderAdded,
    DealOrderFunded,
    DealOrderLocked,
    DealOrderClosed,
    LoanExempted,
    TransferRegistered,
    TransferVerified,
    TransferProcessed,
    TransferFailedVerification,
    LegacyWalletClaimed,
    CollectCoinsRegistered,
    CollectedCoinsMinted,
    CollectCoinsFailedVerification,
    BurnGATERegistered,
    BurnedGATEMinted,
    BurnGATEFailedVerification,
    CurrencyRegistered,
);

/// Fee (and any other amount) taken from an account.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Withdraw {
    pub who: AccountId,
    pub amount: Balance,
}

runtime_events!("Balances": Withdraw);

/// Result of a call dispatched through `Sudo::sudo`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Sudid {
    pub sudo_result: Result<(), subxt::ext::sp_runtime::DispatchError>,
}

runtime_events!("Sudo": Sudid);

/// `System::ExtrinsicFailed`, only matched by key; its leading field is the
/// dispatch error, see [`crate::runtime::client::decode_dispatch_error`].
pub(crate) const EXTRINSIC_FAILED: (&str, &str) = ("System", "ExtrinsicFailed");

#[cfg(test)]
mod test {
    use subxt::utils::H256;

    use super::*;

    #[test]
    fn records_match_on_pallet_and_variant() {
        let id = DealOrderId(10, H256::repeat_byte(3));
        let record = EventRecord::new(&DealOrderLocked(id));

        assert!(record.is::<DealOrderLocked>());
        assert!(!record.is::<DealOrderClosed>());
        assert!(record.as_event::<DealOrderClosed>().is_none());
        assert_eq!(
            record.as_event::<DealOrderLocked>().unwrap().unwrap(),
            DealOrderLocked(id)
        );
    }

    #[test]
    fn trailing_bytes_are_a_decoding_error() {
        let mut record = EventRecord::new(&TransferProcessed(TransferId::default()));
        record.fields.push(0);

        assert!(matches!(
            record.as_event::<TransferProcessed>(),
            Some(Err(Error::EventDecoding {
                pallet: "Creditcoin",
                event: "TransferProcessed",
                ..
            }))
        ));
    }

    #[test]
    fn failed_verification_carries_cause() {
        let record = EventRecord::new(&TransferFailedVerification(
            TransferId::default(),
            VerificationFailureCause::IncorrectAmount,
        ));
        let TransferFailedVerification(_, cause) = record.as_event().unwrap().unwrap();
        assert_eq!(cause, VerificationFailureCause::IncorrectAmount);
    }
}
