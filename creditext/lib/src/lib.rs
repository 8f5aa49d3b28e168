//! Typed client for the Creditcoin chain.
//!
//! Extrinsics are exposed through per-pallet extension traits implemented for
//! [`Client`]; every submission goes through [`Client::traced_submission`],
//! which waits for the extrinsic to be included and decodes any dispatch error.
//! Extrinsics whose effect is verified later by an off-chain authority hand
//! back a [`VerifiableHandle`].

pub mod clients;
mod error;
pub mod ids;
pub mod multipair;
pub mod runtime;
pub mod signing;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::{
    clients::{CreditcoinClientExt, RegisteredDealOrder, SudoClientExt, SystemClientExt},
    error::{CreditcoinError, DispatchError, Error, ModuleError},
    multipair::MultiPairSigner,
    runtime::{
        client::{Client, SubmissionResult, SubmissionState, SubmitOptions, Submitted},
        online::OnlineSession,
        session::{ChainSession, Inclusion, NoncePolicy},
        verification::{
            BurnGateHandle, CollectCoinsHandle, TransferHandle, VerifiableHandle, VerificationOutcome,
            DEFAULT_VERIFICATION_TIMEOUT,
        },
    },
};

/// Balance as specified by the SCALE-encoded runtime.
pub type Balance = u128;

/// BlockNumber as specified by the SCALE-encoded runtime.
pub type BlockNumber = u32;

/// Smallest unit per CTC, the runtime uses 18 decimals.
pub const CREDO_PER_CTC: Balance = 1_000_000_000_000_000_000;

/// Documented minimum fee for standard Creditcoin extrinsics.
pub const POINT_01_CTC: Balance = CREDO_PER_CTC / 100;

#[derive(Clone)]
pub enum CreditcoinConfig {}

// Types are fully qualified ON PURPOSE!
// It's not fun to find out where in your config a type comes from subxt or sp_runtime
// going up and down, in and out the files, this helps!
impl subxt::Config for CreditcoinConfig {
    type Hash = subxt::utils::H256;
    type AccountId = subxt::config::polkadot::AccountId32;
    type Address = subxt::config::polkadot::MultiAddress<Self::AccountId, ()>;
    type Signature = subxt::ext::sp_runtime::MultiSignature;
    type Hasher = subxt::config::substrate::BlakeTwo256;
    type Header =
        subxt::config::substrate::SubstrateHeader<u32, subxt::config::substrate::BlakeTwo256>;
    type ExtrinsicParams = subxt::config::DefaultExtrinsicParams<Self>;
    type AssetId = u32;
}

/// Account identifier used throughout the crate.
pub type AccountId = <CreditcoinConfig as subxt::Config>::AccountId;
