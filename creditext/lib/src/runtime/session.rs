//! The seam between the SDK and the chain client library.
//!
//! Everything the coordinator and the verification poller need from a node is
//! expressed by [`ChainSession`]; [`OnlineSession`](super::online::OnlineSession)
//! backs it with `subxt`, tests use the scripted
//! [`MockSession`](crate::testing::MockSession).

use std::future::Future;

use futures::Stream;
use subxt::utils::H256;

use crate::{
    error::{Error, ModuleError},
    runtime::{calls::RuntimeCall, events::EventRecord},
    BlockNumber, CreditcoinConfig,
};

/// How the nonce of a submitted extrinsic is chosen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NoncePolicy {
    /// Next available index for the account, including the transaction pool.
    #[default]
    Next,
    Explicit(u64),
}

/// Which inclusion status ends a submission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Inclusion in a best block.
    #[default]
    InBlock,
    Finalized,
}

/// The block an extrinsic landed in, along with the events it emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedBlock {
    pub block_hash: H256,
    pub extrinsic_hash: H256,
    /// Events of this extrinsic only, in emission order.
    pub events: Vec<EventRecord>,
}

/// Status of a watched extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Validated, broadcast or retracted; not terminal.
    Pending,
    InBlock(IncludedBlock),
    Finalized(IncludedBlock),
    /// Dropped, invalid or errored in the pool.
    Rejected(String),
}

/// Raw location of a module error, as carried by `DispatchError::Module`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleErrorRef {
    pub pallet_index: u8,
    pub error: [u8; 4],
}

/// All events emitted in one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEvents {
    pub block_hash: H256,
    pub number: BlockNumber,
    pub events: Vec<EventRecord>,
}

/// A live connection to a Creditcoin node.
///
/// Streams returned by this trait own their subscription; dropping a stream
/// unsubscribes.
pub trait ChainSession {
    type StatusStream: Stream<Item = Result<TxStatus, Error>> + Unpin;
    type EventStream: Stream<Item = Result<BlockEvents, Error>> + Unpin;

    /// Sign `call`, submit it and watch its status.
    fn submit_and_watch<Keypair>(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
        nonce: NoncePolicy,
    ) -> impl Future<Output = Result<Self::StatusStream, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Read a raw storage value at the best block.
    fn query_storage(&self, key: &[u8]) -> impl Future<Output = Result<Option<Vec<u8>>, Error>>;

    /// Subscribe to the events of every new best block.
    fn subscribe_events(&self) -> impl Future<Output = Result<Self::EventStream, Error>>;

    /// Like [`subscribe_events`](Self::subscribe_events), but the stream first
    /// replays the already produced blocks numbered `from` and above.
    fn subscribe_events_from(
        &self,
        from: BlockNumber,
    ) -> impl Future<Output = Result<Self::EventStream, Error>>;

    /// Look the error up in the chain metadata.
    fn resolve_module_error(&self, error: &ModuleErrorRef) -> Option<ModuleError>;

    /// Number of the current best (or finalized) block.
    fn block_number(&self, finalized: bool) -> impl Future<Output = Result<BlockNumber, Error>>;
}
