//! Waiting on the off-chain authority.
//!
//! Some extrinsics only register a claim about another chain (a transfer, a
//! token burn); an authority checks it and later reports back with either a
//! success or a failure event. A [`VerifiableHandle`] is handed out once the
//! registering extrinsic is included and follows that second half.

use std::{fmt, marker::PhantomData, time::Duration};

use codec::{Decode, DecodeAll};
use futures::StreamExt;

use crate::{
    error::Error,
    ids::{BurnGateId, CollectedCoinsId, TransferId},
    runtime::{
        events::{
            BurnGATEFailedVerification, BurnedGATEMinted, CollectCoinsFailedVerification,
            CollectedCoinsMinted, EventRecord, RuntimeEvent, TransferFailedVerification,
            TransferVerified,
        },
        online::OnlineSession,
        session::ChainSession,
        storage,
    },
    types::{BurnedGate, CollectedCoins, Transfer, VerificationFailureCause},
    BlockNumber,
};

/// Default time to wait for the authority, roughly 30 blocks.
pub const DEFAULT_VERIFICATION_TIMEOUT: Duration = Duration::from_secs(180);

/// What an event says about the record being verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation<T> {
    /// Verified; the payload, when the event does not carry it, is read from storage.
    Verified(Option<T>),
    Failed(Option<VerificationFailureCause>),
}

/// A kind of record the authority verifies.
pub trait Verifiable {
    type Id: Copy + PartialEq + Decode + fmt::Display;
    type Verified: Clone;

    /// Storage entry the verified record is kept in.
    const ENTRY: &'static str;

    fn storage_key(id: &Self::Id) -> Vec<u8>;

    fn decode_stored(raw: &[u8]) -> Result<Self::Verified, Error>;

    /// Inspect one event, `None` if it is unrelated to `id`.
    fn observe(
        id: &Self::Id,
        event: &EventRecord,
    ) -> Result<Option<Observation<Self::Verified>>, Error>;
}

/// Failure cause carried by a `(id, cause)` failure event.
///
/// The id is matched first; an undecodable cause is reported as `None`.
fn failure_cause<E, Id>(id: &Id, event: &EventRecord) -> Option<Option<VerificationFailureCause>>
where
    E: RuntimeEvent,
    Id: Decode + PartialEq,
{
    if !event.is::<E>() {
        return None;
    }
    let mut fields = event.fields.as_slice();
    let event_id = Id::decode(&mut fields).ok()?;
    if &event_id != id {
        return None;
    }
    Some(VerificationFailureCause::decode_all(&mut fields).ok())
}

/// Transfers registered with `register_{funding,repayment}_transfer`.
#[derive(Debug)]
pub struct TransferVerification;

impl Verifiable for TransferVerification {
    type Id = TransferId;
    type Verified = Transfer;

    const ENTRY: &'static str = "Transfers";

    fn storage_key(id: &TransferId) -> Vec<u8> {
        storage::transfers(id)
    }

    fn decode_stored(raw: &[u8]) -> Result<Transfer, Error> {
        Ok(Transfer::decode_all(&mut &raw[..])?)
    }

    fn observe(
        id: &TransferId,
        event: &EventRecord,
    ) -> Result<Option<Observation<Transfer>>, Error> {
        if let Some(TransferVerified(verified)) = event.as_event::<TransferVerified>().transpose()? {
            return Ok((&verified == id).then_some(Observation::Verified(None)));
        }
        Ok(failure_cause::<TransferFailedVerification, _>(id, event).map(Observation::Failed))
    }
}

/// Coin collections requested with `request_collect_coins{,_v2}`.
#[derive(Debug)]
pub struct CollectCoinsVerification;

impl Verifiable for CollectCoinsVerification {
    type Id = CollectedCoinsId;
    type Verified = CollectedCoins;

    const ENTRY: &'static str = "CollectedCoins";

    fn storage_key(id: &CollectedCoinsId) -> Vec<u8> {
        storage::collected_coins(id)
    }

    fn decode_stored(raw: &[u8]) -> Result<CollectedCoins, Error> {
        Ok(CollectedCoins::decode_all(&mut &raw[..])?)
    }

    fn observe(
        id: &CollectedCoinsId,
        event: &EventRecord,
    ) -> Result<Option<Observation<CollectedCoins>>, Error> {
        if let Some(CollectedCoinsMinted(minted, coins)) =
            event.as_event::<CollectedCoinsMinted>().transpose()?
        {
            return Ok((&minted == id).then_some(Observation::Verified(Some(coins))));
        }
        Ok(failure_cause::<CollectCoinsFailedVerification, _>(id, event).map(Observation::Failed))
    }
}

/// GATE burns registered with `request_burn_gate`.
#[derive(Debug)]
pub struct BurnGateVerification;

impl Verifiable for BurnGateVerification {
    type Id = BurnGateId;
    type Verified = BurnedGate;

    const ENTRY: &'static str = "BurnedGATE";

    fn storage_key(id: &BurnGateId) -> Vec<u8> {
        storage::burned_gate(id)
    }

    fn decode_stored(raw: &[u8]) -> Result<BurnedGate, Error> {
        Ok(BurnedGate::decode_all(&mut &raw[..])?)
    }

    fn observe(
        id: &BurnGateId,
        event: &EventRecord,
    ) -> Result<Option<Observation<BurnedGate>>, Error> {
        if let Some(BurnedGATEMinted(minted, burned)) =
            event.as_event::<BurnedGATEMinted>().transpose()?
        {
            return Ok((&minted == id).then_some(Observation::Verified(Some(burned))));
        }
        Ok(failure_cause::<BurnGATEFailedVerification, _>(id, event).map(Observation::Failed))
    }
}

/// Terminal state of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome<T> {
    Verified(T),
    /// `None` when the authority's cause could not be decoded.
    Failed(Option<VerificationFailureCause>),
}

/// Follows a registered record until the authority verifies or rejects it.
///
/// The handle owns a block event subscription opened no later than its
/// creation; wrappers open it before submitting, so the blocks between
/// inclusion and the handle being returned are not missed. Once a terminal
/// outcome is observed it is kept, and later waits return it without touching
/// the chain again. A timeout is not terminal: the subscription is released and
/// the next wait subscribes anew, replaying the blocks after the last one seen.
pub struct VerifiableHandle<'c, S, V>
where
    S: ChainSession,
    V: Verifiable,
{
    session: &'c S,
    id: V::Id,
    events: Option<S::EventStream>,
    last_seen: Option<BlockNumber>,
    outcome: Option<VerificationOutcome<V::Verified>>,
    _kind: PhantomData<V>,
}

impl<S, V> fmt::Debug for VerifiableHandle<'_, S, V>
where
    S: ChainSession,
    V: Verifiable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiableHandle")
            .field("entry", &V::ENTRY)
            .field("id", &self.id.to_string())
            .field("subscribed", &self.events.is_some())
            .field("last_seen", &self.last_seen)
            .field("terminal", &self.outcome.is_some())
            .finish()
    }
}

/// Handle on a registered transfer, over the default session.
pub type TransferHandle<'c, S = OnlineSession> = VerifiableHandle<'c, S, TransferVerification>;

/// Handle on a coin collection request, over the default session.
pub type CollectCoinsHandle<'c, S = OnlineSession> =
    VerifiableHandle<'c, S, CollectCoinsVerification>;

/// Handle on a GATE burn, over the default session.
pub type BurnGateHandle<'c, S = OnlineSession> = VerifiableHandle<'c, S, BurnGateVerification>;

impl<'c, S, V> VerifiableHandle<'c, S, V>
where
    S: ChainSession,
    V: Verifiable,
{
    /// Start observing `id`; subscribes right away.
    pub async fn new(session: &'c S, id: V::Id) -> Result<Self, Error> {
        let events = session.subscribe_events().await?;
        Ok(Self::with_events(session, id, events))
    }

    /// Observe `id` over a subscription opened earlier, typically before the
    /// registering extrinsic was submitted.
    pub fn with_events(session: &'c S, id: V::Id, events: S::EventStream) -> Self {
        Self {
            session,
            id,
            events: Some(events),
            last_seen: None,
            outcome: None,
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> &V::Id {
        &self.id
    }

    /// The terminal outcome, if one was observed.
    pub fn outcome(&self) -> Option<&VerificationOutcome<V::Verified>> {
        self.outcome.as_ref()
    }

    /// Wait for the authority's verdict for at most `timeout`.
    ///
    /// Returns the verified record, [`Error::VerificationFailed`] when the
    /// authority rejected it, or [`Error::VerificationTimeout`] when neither
    /// happened in time.
    #[tracing::instrument(level = "debug", skip(self), fields(entry = V::ENTRY, id = %self.id))]
    pub async fn wait_for_verification(
        &mut self,
        timeout: Duration,
    ) -> Result<V::Verified, Error> {
        if self.outcome.is_none() {
            let events = match (self.events.take(), self.last_seen) {
                (Some(events), _) => events,
                (None, Some(last_seen)) => {
                    tracing::debug!(from = last_seen + 1, "resubscribing to block events");
                    self.session.subscribe_events_from(last_seen + 1).await?
                }
                (None, None) => {
                    tracing::debug!("resubscribing to block events");
                    self.session.subscribe_events().await?
                }
            };

            // The stream moves into the observer, a timeout drops it
            let observed = tokio::time::timeout(timeout, self.observe(events)).await;
            let outcome = observed.map_err(|_| Error::VerificationTimeout {
                id: self.id.to_string(),
                timeout,
            })??;
            self.outcome = Some(outcome);
        }

        match &self.outcome {
            Some(VerificationOutcome::Verified(verified)) => Ok(verified.clone()),
            Some(VerificationOutcome::Failed(cause)) => Err(Error::VerificationFailed {
                id: self.id.to_string(),
                cause: *cause,
            }),
            // set right above
            None => Err(Error::SubscriptionClosed),
        }
    }

    async fn stored(&self) -> Result<Option<V::Verified>, Error> {
        self.session
            .query_storage(&V::storage_key(&self.id))
            .await?
            .map(|raw| V::decode_stored(&raw))
            .transpose()
    }

    async fn observe(
        &mut self,
        mut events: S::EventStream,
    ) -> Result<VerificationOutcome<V::Verified>, Error> {
        if let Some(verified) = self.stored().await? {
            tracing::debug!("already verified");
            return Ok(VerificationOutcome::Verified(verified));
        }

        while let Some(block) = events.next().await {
            let block = block?;
            tracing::trace!(block = block.number, "checking block events");
            self.last_seen = Some(block.number);

            for event in &block.events {
                match V::observe(&self.id, event)? {
                    Some(Observation::Verified(Some(verified))) => {
                        return Ok(VerificationOutcome::Verified(verified));
                    }
                    Some(Observation::Verified(None)) => {
                        let verified = self.stored().await?.ok_or_else(|| Error::MissingRecord {
                            entry: V::ENTRY,
                            key: self.id.to_string(),
                        })?;
                        return Ok(VerificationOutcome::Verified(verified));
                    }
                    Some(Observation::Failed(cause)) => {
                        tracing::debug!(?cause, "verification failed");
                        return Ok(VerificationOutcome::Failed(cause));
                    }
                    None => {}
                }
            }
        }

        Err(Error::SubscriptionClosed)
    }
}
