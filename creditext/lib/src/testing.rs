//! Scripted in-memory [`ChainSession`] for tests.
//!
//! Statuses and block events are queued up front and handed out by the streams
//! the session returns. Every subscription and every release (stream drop) is
//! counted, so tests can assert that a component subscribes and unsubscribes
//! exactly as often as it should.
//!
//! Blocks form a single chain. An event subscription sees the blocks produced
//! after it was opened, in order; blocks produced before that are only reached
//! through [`ChainSession::subscribe_events_from`]. A block is produced when
//! the submission's best-block inclusion is reported, when a step queued with
//! [`MockSession::script_block_while_watching`] is reached, by
//! [`MockSession::produce_block`], or when a subscriber has seen every produced
//! block and a [`MockSession::script_block`] one is waiting.

use std::{
    collections::{HashMap, VecDeque},
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    task::{Context, Poll},
};

use codec::Encode;
use futures::Stream;
use subxt::{
    ext::{
        sp_core::{sr25519, Pair},
        sp_runtime,
    },
    tx::PairSigner,
    utils::H256,
};

use crate::{
    error::{Error, ModuleError},
    runtime::{
        calls::RuntimeCall,
        events::EventRecord,
        session::{
            BlockEvents, ChainSession, IncludedBlock, ModuleErrorRef, NoncePolicy, TxStatus,
        },
    },
    BlockNumber, CreditcoinConfig,
};

/// Signer for the `//Alice` development account.
pub fn alice() -> PairSigner<CreditcoinConfig, sr25519::Pair> {
    dev_signer("//Alice")
}

/// Signer for a development seed such as `//Bob`.
pub fn dev_signer(seed: &str) -> PairSigner<CreditcoinConfig, sr25519::Pair> {
    let pair = sr25519::Pair::from_string(seed, None).expect("dev seeds are valid");
    PairSigner::new(pair)
}

#[derive(Debug, Default)]
struct Counters {
    subscriptions: AtomicUsize,
    releases: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test poisons the lock, the state is still good for its assertions
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
enum PendingBlock {
    Block(Vec<EventRecord>),
    /// Ends the subscription that reaches it.
    Close,
}

#[derive(Debug, Default)]
struct Chain {
    produced: Vec<BlockEvents>,
    pending: VecDeque<PendingBlock>,
}

impl Chain {
    fn produce(&mut self, events: Vec<EventRecord>) -> BlockEvents {
        let number = self.produced.len() as BlockNumber + 1;
        let block = BlockEvents {
            block_hash: H256::from_low_u64_be(number as u64),
            number,
            events,
        };
        self.produced.push(block.clone());
        block
    }
}

#[derive(Debug)]
enum StatusStep {
    Status(TxStatus),
    /// A block produced while the extrinsic is still being watched.
    Block(Vec<EventRecord>),
}

/// Status stream over the shared script, counting its own release on drop.
pub struct MockStatusStream {
    script: Arc<Mutex<VecDeque<StatusStep>>>,
    chain: Arc<Mutex<Chain>>,
    counters: Arc<Counters>,
}

impl Stream for MockStatusStream {
    type Item = Result<TxStatus, Error>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match lock(&self.script).pop_front() {
                Some(StatusStep::Block(events)) => {
                    lock(&self.chain).produce(events);
                }
                Some(StatusStep::Status(status)) => {
                    if let TxStatus::InBlock(included) = &status {
                        lock(&self.chain).produce(included.events.clone());
                    }
                    return Poll::Ready(Some(Ok(status)));
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for MockStatusStream {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Event stream following the shared chain from its own position.
pub struct MockEventStream {
    chain: Arc<Mutex<Chain>>,
    /// Index of the next produced block to hand out.
    cursor: usize,
    counters: Arc<Counters>,
}

impl Stream for MockEventStream {
    type Item = Result<BlockEvents, Error>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let chain = Arc::clone(&self.chain);
        let mut chain = lock(&chain);

        if let Some(block) = chain.produced.get(self.cursor).cloned() {
            self.cursor += 1;
            return Poll::Ready(Some(Ok(block)));
        }

        match chain.pending.pop_front() {
            Some(PendingBlock::Block(events)) => {
                let block = chain.produce(events);
                self.cursor = chain.produced.len();
                Poll::Ready(Some(Ok(block)))
            }
            Some(PendingBlock::Close) => Poll::Ready(None),
            // A silent chain, only a timeout gets the consumer out
            None => Poll::Pending,
        }
    }
}

impl Drop for MockEventStream {
    fn drop(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory [`ChainSession`].
#[derive(Default)]
pub struct MockSession {
    statuses: Arc<Mutex<VecDeque<StatusStep>>>,
    chain: Arc<Mutex<Chain>>,
    storage: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    module_errors: Mutex<HashMap<(u8, u8), ModuleError>>,
    submitted: Mutex<Vec<(RuntimeCall, NoncePolicy)>>,
    block_number: Mutex<BlockNumber>,
    status_counters: Arc<Counters>,
    event_counters: Arc<Counters>,
    storage_reads: AtomicUsize,
}

impl MockSession {
    pub fn script_status(&self, status: TxStatus) {
        lock(&self.statuses).push_back(StatusStep::Status(status));
    }

    /// Queue a best-block inclusion carrying `events`.
    pub fn script_inclusion(&self, events: Vec<EventRecord>) {
        let index = lock(&self.statuses).len() as u8;
        self.script_status(TxStatus::InBlock(IncludedBlock {
            block_hash: H256::repeat_byte(0xb0 | (index & 0xf)),
            extrinsic_hash: H256::repeat_byte(0xe0 | (index & 0xf)),
            events,
        }));
    }

    /// Queue a finalization of the last queued inclusion.
    pub fn script_finalization(&self) {
        let included = lock(&self.statuses)
            .iter()
            .rev()
            .find_map(|step| match step {
                StatusStep::Status(TxStatus::InBlock(included)) => Some(included.clone()),
                _ => None,
            })
            .expect("an inclusion is scripted before its finalization");
        self.script_status(TxStatus::Finalized(included));
    }

    /// Queue a block produced between the statuses queued around it.
    pub fn script_block_while_watching(&self, events: Vec<EventRecord>) {
        lock(&self.statuses).push_back(StatusStep::Block(events));
    }

    /// Queue an inclusion whose extrinsic failed with the given module error.
    pub fn script_failure(&self, error: ModuleErrorRef) {
        let dispatch_error = sp_runtime::DispatchError::Module(sp_runtime::ModuleError {
            index: error.pallet_index,
            error: error.error,
            message: None,
        });
        let mut fields = dispatch_error.encode();
        // DispatchInfo { weight, class, pays_fee }, never looked at
        fields.extend_from_slice(&[0; 10]);

        self.script_inclusion(vec![EventRecord {
            pallet: "System".to_string(),
            variant: "ExtrinsicFailed".to_string(),
            fields,
        }]);
    }

    /// Queue a block for event subscribers, produced once one of them asks for it.
    pub fn script_block(&self, events: Vec<EventRecord>) {
        lock(&self.chain)
            .pending
            .push_back(PendingBlock::Block(events));
    }

    /// Produce a block right away; only already open subscriptions will see it live.
    pub fn produce_block(&self, events: Vec<EventRecord>) -> BlockNumber {
        lock(&self.chain).produce(events).number
    }

    /// End the subscription that consumes the blocks queued so far.
    pub fn close_events(&self) {
        lock(&self.chain).pending.push_back(PendingBlock::Close);
    }

    /// Number of blocks produced so far.
    pub fn produced_blocks(&self) -> usize {
        lock(&self.chain).produced.len()
    }

    pub fn set_storage(&self, key: Vec<u8>, value: impl Encode) {
        lock(&self.storage).insert(key, value.encode());
    }

    pub fn set_block_number(&self, number: BlockNumber) {
        *lock(&self.block_number) = number;
    }

    pub fn register_module_error(&self, pallet_index: u8, error_index: u8, error: ModuleError) {
        lock(&self.module_errors).insert((pallet_index, error_index), error);
    }

    /// Calls submitted so far, in order.
    pub fn submitted(&self) -> Vec<RuntimeCall> {
        lock(&self.submitted)
            .iter()
            .map(|(call, _)| call.clone())
            .collect()
    }

    pub fn nonces(&self) -> Vec<NoncePolicy> {
        lock(&self.submitted)
            .iter()
            .map(|(_, nonce)| *nonce)
            .collect()
    }

    pub fn remaining_statuses(&self) -> usize {
        lock(&self.statuses).len()
    }

    pub fn status_subscriptions(&self) -> usize {
        self.status_counters.subscriptions.load(Ordering::SeqCst)
    }

    pub fn status_releases(&self) -> usize {
        self.status_counters.releases.load(Ordering::SeqCst)
    }

    pub fn event_subscriptions(&self) -> usize {
        self.event_counters.subscriptions.load(Ordering::SeqCst)
    }

    pub fn event_releases(&self) -> usize {
        self.event_counters.releases.load(Ordering::SeqCst)
    }

    pub fn storage_reads(&self) -> usize {
        self.storage_reads.load(Ordering::SeqCst)
    }

    fn event_stream(&self, cursor: usize) -> MockEventStream {
        self.event_counters
            .subscriptions
            .fetch_add(1, Ordering::SeqCst);

        MockEventStream {
            chain: Arc::clone(&self.chain),
            cursor,
            counters: Arc::clone(&self.event_counters),
        }
    }
}

impl ChainSession for MockSession {
    type StatusStream = MockStatusStream;
    type EventStream = MockEventStream;

    async fn submit_and_watch<Keypair>(
        &self,
        call: &RuntimeCall,
        _signer: &Keypair,
        nonce: NoncePolicy,
    ) -> Result<Self::StatusStream, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        lock(&self.submitted).push((call.clone(), nonce));
        self.status_counters
            .subscriptions
            .fetch_add(1, Ordering::SeqCst);

        Ok(MockStatusStream {
            script: Arc::clone(&self.statuses),
            chain: Arc::clone(&self.chain),
            counters: Arc::clone(&self.status_counters),
        })
    }

    async fn query_storage(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        self.storage_reads.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.storage).get(key).cloned())
    }

    async fn subscribe_events(&self) -> Result<Self::EventStream, Error> {
        let head = lock(&self.chain).produced.len();
        Ok(self.event_stream(head))
    }

    async fn subscribe_events_from(&self, from: BlockNumber) -> Result<Self::EventStream, Error> {
        // Blocks are numbered from 1
        let head = lock(&self.chain).produced.len();
        let cursor = (from.saturating_sub(1) as usize).min(head);
        Ok(self.event_stream(cursor))
    }

    fn resolve_module_error(&self, error: &ModuleErrorRef) -> Option<ModuleError> {
        lock(&self.module_errors)
            .get(&(error.pallet_index, error.error[0]))
            .cloned()
    }

    async fn block_number(&self, _finalized: bool) -> Result<BlockNumber, Error> {
        Ok(*lock(&self.block_number))
    }
}
