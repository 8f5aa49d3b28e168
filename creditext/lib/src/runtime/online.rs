use std::time::Duration;

use futures::{stream::BoxStream, StreamExt};
use hex::ToHex;
use subxt::{
    backend::{
        legacy::LegacyRpcMethods,
        rpc::reconnecting_rpc_client::{FixedInterval, RpcClient},
    },
    config::DefaultExtrinsicParamsBuilder,
    events::EventDetails,
    tx::{TxInBlock, TxStatus as SubxtTxStatus},
    OnlineClient,
};
use tokio::sync::Mutex;

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

/// [`ChainSession`] backed by a `subxt` client over a reconnecting RPC connection.
pub struct OnlineSession {
    pub(crate) client: OnlineClient<CreditcoinConfig>,
    pub(crate) legacy_rpc: LegacyRpcMethods<CreditcoinConfig>,
    last_sent_nonce: Mutex<u64>,
}

impl OnlineSession {
    /// Connect to the node at `rpc_address`.
    ///
    /// By default, this function does not support insecure URLs,
    /// to enable support for them, use the `insecure_url` feature.
    #[tracing::instrument(skip_all, fields(rpc_address = rpc_address.as_ref()))]
    pub async fn new(
        rpc_address: impl AsRef<str>,
        n_retries: u32,
        retry_interval: Duration,
    ) -> Result<Self, subxt::Error> {
        let rpc_address = rpc_address.as_ref();

        if !cfg!(feature = "insecure_url") && !subxt::utils::url_is_secure(rpc_address)? {
            return Err(subxt::Error::Other(format!(
                "{rpc_address} is not secure, enable the `insecure_url` feature to allow it"
            )));
        }

        let rpc_client = RpcClient::builder()
            // the cast should never pose an issue since creditext is target at 64bit systems
            .retry_policy(FixedInterval::new(retry_interval).take(n_retries as usize))
            .build(rpc_address)
            // subxt-style conversion
            // https://github.com/paritytech/subxt/blob/v0.38.0/subxt/src/backend/rpc/rpc_client.rs#L38
            .await
            .map_err(|e| subxt::error::RpcError::ClientError(Box::new(e)))?;

        Ok(Self {
            client: OnlineClient::<_>::from_rpc_client(rpc_client.clone()).await?,
            legacy_rpc: LegacyRpcMethods::<_>::new(rpc_client.into()),
            last_sent_nonce: Mutex::new(0),
        })
    }
}

fn event_record(details: EventDetails<CreditcoinConfig>) -> EventRecord {
    EventRecord {
        pallet: details.pallet_name().to_string(),
        variant: details.variant_name().to_string(),
        fields: details.field_bytes().to_vec(),
    }
}

async fn included_block(
    tx: TxInBlock<CreditcoinConfig, OnlineClient<CreditcoinConfig>>,
) -> Result<IncludedBlock, Error> {
    let events = tx
        .fetch_events()
        .await?
        .iter()
        .map(|details| details.map(event_record))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IncludedBlock {
        block_hash: tx.block_hash(),
        extrinsic_hash: tx.extrinsic_hash(),
        events,
    })
}

impl ChainSession for OnlineSession {
    type StatusStream = BoxStream<'static, Result<TxStatus, Error>>;
    type EventStream = BoxStream<'static, Result<BlockEvents, Error>>;

    /// Signs and submits `call`, see the nonce notes below.
    ///
    /// ## Nonce mechanism
    ///
    /// With [`NoncePolicy::Next`] the nonce is fetched using `system_account_next_index`
    /// from the **best block**; the returned index accounts for the transactions already
    /// included in blocks and the ones pending in the transaction pool.
    /// To avoid the race condition between the tasks in the same process a critical section
    /// is introduced: the next task is allowed to fetch the next index only after the previous
    /// one has been submitted (txpool updated).
    ///
    /// If another process submits transactions for the same account at the same time,
    /// one of them will be rejected or replaced; retrying is up to the caller.
    async fn submit_and_watch<Keypair>(
        &self,
        call: &RuntimeCall,
        signer: &Keypair,
        nonce: NoncePolicy,
    ) -> Result<Self::StatusStream, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        // Critical Section Start
        let mut last_sent_nonce = self.last_sent_nonce.lock().await;
        let current_nonce = match nonce {
            NoncePolicy::Next => {
                self.legacy_rpc
                    .system_account_next_index(&signer.account_id())
                    .await?
            }
            NoncePolicy::Explicit(nonce) => nonce,
        };
        let current_header = self
            .legacy_rpc
            .chain_get_header(None)
            .await?
            .ok_or_else(|| subxt::Error::Other("best block header is missing".to_string()))?;
        let ext_params = DefaultExtrinsicParamsBuilder::new()
            .mortal(&current_header, 8)
            .nonce(current_nonce)
            .build();

        let progress = self
            .client
            .tx()
            .create_signed_offline(call, signer, ext_params)?
            .submit_and_watch()
            .await?;

        tracing::debug!(
            "Previous nonce: {}, next nonce: {}",
            last_sent_nonce,
            current_nonce
        );
        *last_sent_nonce = current_nonce;
        drop(last_sent_nonce);
        // Critical Section End

        tracing::debug!(
            extrinsic_hash = progress.extrinsic_hash().encode_hex::<String>(),
            "extrinsic submitted"
        );

        Ok(progress
            .then(|status| async move {
                let status = match status? {
                    SubxtTxStatus::InBestBlock(tx) => TxStatus::InBlock(included_block(tx).await?),
                    SubxtTxStatus::InFinalizedBlock(tx) => {
                        TxStatus::Finalized(included_block(tx).await?)
                    }
                    SubxtTxStatus::Error { message }
                    | SubxtTxStatus::Invalid { message }
                    | SubxtTxStatus::Dropped { message } => TxStatus::Rejected(message),
                    _ => TxStatus::Pending,
                };
                Ok::<_, Error>(status)
            })
            .boxed())
    }

    async fn query_storage(&self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self
            .client
            .storage()
            .at_latest()
            .await?
            .fetch_raw(key.to_vec())
            .await?)
    }

    async fn subscribe_events(&self) -> Result<Self::EventStream, Error> {
        let blocks = self.client.blocks().subscribe_best().await?;

        Ok(blocks
            .then(|block| async move {
                let block = block?;
                let events = block
                    .events()
                    .await?
                    .iter()
                    .map(|details| details.map(event_record))
                    .collect::<Result<Vec<_>, _>>()
                .map_err(subxt::Error::from)?;

                Ok::<_, Error>(BlockEvents {
                    block_hash: block.hash(),
                    number: block.number(),
                    events,
                })
            })
            .boxed())
    }

    /// Subscribes first and then walks the blocks from `from` up to the current best
    /// one, so nothing produced while catching up falls between the two.
    #[tracing::instrument(level = "debug", skip(self))]
    async fn subscribe_events_from(&self, from: BlockNumber) -> Result<Self::EventStream, Error> {
        let live = self.subscribe_events().await?;
        let best = self
            .legacy_rpc
            .chain_get_header(None)
            .await?
            .ok_or_else(|| subxt::Error::Other("best block header is missing".to_string()))?
            .number;

        let mut missed = Vec::new();
        for number in from..=best {
            let Some(block_hash) = self
                .legacy_rpc
                .chain_get_block_hash(Some(u64::from(number).into()))
                .await?
            else {
                break;
            };
            let events = self
                .client
                .blocks()
                .at(block_hash)
                .await?
                .events()
                .await?
                .iter()
                .map(|details| details.map(event_record))
                .collect::<Result<Vec<_>, _>>()
                .map_err(subxt::Error::from)?;
            missed.push(Ok(BlockEvents {
                block_hash,
                number,
                events,
            }));
        }
        tracing::debug!(replayed = missed.len(), best, "caught up with the chain");

        // The live stream may still hand out blocks that were just replayed
        let live = live.filter(move |block| {
            futures::future::ready(!matches!(block, Ok(block) if block.number <= best))
        });
        Ok(futures::stream::iter(missed).chain(live).boxed())
    }

    fn resolve_module_error(&self, error: &ModuleErrorRef) -> Option<ModuleError> {
        let metadata = self.client.metadata();
        let pallet = metadata.pallet_by_index(error.pallet_index)?;
        let variant = pallet.error_variant_by_index(error.error[0])?;

        Some(ModuleError {
            pallet: pallet.name().to_string(),
            name: variant.name.clone(),
            docs: variant.docs.join(" "),
        })
    }

    async fn block_number(&self, finalized: bool) -> Result<BlockNumber, Error> {
        let mut block_stream = if finalized {
            self.client.blocks().subscribe_finalized().await?
        } else {
            self.client.blocks().subscribe_best().await?
        };

        // there always exists a block on a running chain
        let block = block_stream.next().await.ok_or(Error::SubscriptionClosed)??;

        Ok(block.number())
    }
}
