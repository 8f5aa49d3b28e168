use std::time::Duration;

use codec::Decode;
use futures::StreamExt;
use hex::ToHex;
use subxt::{ext::sp_runtime, utils::H256};

use crate::{
    error::{DispatchError, Error},
    runtime::{
        calls::RuntimeCall,
        events::{EventRecord, RuntimeEvent, Withdraw, EXTRINSIC_FAILED},
        online::OnlineSession,
        session::{ChainSession, IncludedBlock, Inclusion, ModuleErrorRef, NoncePolicy, TxStatus},
    },
    AccountId, Balance, CreditcoinConfig,
};

/// Options for [`Client::traced_submission`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    pub nonce: NoncePolicy,
    pub inclusion: Inclusion,
}

impl SubmitOptions {
    /// Wait for finalization instead of best-block inclusion.
    pub fn finalized() -> Self {
        Self {
            inclusion: Inclusion::Finalized,
            ..Default::default()
        }
    }
}

impl From<bool> for SubmitOptions {
    /// `wait_for_finalization` flag, as taken by the CLI.
    fn from(wait_for_finalization: bool) -> Self {
        if wait_for_finalization {
            Self::finalized()
        } else {
            Self::default()
        }
    }
}

/// Helper type for [`Client::traced_submission`] successful results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Submission block hash.
    pub hash: H256,

    pub extrinsic_hash: H256,

    /// Resulting extrinsic's events.
    pub events: Vec<EventRecord>,
}

impl SubmissionResult {
    /// Decode every event of type `E`, in emission order.
    pub fn find<E: RuntimeEvent>(&self) -> Result<Vec<E>, Error> {
        self.events
            .iter()
            .filter_map(EventRecord::as_event::<E>)
            .collect()
    }

    /// Decode the first event of type `E`, erroring if there is none.
    pub fn find_first<E: RuntimeEvent>(&self) -> Result<E, Error> {
        self.events
            .iter()
            .find_map(EventRecord::as_event::<E>)
            .unwrap_or(Err(Error::MissingEvent {
                pallet: E::PALLET,
                event: E::EVENT,
            }))
    }

    /// Fee charged to `who` for this extrinsic, taken from `Balances::Withdraw`.
    pub fn fee_paid(&self, who: &AccountId) -> Result<Balance, Error> {
        self.find::<Withdraw>()?
            .into_iter()
            .find(|withdraw| &withdraw.who == who)
            .map(|withdraw| withdraw.amount)
            .ok_or(Error::MissingEvent {
                pallet: Withdraw::PALLET,
                event: Withdraw::EVENT,
            })
    }
}

/// A value produced by an extrinsic, along with the submission that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted<T> {
    pub value: T,
    pub submission: SubmissionResult,
}

impl<T> Submitted<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Resolution state of one submission. Moves out of `Pending` at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Pending,
    Failed(DispatchError),
    Succeeded(SubmissionResult),
}

impl SubmissionState {
    pub fn into_result(self) -> Result<SubmissionResult, Error> {
        match self {
            SubmissionState::Pending => Err(Error::SubscriptionClosed),
            SubmissionState::Failed(error) => Err(Error::Dispatch(error)),
            SubmissionState::Succeeded(result) => Ok(result),
        }
    }
}

/// Decode the leading `DispatchError` of `System::ExtrinsicFailed` fields.
pub(crate) fn decode_dispatch_error<S: ChainSession>(session: &S, mut raw: &[u8]) -> DispatchError {
    match sp_runtime::DispatchError::decode(&mut raw) {
        Ok(sp_runtime::DispatchError::Module(module)) => {
            let error_ref = ModuleErrorRef {
                pallet_index: module.index,
                error: module.error,
            };
            session
                .resolve_module_error(&error_ref)
                .map(DispatchError::Module)
                .unwrap_or_else(|| DispatchError::Other(format!("{error_ref:?}")))
        }
        Ok(other) => DispatchError::Other(format!("{other:?}")),
        Err(err) => DispatchError::Other(format!("undecodable dispatch error: {err}")),
    }
}

/// Client to interact with the Creditcoin runtime.
/// You can call any extrinsic via [`Client::traced_submission`].
pub struct Client<S = OnlineSession> {
    pub(crate) session: S,
}

impl Client {
    /// Create a new [`Client`] from a target `rpc_address`.
    ///
    /// By default, this function does not support insecure URLs,
    /// to enable support for them, use the `insecure_url` feature.
    pub async fn new(
        rpc_address: impl AsRef<str>,
        n_retries: u32,
        retry_interval: Duration,
    ) -> Result<Self, subxt::Error> {
        Ok(Self {
            session: OnlineSession::new(rpc_address, n_retries, retry_interval).await?,
        })
    }
}

impl<S> From<S> for Client<S>
where
    S: ChainSession,
{
    fn from(session: S) -> Self {
        Self { session }
    }
}

impl<S> Client<S>
where
    S: ChainSession,
{
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Submit an extrinsic and wait until it is included, returning its block and events.
    ///
    /// The status subscription is released as soon as the first terminal status is seen:
    /// inclusion (best block or finalized, as per [`SubmitOptions::inclusion`]),
    /// or rejection from the transaction pool.
    /// A `System::ExtrinsicFailed` event turns the result into [`Error::Dispatch`],
    /// with module errors resolved through the chain metadata.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            call = %call,
            address = %account_keypair.account_id(),
        )
    )]
    pub async fn traced_submission<Keypair>(
        &self,
        call: &RuntimeCall,
        account_keypair: &Keypair,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        tracing::trace!("submitting extrinsic");
        let mut statuses = self
            .session
            .submit_and_watch(call, account_keypair, options.nonce)
            .await?;

        let mut included: Option<IncludedBlock> = None;
        while let Some(status) = statuses.next().await {
            match status? {
                TxStatus::Pending => tracing::trace!("extrinsic pending"),
                TxStatus::InBlock(block) if options.inclusion == Inclusion::InBlock => {
                    included = Some(block);
                    break;
                }
                TxStatus::InBlock(block) => {
                    tracing::debug!(
                        block_hash = block.block_hash.encode_hex::<String>(),
                        "included in best block, waiting for finalization"
                    );
                }
                TxStatus::Finalized(block) => {
                    included = Some(block);
                    break;
                }
                TxStatus::Rejected(reason) => {
                    tracing::debug!(reason = %reason, "extrinsic rejected");
                    return Err(Error::Rejected(reason));
                }
            }
        }
        // Unsubscribe before looking at the result
        drop(statuses);

        let state = match included {
            Some(block) => self.settle(block),
            None => SubmissionState::Pending,
        };
        state.into_result()
    }

    fn settle(&self, block: IncludedBlock) -> SubmissionState {
        tracing::debug!(
            block_hash = block.block_hash.encode_hex::<String>(),
            extrinsic_hash = block.extrinsic_hash.encode_hex::<String>(),
            "extrinsic included"
        );

        let (pallet, variant) = EXTRINSIC_FAILED;
        let failure = block
            .events
            .iter()
            .find(|event| event.pallet == pallet && event.variant == variant);

        if let Some(failure) = failure {
            let error = decode_dispatch_error(&self.session, &failure.fields);
            // debug level since we're returning the error upwards
            tracing::debug!("found a failing extrinsic: {}", error);
            return SubmissionState::Failed(error);
        }

        SubmissionState::Succeeded(SubmissionResult {
            hash: block.block_hash,
            extrinsic_hash: block.extrinsic_hash,
            events: block.events,
        })
    }
}

#[cfg(test)]
mod test {
    use codec::Encode;
    use subxt::ext::sp_core::{sr25519, Pair};

    use super::*;
    use crate::{
        error::ModuleError,
        ids::DealOrderId,
        runtime::{
            calls::LockDealOrder,
            events::{DealOrderLocked, TransferProcessed},
        },
        testing::{alice, MockSession},
    };

    fn lock_call() -> RuntimeCall {
        LockDealOrder {
            deal_order_id: DealOrderId(5, H256::repeat_byte(5)),
        }
        .into()
    }

    fn address_already_registered() -> ModuleError {
        ModuleError {
            pallet: "Creditcoin".to_string(),
            name: "AddressAlreadyRegistered".to_string(),
            docs: "The specified address has already been registered to another account"
                .to_string(),
        }
    }

    #[tokio::test]
    async fn success_resolves_once_and_releases_subscription() {
        let session = MockSession::default();
        let locked = DealOrderLocked(DealOrderId(5, H256::repeat_byte(5)));
        session.script_inclusion(vec![EventRecord::new(&locked)]);
        // Anything after the terminal status must not be consumed
        session.script_status(TxStatus::Rejected("late".to_string()));

        let client = Client::from(session);
        let result = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(result.find_first::<DealOrderLocked>().unwrap(), locked);
        assert_eq!(client.session.status_subscriptions(), 1);
        assert_eq!(client.session.status_releases(), 1);
        assert_eq!(client.session.remaining_statuses(), 1);
        assert_eq!(client.session.submitted(), vec![lock_call()]);
    }

    #[tokio::test]
    async fn dispatch_error_is_resolved_through_metadata() {
        let session = MockSession::default();
        session.register_module_error(8, 0, address_already_registered());
        session.script_failure(ModuleErrorRef {
            pallet_index: 8,
            error: [0, 0, 0, 0],
        });

        let client = Client::from(session);
        let error = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap_err();

        assert!(error
            .to_string()
            .contains("creditcoin.AddressAlreadyRegistered"));
        assert_eq!(error.module_error(), Some(&address_already_registered()));
        assert_eq!(client.session.status_subscriptions(), 1);
        assert_eq!(client.session.status_releases(), 1);
    }

    #[tokio::test]
    async fn unknown_module_error_falls_back_to_raw_form() {
        let session = MockSession::default();
        session.script_failure(ModuleErrorRef {
            pallet_index: 99,
            error: [3, 0, 0, 0],
        });

        let client = Client::from(session);
        let error = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap_err();

        let Error::Dispatch(DispatchError::Other(raw)) = error else {
            panic!("expected a raw dispatch error, got {error:?}");
        };
        assert!(raw.contains("pallet_index: 99"));
    }

    #[tokio::test]
    async fn non_module_dispatch_error_is_stringified() {
        let session = MockSession::default();
        let mut fields = sp_runtime::DispatchError::BadOrigin.encode();
        // trailing DispatchInfo is ignored
        fields.extend_from_slice(&[0; 10]);
        session.script_inclusion(vec![EventRecord {
            pallet: "System".to_string(),
            variant: "ExtrinsicFailed".to_string(),
            fields,
        }]);

        let client = Client::from(session);
        let error = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::Dispatch(DispatchError::Other(ref raw)) if raw == "BadOrigin"
        ));
    }

    #[tokio::test]
    async fn missing_event_is_not_a_dispatch_failure() {
        let session = MockSession::default();
        session.script_inclusion(vec![]);

        let client = Client::from(session);
        let result = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap();

        assert!(matches!(
            result.find_first::<TransferProcessed>(),
            Err(Error::MissingEvent {
                pallet: "Creditcoin",
                event: "TransferProcessed"
            })
        ));
        assert_eq!(client.session.status_releases(), 1);
    }

    #[tokio::test]
    async fn pool_rejection_is_terminal() {
        let session = MockSession::default();
        session.script_status(TxStatus::Pending);
        session.script_status(TxStatus::Rejected("Priority is too low".to_string()));
        session.script_inclusion(vec![]);

        let client = Client::from(session);
        let error = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Rejected(reason) if reason == "Priority is too low"));
        assert_eq!(client.session.status_subscriptions(), 1);
        assert_eq!(client.session.status_releases(), 1);
        assert_eq!(client.session.remaining_statuses(), 1);
    }

    #[tokio::test]
    async fn closed_stream_without_terminal_status() {
        let session = MockSession::default();
        session.script_status(TxStatus::Pending);

        let client = Client::from(session);
        let error = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(error, Error::SubscriptionClosed));
        assert_eq!(client.session.status_subscriptions(), 1);
        assert_eq!(client.session.status_releases(), 1);
    }

    #[tokio::test]
    async fn finalized_inclusion_skips_best_block() {
        let session = MockSession::default();
        session.script_inclusion(vec![]);
        let finalized = IncludedBlock {
            block_hash: H256::repeat_byte(0xf),
            extrinsic_hash: H256::repeat_byte(1),
            events: vec![],
        };
        session.script_status(TxStatus::Finalized(finalized));

        let client = Client::from(session);
        let result = client
            .traced_submission(&lock_call(), &alice(), SubmitOptions::finalized())
            .await
            .unwrap();

        assert_eq!(result.hash, H256::repeat_byte(0xf));
        assert_eq!(client.session.status_releases(), 1);
    }

    #[tokio::test]
    async fn explicit_nonce_is_forwarded() {
        let session = MockSession::default();
        session.script_inclusion(vec![]);

        let client = Client::from(session);
        client
            .traced_submission(
                &lock_call(),
                &alice(),
                SubmitOptions {
                    nonce: NoncePolicy::Explicit(7),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(client.session.nonces(), vec![NoncePolicy::Explicit(7)]);
    }

    #[test]
    fn fee_is_the_signers_withdrawal() {
        let alice = sr25519::Pair::from_string("//Alice", None).unwrap();
        let bob = sr25519::Pair::from_string("//Bob", None).unwrap();
        let alice_id = AccountId::from(alice.public().0);
        let bob_id = AccountId::from(bob.public().0);

        let result = SubmissionResult {
            hash: H256::zero(),
            extrinsic_hash: H256::zero(),
            events: vec![
                EventRecord::new(&Withdraw {
                    who: bob_id.clone(),
                    amount: 5,
                }),
                EventRecord::new(&Withdraw {
                    who: alice_id.clone(),
                    amount: crate::POINT_01_CTC,
                }),
            ],
        };

        assert_eq!(result.fee_paid(&alice_id).unwrap(), crate::POINT_01_CTC);
        assert_eq!(result.fee_paid(&bob_id).unwrap(), 5);

        let stranger = AccountId::from([7; 32]);
        assert!(matches!(
            result.fee_paid(&stranger),
            Err(Error::MissingEvent {
                pallet: "Balances",
                event: "Withdraw"
            })
        ));
    }
}
