use std::{fmt, future::Future};

use codec::{Decode, DecodeAll};
use subxt::{ext::sp_core::ecdsa, utils::Static};

use crate::{
    error::Error,
    ids::{
        AddressId, AskOrderId, BidOrderId, BurnGateId, CollectedCoinsId, DealOrderId, OfferId,
        TransferId,
    },
    runtime::{
        calls::{
            AddAskOrder, AddBidOrder, AddDealOrder, AddOffer, ClaimLegacyWallet, CloseDealOrder,
            Exempt, FailTask, FundDealOrder, LockDealOrder, PersistTaskOutput, RegisterAddress,
            RegisterAddressV2, RegisterDealOrder, RegisterFundingTransfer,
            RegisterRepaymentTransfer, RequestBurnGate, RequestCollectCoins,
            RequestCollectCoinsV2, RuntimeCall,
        },
        client::{Client, SubmissionResult, SubmitOptions, Submitted},
        events::{
            AddressRegistered, AskOrderAdded, BidOrderAdded, BurnGATERegistered,
            CollectCoinsRegistered, DealOrderAdded, DealOrderClosed, DealOrderFunded,
            DealOrderLocked, LegacyWalletClaimed, LoanExempted, OfferAdded, RuntimeEvent,
            TransferProcessed, TransferRegistered,
        },
        session::ChainSession,
        storage,
        verification::{
            BurnGateHandle, CollectCoinsHandle, TransferHandle, Verifiable, VerifiableHandle,
        },
    },
    types::{
        Address, AskOrder, BidOrder, Blockchain, BurnedGate, CollectedCoins, DealOrder,
        ExternalAddress, ExternalTxId, LoanTerms, Offer, OwnershipProof, TaskId, TaskOutput,
        TokenContract, Transfer, TransferKind, VerificationFailureCause, U256,
    },
    AccountId, BlockNumber, CreditcoinConfig,
};

/// Everything `register_deal_order` creates in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDealOrder {
    pub ask_order: (AskOrderId, AskOrder),
    pub bid_order: (BidOrderId, BidOrder),
    pub offer: (OfferId, Offer),
    pub deal_order: (DealOrderId, DealOrder),
}

/// Compare a locally derived id against the one the chain emitted.
///
/// The chain's id wins, a mismatch usually means the runtime changed its hashing.
fn check_id<Id>(kind: &str, local: Id, chain: Id) -> Id
where
    Id: PartialEq + fmt::Display,
{
    if local != chain {
        tracing::warn!(%local, %chain, "locally derived {kind} id does not match the chain's");
    }
    chain
}

/// Client to interact with the Creditcoin pallet extrinsics and storage.
pub trait CreditcoinClientExt {
    type Session: ChainSession;

    /// Register an external address, proving ownership with an ECDSA signature
    /// over the signer's account id (see [`crate::signing::sign_account_id`]).
    fn register_address<Keypair>(
        &self,
        account_keypair: &Keypair,
        blockchain: Blockchain,
        address: ExternalAddress,
        ownership_proof: [u8; 65],
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(AddressId, Address)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Register an external address with a wallet-produced ownership proof.
    fn register_address_v2<Keypair>(
        &self,
        account_keypair: &Keypair,
        blockchain: Blockchain,
        address: ExternalAddress,
        ownership_proof: OwnershipProof,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(AddressId, Address)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn add_ask_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        address_id: AddressId,
        terms: LoanTerms,
        expiration_block: BlockNumber,
        guid: Vec<u8>,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(AskOrderId, AskOrder)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn add_bid_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        address_id: AddressId,
        terms: LoanTerms,
        expiration_block: BlockNumber,
        guid: Vec<u8>,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(BidOrderId, BidOrder)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Match an ask order with a bid order, submitted by the lender.
    fn add_offer<Keypair>(
        &self,
        account_keypair: &Keypair,
        ask_order_id: AskOrderId,
        bid_order_id: BidOrderId,
        expiration_block: BlockNumber,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(OfferId, Offer)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Accept an offer, submitted by the borrower.
    fn add_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        offer_id: OfferId,
        expiration_block: BlockNumber,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(DealOrderId, DealOrder)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Create the ask, bid, offer and deal in a single extrinsic.
    ///
    /// Submitted by the lender; `borrower_signature` must be produced with
    /// [`crate::signing::sign_loan_params`].
    fn register_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal: RegisterDealOrder,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<RegisteredDealOrder>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn lock_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<DealOrderId>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Fund a deal with a verified transfer; both the deal and the transfer are consumed.
    ///
    /// The extrinsic must report `transfer_id` as the processed transfer, any other
    /// transfer is an [`Error::EventMismatch`] even though the extrinsic went through.
    fn fund_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        transfer_id: TransferId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<DealOrderId>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Register the lender's funding transfer, to be verified by an authority.
    fn register_funding_transfer<Keypair>(
        &self,
        account_keypair: &Keypair,
        transfer_kind: TransferKind,
        deal_order_id: DealOrderId,
        blockchain_tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<TransferHandle<'_, Self::Session>>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Register the borrower's repayment transfer, to be verified by an authority.
    fn register_repayment_transfer<Keypair>(
        &self,
        account_keypair: &Keypair,
        transfer_kind: TransferKind,
        repayment_amount: U256,
        deal_order_id: DealOrderId,
        blockchain_tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<TransferHandle<'_, Self::Session>>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn close_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        transfer_id: TransferId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<DealOrderId>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Forgive the rest of the loan, submitted by the lender.
    fn exempt<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<DealOrderId>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Move the balance of a pre-mainnet wallet to the signer.
    fn claim_legacy_wallet<Keypair>(
        &self,
        account_keypair: &Keypair,
        public_key: ecdsa::Public,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<LegacyWalletClaimed>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Request minting CTC for a token burn on the collection contract's chain.
    fn request_collect_coins<Keypair>(
        &self,
        account_keypair: &Keypair,
        evm_address: ExternalAddress,
        tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<CollectCoinsHandle<'_, Self::Session>>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Request minting CTC for a GCRE or GATE burn.
    ///
    /// Both tokens end up in `CollectedCoins`, see [`CollectedCoins::contract_type`].
    fn request_collect_coins_v2<Keypair>(
        &self,
        account_keypair: &Keypair,
        contract: TokenContract,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<CollectCoinsHandle<'_, Self::Session>>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Swap a GATE burn for CTC paid by the faucet set with
    /// [`set_gate_faucet`](crate::SudoClientExt::set_gate_faucet).
    fn request_burn_gate<Keypair>(
        &self,
        account_keypair: &Keypair,
        evm_address: ExternalAddress,
        tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<BurnGateHandle<'_, Self::Session>>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Authority only.
    fn persist_task_output<Keypair>(
        &self,
        account_keypair: &Keypair,
        deadline: BlockNumber,
        task_output: TaskOutput,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Authority only.
    fn fail_task<Keypair>(
        &self,
        account_keypair: &Keypair,
        deadline: BlockNumber,
        task_id: TaskId,
        cause: VerificationFailureCause,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn address(&self, id: AddressId) -> impl Future<Output = Result<Option<Address>, Error>>;

    fn transfer(&self, id: TransferId) -> impl Future<Output = Result<Option<Transfer>, Error>>;

    fn collected_coins(
        &self,
        id: CollectedCoinsId,
    ) -> impl Future<Output = Result<Option<CollectedCoins>, Error>>;

    fn burned_gate(
        &self,
        id: BurnGateId,
    ) -> impl Future<Output = Result<Option<BurnedGate>, Error>>;

    fn ask_order(&self, id: AskOrderId) -> impl Future<Output = Result<Option<AskOrder>, Error>>;

    fn bid_order(&self, id: BidOrderId) -> impl Future<Output = Result<Option<BidOrder>, Error>>;

    fn offer(&self, id: OfferId) -> impl Future<Output = Result<Option<Offer>, Error>>;

    fn deal_order(&self, id: DealOrderId)
        -> impl Future<Output = Result<Option<DealOrder>, Error>>;

    fn is_authority(&self, who: &AccountId) -> impl Future<Output = Result<bool, Error>>;
}

impl<S> Client<S>
where
    S: ChainSession,
{
    async fn read<T: Decode>(&self, key: Vec<u8>) -> Result<Option<T>, Error> {
        self.session
            .query_storage(&key)
            .await?
            .map(|raw| T::decode_all(&mut raw.as_slice()).map_err(Error::from))
            .transpose()
    }

    async fn registered_address<Keypair>(
        &self,
        account_keypair: &Keypair,
        call: RuntimeCall,
        local_id: AddressId,
        options: SubmitOptions,
    ) -> Result<Submitted<(AddressId, Address)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let submission = self
            .traced_submission(&call, account_keypair, options)
            .await?;
        let AddressRegistered(id, address) = submission.find_first()?;
        let id = check_id("address", local_id, id);
        Ok(Submitted {
            value: (id, address),
            submission,
        })
    }

    /// Submit a call whose effect an authority verifies later.
    ///
    /// Block events are subscribed to before submitting: with finalized inclusion
    /// the authority may answer before the submission settles.
    async fn verifiable_submission<Keypair, V>(
        &self,
        account_keypair: &Keypair,
        call: RuntimeCall,
        options: SubmitOptions,
        registered: impl FnOnce(&SubmissionResult) -> Result<V::Id, Error>,
    ) -> Result<Submitted<VerifiableHandle<'_, S, V>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
        V: Verifiable,
    {
        let events = self.session.subscribe_events().await?;
        let submission = self
            .traced_submission(&call, account_keypair, options)
            .await?;
        let id = registered(&submission)?;
        tracing::debug!(entry = V::ENTRY, %id, "registered, waiting for verification");

        Ok(Submitted {
            value: VerifiableHandle::with_events(&self.session, id, events),
            submission,
        })
    }

    async fn registered_transfer<Keypair>(
        &self,
        account_keypair: &Keypair,
        call: RuntimeCall,
        options: SubmitOptions,
    ) -> Result<Submitted<TransferHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        self.verifiable_submission(account_keypair, call, options, |submission| {
            let TransferRegistered(id, transfer) = submission.find_first()?;
            Ok(check_id(
                "transfer",
                TransferId::new(&transfer.blockchain, &transfer.tx_id),
                id,
            ))
        })
        .await
    }

    async fn registered_collection<Keypair>(
        &self,
        account_keypair: &Keypair,
        call: RuntimeCall,
        options: SubmitOptions,
    ) -> Result<Submitted<CollectCoinsHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        self.verifiable_submission(account_keypair, call, options, |submission| {
            let CollectCoinsRegistered(id, pending) = submission.find_first()?;
            Ok(check_id(
                "collected coins",
                CollectedCoinsId::new(&pending.contract.chain, &pending.tx_id),
                id,
            ))
        })
        .await
    }

    async fn deal_order_event<Keypair, E>(
        &self,
        account_keypair: &Keypair,
        call: RuntimeCall,
        options: SubmitOptions,
        deal_order_id: impl FnOnce(E) -> DealOrderId,
    ) -> Result<Submitted<DealOrderId>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
        E: RuntimeEvent,
    {
        let submission = self
            .traced_submission(&call, account_keypair, options)
            .await?;
        let id = deal_order_id(submission.find_first::<E>()?);
        Ok(Submitted {
            value: id,
            submission,
        })
    }
}

impl<S> CreditcoinClientExt for Client<S>
where
    S: ChainSession,
{
    type Session = S;

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            blockchain = %blockchain,
            external_address = hex::encode(&address),
        )
    )]
    async fn register_address<Keypair>(
        &self,
        account_keypair: &Keypair,
        blockchain: Blockchain,
        address: ExternalAddress,
        ownership_proof: [u8; 65],
        options: SubmitOptions,
    ) -> Result<Submitted<(AddressId, Address)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = AddressId::new(&blockchain, &address);
        let call = RegisterAddress {
            blockchain,
            address,
            ownership_proof,
        };
        self.registered_address(account_keypair, call.into(), local_id, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            blockchain = %blockchain,
            external_address = hex::encode(&address),
        )
    )]
    async fn register_address_v2<Keypair>(
        &self,
        account_keypair: &Keypair,
        blockchain: Blockchain,
        address: ExternalAddress,
        ownership_proof: OwnershipProof,
        options: SubmitOptions,
    ) -> Result<Submitted<(AddressId, Address)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = AddressId::new(&blockchain, &address);
        let call = RegisterAddressV2 {
            blockchain,
            address,
            ownership_proof,
        };
        self.registered_address(account_keypair, call.into(), local_id, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            address_id = %address_id,
            expiration_block = expiration_block,
        )
    )]
    async fn add_ask_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        address_id: AddressId,
        terms: LoanTerms,
        expiration_block: BlockNumber,
        guid: Vec<u8>,
        options: SubmitOptions,
    ) -> Result<Submitted<(AskOrderId, AskOrder)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = AskOrderId::new(expiration_block, &guid);
        let call = AddAskOrder {
            address_id,
            terms,
            expiration_block,
            guid,
        };
        let submission = self
            .traced_submission(&call.into(), account_keypair, options)
            .await?;

        let AskOrderAdded(id, order) = submission.find_first()?;
        Ok(Submitted {
            value: (check_id("ask order", local_id, id), order),
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            address_id = %address_id,
            expiration_block = expiration_block,
        )
    )]
    async fn add_bid_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        address_id: AddressId,
        terms: LoanTerms,
        expiration_block: BlockNumber,
        guid: Vec<u8>,
        options: SubmitOptions,
    ) -> Result<Submitted<(BidOrderId, BidOrder)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = BidOrderId::new(expiration_block, &guid);
        let call = AddBidOrder {
            address_id,
            terms,
            expiration_block,
            guid,
        };
        let submission = self
            .traced_submission(&call.into(), account_keypair, options)
            .await?;

        let BidOrderAdded(id, order) = submission.find_first()?;
        Ok(Submitted {
            value: (check_id("bid order", local_id, id), order),
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            ask_order_id = %ask_order_id,
            bid_order_id = %bid_order_id,
        )
    )]
    async fn add_offer<Keypair>(
        &self,
        account_keypair: &Keypair,
        ask_order_id: AskOrderId,
        bid_order_id: BidOrderId,
        expiration_block: BlockNumber,
        options: SubmitOptions,
    ) -> Result<Submitted<(OfferId, Offer)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = OfferId::new(expiration_block, &ask_order_id, &bid_order_id);
        let call = AddOffer {
            ask_order_id,
            bid_order_id,
            expiration_block,
        };
        let submission = self
            .traced_submission(&call.into(), account_keypair, options)
            .await?;

        let OfferAdded(id, offer) = submission.find_first()?;
        Ok(Submitted {
            value: (check_id("offer", local_id, id), offer),
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            offer_id = %offer_id,
        )
    )]
    async fn add_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        offer_id: OfferId,
        expiration_block: BlockNumber,
        options: SubmitOptions,
    ) -> Result<Submitted<(DealOrderId, DealOrder)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = DealOrderId::new(expiration_block, &offer_id);
        let call = AddDealOrder {
            offer_id,
            expiration_block,
        };
        let submission = self
            .traced_submission(&call.into(), account_keypair, options)
            .await?;

        let DealOrderAdded(id, deal_order) = submission.find_first()?;
        Ok(Submitted {
            value: (check_id("deal order", local_id, id), deal_order),
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            lender_address_id = %deal.lender_address_id,
            borrower_address_id = %deal.borrower_address_id,
        )
    )]
    async fn register_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal: RegisterDealOrder,
        options: SubmitOptions,
    ) -> Result<Submitted<RegisteredDealOrder>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let ask_id = AskOrderId::new(deal.expiration_block, &deal.ask_guid);
        let bid_id = BidOrderId::new(deal.expiration_block, &deal.bid_guid);
        let offer_id = OfferId::new(deal.expiration_block, &ask_id, &bid_id);
        let deal_order_id = DealOrderId::new(deal.expiration_block, &offer_id);

        let submission = self
            .traced_submission(&deal.into(), account_keypair, options)
            .await?;

        let AskOrderAdded(chain_ask_id, ask_order) = submission.find_first()?;
        let BidOrderAdded(chain_bid_id, bid_order) = submission.find_first()?;
        let OfferAdded(chain_offer_id, offer) = submission.find_first()?;
        let DealOrderAdded(chain_deal_order_id, deal_order) = submission.find_first()?;

        Ok(Submitted {
            value: RegisteredDealOrder {
                ask_order: (check_id("ask order", ask_id, chain_ask_id), ask_order),
                bid_order: (check_id("bid order", bid_id, chain_bid_id), bid_order),
                offer: (check_id("offer", offer_id, chain_offer_id), offer),
                deal_order: (
                    check_id("deal order", deal_order_id, chain_deal_order_id),
                    deal_order,
                ),
            },
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deal_order_id = %deal_order_id,
        )
    )]
    async fn lock_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        options: SubmitOptions,
    ) -> Result<Submitted<DealOrderId>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = LockDealOrder { deal_order_id };
        self.deal_order_event(
            account_keypair,
            call.into(),
            options,
            |DealOrderLocked(id): DealOrderLocked| id,
        )
        .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deal_order_id = %deal_order_id,
            transfer_id = %transfer_id,
        )
    )]
    async fn fund_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        transfer_id: TransferId,
        options: SubmitOptions,
    ) -> Result<Submitted<DealOrderId>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = FundDealOrder {
            deal_order_id,
            transfer_id,
        };
        let submission = self
            .traced_submission(&call.into(), account_keypair, options)
            .await?;

        let DealOrderFunded(id) = submission.find_first()?;
        let TransferProcessed(processed) = submission.find_first()?;
        if processed != transfer_id {
            return Err(Error::EventMismatch {
                pallet: TransferProcessed::PALLET,
                event: TransferProcessed::EVENT,
                expected: transfer_id.to_string(),
                found: processed.to_string(),
            });
        }

        Ok(Submitted {
            value: id,
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deal_order_id = %deal_order_id,
            blockchain_tx_id = hex::encode(&blockchain_tx_id),
        )
    )]
    async fn register_funding_transfer<Keypair>(
        &self,
        account_keypair: &Keypair,
        transfer_kind: TransferKind,
        deal_order_id: DealOrderId,
        blockchain_tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> Result<Submitted<TransferHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = RegisterFundingTransfer {
            transfer_kind,
            deal_order_id,
            blockchain_tx_id,
        };
        self.registered_transfer(account_keypair, call.into(), options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deal_order_id = %deal_order_id,
            repayment_amount = %repayment_amount,
            blockchain_tx_id = hex::encode(&blockchain_tx_id),
        )
    )]
    async fn register_repayment_transfer<Keypair>(
        &self,
        account_keypair: &Keypair,
        transfer_kind: TransferKind,
        repayment_amount: U256,
        deal_order_id: DealOrderId,
        blockchain_tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> Result<Submitted<TransferHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = RegisterRepaymentTransfer {
            transfer_kind,
            repayment_amount,
            deal_order_id,
            blockchain_tx_id,
        };
        self.registered_transfer(account_keypair, call.into(), options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deal_order_id = %deal_order_id,
            transfer_id = %transfer_id,
        )
    )]
    async fn close_deal_order<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        transfer_id: TransferId,
        options: SubmitOptions,
    ) -> Result<Submitted<DealOrderId>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = CloseDealOrder {
            deal_order_id,
            transfer_id,
        };
        self.deal_order_event(
            account_keypair,
            call.into(),
            options,
            |DealOrderClosed(id): DealOrderClosed| id,
        )
        .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deal_order_id = %deal_order_id,
        )
    )]
    async fn exempt<Keypair>(
        &self,
        account_keypair: &Keypair,
        deal_order_id: DealOrderId,
        options: SubmitOptions,
    ) -> Result<Submitted<DealOrderId>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = Exempt { deal_order_id };
        self.deal_order_event(
            account_keypair,
            call.into(),
            options,
            |LoanExempted(id): LoanExempted| id,
        )
        .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            public_key = hex::encode(&public_key),
        )
    )]
    async fn claim_legacy_wallet<Keypair>(
        &self,
        account_keypair: &Keypair,
        public_key: ecdsa::Public,
        options: SubmitOptions,
    ) -> Result<Submitted<LegacyWalletClaimed>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = ClaimLegacyWallet {
            public_key: Static(public_key),
        };
        let submission = self
            .traced_submission(&call.into(), account_keypair, options)
            .await?;

        Ok(Submitted {
            value: submission.find_first()?,
            submission,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            evm_address = hex::encode(&evm_address),
            tx_id = hex::encode(&tx_id),
        )
    )]
    async fn request_collect_coins<Keypair>(
        &self,
        account_keypair: &Keypair,
        evm_address: ExternalAddress,
        tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> Result<Submitted<CollectCoinsHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = RequestCollectCoins { evm_address, tx_id };
        self.registered_collection(account_keypair, call.into(), options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            contract_type = ?contract.contract_type(),
            evm_address = hex::encode(contract.evm_address()),
            tx_id = hex::encode(contract.tx_id()),
        )
    )]
    async fn request_collect_coins_v2<Keypair>(
        &self,
        account_keypair: &Keypair,
        contract: TokenContract,
        options: SubmitOptions,
    ) -> Result<Submitted<CollectCoinsHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = RequestCollectCoinsV2 { contract };
        self.registered_collection(account_keypair, call.into(), options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            evm_address = hex::encode(&evm_address),
            tx_id = hex::encode(&tx_id),
        )
    )]
    async fn request_burn_gate<Keypair>(
        &self,
        account_keypair: &Keypair,
        evm_address: ExternalAddress,
        tx_id: ExternalTxId,
        options: SubmitOptions,
    ) -> Result<Submitted<BurnGateHandle<'_, S>>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = RequestBurnGate { evm_address, tx_id };
        self.verifiable_submission(account_keypair, call.into(), options, |submission| {
            let BurnGATERegistered(id, pending) = submission.find_first()?;
            Ok(check_id(
                "burn GATE",
                BurnGateId::new(&pending.contract.chain, &pending.tx_id),
                id,
            ))
        })
        .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deadline = deadline,
            task_id = ?task_output.task_id(),
        )
    )]
    async fn persist_task_output<Keypair>(
        &self,
        account_keypair: &Keypair,
        deadline: BlockNumber,
        task_output: TaskOutput,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = PersistTaskOutput {
            deadline,
            task_output,
        };
        self.traced_submission(&call.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            deadline = deadline,
            task_id = ?task_id,
            cause = %cause,
        )
    )]
    async fn fail_task<Keypair>(
        &self,
        account_keypair: &Keypair,
        deadline: BlockNumber,
        task_id: TaskId,
        cause: VerificationFailureCause,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = FailTask {
            deadline,
            task_id,
            cause,
        };
        self.traced_submission(&call.into(), account_keypair, options)
            .await
    }

    async fn address(&self, id: AddressId) -> Result<Option<Address>, Error> {
        self.read(storage::addresses(&id)).await
    }

    async fn transfer(&self, id: TransferId) -> Result<Option<Transfer>, Error> {
        self.read(storage::transfers(&id)).await
    }

    async fn collected_coins(&self, id: CollectedCoinsId) -> Result<Option<CollectedCoins>, Error> {
        self.read(storage::collected_coins(&id)).await
    }

    async fn burned_gate(&self, id: BurnGateId) -> Result<Option<BurnedGate>, Error> {
        self.read(storage::burned_gate(&id)).await
    }

    async fn ask_order(&self, id: AskOrderId) -> Result<Option<AskOrder>, Error> {
        self.read(storage::ask_orders(&id)).await
    }

    async fn bid_order(&self, id: BidOrderId) -> Result<Option<BidOrder>, Error> {
        self.read(storage::bid_orders(&id)).await
    }

    async fn offer(&self, id: OfferId) -> Result<Option<Offer>, Error> {
        self.read(storage::offers(&id)).await
    }

    async fn deal_order(&self, id: DealOrderId) -> Result<Option<DealOrder>, Error> {
        self.read(storage::deal_orders(&id)).await
    }

    async fn is_authority(&self, who: &AccountId) -> Result<bool, Error> {
        Ok(self
            .session
            .query_storage(&storage::authorities(who))
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod test {
    use subxt::{
        tx::Signer,
        utils::{H160, H256},
    };

    use super::*;
    use crate::{
        error::{CreditcoinError, ModuleError},
        ids::CurrencyId,
        runtime::{
            calls::CreditcoinCall,
            events::{
                BurnGATEFailedVerification, BurnedGATEMinted, CollectCoinsFailedVerification,
                CollectedCoinsMinted, EventRecord, TransferFailedVerification, Withdraw,
            },
            session::ModuleErrorRef,
            verification::DEFAULT_VERIFICATION_TIMEOUT,
        },
        testing::{alice, MockSession},
        types::{
            ContractType, DeployedContract, Duration, EvmTransferKind, InterestRate, InterestType,
            UnverifiedBurnGate, UnverifiedCollectedCoins,
        },
        POINT_01_CTC,
    };

    const CREDITCOIN_INDEX: u8 = 9;

    fn module_error(name: &str) -> ModuleError {
        ModuleError {
            pallet: "Creditcoin".to_string(),
            name: name.to_string(),
            docs: String::new(),
        }
    }

    fn fail_with(session: &MockSession, error_index: u8, name: &str) {
        session.register_module_error(CREDITCOIN_INDEX, error_index, module_error(name));
        session.script_failure(ModuleErrorRef {
            pallet_index: CREDITCOIN_INDEX,
            error: [error_index, 0, 0, 0],
        });
    }

    fn terms() -> LoanTerms {
        LoanTerms {
            amount: U256::from(1_000u64),
            interest_rate: InterestRate {
                rate_per_period: 100,
                decimals: 4,
                period: Duration::from_secs(60),
                interest_type: InterestType::Simple,
            },
            term_length: Duration::from_secs(6_000),
            currency: CurrencyId(H256::repeat_byte(0xcc)),
        }
    }

    fn external_address() -> ExternalAddress {
        vec![0x11; 20]
    }

    fn burn_tx() -> ExternalTxId {
        vec![0xbe; 32]
    }

    fn gate_contract() -> DeployedContract {
        DeployedContract {
            address: H160::repeat_byte(0x6a),
            chain: Blockchain::ETHEREUM,
        }
    }

    fn funding_transfer(tx_id: &ExternalTxId, deal_order_id: DealOrderId) -> Transfer {
        Transfer {
            blockchain: Blockchain::ETHEREUM,
            kind: TransferKind::Evm(EvmTransferKind::Ethless),
            from: AddressId(H256::repeat_byte(1)),
            to: AddressId(H256::repeat_byte(2)),
            deal_order_id,
            amount: U256::from(999u64),
            tx_id: tx_id.clone(),
            block: 20,
            is_processed: false,
            account_id: alice().account_id().clone(),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn register_address_then_already_registered() {
        let session = MockSession::default();
        let alice = alice();
        let id = AddressId::new(&Blockchain::ETHEREUM, &external_address());
        let address = Address {
            blockchain: Blockchain::ETHEREUM,
            value: external_address(),
            owner: alice.account_id().clone(),
        };
        session.script_inclusion(vec![EventRecord::new(&AddressRegistered(
            id,
            address.clone(),
        ))]);
        fail_with(&session, 0, "AddressAlreadyRegistered");
        let client = Client::from(session);

        let registered = client
            .register_address(
                &alice,
                Blockchain::ETHEREUM,
                external_address(),
                [0; 65],
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(registered.value, (id, address));

        let error = client
            .register_address(
                &alice,
                Blockchain::ETHEREUM,
                external_address(),
                [0; 65],
                SubmitOptions::default(),
            )
            .await
            .unwrap_err();
        let module = error.module_error().unwrap();
        assert_eq!(module.to_string(), "creditcoin.AddressAlreadyRegistered");
        assert_eq!(
            module.creditcoin_error(),
            Some(CreditcoinError::AddressAlreadyRegistered)
        );
        assert_eq!(client.session().status_subscriptions(), 2);
        assert_eq!(client.session().status_releases(), 2);
    }

    #[tokio::test]
    async fn chain_id_wins_on_mismatch() {
        let session = MockSession::default();
        let chain_id = AddressId(H256::repeat_byte(0x42));
        let address = Address {
            blockchain: Blockchain::ETHEREUM,
            value: external_address(),
            owner: alice().account_id().clone(),
        };
        session.script_inclusion(vec![EventRecord::new(&AddressRegistered(chain_id, address))]);
        let client = Client::from(session);

        let registered = client
            .register_address(
                &alice(),
                Blockchain::ETHEREUM,
                external_address(),
                [0; 65],
                SubmitOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(registered.value.0, chain_id);
    }

    #[tokio::test]
    async fn ask_order_pays_fee_then_needs_an_address() {
        let session = MockSession::default();
        let alice = alice();
        let address_id = AddressId::new(&Blockchain::ETHEREUM, &external_address());
        let guid = b"ask-guid".to_vec();
        let ask_id = AskOrderId::new(1_000, &guid);
        let order = AskOrder {
            blockchain: Blockchain::ETHEREUM,
            lender_address_id: address_id,
            terms: terms(),
            expiration_block: 1_000,
            block: 10,
            lender: alice.account_id().clone(),
        };
        session.script_inclusion(vec![
            EventRecord::new(&Withdraw {
                who: alice.account_id().clone(),
                amount: POINT_01_CTC,
            }),
            EventRecord::new(&AskOrderAdded(ask_id, order.clone())),
        ]);
        fail_with(&session, 6, "NonExistentAddress");
        let client = Client::from(session);

        let added = client
            .add_ask_order(
                &alice,
                address_id,
                terms(),
                1_000,
                guid.clone(),
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(added.value, (ask_id, order));
        assert!(added.submission.fee_paid(&alice.account_id()).unwrap() >= POINT_01_CTC);

        let error = client
            .add_ask_order(
                &alice,
                AddressId(H256::repeat_byte(0xde)),
                terms(),
                1_000,
                guid,
                SubmitOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            error.module_error().and_then(ModuleError::creditcoin_error),
            Some(CreditcoinError::NonExistentAddress)
        );
    }

    #[tokio::test]
    async fn funding_needs_the_processed_transfer() {
        let session = MockSession::default();
        let deal_order_id = DealOrderId(50, H256::repeat_byte(5));
        session.script_inclusion(vec![EventRecord::new(&DealOrderFunded(deal_order_id))]);
        let client = Client::from(session);

        let error = client
            .fund_deal_order(
                &alice(),
                deal_order_id,
                TransferId(H256::repeat_byte(6)),
                SubmitOptions::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::MissingEvent {
                pallet: "Creditcoin",
                event: "TransferProcessed"
            }
        ));
    }

    #[tokio::test]
    async fn funding_transfer_with_wrong_amount_fails_verification() {
        let session = MockSession::default();
        let alice = alice();
        let tx_id = vec![0xab; 32];
        let transfer_id = TransferId::new(&Blockchain::ETHEREUM, &tx_id);
        let deal_order_id = DealOrderId(50, H256::repeat_byte(5));
        session.script_inclusion(vec![EventRecord::new(&TransferRegistered(
            transfer_id,
            funding_transfer(&tx_id, deal_order_id),
        ))]);
        session.script_block(vec![EventRecord::new(&TransferFailedVerification(
            transfer_id,
            VerificationFailureCause::IncorrectAmount,
        ))]);
        let client = Client::from(session);

        let Submitted {
            value: mut handle, ..
        } = client
            .register_funding_transfer(
                &alice,
                TransferKind::Evm(EvmTransferKind::Ethless),
                deal_order_id,
                tx_id,
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(handle.id(), &transfer_id);

        let error = handle
            .wait_for_verification(DEFAULT_VERIFICATION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::VerificationFailed {
                cause: Some(VerificationFailureCause::IncorrectAmount),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn verdict_before_finalization_is_not_missed() {
        let session = MockSession::default();
        let tx_id = vec![0xab; 32];
        let transfer_id = TransferId::new(&Blockchain::ETHEREUM, &tx_id);
        let deal_order_id = DealOrderId(50, H256::repeat_byte(5));
        session.script_inclusion(vec![EventRecord::new(&TransferRegistered(
            transfer_id,
            funding_transfer(&tx_id, deal_order_id),
        ))]);
        // The authority answers before the inclusion block is finalized
        session.script_block_while_watching(vec![EventRecord::new(
            &TransferFailedVerification(transfer_id, VerificationFailureCause::IncorrectAmount),
        )]);
        session.script_finalization();
        let client = Client::from(session);

        let Submitted {
            value: mut handle, ..
        } = client
            .register_funding_transfer(
                &alice(),
                TransferKind::Evm(EvmTransferKind::Ethless),
                deal_order_id,
                tx_id,
                SubmitOptions::finalized(),
            )
            .await
            .unwrap();
        assert_eq!(client.session().produced_blocks(), 2);

        let error = handle
            .wait_for_verification(DEFAULT_VERIFICATION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::VerificationFailed {
                cause: Some(VerificationFailureCause::IncorrectAmount),
                ..
            }
        ));
        assert_eq!(client.session().event_subscriptions(), 1);
        assert_eq!(client.session().event_releases(), 1);
    }

    #[tokio::test]
    async fn funding_with_another_processed_transfer_is_an_error() {
        let session = MockSession::default();
        let deal_order_id = DealOrderId(50, H256::repeat_byte(5));
        let requested = TransferId(H256::repeat_byte(6));
        let processed = TransferId(H256::repeat_byte(7));
        session.script_inclusion(vec![
            EventRecord::new(&DealOrderFunded(deal_order_id)),
            EventRecord::new(&TransferProcessed(processed)),
        ]);
        let client = Client::from(session);

        let error = client
            .fund_deal_order(&alice(), deal_order_id, requested, SubmitOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            Error::EventMismatch {
                event: "TransferProcessed",
                ref expected,
                ref found,
                ..
            } if expected == &requested.to_string() && found == &processed.to_string()
        ));
    }

    #[tokio::test]
    async fn gate_collection_mints_coins() {
        let session = MockSession::default();
        let id = CollectedCoinsId::new(&Blockchain::ETHEREUM, &burn_tx());
        let coins = CollectedCoins {
            to: AddressId::new(&Blockchain::ETHEREUM, &external_address()),
            amount: 200,
            tx_id: burn_tx(),
            contract_type: ContractType::GATE,
        };
        session.script_inclusion(vec![EventRecord::new(&CollectCoinsRegistered(
            id,
            UnverifiedCollectedCoins {
                to: external_address(),
                tx_id: burn_tx(),
                contract: gate_contract(),
            },
        ))]);
        session.script_block(vec![EventRecord::new(&CollectedCoinsMinted(id, coins.clone()))]);
        let client = Client::from(session);

        let contract = TokenContract::GATE(external_address(), burn_tx());
        let Submitted {
            value: mut handle, ..
        } = client
            .request_collect_coins_v2(&alice(), contract.clone(), SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(handle.id(), &id);

        let minted = handle
            .wait_for_verification(DEFAULT_VERIFICATION_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(minted, coins);
        assert_eq!(
            client.session().submitted(),
            vec![RuntimeCall::from(RequestCollectCoinsV2 { contract })]
        );
    }

    #[tokio::test]
    async fn gcre_collection_fails_verification() {
        let session = MockSession::default();
        let id = CollectedCoinsId::new(&Blockchain::ETHEREUM, &burn_tx());
        session.script_inclusion(vec![EventRecord::new(&CollectCoinsRegistered(
            id,
            UnverifiedCollectedCoins {
                to: external_address(),
                tx_id: burn_tx(),
                contract: gate_contract(),
            },
        ))]);
        session.script_block(vec![EventRecord::new(&CollectCoinsFailedVerification(
            id,
            VerificationFailureCause::IncorrectSender,
        ))]);
        let client = Client::from(session);

        let Submitted {
            value: mut handle, ..
        } = client
            .request_collect_coins_v2(
                &alice(),
                TokenContract::GCRE(external_address(), burn_tx()),
                SubmitOptions::default(),
            )
            .await
            .unwrap();

        let error = handle
            .wait_for_verification(DEFAULT_VERIFICATION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::VerificationFailed {
                cause: Some(VerificationFailureCause::IncorrectSender),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn gate_swap_is_paid_out() {
        let session = MockSession::default();
        let id = BurnGateId::new(&Blockchain::ETHEREUM, &burn_tx());
        let burned = BurnedGate {
            to: AddressId::new(&Blockchain::ETHEREUM, &external_address()),
            amount: 200,
            tx_id: burn_tx(),
        };
        session.script_inclusion(vec![EventRecord::new(&BurnGATERegistered(
            id,
            UnverifiedBurnGate {
                to: external_address(),
                tx_id: burn_tx(),
                contract: gate_contract(),
            },
        ))]);
        session.script_block(vec![EventRecord::new(&BurnedGATEMinted(id, burned.clone()))]);
        let client = Client::from(session);

        let Submitted {
            value: mut handle, ..
        } = client
            .request_burn_gate(
                &alice(),
                external_address(),
                burn_tx(),
                SubmitOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(handle.id(), &id);

        let swapped = handle
            .wait_for_verification(DEFAULT_VERIFICATION_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(swapped, burned);
        let RuntimeCall::Creditcoin(CreditcoinCall::RequestBurnGate(call)) =
            &client.session().submitted()[0]
        else {
            panic!("expected a request_burn_gate call");
        };
        assert_eq!(call.tx_id, burn_tx());
    }

    #[tokio::test]
    async fn gate_swap_with_wrong_sender_fails_verification() {
        let session = MockSession::default();
        let id = BurnGateId::new(&Blockchain::ETHEREUM, &burn_tx());
        session.script_inclusion(vec![EventRecord::new(&BurnGATERegistered(
            id,
            UnverifiedBurnGate {
                to: external_address(),
                tx_id: burn_tx(),
                contract: gate_contract(),
            },
        ))]);
        session.script_block(vec![EventRecord::new(&BurnGATEFailedVerification(
            id,
            VerificationFailureCause::IncorrectSender,
        ))]);
        let client = Client::from(session);

        let Submitted {
            value: mut handle, ..
        } = client
            .request_burn_gate(
                &alice(),
                external_address(),
                burn_tx(),
                SubmitOptions::default(),
            )
            .await
            .unwrap();

        let error = handle
            .wait_for_verification(DEFAULT_VERIFICATION_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            Error::VerificationFailed {
                cause: Some(VerificationFailureCause::IncorrectSender),
                ..
            }
        ));
        assert_eq!(client.burned_gate(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn gate_swap_without_faucet_releases_the_event_subscription() {
        let session = MockSession::default();
        fail_with(&session, 40, "BurnGATEFaucetNotSet");
        let client = Client::from(session);

        let error = client
            .request_burn_gate(
                &alice(),
                external_address(),
                burn_tx(),
                SubmitOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(
            error.module_error().and_then(ModuleError::creditcoin_error),
            Some(CreditcoinError::BurnGATEFaucetNotSet)
        );
        assert_eq!(client.session().event_subscriptions(), 1);
        assert_eq!(client.session().event_releases(), 1);
    }

    #[tokio::test]
    async fn storage_reads_decode_records() {
        let session = MockSession::default();
        let deal_order_id = DealOrderId(50, H256::repeat_byte(5));
        let address = Address {
            blockchain: Blockchain::ETHEREUM,
            value: external_address(),
            owner: alice().account_id().clone(),
        };
        let address_id = AddressId::new(&Blockchain::ETHEREUM, &external_address());
        session.set_storage(storage::addresses(&address_id), address.clone());
        session.set_storage(storage::authorities(&alice().account_id()), ());
        let client = Client::from(session);

        assert_eq!(client.address(address_id).await.unwrap(), Some(address));
        assert_eq!(client.deal_order(deal_order_id).await.unwrap(), None);
        assert!(client.is_authority(&alice().account_id()).await.unwrap());
    }
}
