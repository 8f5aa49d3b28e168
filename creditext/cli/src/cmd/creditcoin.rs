use std::time::Duration;

use anyhow::bail;
use clap::{ArgGroup, Subcommand, ValueEnum};
use creditext::{
    ids::{
        AddressId, AskOrderId, BidOrderId, BurnGateId, CollectedCoinsId, DealOrderId, OfferId,
        TransferId,
    },
    multipair::{DebugPair, MultiPairSigner},
    runtime::calls::RegisterDealOrder,
    signing::{sign_account_id, sign_loan_params},
    types::{
        signature_from_hex, Blockchain, EvmTransferKind, ExternalAddress, ExternalTxId, LoanTerms,
        OwnershipProof, TaskId, TokenContract, TransferKind, VerificationFailureCause, U256,
    },
    AccountId, BlockNumber, CreditcoinClientExt, Inclusion, SubmitOptions, Submitted,
};
use subxt::{
    ext::sp_core::{
        ecdsa::{self, Pair as ECDSAPair},
        ed25519::Pair as Ed25519Pair,
        sr25519::Pair as Sr25519Pair,
    },
    tx::Signer,
};
use url::Url;

use crate::{
    cmd::{display_record, display_report, Report},
    deser::{parse_ecdsa_public, parse_hex, ParseablePath},
    missing_keypair_error, operation_takes_a_while, OutputFormat,
};

fn parse_secs(s: &str) -> Result<Duration, String> {
    Ok(Duration::from_secs(s.parse().map_err(|_| {
        format!("{s} is not a valid number of seconds")
    })?))
}

/// How the ownership proof of `register-address` was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub(crate) enum ProofKind {
    /// Plain signature, submitted through `register_address`.
    #[default]
    Legacy,
    /// `eth_sign` signature, submitted through `register_address_v2`.
    EthSign,
    /// Wallet `personal_sign` signature, submitted through `register_address_v2`.
    PersonalSign,
}

/// Token burnt for `request-collect-coins-v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BurntToken {
    Gcre,
    Gate,
}

impl BurntToken {
    fn contract(self, evm_address: ExternalAddress, tx_id: ExternalTxId) -> TokenContract {
        match self {
            BurntToken::Gcre => TokenContract::GCRE(evm_address, tx_id),
            BurntToken::Gate => TokenContract::GATE(evm_address, tx_id),
        }
    }
}

#[derive(Debug, Subcommand)]
#[command(name = "creditcoin", about = "CLI Client to the Creditcoin Pallet", version)]
pub(crate) enum CreditcoinCommand {
    /// Bind an external address to the signer's account.
    #[command(group(ArgGroup::new("proof").required(true).args(&["ownership_proof", "external_key"])))]
    RegisterAddress {
        /// Chain the address lives on: a known name or an EVM chain id.
        blockchain: Blockchain,
        /// External address, as hex.
        #[arg(value_parser = parse_hex)]
        address: ExternalAddress,
        /// Pre-computed 65 byte signature over the signer's account id, as hex.
        #[arg(long)]
        ownership_proof: Option<String>,
        /// ECDSA key of the external address, used to sign the ownership proof.
        #[arg(long, value_parser = DebugPair::<ECDSAPair>::value_parser)]
        external_key: Option<DebugPair<ECDSAPair>>,
        #[arg(long, value_enum, default_value_t = ProofKind::Legacy)]
        proof_kind: ProofKind,
    },

    /// Offer to lend under the given terms, as the lender.
    AddAskOrder {
        address_id: AddressId,
        /// Loan terms. Either JSON or a file path, prepended with an @.
        #[arg(value_parser = <LoanTerms as ParseablePath>::parse_json)]
        terms: LoanTerms,
        expiration_block: BlockNumber,
        /// Caller-chosen unique identifier of the order.
        guid: String,
    },

    /// Request a loan under the given terms, as the borrower.
    AddBidOrder {
        address_id: AddressId,
        /// Loan terms. Either JSON or a file path, prepended with an @.
        #[arg(value_parser = <LoanTerms as ParseablePath>::parse_json)]
        terms: LoanTerms,
        expiration_block: BlockNumber,
        /// Caller-chosen unique identifier of the order.
        guid: String,
    },

    /// Match an ask order with a bid order, as the lender.
    AddOffer {
        ask_order_id: AskOrderId,
        bid_order_id: BidOrderId,
        expiration_block: BlockNumber,
    },

    /// Accept an offer, as the borrower.
    AddDealOrder {
        offer_id: OfferId,
        expiration_block: BlockNumber,
    },

    /// Register the whole deal in one extrinsic, as the lender, with the borrower's consent
    /// signed by borrower_<key_type>_key.
    #[command(group(ArgGroup::new("borrower_keypair").required(true).args(&["borrower_sr25519_key", "borrower_ecdsa_key", "borrower_ed25519_key"])))]
    RegisterDealOrder {
        lender_address_id: AddressId,
        borrower_address_id: AddressId,
        /// Loan terms. Either JSON or a file path, prepended with an @.
        #[arg(value_parser = <LoanTerms as ParseablePath>::parse_json)]
        terms: LoanTerms,
        expiration_block: BlockNumber,
        ask_guid: String,
        bid_guid: String,
        /// Sr25519 keypair, encoded as hex, BIP-39 or a dev phrase like `//Alice`.
        ///
        /// See `sp_core::crypto::Pair::from_string_with_seed` for more information.
        #[arg(long, value_parser = DebugPair::<Sr25519Pair>::value_parser)]
        borrower_sr25519_key: Option<DebugPair<Sr25519Pair>>,

        /// ECDSA keypair, encoded as hex, BIP-39 or a dev phrase like `//Alice`.
        ///
        /// See `sp_core::crypto::Pair::from_string_with_seed` for more information.
        #[arg(long, value_parser = DebugPair::<ECDSAPair>::value_parser)]
        borrower_ecdsa_key: Option<DebugPair<ECDSAPair>>,

        /// Ed25519 keypair, encoded as hex, BIP-39 or a dev phrase like `//Alice`.
        ///
        /// See `sp_core::crypto::Pair::from_string_with_seed` for more information.
        #[arg(long, value_parser = DebugPair::<Ed25519Pair>::value_parser)]
        borrower_ed25519_key: Option<DebugPair<Ed25519Pair>>,
    },

    /// Lock a deal order, as the borrower.
    LockDealOrder { deal_order_id: DealOrderId },

    /// Fund a deal order with a verified transfer, as the lender.
    FundDealOrder {
        deal_order_id: DealOrderId,
        transfer_id: TransferId,
    },

    /// Register the lender's transfer funding a deal.
    RegisterFundingTransfer {
        #[arg(value_enum)]
        transfer_kind: EvmTransferKind,
        deal_order_id: DealOrderId,
        /// Transaction hash on the external chain, as hex.
        #[arg(value_parser = parse_hex)]
        blockchain_tx_id: ExternalTxId,
        /// Wait for the authority to verify the transfer.
        #[arg(long, default_value_t = false)]
        wait_for_verification: bool,
        /// How long to wait for the verification, in seconds.
        #[arg(long, value_parser = parse_secs, default_value = "180")]
        verification_timeout: Duration,
    },

    /// Register the borrower's transfer repaying a deal.
    RegisterRepaymentTransfer {
        #[arg(value_enum)]
        transfer_kind: EvmTransferKind,
        repayment_amount: U256,
        deal_order_id: DealOrderId,
        /// Transaction hash on the external chain, as hex.
        #[arg(value_parser = parse_hex)]
        blockchain_tx_id: ExternalTxId,
        /// Wait for the authority to verify the transfer.
        #[arg(long, default_value_t = false)]
        wait_for_verification: bool,
        /// How long to wait for the verification, in seconds.
        #[arg(long, value_parser = parse_secs, default_value = "180")]
        verification_timeout: Duration,
    },

    /// Close a repaid deal order, as the borrower.
    CloseDealOrder {
        deal_order_id: DealOrderId,
        transfer_id: TransferId,
    },

    /// Forgive the rest of a loan, as the lender.
    Exempt { deal_order_id: DealOrderId },

    /// Claim the balance of a legacy wallet.
    ClaimLegacyWallet {
        /// Compressed ECDSA public key of the legacy wallet, as hex.
        #[arg(value_parser = parse_ecdsa_public)]
        public_key: ecdsa::Public,
    },

    /// Request minting CTC for a burn on the collection contract.
    RequestCollectCoins {
        /// Address that burnt the tokens, as hex.
        #[arg(value_parser = parse_hex)]
        evm_address: ExternalAddress,
        /// Burn transaction hash, as hex.
        #[arg(value_parser = parse_hex)]
        tx_id: ExternalTxId,
        /// Wait for the authority to verify the burn.
        #[arg(long, default_value_t = false)]
        wait_for_verification: bool,
        /// How long to wait for the verification, in seconds.
        #[arg(long, value_parser = parse_secs, default_value = "180")]
        verification_timeout: Duration,
    },

    /// Request minting CTC for a GCRE or GATE burn.
    RequestCollectCoinsV2 {
        #[arg(value_enum)]
        token: BurntToken,
        /// Address that burnt the tokens, as hex.
        #[arg(value_parser = parse_hex)]
        evm_address: ExternalAddress,
        /// Burn transaction hash, as hex.
        #[arg(value_parser = parse_hex)]
        tx_id: ExternalTxId,
        /// Wait for the authority to verify the burn.
        #[arg(long, default_value_t = false)]
        wait_for_verification: bool,
        /// How long to wait for the verification, in seconds.
        #[arg(long, value_parser = parse_secs, default_value = "180")]
        verification_timeout: Duration,
    },

    /// Swap burnt GATE for CTC from the on-chain faucet.
    RequestBurnGate {
        /// Address that burnt the tokens, as hex.
        #[arg(value_parser = parse_hex)]
        evm_address: ExternalAddress,
        /// Burn transaction hash, as hex.
        #[arg(value_parser = parse_hex)]
        tx_id: ExternalTxId,
        /// Wait for the authority to verify the burn.
        #[arg(long, default_value_t = false)]
        wait_for_verification: bool,
        /// How long to wait for the verification, in seconds.
        #[arg(long, value_parser = parse_secs, default_value = "180")]
        verification_timeout: Duration,
    },

    /// Reject a verification task, as an authority.
    #[command(group(ArgGroup::new("task").required(true).args(&["transfer_id", "collected_coins_id"])))]
    FailTask {
        deadline: BlockNumber,
        #[arg(value_enum)]
        cause: VerificationFailureCause,
        #[arg(long)]
        transfer_id: Option<TransferId>,
        #[arg(long)]
        collected_coins_id: Option<CollectedCoinsId>,
    },

    /// Retrieve a registered address.
    GetAddress { address_id: AddressId },

    /// Retrieve a registered transfer.
    GetTransfer { transfer_id: TransferId },

    /// Retrieve minted collected coins.
    GetCollectedCoins { collected_coins_id: CollectedCoinsId },

    /// Retrieve a paid out GATE swap.
    GetBurnedGate { burn_gate_id: BurnGateId },

    GetAskOrder { ask_order_id: AskOrderId },

    GetBidOrder { bid_order_id: BidOrderId },

    GetOffer { offer_id: OfferId },

    GetDealOrder { deal_order_id: DealOrderId },

    /// Check whether an account is an authority.
    IsAuthority { account_id: AccountId },
}

impl CreditcoinCommand {
    /// Run a `creditcoin` command.
    ///
    /// Requires the target RPC address and, except for reads, a keypair able to sign transactions.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(
            node_rpc = node_rpc.as_str(),
            address = ?account_keypair.as_ref().map(|keypair| keypair.account_id().to_string()),
        )
    )]
    pub async fn run(
        self,
        node_rpc: Url,
        account_keypair: Option<MultiPairSigner>,
        n_retries: u32,
        retry_interval: Duration,
        output_format: OutputFormat,
        wait_for_finalization: bool,
    ) -> Result<(), anyhow::Error> {
        let client = creditext::Client::new(node_rpc, n_retries, retry_interval).await?;

        match self {
            // NOTE: subcommand_negates_reqs does not work for this since it only negates the parents'
            // requirements, and the global arguments (keys) are at the grandparent level
            // https://users.rust-lang.org/t/clap-ignore-global-argument-in-sub-command/101701/8
            CreditcoinCommand::GetAddress { address_id } => display_record(
                "address",
                address_id,
                client.address(address_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetTransfer { transfer_id } => display_record(
                "transfer",
                transfer_id,
                client.transfer(transfer_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetCollectedCoins { collected_coins_id } => display_record(
                "collected coins",
                collected_coins_id,
                client.collected_coins(collected_coins_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetBurnedGate { burn_gate_id } => display_record(
                "burned GATE",
                burn_gate_id,
                client.burned_gate(burn_gate_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetAskOrder { ask_order_id } => display_record(
                "ask order",
                ask_order_id,
                client.ask_order(ask_order_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetBidOrder { bid_order_id } => display_record(
                "bid order",
                bid_order_id,
                client.bid_order(bid_order_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetOffer { offer_id } => display_record(
                "offer",
                offer_id,
                client.offer(offer_id).await?,
                output_format,
            )?,
            CreditcoinCommand::GetDealOrder { deal_order_id } => display_record(
                "deal order",
                deal_order_id,
                client.deal_order(deal_order_id).await?,
                output_format,
            )?,
            CreditcoinCommand::IsAuthority { account_id } => {
                let is_authority = client.is_authority(&account_id).await?;
                tracing::debug!("Account {} is authority: {}", account_id, is_authority);
                // A boolean is valid JSON as is
                println!("{}", is_authority);
            }
            else_ => {
                let Some(account_keypair) = account_keypair else {
                    return Err(missing_keypair_error().into());
                };
                else_
                    .with_keypair(
                        client,
                        account_keypair,
                        output_format,
                        SubmitOptions::from(wait_for_finalization),
                    )
                    .await?;
            }
        };

        Ok(())
    }

    async fn with_keypair<Client>(
        self,
        client: Client,
        account_keypair: MultiPairSigner,
        output_format: OutputFormat,
        options: SubmitOptions,
    ) -> Result<(), anyhow::Error>
    where
        Client: CreditcoinClientExt,
    {
        operation_takes_a_while(options.inclusion == Inclusion::Finalized);

        let signer = account_keypair.account_id();
        let report = match self {
            CreditcoinCommand::RegisterAddress {
                blockchain,
                address,
                ownership_proof,
                external_key,
                proof_kind,
            } => {
                let signature = match (ownership_proof, external_key) {
                    (Some(proof), _) => signature_from_hex(&proof)?,
                    (None, Some(_)) if proof_kind == ProofKind::PersonalSign => {
                        bail!("personal_sign proofs are produced by the wallet, pass --ownership-proof")
                    }
                    (None, Some(key)) => sign_account_id(&key.into_inner(), &signer),
                    (None, None) => bail!("an ownership proof or the external key is required"),
                };

                let submitted = match proof_kind {
                    ProofKind::Legacy => {
                        client
                            .register_address(
                                &account_keypair,
                                blockchain,
                                address,
                                signature,
                                options,
                            )
                            .await?
                    }
                    ProofKind::EthSign => {
                        client
                            .register_address_v2(
                                &account_keypair,
                                blockchain,
                                address,
                                OwnershipProof::EthSign(signature),
                                options,
                            )
                            .await?
                    }
                    ProofKind::PersonalSign => {
                        client
                            .register_address_v2(
                                &account_keypair,
                                blockchain,
                                address,
                                OwnershipProof::PersonalSign(signature),
                                options,
                            )
                            .await?
                    }
                };
                let (address_id, _) = &submitted.value;
                tracing::debug!("[{}] Registered address {}", submitted.submission.hash, address_id);
                report(&submitted, &signer).with_result(address_id)
            }
            CreditcoinCommand::AddAskOrder {
                address_id,
                terms,
                expiration_block,
                guid,
            } => {
                let submitted = client
                    .add_ask_order(
                        &account_keypair,
                        address_id,
                        terms,
                        expiration_block,
                        guid.into_bytes(),
                        options,
                    )
                    .await?;
                report(&submitted, &signer).with_result(submitted.value.0)
            }
            CreditcoinCommand::AddBidOrder {
                address_id,
                terms,
                expiration_block,
                guid,
            } => {
                let submitted = client
                    .add_bid_order(
                        &account_keypair,
                        address_id,
                        terms,
                        expiration_block,
                        guid.into_bytes(),
                        options,
                    )
                    .await?;
                report(&submitted, &signer).with_result(submitted.value.0)
            }
            CreditcoinCommand::AddOffer {
                ask_order_id,
                bid_order_id,
                expiration_block,
            } => {
                let submitted = client
                    .add_offer(
                        &account_keypair,
                        ask_order_id,
                        bid_order_id,
                        expiration_block,
                        options,
                    )
                    .await?;
                report(&submitted, &signer).with_result(submitted.value.0)
            }
            CreditcoinCommand::AddDealOrder {
                offer_id,
                expiration_block,
            } => {
                let submitted = client
                    .add_deal_order(&account_keypair, offer_id, expiration_block, options)
                    .await?;
                report(&submitted, &signer).with_result(submitted.value.0)
            }
            CreditcoinCommand::RegisterDealOrder {
                lender_address_id,
                borrower_address_id,
                terms,
                expiration_block,
                ask_guid,
                bid_guid,
                borrower_sr25519_key,
                borrower_ecdsa_key,
                borrower_ed25519_key,
            } => {
                let Some(borrower) = MultiPairSigner::new(
                    borrower_sr25519_key.map(DebugPair::into_inner),
                    borrower_ecdsa_key.map(DebugPair::into_inner),
                    borrower_ed25519_key.map(DebugPair::into_inner),
                ) else {
                    bail!("the borrower's consent requires one of their keys");
                };
                let borrower_signature = sign_loan_params(
                    &borrower,
                    expiration_block,
                    ask_guid.as_bytes(),
                    bid_guid.as_bytes(),
                    &terms,
                );
                let deal = RegisterDealOrder::new(
                    lender_address_id,
                    borrower_address_id,
                    terms,
                    expiration_block,
                    ask_guid.into_bytes(),
                    bid_guid.into_bytes(),
                    borrower.multi_signer(),
                    borrower_signature,
                );

                let submitted = client
                    .register_deal_order(&account_keypair, deal, options)
                    .await?;
                let registered = &submitted.value;
                report(&submitted, &signer).with_result(format!(
                    "ask order: {}\nbid order: {}\noffer: {}\ndeal order: {}",
                    registered.ask_order.0,
                    registered.bid_order.0,
                    registered.offer.0,
                    registered.deal_order.0
                ))
            }
            CreditcoinCommand::LockDealOrder { deal_order_id } => {
                let submitted = client
                    .lock_deal_order(&account_keypair, deal_order_id, options)
                    .await?;
                report(&submitted, &signer)
            }
            CreditcoinCommand::FundDealOrder {
                deal_order_id,
                transfer_id,
            } => {
                let submitted = client
                    .fund_deal_order(&account_keypair, deal_order_id, transfer_id, options)
                    .await?;
                report(&submitted, &signer)
            }
            CreditcoinCommand::RegisterFundingTransfer {
                transfer_kind,
                deal_order_id,
                blockchain_tx_id,
                wait_for_verification,
                verification_timeout,
            } => {
                let mut submitted = client
                    .register_funding_transfer(
                        &account_keypair,
                        TransferKind::Evm(transfer_kind),
                        deal_order_id,
                        blockchain_tx_id,
                        options,
                    )
                    .await?;
                let transfer_id = *submitted.value.id();
                if wait_for_verification {
                    let transfer = submitted
                        .value
                        .wait_for_verification(verification_timeout)
                        .await?;
                    tracing::info!("Transfer {} verified: {:?}", transfer_id, transfer);
                }
                report(&submitted, &signer).with_result(transfer_id)
            }
            CreditcoinCommand::RegisterRepaymentTransfer {
                transfer_kind,
                repayment_amount,
                deal_order_id,
                blockchain_tx_id,
                wait_for_verification,
                verification_timeout,
            } => {
                let mut submitted = client
                    .register_repayment_transfer(
                        &account_keypair,
                        TransferKind::Evm(transfer_kind),
                        repayment_amount,
                        deal_order_id,
                        blockchain_tx_id,
                        options,
                    )
                    .await?;
                let transfer_id = *submitted.value.id();
                if wait_for_verification {
                    let transfer = submitted
                        .value
                        .wait_for_verification(verification_timeout)
                        .await?;
                    tracing::info!("Transfer {} verified: {:?}", transfer_id, transfer);
                }
                report(&submitted, &signer).with_result(transfer_id)
            }
            CreditcoinCommand::CloseDealOrder {
                deal_order_id,
                transfer_id,
            } => {
                let submitted = client
                    .close_deal_order(&account_keypair, deal_order_id, transfer_id, options)
                    .await?;
                report(&submitted, &signer)
            }
            CreditcoinCommand::Exempt { deal_order_id } => {
                let submitted = client
                    .exempt(&account_keypair, deal_order_id, options)
                    .await?;
                report(&submitted, &signer)
            }
            CreditcoinCommand::ClaimLegacyWallet { public_key } => {
                let submitted = client
                    .claim_legacy_wallet(&account_keypair, public_key, options)
                    .await?;
                let claimed = &submitted.value;
                report(&submitted, &signer)
                    .with_result(format!("claimed {} from {}", claimed.2, claimed.1))
            }
            CreditcoinCommand::RequestCollectCoins {
                evm_address,
                tx_id,
                wait_for_verification,
                verification_timeout,
            } => {
                let mut submitted = client
                    .request_collect_coins(&account_keypair, evm_address, tx_id, options)
                    .await?;
                let collected_coins_id = *submitted.value.id();
                if wait_for_verification {
                    let coins = submitted
                        .value
                        .wait_for_verification(verification_timeout)
                        .await?;
                    tracing::info!("Minted {} for {}", coins.amount, collected_coins_id);
                }
                report(&submitted, &signer).with_result(collected_coins_id)
            }
            CreditcoinCommand::RequestCollectCoinsV2 {
                token,
                evm_address,
                tx_id,
                wait_for_verification,
                verification_timeout,
            } => {
                let contract = token.contract(evm_address, tx_id);
                let mut submitted = client
                    .request_collect_coins_v2(&account_keypair, contract, options)
                    .await?;
                let collected_coins_id = *submitted.value.id();
                if wait_for_verification {
                    let coins = submitted
                        .value
                        .wait_for_verification(verification_timeout)
                        .await?;
                    tracing::info!("Minted {} for {}", coins.amount, collected_coins_id);
                }
                report(&submitted, &signer).with_result(collected_coins_id)
            }
            CreditcoinCommand::RequestBurnGate {
                evm_address,
                tx_id,
                wait_for_verification,
                verification_timeout,
            } => {
                let mut submitted = client
                    .request_burn_gate(&account_keypair, evm_address, tx_id, options)
                    .await?;
                let burn_gate_id = *submitted.value.id();
                if wait_for_verification {
                    let burned = submitted
                        .value
                        .wait_for_verification(verification_timeout)
                        .await?;
                    tracing::info!("Paid out {} for {}", burned.amount, burn_gate_id);
                }
                report(&submitted, &signer).with_result(burn_gate_id)
            }
            CreditcoinCommand::FailTask {
                deadline,
                cause,
                transfer_id,
                collected_coins_id,
            } => {
                let task_id = match (transfer_id, collected_coins_id) {
                    (Some(id), _) => TaskId::from(id),
                    (None, Some(id)) => TaskId::from(id),
                    (None, None) => bail!("a transfer or collected coins id is required"),
                };
                let submission = client
                    .fail_task(&account_keypair, deadline, task_id, cause, options)
                    .await?;
                Report::new(&submission, &signer)
            }
            _unsigned => unreachable!("unsigned commands should have been previously handled"),
        };

        display_report(&report, output_format)
    }
}

fn report<T>(submitted: &Submitted<T>, signer: &AccountId) -> Report {
    Report::new(&submitted.submission, signer)
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::*;
    use crate::{Cli, SubCommand};

    const DEAL_ORDER_ID: &str =
        "100-0x0000000000000000000000000000000000000000000000000000000000000001";

    fn parse(args: &[&str]) -> Result<CreditcoinCommand, clap::Error> {
        let cli = Cli::try_parse_from(["creditext", "creditcoin"].iter().chain(args))?;
        match cli.subcommand {
            SubCommand::Creditcoin(cmd) => Ok(cmd),
            other => panic!("expected a creditcoin command, got {other:?}"),
        }
    }

    #[test]
    fn register_deal_order_needs_the_borrower() {
        let terms = r#"{"amount":"1","interest_rate":{"rate_per_period":0,"decimals":0,"period":{"secs":1,"nanos":0},"interest_type":"Simple"},"term_length":{"secs":1,"nanos":0},"currency":"0x0000000000000000000000000000000000000000000000000000000000000000"}"#;
        let address_id = format!("0x{}", "11".repeat(32));
        let args = [
            "register-deal-order",
            address_id.as_str(),
            address_id.as_str(),
            terms,
            "100",
            "ask",
            "bid",
        ];

        assert!(parse(&args).is_err());

        let with_borrower = [&args[..], &["--borrower-sr25519-key", "//Bob"]].concat();
        assert!(matches!(
            parse(&with_borrower).unwrap(),
            CreditcoinCommand::RegisterDealOrder {
                borrower_sr25519_key: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn transfer_verification_defaults() {
        let cmd = parse(&[
            "register-funding-transfer",
            "erc20",
            DEAL_ORDER_ID,
            "0xabcdef",
        ])
        .unwrap();

        let CreditcoinCommand::RegisterFundingTransfer {
            transfer_kind,
            blockchain_tx_id,
            wait_for_verification,
            verification_timeout,
            ..
        } = cmd
        else {
            panic!("expected register-funding-transfer");
        };
        assert_eq!(transfer_kind, EvmTransferKind::Erc20);
        assert_eq!(blockchain_tx_id, vec![0xab, 0xcd, 0xef]);
        assert!(!wait_for_verification);
        assert_eq!(verification_timeout, creditext::DEFAULT_VERIFICATION_TIMEOUT);
    }

    #[test]
    fn collect_coins_v2_tags_the_token() {
        let cmd = parse(&["request-collect-coins-v2", "gate", "0x1111", "0xbeef"]).unwrap();

        let CreditcoinCommand::RequestCollectCoinsV2 {
            token,
            evm_address,
            tx_id,
            ..
        } = cmd
        else {
            panic!("expected request-collect-coins-v2");
        };
        assert_eq!(
            token.contract(evm_address, tx_id),
            TokenContract::GATE(vec![0x11, 0x11], vec![0xbe, 0xef])
        );
        assert!(parse(&["request-collect-coins-v2", "ctc", "0x1111", "0xbeef"]).is_err());
    }

    #[test]
    fn register_address_needs_a_proof() {
        assert!(parse(&["register-address", "ethereum", "0x1111"]).is_err());

        let cmd = parse(&[
            "register-address",
            "evm-31337",
            "0x1111",
            "--external-key",
            "//Alice",
            "--proof-kind",
            "eth-sign",
        ])
        .unwrap();
        assert!(matches!(
            cmd,
            CreditcoinCommand::RegisterAddress {
                blockchain,
                proof_kind: ProofKind::EthSign,
                ..
            } if blockchain == Blockchain::evm(31337)
        ));
    }

    #[test]
    fn fail_task_takes_one_task_id() {
        let id = format!("0x{}", "22".repeat(32));
        assert!(parse(&["fail-task", "10", "incorrect-amount"]).is_err());

        let cmd = parse(&["fail-task", "10", "incorrect-amount", "--transfer-id", id.as_str()]).unwrap();
        assert!(matches!(
            cmd,
            CreditcoinCommand::FailTask {
                cause: VerificationFailureCause::IncorrectAmount,
                transfer_id: Some(_),
                collected_coins_id: None,
                ..
            }
        ));
    }
}
