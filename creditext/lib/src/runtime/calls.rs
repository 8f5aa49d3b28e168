//! Typed extrinsic payloads.
//!
//! Each call is a plain struct whose field names and order follow the
//! runtime's declaration; it is encoded against the node's metadata through
//! [`DefaultPayload`], so a runtime whose call shape diverges is refused at
//! encoding time rather than on chain.

use subxt::{
    ext::{
        sp_core::ecdsa,
        sp_runtime::{MultiSignature, MultiSigner},
        subxt_core,
    },
    tx::{DefaultPayload, Payload},
    utils::{Encoded, MultiAddress, Static},
    Metadata,
};

use crate::{
    ids::{AddressId, AskOrderId, BidOrderId, DealOrderId, OfferId, TransferId},
    types::{
        Blockchain, Currency, DeployedContract, ExternalAddress, ExternalTxId, LoanTerms,
        OwnershipProof, TaskId, TaskOutput, TokenContract, TransferKind, VerificationFailureCause,
        U256,
    },
    AccountId, Balance, BlockNumber,
};

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RegisterAddress {
    pub blockchain: Blockchain,
    pub address: ExternalAddress,
    /// ECDSA signature over the registering account id.
    pub ownership_proof: [u8; 65],
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RegisterAddressV2 {
    pub blockchain: Blockchain,
    pub address: ExternalAddress,
    pub ownership_proof: OwnershipProof,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct AddAskOrder {
    pub address_id: AddressId,
    pub terms: LoanTerms,
    pub expiration_block: BlockNumber,
    pub guid: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct AddBidOrder {
    pub address_id: AddressId,
    pub terms: LoanTerms,
    pub expiration_block: BlockNumber,
    pub guid: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct AddOffer {
    pub ask_order_id: AskOrderId,
    pub bid_order_id: BidOrderId,
    pub expiration_block: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct AddDealOrder {
    pub offer_id: OfferId,
    pub expiration_block: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct LockDealOrder {
    pub deal_order_id: DealOrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct FundDealOrder {
    pub deal_order_id: DealOrderId,
    pub transfer_id: TransferId,
}

/// Lender-submitted deal, pre-authorised by the borrower's signature over
/// the loan parameters (see [`crate::signing::sign_loan_params`]).
#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RegisterDealOrder {
    pub lender_address_id: AddressId,
    pub borrower_address_id: AddressId,
    pub terms: LoanTerms,
    pub expiration_block: BlockNumber,
    pub ask_guid: Vec<u8>,
    pub bid_guid: Vec<u8>,
    pub borrower_key: Static<MultiSigner>,
    pub borrower_signature: Static<MultiSignature>,
}

impl RegisterDealOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        lender_address_id: AddressId,
        borrower_address_id: AddressId,
        terms: LoanTerms,
        expiration_block: BlockNumber,
        ask_guid: Vec<u8>,
        bid_guid: Vec<u8>,
        borrower_key: MultiSigner,
        borrower_signature: MultiSignature,
    ) -> Self {
        Self {
            lender_address_id,
            borrower_address_id,
            terms,
            expiration_block,
            ask_guid,
            bid_guid,
            borrower_key: Static(borrower_key),
            borrower_signature: Static(borrower_signature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct CloseDealOrder {
    pub deal_order_id: DealOrderId,
    pub transfer_id: TransferId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RegisterFundingTransfer {
    pub transfer_kind: TransferKind,
    pub deal_order_id: DealOrderId,
    pub blockchain_tx_id: ExternalTxId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RegisterRepaymentTransfer {
    pub transfer_kind: TransferKind,
    pub repayment_amount: U256,
    pub deal_order_id: DealOrderId,
    pub blockchain_tx_id: ExternalTxId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct Exempt {
    pub deal_order_id: DealOrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct ClaimLegacyWallet {
    pub public_key: Static<ecdsa::Public>,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RequestCollectCoins {
    pub evm_address: ExternalAddress,
    pub tx_id: ExternalTxId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RequestCollectCoinsV2 {
    pub contract: TokenContract,
}

/// Swap GATE burnt on an EVM chain for CTC from the on-chain faucet.
#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RequestBurnGate {
    pub evm_address: ExternalAddress,
    pub tx_id: ExternalTxId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct PersistTaskOutput {
    pub deadline: BlockNumber,
    pub task_output: TaskOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct FailTask {
    pub deadline: BlockNumber,
    pub task_id: TaskId,
    pub cause: VerificationFailureCause,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct AddAuthority {
    pub who: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RemoveAuthority {
    pub who: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct SetCollectCoinsContract {
    pub contract: DeployedContract,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct SetGateContract {
    pub contract: DeployedContract,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct SetGateFaucet {
    pub address: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct RegisterCurrency {
    pub currency: Currency,
}

/// `Balances::set_balance`, root only.
#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
pub struct SetBalance {
    pub who: MultiAddress<AccountId, ()>,
    pub new_free: Balance,
    pub new_reserved: Balance,
}

#[derive(Debug, Clone, PartialEq, Eq, scale_encode::EncodeAsType)]
struct SudoArgs {
    call: Static<Encoded>,
}

/// Any call this SDK can submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    Creditcoin(CreditcoinCall),
    Balances(BalancesCall),
    Sudo(SudoCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SudoCall {
    Sudo(Box<RuntimeCall>),
}

macro_rules! pallet_calls {
    ($pallet:literal, $outer:ident :: $enum:ident { $($variant:ident => $name:literal,)* }) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $enum {
            $($variant($variant),)*
        }

        impl $enum {
            pub fn name(&self) -> &'static str {
                match self {
                    $($enum::$variant(_) => $name,)*
                }
            }

            fn encode_call_data_to(
                &self,
                metadata: &Metadata,
                out: &mut Vec<u8>,
            ) -> Result<(), subxt_core::Error> {
                match self {
                    $($enum::$variant(args) => {
                        DefaultPayload::new($pallet, $name, args.clone())
                            .encode_call_data_to(metadata, out)
                    })*
                }
            }
        }

        $(
            impl From<$variant> for RuntimeCall {
                fn from(args: $variant) -> Self {
                    RuntimeCall::$outer($enum::$variant(args))
                }
            }
        )*
    };
}

pallet_calls!("Creditcoin", Creditcoin::CreditcoinCall {
    RegisterAddress => "register_address",
    RegisterAddressV2 => "register_address_v2",
    AddAskOrder => "add_ask_order",
    AddBidOrder => "add_bid_order",
    AddOffer => "add_offer",
    AddDealOrder => "add_deal_order",
    LockDealOrder => "lock_deal_order",
    FundDealOrder => "fund_deal_order",
    RegisterDealOrder => "register_deal_order",
    CloseDealOrder => "close_deal_order",
    RegisterFundingTransfer => "register_funding_transfer",
    RegisterRepaymentTransfer => "register_repayment_transfer",
    Exempt => "exempt",
    ClaimLegacyWallet => "claim_legacy_wallet",
    RequestCollectCoins => "request_collect_coins",
    RequestCollectCoinsV2 => "request_collect_coins_v2",
    RequestBurnGate => "request_burn_gate",
    PersistTaskOutput => "persist_task_output",
    FailTask => "fail_task",
    AddAuthority => "add_authority",
    RemoveAuthority => "remove_authority",
    SetCollectCoinsContract => "set_collect_coins_contract",
    SetGateContract => "set_gate_contract",
    SetGateFaucet => "set_gate_faucet",
    RegisterCurrency => "register_currency",
});

pallet_calls!("Balances", Balances::BalancesCall {
    SetBalance => "set_balance",
});

impl RuntimeCall {
    /// Wrap the call in `Sudo::sudo`.
    pub fn sudo(self) -> Self {
        RuntimeCall::Sudo(SudoCall::Sudo(Box::new(self)))
    }

    pub fn pallet(&self) -> &'static str {
        match self {
            RuntimeCall::Creditcoin(_) => "Creditcoin",
            RuntimeCall::Balances(_) => "Balances",
            RuntimeCall::Sudo(_) => "Sudo",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuntimeCall::Creditcoin(call) => call.name(),
            RuntimeCall::Balances(call) => call.name(),
            RuntimeCall::Sudo(SudoCall::Sudo(_)) => "sudo",
        }
    }
}

impl std::fmt::Display for RuntimeCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.pallet(), self.name())
    }
}

impl Payload for RuntimeCall {
    fn encode_call_data_to(
        &self,
        metadata: &Metadata,
        out: &mut Vec<u8>,
    ) -> Result<(), subxt_core::Error> {
        match self {
            RuntimeCall::Creditcoin(call) => call.encode_call_data_to(metadata, out),
            RuntimeCall::Balances(call) => call.encode_call_data_to(metadata, out),
            RuntimeCall::Sudo(SudoCall::Sudo(inner)) => {
                // The boxed call is opaque to the type-directed encoder,
                // so it goes in already encoded
                let inner = inner.encode_call_data(metadata)?;
                DefaultPayload::new(
                    "Sudo",
                    "sudo",
                    SudoArgs {
                        call: Static(Encoded(inner)),
                    },
                )
                .encode_call_data_to(metadata, out)
            }
        }
    }
}
