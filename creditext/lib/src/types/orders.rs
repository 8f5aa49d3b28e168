use codec::{Decode, Encode};

use super::{Blockchain, LoanTerms};
use crate::{
    ids::{AddressId, AskOrderId, BidOrderId, OfferId, TransferId},
    AccountId, BlockNumber,
};

/// Moment as used by the runtime's timestamp pallet, milliseconds since the epoch.
pub type Moment = u64;

/// A lender's standing offer to lend under the given terms.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct AskOrder {
    pub blockchain: Blockchain,
    pub lender_address_id: AddressId,
    pub terms: LoanTerms,
    pub expiration_block: BlockNumber,
    pub block: BlockNumber,
    pub lender: AccountId,
}

/// A borrower's request to borrow under the given terms.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BidOrder {
    pub blockchain: Blockchain,
    pub borrower_address_id: AddressId,
    pub terms: LoanTerms,
    pub expiration_block: BlockNumber,
    pub block: BlockNumber,
    pub borrower: AccountId,
}

/// A lender's match of an ask against a bid.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Offer {
    pub blockchain: Blockchain,
    pub ask_id: AskOrderId,
    pub bid_id: BidOrderId,
    pub expiration_block: BlockNumber,
    pub block: BlockNumber,
    pub lender: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DealOrder {
    pub blockchain: Blockchain,
    pub offer_id: OfferId,
    pub lender_address_id: AddressId,
    pub borrower_address_id: AddressId,
    pub terms: LoanTerms,
    pub expiration_block: BlockNumber,
    pub timestamp: Moment,
    /// Block the deal was funded in.
    pub block: Option<BlockNumber>,
    pub funding_transfer_id: Option<TransferId>,
    pub repayment_transfer_id: Option<TransferId>,
    /// Set by the borrower before repaying, the deal can no longer be funded.
    pub lock: Option<AccountId>,
    pub borrower: AccountId,
}

impl DealOrder {
    pub fn is_funded(&self) -> bool {
        self.funding_transfer_id.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.repayment_transfer_id.is_some()
    }
}
