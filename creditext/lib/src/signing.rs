//! Off-chain signatures the runtime checks as call arguments.

use codec::Encode;
use sha2::{Digest, Sha256};
use subxt::ext::{
    sp_core::{ecdsa, hashing::blake2_256},
    sp_runtime::MultiSignature,
};

use crate::{types::LoanTerms, AccountId, BlockNumber, CreditcoinConfig};

/// Message a borrower signs to pre-authorise `register_deal_order`.
pub fn loan_params_message(
    expiration_block: BlockNumber,
    ask_guid: &[u8],
    bid_guid: &[u8],
    terms: &LoanTerms,
) -> Vec<u8> {
    (expiration_block, ask_guid, bid_guid, terms).encode()
}

/// Borrower signature over the loan parameters, see [`loan_params_message`].
pub fn sign_loan_params<Keypair>(
    borrower: &Keypair,
    expiration_block: BlockNumber,
    ask_guid: &[u8],
    bid_guid: &[u8],
    terms: &LoanTerms,
) -> MultiSignature
where
    Keypair: subxt::tx::Signer<CreditcoinConfig>,
{
    borrower.sign(&loan_params_message(
        expiration_block,
        ask_guid,
        bid_guid,
        terms,
    ))
}

/// Digest signed as proof of owning an external address: `blake2_256(sha256(account_id))`.
pub fn account_id_digest(account_id: &AccountId) -> [u8; 32] {
    blake2_256(&Sha256::digest(account_id.encode()))
}

/// Ownership proof for `register_address`, made with the external address' key.
///
/// Returns the recoverable signature as `r ++ s ++ v`.
pub fn sign_account_id(pair: &ecdsa::Pair, account_id: &AccountId) -> [u8; 65] {
    pair.sign_prehashed(&account_id_digest(account_id)).0
}

#[cfg(test)]
mod test {
    use subxt::{
        ext::sp_core::{sr25519, Pair},
        tx::Signer,
        utils::H256,
    };

    use super::*;
    use crate::{
        ids::CurrencyId,
        testing::alice,
        types::{Duration, InterestRate, InterestType, U256},
    };

    fn terms() -> LoanTerms {
        LoanTerms {
            amount: U256::from(1_000u64),
            interest_rate: InterestRate {
                rate_per_period: 100,
                decimals: 4,
                period: Duration::from_secs(60),
                interest_type: InterestType::Compound,
            },
            term_length: Duration::from_secs(6_000),
            currency: CurrencyId(H256::zero()),
        }
    }

    #[test]
    fn guids_are_length_prefixed() {
        let message = loan_params_message(7, b"ask", b"bid", &terms());

        assert_eq!(&message[..4], &7u32.to_le_bytes());
        assert_eq!(&message[4..8], &[3 << 2, b'a', b's', b'k']);
        assert_eq!(&message[8..12], &[3 << 2, b'b', b'i', b'd']);
        assert_eq!(&message[12..], terms().encode().as_slice());
    }

    #[test]
    fn loan_params_signature_verifies() {
        let borrower = sr25519::Pair::from_string("//Bob", None).unwrap();
        let signer = crate::testing::dev_signer("//Bob");

        let signature = sign_loan_params(&signer, 100, b"ask", b"bid", &terms());

        let MultiSignature::Sr25519(signature) = signature else {
            panic!("expected an sr25519 signature");
        };
        assert!(sr25519::Pair::verify(
            &signature,
            loan_params_message(100, b"ask", b"bid", &terms()),
            &borrower.public()
        ));
    }

    #[test]
    fn account_id_signature_recovers_the_key() {
        let pair = ecdsa::Pair::from_string("//Alice", None).unwrap();
        let account_id = alice().account_id().clone();

        let signature = sign_account_id(&pair, &account_id);

        let recovered = ecdsa::Signature::from_raw(signature)
            .recover_prehashed(&account_id_digest(&account_id))
            .unwrap();
        assert_eq!(recovered, pair.public());
    }

    #[test]
    fn digest_depends_on_the_account() {
        assert_ne!(
            account_id_digest(&AccountId::from([1; 32])),
            account_id_digest(&AccountId::from([2; 32]))
        );
    }
}
