use codec::{Decode, Encode};
use sha2::{Digest, Sha512};
use subxt::ext::sp_core::ecdsa;

use super::{Blockchain, ExternalAddress};
use crate::AccountId;

/// An external address bound to a Creditcoin account.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub struct Address {
    pub blockchain: Blockchain,
    pub value: ExternalAddress,
    pub owner: AccountId,
}

/// Proof that the registering account controls the external address.
///
/// Both variants carry a 65-byte `r ++ s ++ v` ECDSA signature over the
/// registering account id, see [`crate::signing::sign_account_id`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub enum OwnershipProof {
    PersonalSign([u8; 65]),
    EthSign([u8; 65]),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseSignatureError {
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error("signature must be 65 bytes long, got {0}")]
    Length(usize),
}

/// Parse a hex-encoded `r ++ s ++ v` signature, with or without a `0x` prefix.
pub fn signature_from_hex(src: &str) -> Result<[u8; 65], ParseSignatureError> {
    let bytes = hex::decode(src.strip_prefix("0x").unwrap_or(src))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseSignatureError::Length(len))
}

impl OwnershipProof {
    /// Proof produced by signing the account id digest directly (`eth_sign`).
    pub fn eth_sign_from_hex(src: &str) -> Result<Self, ParseSignatureError> {
        signature_from_hex(src).map(Self::EthSign)
    }

    /// Proof produced by a wallet's `personal_sign`.
    pub fn personal_sign_from_hex(src: &str) -> Result<Self, ParseSignatureError> {
        signature_from_hex(src).map(Self::PersonalSign)
    }
}

/// Address of a wallet on the legacy (pre-substrate) Creditcoin network.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, scale_encode::EncodeAsType)]
pub struct LegacySighash(pub [u8; 60]);

impl From<&ecdsa::Public> for LegacySighash {
    fn from(public_key: &ecdsa::Public) -> Self {
        let compressed_key_hex = hex::encode(public_key.0);
        let key_hash_hex = hex::encode(Sha512::digest(compressed_key_hex.as_bytes()));

        // 128 hex digits, the legacy merkle address keeps the last 60
        let mut sighash = [0u8; 60];
        sighash.copy_from_slice(&key_hash_hex.as_bytes()[128 - 60..]);
        Self(sighash)
    }
}

impl std::fmt::Display for LegacySighash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}
