//! Fixtures for running the SDK against a live Creditcoin node.

mod config;

use creditext::{
    ids::AddressId,
    signing::sign_account_id,
    types::{Blockchain, ExternalAddress},
    Client, CreditcoinClientExt, Error, SubmitOptions, SudoClientExt,
};
use subxt::{
    ext::sp_core::{ecdsa, Pair},
    tx::Signer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::config::{ConfigError, TestConfig};
pub use creditext::testing::{alice, dev_signer};

/// Number of connection attempts before a test gives up on the node.
const N_RETRIES: u32 = 10;
const RETRY_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3);

/// Well-known development accounts of Hardhat and Anvil, as `(secret key, address)`.
const DEV_WALLETS: [(&str, &str); 3] = [
    (
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        "f39fd6e51aad88f6f4ce6ab8827279cfffb92266",
    ),
    (
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        "70997970c51812dc3a010c7d01b50e0d17dc79c8",
    ),
    (
        "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
        "3c44cdddb6a900fa2b585dd299e03d12fa4293bc",
    ),
];

pub fn setup_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env()
        .expect("valid level should be set");

    // Several tests in the same binary call this, only the first one installs it
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .try_init();
}

pub async fn connect(config: &TestConfig) -> Result<Client, subxt::Error> {
    Client::new(config.api_url.as_str(), N_RETRIES, RETRY_INTERVAL).await
}

/// An Ethereum account, with the key needed to prove its ownership.
#[derive(Clone)]
pub struct ExternalWallet {
    pub pair: ecdsa::Pair,
    pub address: ExternalAddress,
}

impl std::fmt::Debug for ExternalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalWallet")
            .field("address", &hex::encode(&self.address))
            .finish()
    }
}

impl ExternalWallet {
    /// The `index`-th development wallet, panics past the last one.
    pub fn dev(index: usize) -> Self {
        let (secret, address) = DEV_WALLETS[index];
        Self {
            pair: ecdsa::Pair::from_string(secret, None)
                .expect("dev secrets are valid"),
            address: hex::decode(address).expect("dev addresses are valid hex"),
        }
    }

    pub fn address_id(&self, blockchain: &Blockchain) -> AddressId {
        AddressId::new(blockchain, &self.address)
    }
}

/// Register `wallet` for `owner`, or return the existing registration when the
/// config allows reusing it.
pub async fn ensure_address<Keypair>(
    client: &Client,
    config: &TestConfig,
    owner: &Keypair,
    wallet: &ExternalWallet,
) -> Result<AddressId, Error>
where
    Keypair: Signer<creditext::CreditcoinConfig>,
{
    let address_id = wallet.address_id(&config.ethereum_chain);
    if config.reuse_existing_addresses {
        if let Some(address) = client.address(address_id).await? {
            if address.owner == owner.account_id() {
                tracing::debug!(%address_id, "reusing registered address");
                return Ok(address_id);
            }
        }
    }

    let registered = client
        .register_address(
            owner,
            config.ethereum_chain,
            wallet.address.clone(),
            sign_account_id(&wallet.pair, &owner.account_id()),
            SubmitOptions::default(),
        )
        .await?;
    Ok(registered.value.0)
}

/// Make `authority` an authority through the sudo key, when the config asks for it.
pub async fn ensure_authority<Keypair>(
    client: &Client,
    config: &TestConfig,
    sudo: &Keypair,
    authority: &Keypair,
) -> Result<(), Error>
where
    Keypair: Signer<creditext::CreditcoinConfig>,
{
    if !config.execute_setup_authority {
        return Ok(());
    }
    let who = authority.account_id();
    if client.is_authority(&who).await? {
        return Ok(());
    }
    client
        .add_authority(sudo, who, SubmitOptions::default())
        .await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use creditext::signing::account_id_digest;

    use super::*;

    #[test]
    fn dev_wallets_sign_ownership_proofs() {
        let owner = alice().account_id().clone();
        for index in 0..DEV_WALLETS.len() {
            let wallet = ExternalWallet::dev(index);
            assert_eq!(wallet.address.len(), 20);

            let proof = sign_account_id(&wallet.pair, &owner);
            let recovered = ecdsa::Signature::from_raw(proof)
                .recover_prehashed(&account_id_digest(&owner))
                .unwrap();
            assert_eq!(recovered, wallet.pair.public());
        }
    }

    #[test]
    fn address_ids_depend_on_the_chain() {
        let wallet = ExternalWallet::dev(0);
        assert_ne!(
            wallet.address_id(&Blockchain::ETHEREUM),
            wallet.address_id(&Blockchain::evm(31337))
        );
    }
}
