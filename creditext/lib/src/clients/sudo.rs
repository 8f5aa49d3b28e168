use std::future::Future;

use codec::Encode;
use subxt::utils::MultiAddress;

use crate::{
    error::Error,
    ids::CurrencyId,
    runtime::{
        calls::{
            AddAuthority, RegisterCurrency, RemoveAuthority, RuntimeCall, SetBalance,
            SetCollectCoinsContract, SetGateContract, SetGateFaucet,
        },
        client::{decode_dispatch_error, Client, SubmissionResult, SubmitOptions, Submitted},
        events::{CurrencyRegistered, Sudid},
        session::ChainSession,
    },
    types::{Currency, DeployedContract},
    AccountId, Balance, CreditcoinConfig,
};

/// Root-only extrinsics, dispatched through `Sudo::sudo`.
///
/// The signer must be the sudo key. A failure of the wrapped call does not fail
/// the extrinsic itself; it is reported by `Sudo::Sudid` and surfaced here as
/// [`Error::Dispatch`].
pub trait SudoClientExt {
    fn add_authority<Keypair>(
        &self,
        account_keypair: &Keypair,
        who: AccountId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn remove_authority<Keypair>(
        &self,
        account_keypair: &Keypair,
        who: AccountId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Set the free and reserved balance of `who`.
    fn set_balance<Keypair>(
        &self,
        account_keypair: &Keypair,
        who: AccountId,
        new_free: Balance,
        new_reserved: Balance,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    /// Contract whose burns can be collected with `request_collect_coins`.
    fn set_collect_coins_contract<Keypair>(
        &self,
        account_keypair: &Keypair,
        contract: DeployedContract,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn set_gate_contract<Keypair>(
        &self,
        account_keypair: &Keypair,
        contract: DeployedContract,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn set_gate_faucet<Keypair>(
        &self,
        account_keypair: &Keypair,
        address: AccountId,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<SubmissionResult, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;

    fn register_currency<Keypair>(
        &self,
        account_keypair: &Keypair,
        currency: Currency,
        options: SubmitOptions,
    ) -> impl Future<Output = Result<Submitted<(CurrencyId, Currency)>, Error>>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>;
}

impl<S> Client<S>
where
    S: ChainSession,
{
    async fn sudo_submission<Keypair>(
        &self,
        call: RuntimeCall,
        account_keypair: &Keypair,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let submission = self
            .traced_submission(&call.sudo(), account_keypair, options)
            .await?;

        let Sudid { sudo_result } = submission.find_first()?;
        if let Err(error) = sudo_result {
            let error = decode_dispatch_error(&self.session, &error.encode());
            tracing::debug!("sudo call failed: {}", error);
            return Err(Error::Dispatch(error));
        }

        Ok(submission)
    }
}

impl<S> SudoClientExt for Client<S>
where
    S: ChainSession,
{
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(address = %account_keypair.account_id(), who = %who)
    )]
    async fn add_authority<Keypair>(
        &self,
        account_keypair: &Keypair,
        who: AccountId,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        self.sudo_submission(AddAuthority { who }.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(address = %account_keypair.account_id(), who = %who)
    )]
    async fn remove_authority<Keypair>(
        &self,
        account_keypair: &Keypair,
        who: AccountId,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        self.sudo_submission(RemoveAuthority { who }.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(
            address = %account_keypair.account_id(),
            who = %who,
            new_free = new_free,
            new_reserved = new_reserved,
        )
    )]
    async fn set_balance<Keypair>(
        &self,
        account_keypair: &Keypair,
        who: AccountId,
        new_free: Balance,
        new_reserved: Balance,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = SetBalance {
            who: MultiAddress::Id(who),
            new_free,
            new_reserved,
        };
        self.sudo_submission(call.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(address = %account_keypair.account_id(), contract = ?contract)
    )]
    async fn set_collect_coins_contract<Keypair>(
        &self,
        account_keypair: &Keypair,
        contract: DeployedContract,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = SetCollectCoinsContract { contract };
        self.sudo_submission(call.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(address = %account_keypair.account_id(), contract = ?contract)
    )]
    async fn set_gate_contract<Keypair>(
        &self,
        account_keypair: &Keypair,
        contract: DeployedContract,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let call = SetGateContract { contract };
        self.sudo_submission(call.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(address = %account_keypair.account_id(), faucet = %address)
    )]
    async fn set_gate_faucet<Keypair>(
        &self,
        account_keypair: &Keypair,
        address: AccountId,
        options: SubmitOptions,
    ) -> Result<SubmissionResult, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        self.sudo_submission(SetGateFaucet { address }.into(), account_keypair, options)
            .await
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(address = %account_keypair.account_id())
    )]
    async fn register_currency<Keypair>(
        &self,
        account_keypair: &Keypair,
        currency: Currency,
        options: SubmitOptions,
    ) -> Result<Submitted<(CurrencyId, Currency)>, Error>
    where
        Keypair: subxt::tx::Signer<CreditcoinConfig>,
    {
        let local_id = CurrencyId::new(&currency);
        let submission = self
            .sudo_submission(RegisterCurrency { currency }.into(), account_keypair, options)
            .await?;

        let CurrencyRegistered(id, currency) = submission.find_first()?;
        if id != local_id {
            tracing::warn!(
                local = %local_id,
                chain = %id,
                "locally derived currency id does not match the chain's"
            );
        }

        Ok(Submitted {
            value: (id, currency),
            submission,
        })
    }
}
