use std::time::Duration;

use clap::Subcommand;
use creditext::{
    multipair::MultiPairSigner,
    types::{Blockchain, Currency, DeployedContract},
    AccountId, Balance, SubmitOptions, SudoClientExt,
};
use subxt::{tx::Signer, utils::H160};
use url::Url;

use crate::{
    cmd::{display_report, Report},
    deser::{parse_evm_address, parse_without_underscore, ParseablePath},
    missing_keypair_error, operation_takes_a_while, OutputFormat,
};

#[derive(Debug, Subcommand)]
#[command(name = "sudo", about = "Root-only Creditcoin extrinsics", version)]
pub(crate) enum SudoCommand {
    /// Allow an account to verify transfers and coin collections.
    AddAuthority { who: AccountId },

    RemoveAuthority { who: AccountId },

    /// Overwrite an account's balance.
    SetBalance {
        who: AccountId,
        #[arg(value_parser = parse_without_underscore::<Balance>)]
        new_free: Balance,
        #[arg(value_parser = parse_without_underscore::<Balance>, default_value = "0")]
        new_reserved: Balance,
    },

    /// Set the contract whose burns can be collected as CTC.
    SetCollectCoinsContract {
        #[arg(value_parser = parse_evm_address)]
        address: H160,
        chain: Blockchain,
    },

    /// Set the GATE token contract.
    SetGateContract {
        #[arg(value_parser = parse_evm_address)]
        address: H160,
        chain: Blockchain,
    },

    /// Set the account paying out GATE swaps.
    SetGateFaucet { address: AccountId },

    /// Register a loan currency. Either JSON or a file path, prepended with an @.
    RegisterCurrency {
        #[arg(value_parser = <Currency as ParseablePath>::parse_json)]
        currency: Currency,
    },
}

impl SudoCommand {
    /// Run a `sudo` command.
    ///
    /// Requires the target RPC address and the sudo keypair.
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
        let Some(account_keypair) = account_keypair else {
            return Err(missing_keypair_error().into());
        };
        let client = creditext::Client::new(node_rpc, n_retries, retry_interval).await?;

        operation_takes_a_while(wait_for_finalization);
        let options = SubmitOptions::from(wait_for_finalization);
        let signer = account_keypair.account_id();

        let report = match self {
            SudoCommand::AddAuthority { who } => {
                let submission = client.add_authority(&account_keypair, who, options).await?;
                Report::new(&submission, &signer)
            }
            SudoCommand::RemoveAuthority { who } => {
                let submission = client
                    .remove_authority(&account_keypair, who, options)
                    .await?;
                Report::new(&submission, &signer)
            }
            SudoCommand::SetBalance {
                who,
                new_free,
                new_reserved,
            } => {
                let submission = client
                    .set_balance(&account_keypair, who, new_free, new_reserved, options)
                    .await?;
                Report::new(&submission, &signer)
            }
            SudoCommand::SetCollectCoinsContract { address, chain } => {
                let submission = client
                    .set_collect_coins_contract(
                        &account_keypair,
                        DeployedContract { address, chain },
                        options,
                    )
                    .await?;
                Report::new(&submission, &signer)
            }
            SudoCommand::SetGateContract { address, chain } => {
                let submission = client
                    .set_gate_contract(&account_keypair, DeployedContract { address, chain }, options)
                    .await?;
                Report::new(&submission, &signer)
            }
            SudoCommand::SetGateFaucet { address } => {
                let submission = client
                    .set_gate_faucet(&account_keypair, address, options)
                    .await?;
                Report::new(&submission, &signer)
            }
            SudoCommand::RegisterCurrency { currency } => {
                let submitted = client
                    .register_currency(&account_keypair, currency, options)
                    .await?;
                let (currency_id, _) = &submitted.value;
                tracing::debug!("[{}] Registered currency {}", submitted.submission.hash, currency_id);
                Report::new(&submitted.submission, &signer).with_result(currency_id)
            }
        };

        display_report(&report, output_format)
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use creditext::CREDO_PER_CTC;

    use super::*;
    use crate::{Cli, SubCommand};

    // //Alice
    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    fn parse(args: &[&str]) -> Result<SudoCommand, clap::Error> {
        let cli = Cli::try_parse_from(["creditext", "sudo"].iter().chain(args))?;
        match cli.subcommand {
            SubCommand::Sudo(cmd) => Ok(cmd),
            other => panic!("expected a sudo command, got {other:?}"),
        }
    }

    #[test]
    fn balances_accept_underscores() {
        let cmd = parse(&["set-balance", ALICE, "1_000_000_000_000_000_000"]).unwrap();

        let SudoCommand::SetBalance {
            who,
            new_free,
            new_reserved,
        } = cmd
        else {
            panic!("expected set-balance");
        };
        assert_eq!(who.to_string(), ALICE);
        assert_eq!(new_free, CREDO_PER_CTC);
        assert_eq!(new_reserved, 0);
    }

    #[test]
    fn contracts_need_a_20_byte_address() {
        assert!(parse(&["set-gate-contract", "0x1234", "ethereum"]).is_err());

        let cmd = parse(&[
            "set-collect-coins-contract",
            "0xa3ee21c306a700e682abcdfe9baa6a08f3820419",
            "rinkeby",
        ])
        .unwrap();
        assert!(matches!(
            cmd,
            SudoCommand::SetCollectCoinsContract { chain, .. } if chain == Blockchain::RINKEBY
        ));
    }
}
