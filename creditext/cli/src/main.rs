#![deny(clippy::unwrap_used)]

mod cmd;
mod deser;

use std::{fmt::Display, time::Duration};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use cmd::{creditcoin::CreditcoinCommand, sudo::SudoCommand, system::SystemCommand};
use creditext::{multipair::MultiPairArgs, MultiPairSigner};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};
use url::Url;

pub(crate) const FULL_NODE_DEFAULT_RPC_ADDR: &str = "ws://127.0.0.1:9944";

#[derive(Debug, Parser)]
#[command(name = "creditext", about = "CLI client to the Creditcoin chain", version)]
struct Cli {
    #[command(subcommand)]
    pub subcommand: SubCommand,

    /// RPC server's URL.
    #[arg(long, env, default_value = FULL_NODE_DEFAULT_RPC_ADDR)]
    pub node_rpc: Url,

    /// Keypair signing the extrinsics, not needed for read-only commands.
    #[command(flatten)]
    pub pair: MultiPairArgs,

    /// The number of connection retries when trying to initially connect to the node.
    #[arg(long, default_value = "10")]
    pub n_retries: u32,

    /// The retry interval in milliseconds.
    #[arg(long, default_value = "3000", value_parser = parse_ms)]
    pub retry_interval: Duration,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Wait for the extrinsic's block to be finalized instead of just included.
    #[arg(long, global = true, default_value_t = false)]
    pub wait_for_finalization: bool,
}

fn parse_ms(s: &str) -> Result<Duration, String> {
    Ok(Duration::from_millis(s.parse().map_err(|_| {
        format!("{s} is not a valid number of milliseconds")
    })?))
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Creditcoin pallet extrinsics and storage.
    #[command(subcommand)]
    Creditcoin(CreditcoinCommand),
    /// Root-only extrinsics, signed by the sudo key.
    #[command(subcommand)]
    Sudo(SudoCommand),
    /// Chain height.
    #[command(subcommand)]
    System(SystemCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Plain,
    Json,
}

impl OutputFormat {
    pub fn format<T>(&self, value: &T) -> Result<String, serde_json::Error>
    where
        T: serde::Serialize + Display,
    {
        match self {
            OutputFormat::Plain => Ok(value.to_string()),
            OutputFormat::Json => serde_json::to_string(value),
        }
    }
}

/// Error for signed commands run without any of the keypair arguments.
pub(crate) fn missing_keypair_error() -> clap::Error {
    Cli::command().error(
        clap::error::ErrorKind::MissingRequiredArgument,
        "this command requires one of --sr25519-key, --ecdsa-key or --ed25519-key",
    )
}

pub(crate) fn operation_takes_a_while(wait_for_finalization: bool) {
    if wait_for_finalization {
        tracing::info!("this operation waits for finalization and may take a while");
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Logger initialization.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(LevelFilter::INFO.into())
                        .from_env()?,
                )
                .with_filter(filter::filter_fn(|metadata| {
                    if let Some(module_path) = metadata.module_path() {
                        module_path.starts_with("creditext")
                    } else {
                        true
                    }
                })),
        )
        .init();

    let cli_arguments = Cli::parse();
    let account_keypair = Option::<MultiPairSigner>::from(cli_arguments.pair);

    match cli_arguments.subcommand {
        SubCommand::Creditcoin(cmd) => {
            cmd.run(
                cli_arguments.node_rpc,
                account_keypair,
                cli_arguments.n_retries,
                cli_arguments.retry_interval,
                cli_arguments.format,
                cli_arguments.wait_for_finalization,
            )
            .await?
        }
        SubCommand::Sudo(cmd) => {
            cmd.run(
                cli_arguments.node_rpc,
                account_keypair,
                cli_arguments.n_retries,
                cli_arguments.retry_interval,
                cli_arguments.format,
                cli_arguments.wait_for_finalization,
            )
            .await?
        }
        SubCommand::System(cmd) => {
            cmd.run(
                cli_arguments.node_rpc,
                cli_arguments.n_retries,
                cli_arguments.retry_interval,
                cli_arguments.format,
            )
            .await?
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn read_only_commands_need_no_key() {
        let cli = Cli::try_parse_from(["creditext", "system", "get-height"]).unwrap();

        assert_eq!(cli.node_rpc.as_str(), "ws://127.0.0.1:9944/");
        assert!(Option::<MultiPairSigner>::from(cli.pair).is_none());
    }

    #[test]
    fn keypair_and_global_flags() {
        let cli = Cli::try_parse_from([
            "creditext",
            "--sr25519-key",
            "//Alice",
            "--format",
            "json",
            "creditcoin",
            "lock-deal-order",
            "100-0x0000000000000000000000000000000000000000000000000000000000000001",
            "--wait-for-finalization",
        ])
        .unwrap();

        assert!(cli.wait_for_finalization);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            Option::<MultiPairSigner>::from(cli.pair),
            Some(MultiPairSigner::Sr25519(_))
        ));
    }
}
