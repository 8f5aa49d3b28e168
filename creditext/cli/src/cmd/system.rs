use std::time::Duration;

use clap::Subcommand;
use creditext::{BlockNumber, SystemClientExt};
use url::Url;

use crate::OutputFormat;

#[derive(Debug, Subcommand)]
#[command(name = "system", about = "System related actions", version)]
pub(crate) enum SystemCommand {
    /// Get current height
    GetHeight {
        /// Wait for finalized blocks only
        #[arg(long, default_value_t = false)]
        finalized: bool,
    },
    /// Wait for a specific block height
    WaitForHeight {
        /// Block height to wait for
        height: BlockNumber,

        /// Wait for finalized blocks only
        #[arg(long, default_value_t = false)]
        finalized: bool,
    },
}

impl SystemCommand {
    /// Run a `system` command.
    ///
    /// Requires the target RPC address.
    #[tracing::instrument(level = "info", skip(self, node_rpc), fields(node_rpc = node_rpc.as_str()))]
    pub async fn run(
        self,
        node_rpc: Url,
        n_retries: u32,
        retry_interval: Duration,
        output_format: OutputFormat,
    ) -> Result<(), anyhow::Error> {
        let client = creditext::Client::new(node_rpc, n_retries, retry_interval).await?;

        match self {
            SystemCommand::GetHeight { finalized } => {
                let height = client.height(finalized).await?;
                match output_format {
                    OutputFormat::Plain => println!("{} block: {height}", block_kind(finalized)),
                    // A number is valid JSON as is
                    OutputFormat::Json => println!("{height}"),
                }
            }
            SystemCommand::WaitForHeight { height, finalized } => {
                client.wait_for_height(height, finalized).await?;
                match output_format {
                    OutputFormat::Plain => {
                        println!("{} block reached height {height}", block_kind(finalized))
                    }
                    OutputFormat::Json => println!("{height}"),
                }
            }
        };

        Ok(())
    }
}

fn block_kind(finalized: bool) -> &'static str {
    if finalized {
        "Finalized"
    } else {
        "Best"
    }
}
