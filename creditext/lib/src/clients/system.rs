use std::{future::Future, time::Duration};

use tokio::time::sleep;

use crate::{error::Error, runtime::session::ChainSession, BlockNumber, Client};

/// How long [`SystemClientExt::wait_for_height`] sleeps between checks.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub trait SystemClientExt {
    /// Get the current height of the chain.
    ///
    /// Unless `wait_for_finalization` is set, this is the latest non-finalized block.
    fn height(
        &self,
        wait_for_finalization: bool,
    ) -> impl Future<Output = Result<BlockNumber, Error>>;

    /// Wait for the chain to reach a specific height.
    fn wait_for_height(
        &self,
        height: BlockNumber,
        wait_for_finalization: bool,
    ) -> impl Future<Output = Result<(), Error>>;
}

impl<S> SystemClientExt for Client<S>
where
    S: ChainSession,
{
    async fn height(&self, wait_for_finalization: bool) -> Result<BlockNumber, Error> {
        self.session.block_number(wait_for_finalization).await
    }

    async fn wait_for_height(
        &self,
        height: BlockNumber,
        wait_for_finalization: bool,
    ) -> Result<(), Error> {
        loop {
            let current_height = self.height(wait_for_finalization).await?;
            tracing::debug!("Current height: {current_height}");

            if current_height >= height {
                return Ok(());
            }

            sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::MockSession;

    #[tokio::test]
    async fn height_comes_from_the_session() {
        let session = MockSession::default();
        session.set_block_number(42);
        let client = Client::from(session);

        assert_eq!(client.height(false).await.unwrap(), 42);
        client.wait_for_height(40, true).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn waits_until_the_height_is_reached() {
        let client = Client::from(MockSession::default());
        client.session().set_block_number(1);

        let wait = client.wait_for_height(3, false);
        let bump = async {
            sleep(Duration::from_secs(5)).await;
            client.session().set_block_number(3);
        };
        let (reached, ()) = tokio::join!(wait, bump);

        reached.unwrap();
    }
}
