use creditext::{CreditcoinClientExt, SystemClientExt};
use harness::{alice, connect, ensure_authority, setup_logging, TestConfig};
use subxt::tx::Signer;

#[tokio::test]
#[ignore = "needs a running Creditcoin node"]
async fn authority_setup_is_idempotent() {
    setup_logging();
    let config = TestConfig::get();
    if !config.execute_setup_authority {
        return;
    }
    let client = connect(config).await.unwrap();
    let alice = alice();

    // On development chains `//Alice` holds the sudo key
    ensure_authority(&client, config, &alice, &alice).await.unwrap();
    assert!(client.is_authority(&alice.account_id()).await.unwrap());

    let height = client.height(false).await.unwrap();
    ensure_authority(&client, config, &alice, &alice).await.unwrap();
    assert!(client.is_authority(&alice.account_id()).await.unwrap());
    assert!(client.height(false).await.unwrap() >= height);
}
