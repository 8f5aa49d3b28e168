use creditext::{
    ids::{AddressId, AskOrderId},
    types::{Duration, InterestRate, InterestType, LoanTerms, U256},
    CreditcoinClientExt, CreditcoinError, SubmitOptions, SystemClientExt,
};
use harness::{connect, dev_signer, ensure_address, setup_logging, ExternalWallet, TestConfig};
use subxt::tx::Signer;

fn terms() -> LoanTerms {
    LoanTerms {
        amount: U256::from(1_000u64),
        interest_rate: InterestRate {
            rate_per_period: 100,
            decimals: 4,
            period: Duration::from_secs(60),
            interest_type: InterestType::Simple,
        },
        term_length: Duration::from_secs(6_000),
        currency: Default::default(),
    }
}

fn unique_guid() -> Vec<u8> {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("ask-{nanos}").into_bytes()
}

#[tokio::test]
#[ignore = "needs a running Creditcoin node"]
async fn ask_order_charges_a_fee_and_needs_an_address() {
    setup_logging();
    let config = TestConfig::get();
    let client = connect(config).await.unwrap();
    let charlie = dev_signer("//Charlie");
    let address_id = ensure_address(&client, config, &charlie, &ExternalWallet::dev(1))
        .await
        .unwrap();
    let expiration_block = client.height(false).await.unwrap() + 1_000;
    let guid = unique_guid();

    let added = client
        .add_ask_order(
            &charlie,
            address_id,
            terms(),
            expiration_block,
            guid.clone(),
            SubmitOptions::default(),
        )
        .await
        .unwrap();

    let (ask_order_id, ask_order) = &added.value;
    assert_eq!(*ask_order_id, AskOrderId::new(expiration_block, &guid));
    assert_eq!(ask_order.lender_address_id, address_id);
    let fee = added.submission.fee_paid(&charlie.account_id()).unwrap();
    assert!(
        fee >= config.minimum_txn_fee,
        "fee {fee} is below {}",
        config.minimum_txn_fee
    );

    let unregistered = AddressId::new(&config.ethereum_chain, b"never registered");
    let error = client
        .add_ask_order(
            &charlie,
            unregistered,
            terms(),
            expiration_block,
            unique_guid(),
            SubmitOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        error.module_error().and_then(|module| module.creditcoin_error()),
        Some(CreditcoinError::NonExistentAddress)
    );
}
