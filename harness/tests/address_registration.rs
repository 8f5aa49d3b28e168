use creditext::{
    ids::AddressId, signing::sign_account_id, CreditcoinClientExt, CreditcoinError, ModuleError,
    SubmitOptions,
};
use harness::{alice, connect, dev_signer, setup_logging, ExternalWallet, TestConfig};
use subxt::tx::Signer;

#[tokio::test]
#[ignore = "needs a running Creditcoin node"]
async fn address_registration_round_trips_and_is_unique() {
    setup_logging();
    let config = TestConfig::get();
    let client = connect(config).await.unwrap();
    let alice = alice();
    let wallet = ExternalWallet::dev(0);
    let local_id = AddressId::new(&config.ethereum_chain, &wallet.address);

    if client.address(local_id).await.unwrap().is_none() {
        let registered = client
            .register_address(
                &alice,
                config.ethereum_chain,
                wallet.address.clone(),
                sign_account_id(&wallet.pair, &alice.account_id()),
                SubmitOptions::default(),
            )
            .await
            .unwrap();

        let (chain_id, address) = &registered.value;
        assert_eq!(*chain_id, local_id);
        assert_eq!(address.value, wallet.address);
        assert_eq!(address.owner, *alice.account_id());
        let fee = registered.submission.fee_paid(&alice.account_id()).unwrap();
        assert!(fee >= config.minimum_txn_fee);
    } else {
        assert!(
            config.reuse_existing_addresses,
            "{wallet:?} is already registered, set CREDITCOIN_REUSE_EXISTING_ADDRESSES to rerun"
        );
    }

    // Same address, different account
    let bob = dev_signer("//Bob");
    let error = client
        .register_address(
            &bob,
            config.ethereum_chain,
            wallet.address.clone(),
            sign_account_id(&wallet.pair, &bob.account_id()),
            SubmitOptions::default(),
        )
        .await
        .unwrap_err();

    let module = error.module_error().unwrap();
    assert_eq!(module.qualified_name(), "creditcoin.AddressAlreadyRegistered");
    assert_eq!(
        module.creditcoin_error(),
        Some(CreditcoinError::AddressAlreadyRegistered)
    );
    assert_eq!(
        error.module_error().map(ModuleError::section).as_deref(),
        Some("creditcoin")
    );
}
