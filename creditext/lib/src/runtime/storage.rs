//! Raw storage keys of the Creditcoin pallet.
//!
//! A key is `twox_128(pallet) ++ twox_128(entry)` followed by each map key
//! run through the hasher the runtime declares for it.

use codec::Encode;
use subxt::ext::sp_core::hashing::{blake2_128, twox_128, twox_64};

use crate::{
    ids::{
        AddressId, AskOrderId, BidOrderId, BurnGateId, CollectedCoinsId, DealOrderId, OfferId,
        TransferId,
    },
    AccountId,
};

const PALLET: &str = "Creditcoin";

fn prefix(entry: &str) -> Vec<u8> {
    let mut key = twox_128(PALLET.as_bytes()).to_vec();
    key.extend_from_slice(&twox_128(entry.as_bytes()));
    key
}

fn blake2_128_concat(key: &mut Vec<u8>, encoded: &[u8]) {
    key.extend_from_slice(&blake2_128(encoded));
    key.extend_from_slice(encoded);
}

fn twox_64_concat(key: &mut Vec<u8>, encoded: &[u8]) {
    key.extend_from_slice(&twox_64(encoded));
    key.extend_from_slice(encoded);
}

fn double_map(entry: &str, block: u32, hash: &[u8]) -> Vec<u8> {
    let mut key = prefix(entry);
    twox_64_concat(&mut key, &block.encode());
    // Identity
    key.extend_from_slice(hash);
    key
}

pub fn addresses(id: &AddressId) -> Vec<u8> {
    let mut key = prefix("Addresses");
    blake2_128_concat(&mut key, &id.encode());
    key
}

pub fn authorities(who: &AccountId) -> Vec<u8> {
    let mut key = prefix("Authorities");
    blake2_128_concat(&mut key, &who.encode());
    key
}

pub fn transfers(id: &TransferId) -> Vec<u8> {
    let mut key = prefix("Transfers");
    key.extend_from_slice(&id.encode());
    key
}

pub fn collected_coins(id: &CollectedCoinsId) -> Vec<u8> {
    let mut key = prefix("CollectedCoins");
    key.extend_from_slice(&id.encode());
    key
}

pub fn burned_gate(id: &BurnGateId) -> Vec<u8> {
    let mut key = prefix("BurnedGATE");
    key.extend_from_slice(&id.encode());
    key
}

pub fn ask_orders(id: &AskOrderId) -> Vec<u8> {
    double_map("AskOrders", id.expiration_block(), id.hash().as_bytes())
}

pub fn bid_orders(id: &BidOrderId) -> Vec<u8> {
    double_map("BidOrders", id.expiration_block(), id.hash().as_bytes())
}

pub fn offers(id: &OfferId) -> Vec<u8> {
    double_map("Offers", id.expiration_block(), id.hash().as_bytes())
}

pub fn deal_orders(id: &DealOrderId) -> Vec<u8> {
    double_map("DealOrders", id.expiration_block(), id.hash().as_bytes())
}
