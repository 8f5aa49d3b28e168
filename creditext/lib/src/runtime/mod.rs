//! Everything between a typed call and the chain.

pub mod calls;
pub mod client;
pub mod events;
pub mod online;
pub mod session;
pub mod storage;
pub mod verification;
