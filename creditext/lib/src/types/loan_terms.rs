use codec::{Decode, Encode};

use super::U256;
use crate::ids::CurrencyId;

/// Runtime's own duration type, a plain `{ secs, nanos }` pair.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Duration {
    pub secs: u64,
    pub nanos: u32,
}

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs, nanos: 0 }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self {
            secs: millis / 1000,
            nanos: ((millis % 1000) * 1_000_000) as u32,
        }
    }
}

impl From<std::time::Duration> for Duration {
    fn from(value: std::time::Duration) -> Self {
        Self {
            secs: value.as_secs(),
            nanos: value.subsec_nanos(),
        }
    }
}

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        std::time::Duration::new(value.secs, value.nanos)
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum InterestType {
    #[default]
    Simple,
    Compound,
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct InterestRate {
    pub rate_per_period: u64,
    pub decimals: u64,
    pub period: Duration,
    pub interest_type: InterestType,
}

/// Terms shared by ask and bid orders.
///
/// The runtime rejects terms with a zero `term_length`, or whose `term_length`
/// is not a multiple of the interest `period`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Encode,
    Decode,
    scale_encode::EncodeAsType,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct LoanTerms {
    pub amount: U256,
    pub interest_rate: InterestRate,
    pub term_length: Duration,
    pub currency: CurrencyId,
}
