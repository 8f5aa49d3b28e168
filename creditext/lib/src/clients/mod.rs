mod creditcoin;
mod sudo;
mod system;

pub use creditcoin::{CreditcoinClientExt, RegisteredDealOrder};
pub use sudo::SudoClientExt;
pub use system::SystemClientExt;
