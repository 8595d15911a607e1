pub use raffyl_abi::{
    boundary,
    format_address,
    format_token_amount,
    format_tx_hash,
    gateway,
    parse_token_amount,
};

pub mod actions;
pub mod aggregator;
pub mod client;
pub mod rules;
pub mod session;
pub mod ui;
pub mod wallets;

#[cfg(feature = "test-helpers")]
pub use raffyl_abi::test_helpers;
