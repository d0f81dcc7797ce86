pub mod abi;
pub mod ethereum;
pub mod tracker;

pub use tracker::TokenBalanceTracker;
