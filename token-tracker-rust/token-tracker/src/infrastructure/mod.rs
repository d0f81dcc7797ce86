pub mod blockchain;
pub mod config;
pub mod indexer;
pub mod logger;
pub mod monitoring;
