pub mod caption;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod jsonl;
pub mod logging;
pub mod materialize;
pub mod metrics;
pub mod pairing;
pub mod split;
pub mod types;
