//! Adapters Layer - Concrete implementations of the ports
//!
//! - `jupiter`: primary USD price provider
//! - `coingecko`: fallback USD price provider
//! - `memory`: in-memory store and custody, for tests and the demo binary
//! - `cli`: clap argument parsing for the binary

pub mod cli;
pub mod coingecko;
pub mod jupiter;
pub mod memory;

pub use coingecko::CoinGeckoPriceFeed;
pub use jupiter::JupiterPriceFeed;
pub use memory::{InMemoryCustody, InMemoryStore};
