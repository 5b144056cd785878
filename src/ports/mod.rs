//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Wallet custody (balance reads, debit/credit)
//! - Price transport (one feed per provider)
//! - Persistence (keyed record store per entity)

pub mod custody;
pub mod mocks;
pub mod price_feed;
pub mod store;

pub use custody::WalletCustody;
pub use price_feed::{PriceFeed, PriceFeedError};
pub use store::LedgerStore;
