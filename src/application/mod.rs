//! Application Layer - Orchestrates domain logic over the ports
//!
//! - `resolver`: ordered price-provider chain with cache and write-back
//! - `ledger`: buy/sell accounting with weighted-average cost
//! - `orders`: limit-order lifecycle and evaluation
//! - `facade`: the external surface, one call per operation
//! - `locks`: keyed async mutual exclusion for wallets and tokens

pub mod facade;
pub mod ledger;
pub mod locks;
pub mod orders;
pub mod resolver;

pub use facade::{Dashboard, LedgerFacade, OrderListing, TickOutcome, TransactionView};
pub use ledger::{HoldingView, PositionLedger, RateModel};
pub use orders::{Evaluation, OrderBook};
pub use resolver::{PriceResolver, Quote};
