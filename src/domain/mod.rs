//! Domain Layer - Core ledger types and arithmetic
//!
//! Pure types and cost-accounting logic with no external dependencies.
//! All external interactions (custody, price transport, storage) happen
//! through the ports layer.

pub mod error;
pub mod holding;
pub mod order;
pub mod settings;
pub mod token;
pub mod transaction;

pub use error::{LedgerError, LedgerResult};
pub use holding::{Holding, SellEffect};
pub use order::{LimitOrder, OrderView};
pub use settings::{AlertMode, Settings, SettingsPatch, DEFAULT_SLIPPAGE_PCT};
pub use token::{Token, DEFAULT_TOKEN_DECIMALS};
pub use transaction::{Transaction, TxKind, TxStatus};
