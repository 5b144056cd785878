//! Wallet Custody Port
//!
//! The ledger never touches keys or addresses; it only reads balances and
//! requests debits/credits from the custody collaborator. The "one active
//! wallet" flag lives on the custody side as well - every ledger call
//! carries an explicit wallet id.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::LedgerResult;

#[async_trait]
pub trait WalletCustody: Send + Sync {
    /// Current SOL balance. Fails with `WalletNotFound` for unknown ids.
    async fn balance(&self, wallet_id: i64) -> LedgerResult<Decimal>;

    /// Debit SOL from the wallet. Fails with `InsufficientBalance` when the
    /// balance cannot cover the amount; balance is left untouched then.
    async fn debit(&self, wallet_id: i64, amount: Decimal) -> LedgerResult<()>;

    /// Credit SOL to the wallet.
    async fn credit(&self, wallet_id: i64, amount: Decimal) -> LedgerResult<()>;
}
