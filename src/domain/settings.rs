//! Per-Wallet Trading Settings
//!
//! Settings are lazily materialized: reads of a wallet that never wrote
//! settings return the defaults, and the first patch creates the record
//! with defaults filled in for unsupplied fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};

pub const DEFAULT_SLIPPAGE_PCT: Decimal = dec!(0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMode {
    Popup,
    Silent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub wallet_id: i64,
    /// Slippage tolerance, 0-100 percent
    pub slippage_pct: Decimal,
    pub mev_protection: bool,
    pub alert_mode: AlertMode,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    /// Defaults for a wallet that has never written settings.
    pub fn defaults(wallet_id: i64) -> Self {
        Self {
            wallet_id,
            slippage_pct: DEFAULT_SLIPPAGE_PCT,
            mev_protection: true,
            alert_mode: AlertMode::Popup,
            updated_at: Utc::now(),
        }
    }

    /// Apply a partial update; only supplied fields change.
    pub fn apply(&mut self, patch: &SettingsPatch) -> LedgerResult<()> {
        patch.validate()?;
        if let Some(slippage) = patch.slippage_pct {
            self.slippage_pct = slippage;
        }
        if let Some(mev) = patch.mev_protection {
            self.mev_protection = mev;
        }
        if let Some(mode) = patch.alert_mode {
            self.alert_mode = mode;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Explicit patch structure: absent fields keep their current value
/// (or the default, on first write).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub slippage_pct: Option<Decimal>,
    pub mev_protection: Option<bool>,
    pub alert_mode: Option<AlertMode>,
}

impl SettingsPatch {
    pub fn validate(&self) -> LedgerResult<()> {
        if let Some(slippage) = self.slippage_pct {
            if slippage < Decimal::ZERO || slippage > dec!(100) {
                return Err(LedgerError::InvalidAmount(format!(
                    "slippage_pct must be 0-100, got {slippage}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::defaults(7);
        assert_eq!(s.slippage_pct, dec!(0.5));
        assert!(s.mev_protection);
        assert_eq!(s.alert_mode, AlertMode::Popup);
    }

    #[test]
    fn test_patch_updates_only_supplied_fields() {
        let mut s = Settings::defaults(1);
        let patch = SettingsPatch {
            slippage_pct: Some(dec!(1.25)),
            mev_protection: None,
            alert_mode: None,
        };
        s.apply(&patch).unwrap();
        assert_eq!(s.slippage_pct, dec!(1.25));
        assert!(s.mev_protection); // untouched
        assert_eq!(s.alert_mode, AlertMode::Popup); // untouched
    }

    #[test]
    fn test_patch_rejects_out_of_range_slippage() {
        let mut s = Settings::defaults(1);
        let patch = SettingsPatch {
            slippage_pct: Some(dec!(150)),
            ..Default::default()
        };
        assert!(matches!(
            s.apply(&patch),
            Err(LedgerError::InvalidAmount(_))
        ));
        // Failed patch leaves settings unchanged
        assert_eq!(s.slippage_pct, dec!(0.5));
    }

    #[test]
    fn test_full_patch() {
        let mut s = Settings::defaults(1);
        let patch = SettingsPatch {
            slippage_pct: Some(dec!(2)),
            mev_protection: Some(false),
            alert_mode: Some(AlertMode::Silent),
        };
        s.apply(&patch).unwrap();
        assert_eq!(s.slippage_pct, dec!(2));
        assert!(!s.mev_protection);
        assert_eq!(s.alert_mode, AlertMode::Silent);
    }
}
