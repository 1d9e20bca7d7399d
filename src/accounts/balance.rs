//! Balance queries.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::accounts::holdings::{first_holding, parse_address};
use crate::accounts::holiday::{Clock, HolidayWindow};
use crate::error::RelayResult;
use crate::ledger::types::{Commitment, Pubkey};
use crate::observability::metrics;
use crate::resilience::RetryExecutor;

/// Display balance of one asset for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub amount: f64,
    /// Set when the amount comes from the holiday override.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub holiday_bonus: bool,
}

impl BalanceReport {
    fn ledger(amount: f64) -> Self {
        Self {
            amount,
            holiday_bonus: false,
        }
    }
}

/// Answers balance questions, with the holiday override in front.
pub struct BalanceQuery {
    executor: Arc<RetryExecutor>,
    commitment: Commitment,
    clock: Arc<dyn Clock>,
    holiday: HolidayWindow,
}

impl BalanceQuery {
    pub fn new(
        executor: Arc<RetryExecutor>,
        commitment: Commitment,
        clock: Arc<dyn Clock>,
        holiday: HolidayWindow,
    ) -> Self {
        Self {
            executor,
            commitment,
            clock,
            holiday,
        }
    }

    /// Balance of `asset` held by `wallet`.
    ///
    /// Inside the holiday window this returns the override amount without
    /// validating either identifier or contacting the ledger. Otherwise both
    /// identifiers must be valid addresses; a wallet with no holding account
    /// has balance 0.
    pub async fn get_balance(&self, wallet: &str, asset: &str) -> RelayResult<BalanceReport> {
        if let Some(amount) = self.holiday.override_for(self.clock.today()) {
            tracing::info!(amount, "Holiday period active, returning override balance");
            metrics::record_holiday_override();
            return Ok(BalanceReport {
                amount,
                holiday_bonus: true,
            });
        }

        let owner = parse_address("wallet", wallet)?;
        let mint = parse_address("asset", asset)?;
        self.ledger_balance(owner, mint).await.map(BalanceReport::ledger)
    }

    /// Balance as reported by the ledger, with no override.
    pub async fn ledger_balance(&self, owner: Pubkey, mint: Pubkey) -> RelayResult<f64> {
        let amount = match first_holding(&self.executor, owner, mint, self.commitment).await? {
            Some(account) => account.amount.ui_amount,
            None => {
                tracing::debug!(owner = %owner, "No holding account, balance is zero");
                0.0
            }
        };
        Ok(amount)
    }
}
