//! Calendar override for balance queries.
//!
//! During a fixed yearly window every balance query answers with a fixed
//! amount, before any input validation or ledger access.

use chrono::{Datelike, Local, NaiveDate};

use crate::config::HolidayConfig;

/// Source of the current local date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the process's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Inclusive day range within one month, repeating every year.
#[derive(Debug, Clone, PartialEq)]
pub struct HolidayWindow {
    enabled: bool,
    month: u32,
    start_day: u32,
    end_day: u32,
    amount: f64,
}

impl HolidayWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.enabled
            && date.month() == self.month
            && (self.start_day..=self.end_day).contains(&date.day())
    }

    /// The override amount if `date` falls inside the window.
    pub fn override_for(&self, date: NaiveDate) -> Option<f64> {
        self.contains(date).then_some(self.amount)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

impl From<&HolidayConfig> for HolidayWindow {
    fn from(config: &HolidayConfig) -> Self {
        Self {
            enabled: config.enabled,
            month: config.month,
            start_day: config.start_day,
            end_day: config.end_day,
            amount: config.amount,
        }
    }
}

impl Default for HolidayWindow {
    fn default() -> Self {
        Self::from(&HolidayConfig::default())
    }
}
