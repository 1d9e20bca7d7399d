//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1, calendar days)
//! - Check the endpoint URL and asset mint parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - A missing API key is not a validation error; the connection cache
//!   reports it when the first handle is built

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::ledger::types::parse_pubkey;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("rpc.endpoint '{0}' is not a valid URL: {1}")]
    InvalidEndpoint(String, String),

    #[error("asset.mint is not a valid address: {0}")]
    InvalidMint(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("holiday window {month}/{start_day}-{end_day} is not a valid date range")]
    InvalidHolidayWindow {
        month: u32,
        start_day: u32,
        end_day: u32,
    },

    #[error("holiday.amount must be a non-negative number")]
    InvalidHolidayAmount,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.rpc.endpoint) {
        errors.push(ValidationError::InvalidEndpoint(
            config.rpc.endpoint.clone(),
            e.to_string(),
        ));
    }

    if let Err(e) = parse_pubkey(&config.asset.mint) {
        errors.push(ValidationError::InvalidMint(e.to_string()));
    }

    if config.rpc.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero("rpc.request_timeout_ms"));
    }
    if config.rpc.confirmation_poll_ms == 0 {
        errors.push(ValidationError::Zero("rpc.confirmation_poll_ms"));
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero("retries.max_attempts"));
    }
    if config.settlement.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::Zero("settlement.confirmation_timeout_secs"));
    }

    let holiday = &config.holiday;
    if holiday.enabled {
        // Leap year so that 2/29 is accepted.
        let day = |d| NaiveDate::from_ymd_opt(2024, holiday.month, d);
        if holiday.start_day > holiday.end_day
            || day(holiday.start_day).is_none()
            || day(holiday.end_day).is_none()
        {
            errors.push(ValidationError::InvalidHolidayWindow {
                month: holiday.month,
                start_day: holiday.start_day,
                end_day: holiday.end_day,
            });
        }
        if !(holiday.amount.is_finite() && holiday.amount >= 0.0) {
            errors.push(ValidationError::InvalidHolidayAmount);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
