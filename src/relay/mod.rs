//! Relay facade.
//!
//! Builds every component from one validated [`RelayConfig`] and exposes
//! the caller-facing operations. All components share one connection cache.

pub mod types;

pub use types::Reply;

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::accounts::holdings::parse_address;
use crate::accounts::{
    BalanceQuery, BalanceReport, Clock, HolidayWindow, SystemClock, TransactionPreparer,
    UnsignedTransferDescriptor,
};
use crate::config::{validate_config, RelayConfig};
use crate::error::{RelayError, RelayResult};
use crate::ledger::types::Pubkey;
use crate::resilience::{ConnectionCache, Connector, HttpConnector, RetryExecutor, RetryPolicy};
use crate::settlement::{SubmissionOutcome, TransactionSettler};

pub struct Relay {
    asset: Pubkey,
    cache: Arc<ConnectionCache>,
    executor: Arc<RetryExecutor>,
    balances: BalanceQuery,
    preparer: TransactionPreparer,
    settler: TransactionSettler,
}

impl Relay {
    /// Relay talking JSON-RPC to the configured endpoint, on the wall clock.
    pub fn from_config(config: &RelayConfig) -> RelayResult<Self> {
        Self::with_parts(
            config,
            Arc::new(HttpConnector::new(config.rpc.clone())),
            Arc::new(SystemClock),
        )
    }

    /// Relay over a custom connector and clock.
    pub fn with_parts(
        config: &RelayConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> RelayResult<Self> {
        validate_config(config).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            RelayError::Config(messages.join(", "))
        })?;
        let asset = parse_address("asset", &config.asset.mint)?;
        let commitment = config.rpc.commitment;

        let cache = Arc::new(ConnectionCache::new(connector));
        let executor = Arc::new(RetryExecutor::new(
            cache.clone(),
            RetryPolicy::from(&config.retries),
        ));

        Ok(Self {
            asset,
            balances: BalanceQuery::new(
                executor.clone(),
                commitment,
                clock,
                HolidayWindow::from(&config.holiday),
            ),
            preparer: TransactionPreparer::new(executor.clone(), commitment, asset),
            settler: TransactionSettler::new(cache.clone(), commitment, &config.settlement),
            cache,
            executor,
        })
    }

    /// Balance of any asset, holiday override first.
    pub async fn balance(&self, wallet: &str, asset: &str) -> RelayResult<BalanceReport> {
        self.balances
            .get_balance(wallet, asset)
            .instrument(operation_span("balance"))
            .await
    }

    /// Ledger balance of the configured asset. The holiday override does not
    /// apply here.
    pub async fn asset_balance(&self, wallet: &str) -> RelayResult<BalanceReport> {
        async {
            let owner = parse_address("wallet", wallet)?;
            let amount = self.balances.ledger_balance(owner, self.asset).await?;
            Ok::<_, RelayError>(BalanceReport {
                amount,
                holiday_bonus: false,
            })
        }
        .instrument(operation_span("asset_balance"))
        .await
    }

    pub async fn prepare_transfer(&self, wallet: &str) -> RelayResult<UnsignedTransferDescriptor> {
        self.preparer
            .prepare_transfer(wallet)
            .instrument(operation_span("prepare_transfer"))
            .await
    }

    pub async fn submit(&self, serialized_transaction: &str) -> RelayResult<SubmissionOutcome> {
        self.settler
            .submit(serialized_transaction)
            .instrument(operation_span("submit"))
            .await
    }

    /// Provider liveness, with the usual retries.
    pub async fn health(&self) -> RelayResult<()> {
        self.executor
            .call("health", |rpc| async move { rpc.health().await })
            .instrument(operation_span("health"))
            .await
    }

    pub fn asset(&self) -> &Pubkey {
        &self.asset
    }

    pub fn connection(&self) -> &ConnectionCache {
        &self.cache
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("asset", &self.asset)
            .field("connection", &self.cache)
            .finish()
    }
}

fn operation_span(operation: &'static str) -> tracing::Span {
    tracing::info_span!("relay", operation, op_id = %Uuid::new_v4())
}
