//! Scripted in-memory ledger for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::RelayError;
use crate::ledger::client::LedgerRpc;
use crate::ledger::types::{
    Checkpoint, Commitment, Confirmation, HoldingAccount, Pubkey, RpcError, RpcResult,
    SendOptions, TokenAmount,
};
use crate::resilience::{ConnectionCache, RetryExecutor, RetryPolicy};

#[derive(Default)]
pub(crate) struct StubLedger {
    holdings: Vec<HoldingAccount>,
    list_failures: AtomicU32,
    sends: Mutex<VecDeque<RpcResult<String>>>,
    confirmations: Mutex<VecDeque<RpcResult<Confirmation>>>,
    confirm_delay: Option<Duration>,
    calls: Mutex<Vec<&'static str>>,
}

impl StubLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_holding(mut self, account: HoldingAccount) -> Self {
        self.holdings.push(account);
        self
    }

    /// Fail the next `n` holdings queries with a transport error.
    pub(crate) fn failing_lists(self, n: u32) -> Self {
        self.list_failures.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_send(self, result: RpcResult<String>) -> Self {
        self.sends.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_confirmation(self, result: RpcResult<Confirmation>) -> Self {
        self.confirmations.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| **c == method).count()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }
}

#[async_trait]
impl LedgerRpc for StubLedger {
    async fn list_holding_accounts(
        &self,
        _owner: &Pubkey,
        _mint: &Pubkey,
        _commitment: Commitment,
    ) -> RpcResult<Vec<HoldingAccount>> {
        self.record("list_holding_accounts");
        let remaining = self.list_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.list_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(RpcError::Transport("connection reset".into()));
        }
        Ok(self.holdings.clone())
    }

    async fn latest_checkpoint(&self, _commitment: Commitment) -> RpcResult<Checkpoint> {
        self.record("latest_checkpoint");
        Ok(checkpoint())
    }

    async fn send_transaction(&self, _wire: &[u8], _options: &SendOptions) -> RpcResult<String> {
        self.record("send_transaction");
        self.sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Request("no scripted send".into())))
    }

    async fn await_confirmation(
        &self,
        _signature: &str,
        _commitment: Commitment,
    ) -> RpcResult<Confirmation> {
        self.record("await_confirmation");
        if let Some(delay) = self.confirm_delay {
            tokio::time::sleep(delay).await;
        }
        self.confirmations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RpcError::Request("no scripted confirmation".into())))
    }

    async fn health(&self) -> RpcResult<()> {
        self.record("health");
        Ok(())
    }
}

pub(crate) fn checkpoint() -> Checkpoint {
    Checkpoint {
        blockhash: "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N".into(),
        last_valid_block_height: 3_090,
    }
}

pub(crate) fn holding(seed: u8, ui_amount: f64) -> HoldingAccount {
    HoldingAccount {
        address: Pubkey::new_from_array([seed; 32]),
        amount: TokenAmount {
            raw: ((ui_amount * 1e6) as u64).to_string(),
            decimals: 6,
            ui_amount,
        },
    }
}

/// Cache serving `stub` forever.
pub(crate) fn cache_for(stub: Arc<StubLedger>) -> Arc<ConnectionCache> {
    let connector = move || -> Result<Arc<dyn LedgerRpc>, RelayError> {
        Ok(stub.clone() as Arc<dyn LedgerRpc>)
    };
    Arc::new(ConnectionCache::new(Arc::new(connector)))
}

/// Executor over `stub` with a 1 ms backoff unit.
pub(crate) fn executor_for(stub: Arc<StubLedger>) -> Arc<RetryExecutor> {
    Arc::new(RetryExecutor::new(
        cache_for(stub),
        RetryPolicy {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(1),
        },
    ))
}
