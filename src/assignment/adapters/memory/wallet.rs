//! In-memory wallet registry and fixed clock for tests.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::assignment::ports::{WalletStore, WalletStoreError, WalletStoreResult};

/// Thread-safe in-memory wallet registry keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<u64, String>>>,
}

impl InMemoryWalletStore {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `address` for `user_id`, replacing any previous address.
    pub fn register(&self, user_id: u64, address: impl Into<String>) {
        let mut wallets = self
            .wallets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        wallets.insert(user_id, address.into());
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn wallet_for(
        &self,
        user_id: u64,
        _issue_number: u64,
    ) -> WalletStoreResult<Option<String>> {
        let wallets = self.wallets.read().map_err(|err| {
            WalletStoreError::backend(std::io::Error::other(err.to_string()))
        })?;
        Ok(wallets.get(&user_id).cloned())
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Creates a clock that always reports `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
