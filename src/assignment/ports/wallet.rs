//! Wallet registry port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for wallet look-ups.
pub type WalletStoreResult<T> = Result<T, WalletStoreError>;

/// Look-up of contributors' registered payment wallets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Returns the wallet address registered by `user_id`, or `None`.
    ///
    /// `issue_number` is passed for logging on the store side.
    async fn wallet_for(&self, user_id: u64, issue_number: u64)
    -> WalletStoreResult<Option<String>>;
}

/// Errors returned by wallet store implementations.
#[derive(Debug, Clone, Error)]
pub enum WalletStoreError {
    /// The store answered with an unexpected status.
    #[error("wallet lookup failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Transport or decoding failure.
    #[error("wallet store error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl WalletStoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
