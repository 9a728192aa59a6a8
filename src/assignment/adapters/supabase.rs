//! Wallet registry backed by the Supabase (`PostgREST`) users table.

use super::http::{
    RetryPolicy, is_retryable_status, is_retryable_transport_error, parse_retry_after,
    truncate_for_error,
};
use crate::assignment::ports::{WalletStore, WalletStoreError, WalletStoreResult};
use crate::config::PluginEnv;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const API_KEY_HEADER: &str = "apikey";
const USERS_PATH: &str = "rest/v1/users";

#[derive(Debug, Deserialize)]
struct UserRow {
    #[serde(default)]
    wallets: Option<WalletRow>,
}

#[derive(Debug, Deserialize)]
struct WalletRow {
    #[serde(default)]
    address: Option<String>,
}

/// Wallet look-ups against `GET /rest/v1/users?select=id,wallets(address)`.
#[derive(Debug, Clone)]
pub struct SupabaseWalletStore {
    http: reqwest::Client,
    users_url: String,
    retry: RetryPolicy,
}

impl SupabaseWalletStore {
    /// Builds a store for the database described by `env`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletStoreError::Backend`] when the key is not a valid
    /// header value or the HTTP client cannot be built.
    pub fn new(env: &PluginEnv) -> WalletStoreResult<Self> {
        let key = env.supabase_key();
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(key).map_err(WalletStoreError::backend)?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(WalletStoreError::backend)?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(WalletStoreError::backend)?;
        let base = env.supabase_url().as_str().trim_end_matches('/');
        Ok(Self {
            http,
            users_url: format!("{base}/{USERS_PATH}"),
            retry: RetryPolicy::default(),
        })
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl WalletStore for SupabaseWalletStore {
    async fn wallet_for(
        &self,
        user_id: u64,
        issue_number: u64,
    ) -> WalletStoreResult<Option<String>> {
        let id_filter = format!("eq.{user_id}");
        let mut attempt = 0_usize;
        let rows: Vec<UserRow> = loop {
            attempt = attempt.saturating_add(1);
            let sent = self
                .http
                .get(&self.users_url)
                .query(&[("select", "id,wallets(address)"), ("id", id_filter.as_str())])
                .send()
                .await;
            match sent {
                Ok(response) if response.status().is_success() => {
                    break response.json().await.map_err(WalletStoreError::backend)?;
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if self.retry.should_retry(attempt) && is_retryable_status(status) {
                        tokio::time::sleep(self.retry.delay(attempt, retry_after)).await;
                        continue;
                    }
                    return Err(WalletStoreError::Status {
                        status,
                        body: truncate_for_error(&body),
                    });
                }
                Err(err) => {
                    if self.retry.should_retry(attempt) && is_retryable_transport_error(&err) {
                        tokio::time::sleep(self.retry.delay(attempt, None)).await;
                        continue;
                    }
                    return Err(WalletStoreError::backend(err));
                }
            }
        };

        let address = rows
            .into_iter()
            .next()
            .and_then(|row| row.wallets)
            .and_then(|wallet| wallet.address)
            .filter(|address| !address.trim().is_empty());
        if address.is_none() {
            info!(user_id, issue_number, "no wallet registered for user");
        } else {
            debug!(user_id, issue_number, "found registered wallet");
        }
        Ok(address)
    }
}
