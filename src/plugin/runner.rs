//! Runs one invocation against the live GitHub and wallet adapters.

use super::{CommandDispatcher, DispatchOutcome, PluginError, PluginEvent, PluginInputs};
use crate::assignment::adapters::{
    github::{GitHubConfig, GitHubIssueTracker},
    http::RetryPolicy,
    supabase::SupabaseWalletStore,
};
use crate::config::{PluginEnv, StartStopSettings};
use mockable::DefaultClock;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};

/// Outbound connection options shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// GitHub REST base URL; GraphQL is served under `/graphql`.
    pub github_api_base: String,
    /// Retry policy for GitHub and wallet requests.
    pub retry: RetryPolicy,
}

/// Decodes the event and dispatches it.
///
/// `settings` and `env` must already be validated.
///
/// # Errors
///
/// Returns [`PluginError`] when the payload cannot be decoded or a client
/// cannot be built.
pub async fn run_plugin(
    inputs: &PluginInputs,
    settings: StartStopSettings,
    env: &PluginEnv,
    config: &RunnerConfig,
) -> Result<DispatchOutcome, PluginError> {
    let span = info_span!("invocation", state_id = %inputs.state_id, event = %inputs.event_name);
    async {
        let event = PluginEvent::decode(&inputs.event_name, &inputs.event_payload)?;
        let tracker = GitHubIssueTracker::new(
            GitHubConfig::new(config.github_api_base.as_str(), inputs.auth_token.as_str())
                .with_retry(config.retry),
        )?;
        let wallets = SupabaseWalletStore::new(env)?.with_retry(config.retry);
        let dispatcher = CommandDispatcher::new(
            Arc::new(tracker),
            Arc::new(wallets),
            Arc::new(DefaultClock),
            Arc::new(settings),
        );
        let outcome = dispatcher.handle(event).await?;
        info!(status = ?outcome.status, output = ?outcome.output, "invocation finished");
        Ok::<_, PluginError>(outcome)
    }
    .instrument(span)
    .await
}
