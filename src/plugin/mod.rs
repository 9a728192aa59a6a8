//! Plugin entry: invocation inputs, event decoding and dispatch.

mod dispatcher;
mod error;
mod event;
mod runner;

pub use dispatcher::{CommandDispatcher, DispatchOutcome, DispatchStatus};
pub use error::PluginError;
pub use event::{
    ISSUE_COMMENT_CREATED, ISSUES_ASSIGNED, PULL_REQUEST_OPENED, PULL_REQUEST_REOPENED,
    PluginEvent, PluginInputs,
};
pub use runner::{RunnerConfig, run_plugin};
