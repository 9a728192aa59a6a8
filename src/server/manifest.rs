//! Capability manifest served at `/manifest.json`.

use crate::assignment::domain::CommandName;
use crate::config::StartStopSettings;
use crate::plugin::{
    ISSUE_COMMENT_CREATED, ISSUES_ASSIGNED, PULL_REQUEST_OPENED, PULL_REQUEST_REOPENED,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Plugin name advertised to the host.
pub const PLUGIN_NAME: &str = "Start | Stop";

/// Events the host should forward to this plugin.
pub const LISTENED_EVENTS: [&str; 4] = [
    ISSUE_COMMENT_CREATED,
    ISSUES_ASSIGNED,
    PULL_REQUEST_OPENED,
    PULL_REQUEST_REOPENED,
];

/// A slash command entry of the manifest.
#[derive(Debug, Clone, Serialize)]
pub struct CommandEntry {
    /// What the command does.
    pub description: &'static str,
    /// Example invocation.
    pub example: &'static str,
}

/// Manifest document.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Commands keyed by name.
    pub commands: BTreeMap<&'static str, CommandEntry>,
    /// Webhook events handled.
    #[serde(rename = "ubiquity:listeners")]
    pub listeners: Vec<&'static str>,
    /// Configuration with every default filled in.
    pub configuration: StartStopSettings,
}

impl Manifest {
    /// Builds the manifest for this build of the plugin.
    #[must_use]
    pub fn current() -> Self {
        let commands = BTreeMap::from([
            (
                CommandName::Start.as_str(),
                CommandEntry {
                    description: "Assign yourself and/or others to the issue/task.",
                    example: "/start [@user1 @user2 ...]",
                },
            ),
            (
                CommandName::Stop.as_str(),
                CommandEntry {
                    description: "Unassign yourself from the issue/task.",
                    example: "/stop",
                },
            ),
        ]);
        Self {
            name: PLUGIN_NAME,
            description: "Assign or un-assign yourself from an issue/task.",
            commands,
            listeners: LISTENED_EVENTS.to_vec(),
            configuration: StartStopSettings::default(),
        }
    }
}
