//! Domain model for task assignment.
//!
//! Issues, pull request summaries, roles and their limits, slash commands,
//! issue references and deadlines. Nothing here performs I/O; remote state
//! arrives through the ports.

mod command;
mod deadline;
mod duration;
mod error;
mod ids;
mod issue;
mod pull_request;
mod references;
mod role;

pub use command::{CommandName, SlashCommand, filter_teammates, is_valid_login};
pub use deadline::{
    ASSIGNMENT_TIPS, AssignmentComment, DEADLINE_FORMAT, WALLET_PROMPT, calculate_durations,
    deadline_for, format_deadline, shortest_duration,
};
pub use duration::{DurationUnit, HumanDuration};
pub use error::AssignmentDomainError;
pub use ids::{IssueLocator, IssueNumber, RepositoryRef, Sender};
pub use issue::{Issue, IssueState, is_parent_body};
pub use pull_request::{
    APPROVED_REVIEW_STATE, CROSS_REFERENCED_EVENT, LinkedPullRequest, Review, SearchItem,
    TimelineEvent, TimelineSource,
};
pub use references::{extract_issue_references, issue_linked_via_pr_body};
pub use role::{Role, TaskLimit};
