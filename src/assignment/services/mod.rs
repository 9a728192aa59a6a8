//! Application services for task assignment.

pub mod comment;
mod linked_prs;
mod pagination;
mod start_stop;

pub use linked_prs::LinkedPullRequestResolver;
pub use pagination::{next_page_number, paginate};
pub use start_stop::{
    StartRequest, StartStopError, StartStopResult, StartStopService, StopRequest, TaskOutcome,
};
