pub mod client;
pub mod errors;
pub mod issue_key;
pub mod issues;
pub mod poller;
pub mod transitions;
pub mod types;

pub use client::{normalize_base_url, JiraClient, StatusReader, TransitionExecutor};
pub use errors::JiraError;
pub use issue_key::IssueKey;
pub use poller::{ConsistencyPoller, PollConfig};
pub use transitions::resolve_transition;
pub use types::{AppliedTransition, CreateIssueRequest, CreatedIssue, JiraTransition, UNKNOWN_STATUS};
