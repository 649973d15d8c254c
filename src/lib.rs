// jira-flow library - Jira status-transition flow with a Slack panel surface
// Exposes the core components for the binary and for integration tests

pub mod cli;
pub mod config;
pub mod http;
pub mod jira;
pub mod notify;
pub mod observability;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::AppConfig;
pub use http::RateLimitedHttpClient;
pub use jira::{ConsistencyPoller, IssueKey, JiraClient, JiraError, PollConfig, StatusReader, TransitionExecutor};
pub use notify::{ConsoleNotifier, Notifier, SlackNotifier};
pub use observability::{JiraApiMetrics, OperationTimer};
pub use telemetry::{create_interaction_span, generate_correlation_id, init_telemetry};
pub use workflows::{AuthorizationPolicy, FlowController, FlowTable, InteractionContext};
