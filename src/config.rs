use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::jira::{normalize_base_url, JiraError, PollConfig};
use crate::workflows::flow::FlowConfig;

pub const DEFAULT_CONFIG_FILE: &str = "jira-flow.toml";

/// Main configuration structure for jira-flow
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Jira connection settings
    pub jira: JiraConfig,
    /// Status and transition names, or an explicit decision table
    pub flow: FlowConfig,
    /// Who may execute the approval transition
    pub approval: ApprovalConfig,
    /// Read-retry and wait-for-change timing
    pub poll: PollConfig,
    /// Slack notification surface
    pub slack: SlackConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Site root, e.g. https://acme.atlassian.net
    pub base_url: Option<String>,
    /// Account email for basic auth
    pub email: Option<String>,
    /// API token for basic auth (can be set via env var)
    pub api_token: Option<String>,
    /// Project used for issue creation
    pub project_key: String,
    /// Issue type name used for issue creation
    pub issue_type: String,
    /// Per-request timeout
    pub request_timeout_ms: u64,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// The only actor allowed to run the approval transition
    pub approver_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SlackConfig {
    pub bot_token: Option<String>,
    pub api_base: String,
    /// Default channel for panels and announcements
    pub channel: Option<String>,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub json: bool,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token: None,
            project_key: "KAN".to_string(),
            issue_type: "Task".to_string(),
            request_timeout_ms: 15_000,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_capacity: 20,
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: "https://slack.com/api".to_string(),
            channel: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: true,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl JiraConfig {
    /// Normalized base URL, or a config error naming `JIRA_BASE_URL`.
    pub fn require_base_url(&self) -> Result<String, JiraError> {
        non_empty(&self.base_url)
            .map(|raw| normalize_base_url(&raw))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| JiraError::config("JIRA_BASE_URL"))
    }

    pub fn require_credentials(&self) -> Result<(String, String), JiraError> {
        let email = non_empty(&self.email).ok_or_else(|| JiraError::config("JIRA_EMAIL"))?;
        let token = non_empty(&self.api_token).ok_or_else(|| JiraError::config("JIRA_API_TOKEN"))?;
        Ok((email, token))
    }
}

impl SlackConfig {
    pub fn require_bot_token(&self) -> Result<String, JiraError> {
        non_empty(&self.bot_token).ok_or_else(|| JiraError::config("SLACK_BOT_TOKEN"))
    }

    pub fn require_channel(&self) -> Result<String, JiraError> {
        non_empty(&self.channel).ok_or_else(|| JiraError::config("SLACK_CHANNEL_ID"))
    }
}

impl ApprovalConfig {
    pub fn approver(&self) -> Option<String> {
        non_empty(&self.approver_id)
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (jira-flow.toml, or `path` when given)
    /// 3. Environment variables (JIRA_FLOW_ prefix, `__` between sections)
    /// 4. Deployment environment names (JIRA_BASE_URL, JIRA_STATUS_TODO, ...)
    ///    for values still unset
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let file: Option<PathBuf> = match path {
            Some(p) => Some(p.to_path_buf()),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            None => None,
        };
        if let Some(file) = &file {
            builder = builder.add_source(File::from(file.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix("JIRA_FLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.apply_env_fallbacks(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Fill unset values from the deployment environment names.
    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let fill = |slot: &mut Option<String>, key: &str| {
            if non_empty(slot).is_none() {
                if let Some(value) = get(key) {
                    *slot = Some(value);
                }
            }
        };

        fill(&mut self.jira.base_url, "JIRA_BASE_URL");
        fill(&mut self.jira.email, "JIRA_EMAIL");
        fill(&mut self.jira.api_token, "JIRA_API_TOKEN");
        fill(&mut self.approval.approver_id, "JIRA_APPROVER_ID");
        fill(&mut self.slack.bot_token, "SLACK_BOT_TOKEN");
        fill(&mut self.slack.channel, "SLACK_CHANNEL_ID");
        fill(&mut self.flow.table_json, "JIRA_FLOW_JSON");

        let statuses = &mut self.flow.statuses;
        fill(&mut statuses.todo, "JIRA_STATUS_TODO");
        fill(&mut statuses.pending, "JIRA_STATUS_PENDING");
        fill(&mut statuses.approved, "JIRA_STATUS_APPROVED");
        fill(&mut statuses.in_process, "JIRA_STATUS_IN_PROCESS");
        fill(&mut statuses.in_review, "JIRA_STATUS_IN_REVIEW");
        fill(&mut statuses.done, "JIRA_STATUS_DONE");

        // Transition names have defaults, so the deployment names override them.
        let transitions = &mut self.flow.transitions;
        let overrides: [(&mut String, &str); 5] = [
            (&mut transitions.todo_to_pending, "JIRA_TRANSITION_TODO_TO_PENDING"),
            (&mut transitions.pending_to_approved, "JIRA_TRANSITION_PENDING_TO_APPROVED"),
            (&mut transitions.approved_to_in_process, "JIRA_TRANSITION_APPROVED_TO_IN_PROCESS"),
            (&mut transitions.in_process_to_in_review, "JIRA_TRANSITION_IN_PROCESS_TO_IN_REVIEW"),
            (&mut transitions.in_review_to_done, "JIRA_TRANSITION_IN_REVIEW_TO_DONE"),
        ];
        for (slot, key) in overrides {
            if let Some(value) = get(key) {
                *slot = value;
            }
        }
    }

    /// Render the effective configuration as TOML with secrets masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.jira.api_token.is_some() {
            shown.jira.api_token = Some("<redacted>".to_string());
        }
        if shown.slack.bot_token.is_some() {
            shown.slack.bot_token = Some("<redacted>".to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
