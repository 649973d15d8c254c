//! Flow decision table: which transition follows a given remote status.
//!
//! The table is data, not control flow. Keys are exact remote status names;
//! a status without a key is terminal (or simply unconfigured) and yields no
//! next step. Lookups never fold case or match partially.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::jira::JiraError;

/// Who hears about a successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    None,
    #[default]
    Channel,
    DmClicker,
    EphemeralClicker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyTemplate {
    #[serde(default)]
    pub mode: NotifyMode,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StepGuard {
    #[serde(default)]
    pub allow_users: Vec<String>,
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub label: String,
    /// Remote transition display name.
    pub transition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<StepGuard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyTemplate>,
}

impl FlowStep {
    pub fn new(label: impl Into<String>, transition: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            transition: transition.into(),
            guard: None,
            notify: None,
        }
    }

    pub fn with_guard<I, S>(mut self, allow_users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard = Some(StepGuard {
            allow_users: allow_users.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_notify(mut self, mode: NotifyMode, text: impl Into<String>) -> Self {
        self.notify = Some(NotifyTemplate {
            mode,
            text: text.into(),
        });
        self
    }
}

/// The step selected for a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextStep<'a> {
    pub status: &'a str,
    pub label: &'a str,
    pub transition_name: &'a str,
    pub step: &'a FlowStep,
}

impl NextStep<'_> {
    pub fn guard(&self) -> Option<&StepGuard> {
        self.step.guard.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowTable {
    steps: BTreeMap<String, FlowStep>,
}

impl FlowTable {
    pub fn new(steps: BTreeMap<String, FlowStep>) -> Self {
        Self { steps }
    }

    pub fn from_json(raw: &str) -> Result<Self, JiraError> {
        serde_json::from_str(raw)
            .map_err(|e| JiraError::invalid_config("JIRA_FLOW_JSON", e.to_string()))
    }

    pub fn from_toml(raw: &str) -> Result<Self, JiraError> {
        toml::from_str(raw).map_err(|e| JiraError::invalid_config("flow.table_path", e.to_string()))
    }

    pub fn insert(&mut self, status: impl Into<String>, step: FlowStep) {
        self.steps.insert(status.into(), step);
    }

    /// Next step for `current_status`, or `None` for terminal/unconfigured
    /// statuses and rows with a blank transition.
    pub fn decide_next<'a>(&'a self, current_status: &str) -> Option<NextStep<'a>> {
        let (status, step) = self.steps.get_key_value(current_status)?;
        let transition_name = step.transition.trim();
        if transition_name.is_empty() {
            return None;
        }
        Some(NextStep {
            status,
            label: step.label.as_str(),
            transition_name,
            step,
        })
    }

    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlowStep)> {
        self.steps.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Remote status names of the default linear chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusNames {
    pub todo: Option<String>,
    pub pending: Option<String>,
    pub approved: Option<String>,
    pub in_process: Option<String>,
    pub in_review: Option<String>,
    pub done: Option<String>,
}

/// Remote transition names of the default linear chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionNames {
    pub todo_to_pending: String,
    pub pending_to_approved: String,
    pub approved_to_in_process: String,
    pub in_process_to_in_review: String,
    pub in_review_to_done: String,
}

impl Default for TransitionNames {
    fn default() -> Self {
        Self {
            todo_to_pending: "Task Create".to_string(),
            pending_to_approved: "Approve".to_string(),
            approved_to_in_process: "Task Start".to_string(),
            in_process_to_in_review: "Task complete".to_string(),
            in_review_to_done: "Task close".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub statuses: StatusNames,
    pub transitions: TransitionNames,
    /// TOML file holding an explicit table keyed by status name.
    pub table_path: Option<PathBuf>,
    /// Explicit table as a JSON object keyed by status name.
    pub table_json: Option<String>,
}

fn required(value: &Option<String>, key: &str) -> Result<String, JiraError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| JiraError::config(key))
}

impl FlowConfig {
    /// Resolve the table: explicit JSON, then an explicit TOML file, then the
    /// default chain built from configured status and transition names.
    pub fn build_table(&self) -> Result<FlowTable, JiraError> {
        if let Some(raw) = self.table_json.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            return FlowTable::from_json(raw);
        }
        if let Some(path) = &self.table_path {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                JiraError::invalid_config("flow.table_path", format!("{}: {e}", path.display()))
            })?;
            return FlowTable::from_toml(&raw);
        }
        self.default_chain()
    }

    pub fn default_chain(&self) -> Result<FlowTable, JiraError> {
        let s = &self.statuses;
        let t = &self.transitions;

        let todo = required(&s.todo, "JIRA_STATUS_TODO")?;
        let pending = required(&s.pending, "JIRA_STATUS_PENDING")?;
        let approved = required(&s.approved, "JIRA_STATUS_APPROVED")?;
        let in_process = required(&s.in_process, "JIRA_STATUS_IN_PROCESS")?;
        let in_review = required(&s.in_review, "JIRA_STATUS_IN_REVIEW")?;
        // Done carries no step but must still be configured.
        required(&s.done, "JIRA_STATUS_DONE")?;

        let mut table = FlowTable::default();
        table.insert(todo, FlowStep::new("Move to Pending Approval", t.todo_to_pending.trim()));
        table.insert(pending, FlowStep::new("Approve", t.pending_to_approved.trim()));
        table.insert(approved, FlowStep::new("Start (In Process)", t.approved_to_in_process.trim()));
        table.insert(in_process, FlowStep::new("Send to Review", t.in_process_to_in_review.trim()));
        table.insert(in_review, FlowStep::new("Close (Done)", t.in_review_to_done.trim()));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle_statuses() -> StatusNames {
        StatusNames {
            todo: Some("To Do".to_string()),
            pending: Some("Pending Approval".to_string()),
            approved: Some("Approved".to_string()),
            in_process: Some("In Process".to_string()),
            in_review: Some("In Review".to_string()),
            done: Some("Done".to_string()),
        }
    }

    #[test]
    fn test_default_chain_walks_the_lifecycle() {
        let config = FlowConfig {
            statuses: lifecycle_statuses(),
            ..Default::default()
        };
        let table = config.build_table().unwrap();

        let expected = [
            ("To Do", "Task Create", "Move to Pending Approval"),
            ("Pending Approval", "Approve", "Approve"),
            ("Approved", "Task Start", "Start (In Process)"),
            ("In Process", "Task complete", "Send to Review"),
            ("In Review", "Task close", "Close (Done)"),
        ];
        for (status, transition, label) in expected {
            let next = table.decide_next(status).unwrap();
            assert_eq!(next.transition_name, transition);
            assert_eq!(next.label, label);
            assert_eq!(next.status, status);
        }
        assert!(table.decide_next("Done").is_none());
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut table = FlowTable::default();
        table.insert("To Do", FlowStep::new("Move", "Task Create"));

        assert!(table.decide_next("to do").is_none());
        assert!(table.decide_next("To Do ").is_none());
        assert!(table.decide_next("To").is_none());
        assert!(table.decide_next("To Do").is_some());
    }

    #[test]
    fn test_blank_transition_is_no_step() {
        let mut table = FlowTable::default();
        table.insert("Blocked", FlowStep::new("Unblock", "   "));
        assert!(table.decide_next("Blocked").is_none());
    }

    #[test]
    fn test_missing_status_names_the_key() {
        let mut statuses = lifecycle_statuses();
        statuses.in_review = Some("  ".to_string());
        let config = FlowConfig {
            statuses,
            ..Default::default()
        };

        let err = config.build_table().unwrap_err();
        assert!(matches!(err, JiraError::Config { ref key } if key == "JIRA_STATUS_IN_REVIEW"));
    }

    #[test]
    fn test_json_table_with_guard_and_notify() {
        let raw = r#"{
            "Pending Approval": {
                "label": "Approve",
                "transition": "Approve",
                "guard": { "allowUsers": ["U1", "U2"] },
                "notify": { "mode": "dm_clicker", "text": "{issue_key} approved" }
            },
            "To Do": { "label": "Submit", "transition": "Task Create" }
        }"#;
        let config = FlowConfig {
            table_json: Some(raw.to_string()),
            ..Default::default()
        };

        let table = config.build_table().unwrap();
        let next = table.decide_next("Pending Approval").unwrap();
        assert_eq!(next.guard().unwrap().allow_users, vec!["U1", "U2"]);
        let notify = next.step.notify.as_ref().unwrap();
        assert_eq!(notify.mode, NotifyMode::DmClicker);
        assert!(table.decide_next("To Do").unwrap().step.guard.is_none());
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let config = FlowConfig {
            table_json: Some("{ not json".to_string()),
            ..Default::default()
        };
        let err = config.build_table().unwrap_err();
        assert!(matches!(err, JiraError::InvalidConfig { ref key, .. } if key == "JIRA_FLOW_JSON"));
    }

    #[test]
    fn test_toml_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.toml");
        std::fs::write(
            &path,
            r#"
["In Review"]
label = "Close"
transition = "Task close"

["In Review".notify]
mode = "none"
"#,
        )
        .unwrap();

        let config = FlowConfig {
            table_path: Some(path),
            ..Default::default()
        };
        let table = config.build_table().unwrap();
        let next = table.decide_next("In Review").unwrap();
        assert_eq!(next.transition_name, "Task close");
        assert_eq!(next.step.notify.as_ref().unwrap().mode, NotifyMode::None);
    }
}
