// Wire types for the subset of the Jira Cloud REST v3 API this crate touches

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Status reported when the remote value cannot be observed.
pub const UNKNOWN_STATUS: &str = "Unknown";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueStatusResponse {
    #[serde(default)]
    pub fields: Option<IssueFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub status: Option<NamedRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

impl IssueStatusResponse {
    /// Status name, or the `Unknown` sentinel when the payload omits it.
    pub fn status_name(&self) -> String {
        self.fields
            .as_ref()
            .and_then(|f| f.status.as_ref())
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<JiraTransition>,
}

/// A transition the remote currently offers for an issue.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct JiraTransition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub to: Option<NamedRef>,
}

impl JiraTransition {
    pub fn trimmed_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    pub fn target_status(&self) -> Option<&str> {
        self.to.as_ref().and_then(|t| t.name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionRequest {
    pub transition: TransitionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitionId {
    pub id: String,
}

/// Result of a submitted transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub id: String,
    pub name: String,
    /// Target status the remote advertised for the transition, when present.
    pub to_status: Option<String>,
}

/// Input for the one-shot issue creation call.
#[derive(Debug, Clone)]
pub struct CreateIssueRequest {
    pub project_key: String,
    pub issue_type: String,
    pub task_name: String,
    pub summary: String,
    pub description: Option<String>,
    pub requester: String,
}

impl CreateIssueRequest {
    pub fn remote_summary(&self) -> String {
        format!("[{}] {}", self.task_name.trim(), self.summary.trim())
    }

    pub fn remote_description(&self) -> String {
        let origin = format!("Created via Slack by <@{}>", self.requester.trim());
        match self.description.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{origin}\n\n{extra}"),
            _ => origin,
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "fields": {
                "project": { "key": self.project_key },
                "summary": self.remote_summary(),
                "description": plain_text_adf(&self.remote_description()),
                "issuetype": { "name": self.issue_type },
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueResponse {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub key: String,
    pub url: String,
}

/// Single-paragraph Atlassian Document Format body.
pub fn plain_text_adf(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [
            {
                "type": "paragraph",
                "content": [{ "type": "text", "text": text.trim() }]
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_name_falls_back_to_unknown() {
        let parsed: IssueStatusResponse = serde_json::from_value(json!({ "fields": {} })).unwrap();
        assert_eq!(parsed.status_name(), UNKNOWN_STATUS);

        let parsed: IssueStatusResponse =
            serde_json::from_value(json!({ "fields": { "status": { "name": "In Review" } } }))
                .unwrap();
        assert_eq!(parsed.status_name(), "In Review");
    }

    #[test]
    fn test_create_payload_shape() {
        let request = CreateIssueRequest {
            project_key: "KAN".to_string(),
            issue_type: "Task".to_string(),
            task_name: " Billing ".to_string(),
            summary: "Fix invoice rounding".to_string(),
            description: Some("Seen on EU accounts".to_string()),
            requester: "U123".to_string(),
        };

        let payload = request.to_payload();
        assert_eq!(payload["fields"]["project"]["key"], "KAN");
        assert_eq!(payload["fields"]["summary"], "[Billing] Fix invoice rounding");
        assert_eq!(payload["fields"]["issuetype"]["name"], "Task");
        assert_eq!(
            payload["fields"]["description"]["content"][0]["content"][0]["text"],
            "Created via Slack by <@U123>\n\nSeen on EU accounts"
        );
    }

    #[test]
    fn test_blank_description_keeps_origin_line_only() {
        let request = CreateIssueRequest {
            project_key: "KAN".to_string(),
            issue_type: "Task".to_string(),
            task_name: "Ops".to_string(),
            summary: "Rotate keys".to_string(),
            description: Some("   ".to_string()),
            requester: "U9".to_string(),
        };
        assert_eq!(request.remote_description(), "Created via Slack by <@U9>");
    }
}
