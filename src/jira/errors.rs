use thiserror::Error;

/// Maximum number of available transition names carried in a not-found error.
pub const MAX_LISTED_TRANSITIONS: usize = 50;

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Missing configuration: {key}")]
    Config { key: String },

    #[error("Invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Issue key is empty (input=\"{input}\")")]
    EmptyIssueKey { input: String },

    #[error("Transition name is empty")]
    EmptyTransitionName,

    #[error(
        "{method} {url} failed (read). status={} body={body}",
        display_status(.status)
    )]
    RemoteRead {
        method: String,
        url: String,
        status: Option<u16>,
        body: String,
    },

    #[error(
        "{method} {url} failed (write). status={} body={body}",
        display_status(.status)
    )]
    RemoteWrite {
        method: String,
        url: String,
        status: Option<u16>,
        body: String,
    },

    #[error(
        "Transition \"{requested}\" not found. Available: {}",
        display_available(.available)
    )]
    TransitionNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("Notification {operation} failed: {message}")]
    Notification { operation: String, message: String },
}

impl JiraError {
    pub fn config(key: impl Into<String>) -> Self {
        JiraError::Config { key: key.into() }
    }

    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        JiraError::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// True for failures that a later read may not reproduce.
    pub fn is_transient_read(&self) -> bool {
        match self {
            JiraError::RemoteRead { status: None, .. } => true,
            JiraError::RemoteRead {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// HTTP status carried by remote failures, `None` for transport faults and
    /// non-remote errors.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            JiraError::RemoteRead { status, .. } | JiraError::RemoteWrite { status, .. } => *status,
            _ => None,
        }
    }
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "network".to_string(),
    }
}

fn display_available(available: &[String]) -> String {
    if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_read_message_carries_request_details() {
        let err = JiraError::RemoteRead {
            method: "GET".to_string(),
            url: "https://example.atlassian.net/rest/api/3/issue/KAN-1?fields=status".to_string(),
            status: Some(404),
            body: "{\"errorMessages\":[\"Issue does not exist\"]}".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("GET"));
        assert!(message.contains("/rest/api/3/issue/KAN-1"));
        assert!(message.contains("status=404"));
        assert!(message.contains("Issue does not exist"));
    }

    #[test]
    fn test_transport_fault_reports_network_status() {
        let err = JiraError::RemoteWrite {
            method: "POST".to_string(),
            url: "http://localhost:1/rest".to_string(),
            status: None,
            body: "connection refused".to_string(),
        };

        assert!(err.to_string().contains("status=network"));
        assert_eq!(err.http_status(), None);
    }

    #[test]
    fn test_not_found_lists_available_or_none() {
        let err = JiraError::TransitionNotFound {
            requested: "Approve".to_string(),
            available: vec!["Task Start".to_string(), "Reject".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Transition \"Approve\" not found. Available: Task Start, Reject"
        );

        let empty = JiraError::TransitionNotFound {
            requested: "Approve".to_string(),
            available: Vec::new(),
        };
        assert!(empty.to_string().ends_with("Available: (none)"));
    }

    #[test]
    fn test_transient_read_classification() {
        let server_error = JiraError::RemoteRead {
            method: "GET".into(),
            url: "u".into(),
            status: Some(503),
            body: String::new(),
        };
        let not_found = JiraError::RemoteRead {
            method: "GET".into(),
            url: "u".into(),
            status: Some(404),
            body: String::new(),
        };

        assert!(server_error.is_transient_read());
        assert!(!not_found.is_transient_read());
        assert!(!JiraError::config("JIRA_BASE_URL").is_transient_read());
    }
}
