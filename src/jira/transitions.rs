use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

use super::client::{JiraClient, RequestKind, TransitionExecutor};
use super::errors::MAX_LISTED_TRANSITIONS;
use super::types::{AppliedTransition, JiraTransition, TransitionId, TransitionRequest, TransitionsResponse};
use super::{IssueKey, JiraError};

/// Find the offered transition whose trimmed name equals `requested` exactly.
///
/// Entries without an id cannot be submitted and never match. A miss carries
/// up to [`MAX_LISTED_TRANSITIONS`] available names.
pub fn resolve_transition(
    available: &[JiraTransition],
    requested: &str,
) -> Result<AppliedTransition, JiraError> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(JiraError::EmptyTransitionName);
    }

    let matched = available.iter().find_map(|t| {
        let id = t.id.as_deref().filter(|id| !id.trim().is_empty())?;
        (t.trimmed_name()? == requested).then(|| AppliedTransition {
            id: id.to_string(),
            name: requested.to_string(),
            to_status: t.target_status().map(str::to_string),
        })
    });

    matched.ok_or_else(|| JiraError::TransitionNotFound {
        requested: requested.to_string(),
        available: available
            .iter()
            .filter_map(JiraTransition::trimmed_name)
            .take(MAX_LISTED_TRANSITIONS)
            .map(str::to_string)
            .collect(),
    })
}

impl JiraClient {
    /// Transitions the remote offers for the issue in its current status.
    pub async fn list_transitions(&self, key: &IssueKey) -> Result<Vec<JiraTransition>, JiraError> {
        let url = self.rest_url(&["issue", key.as_str(), "transitions"], &[]);
        let response = self
            .request(RequestKind::Read, Method::GET, url, None)
            .await?;
        Ok(Self::decode::<TransitionsResponse>(&response).transitions)
    }

    /// Resolve `transition_name` against the currently available set, then
    /// submit it by id. Nothing is posted when resolution fails.
    pub async fn transition_by_name(
        &self,
        key: &IssueKey,
        transition_name: &str,
    ) -> Result<AppliedTransition, JiraError> {
        if transition_name.trim().is_empty() {
            return Err(JiraError::EmptyTransitionName);
        }

        let available = self.list_transitions(key).await?;
        let resolved = resolve_transition(&available, transition_name)?;

        let body = serde_json::to_value(TransitionRequest {
            transition: TransitionId {
                id: resolved.id.clone(),
            },
        })
        .map_err(|e| JiraError::invalid_config("transition", e.to_string()))?;

        let url = self.rest_url(&["issue", key.as_str(), "transitions"], &[]);
        self.request(RequestKind::Write, Method::POST, url, Some(&body))
            .await?;

        info!(
            issue_key = %key,
            transition = %resolved.name,
            transition_id = %resolved.id,
            "Submitted transition"
        );
        Ok(resolved)
    }
}

#[async_trait]
impl TransitionExecutor for JiraClient {
    async fn apply_transition(
        &self,
        key: &IssueKey,
        transition_name: &str,
    ) -> Result<AppliedTransition, JiraError> {
        self.transition_by_name(key, transition_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::types::NamedRef;

    fn offered(id: &str, name: &str, to: &str) -> JiraTransition {
        JiraTransition {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            to: Some(NamedRef {
                name: Some(to.to_string()),
            }),
        }
    }

    #[test]
    fn test_resolves_exact_trimmed_name() {
        let available = vec![
            offered("11", "Task Create ", "Pending Approval"),
            offered("21", "Reject", "Rejected"),
        ];

        let resolved = resolve_transition(&available, " Task Create").unwrap();
        assert_eq!(resolved.id, "11");
        assert_eq!(resolved.name, "Task Create");
        assert_eq!(resolved.to_status.as_deref(), Some("Pending Approval"));
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let available = vec![offered("11", "Task Create", "Pending Approval")];
        let err = resolve_transition(&available, "task create").unwrap_err();
        assert!(matches!(err, JiraError::TransitionNotFound { .. }));
    }

    #[test]
    fn test_target_status_name_does_not_match() {
        let available = vec![offered("31", "Task Start", "In Process")];
        assert!(resolve_transition(&available, "In Process").is_err());
    }

    #[test]
    fn test_not_found_lists_at_most_fifty_names() {
        let available: Vec<JiraTransition> = (0..80)
            .map(|i| offered(&i.to_string(), &format!("T{i}"), "X"))
            .collect();

        match resolve_transition(&available, "Approve") {
            Err(JiraError::TransitionNotFound {
                requested,
                available,
            }) => {
                assert_eq!(requested, "Approve");
                assert_eq!(available.len(), MAX_LISTED_TRANSITIONS);
                assert_eq!(available[0], "T0");
            }
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_without_id_is_not_resolvable() {
        let available = vec![JiraTransition {
            id: None,
            name: Some("Approve".to_string()),
            to: None,
        }];
        let err = resolve_transition(&available, "Approve").unwrap_err();
        match err {
            JiraError::TransitionNotFound { available, .. } => assert_eq!(available, vec!["Approve"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_blank_request_is_rejected() {
        assert!(matches!(
            resolve_transition(&[], "  "),
            Err(JiraError::EmptyTransitionName)
        ));
    }
}
