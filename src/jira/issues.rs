use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info};

use super::client::{JiraClient, RequestKind, StatusReader};
use super::types::{CreateIssueRequest, CreateIssueResponse, CreatedIssue, IssueStatusResponse};
use super::{IssueKey, JiraError};

impl JiraClient {
    /// `GET /issue/{key}?fields=status`, returning the status display name.
    pub async fn get_issue_status(&self, key: &IssueKey) -> Result<String, JiraError> {
        let url = self.rest_url(&["issue", key.as_str()], &[("fields", "status")]);
        let response = self
            .request(RequestKind::Read, Method::GET, url, None)
            .await?;

        let status = Self::decode::<IssueStatusResponse>(&response).status_name();
        debug!(issue_key = %key, status = %status, "Read issue status");
        Ok(status)
    }

    /// One-shot issue creation.
    pub async fn create_issue(&self, request: &CreateIssueRequest) -> Result<CreatedIssue, JiraError> {
        if request.task_name.trim().is_empty() {
            return Err(JiraError::config("task_name"));
        }
        if request.summary.trim().is_empty() {
            return Err(JiraError::config("summary"));
        }
        if request.requester.trim().is_empty() {
            return Err(JiraError::config("requester"));
        }
        if request.project_key.trim().is_empty() {
            return Err(JiraError::config("jira.project_key"));
        }

        let payload = request.to_payload();
        let response = self
            .request(RequestKind::Write, Method::POST, self.rest_url(&["issue"], &[]), Some(&payload))
            .await?;

        let created: CreateIssueResponse = response
            .json()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or_else(|| JiraError::RemoteWrite {
                method: response.method.clone(),
                url: response.url.clone(),
                status: Some(response.status),
                body: format!("response carried no issue key: {}", response.body),
            })?;

        let key = IssueKey::parse(&created.key)?;
        let url = self.issue_url(&key);
        info!(issue_key = %key, project = %request.project_key, "Created issue");
        Ok(CreatedIssue {
            key: key.to_string(),
            url,
        })
    }
}

#[async_trait]
impl StatusReader for JiraClient {
    async fn read_status(&self, key: &IssueKey) -> Result<String, JiraError> {
        self.get_issue_status(key).await
    }
}
