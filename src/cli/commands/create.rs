use anyhow::Result;

use super::Command;
use crate::config::AppConfig;
use crate::jira::{CreateIssueRequest, JiraClient};
use crate::observability::OperationTimer;

pub struct CreateCommand {
    config: AppConfig,
    request: CreateIssueRequest,
}

impl CreateCommand {
    pub fn new(
        config: AppConfig,
        task_name: String,
        summary: String,
        requester: String,
        description: Option<String>,
        project: Option<String>,
    ) -> Self {
        let request = CreateIssueRequest {
            project_key: project.unwrap_or_else(|| config.jira.project_key.clone()),
            issue_type: config.jira.issue_type.clone(),
            task_name,
            summary,
            description,
            requester,
        };
        Self { config, request }
    }
}

impl Command for CreateCommand {
    async fn execute(&self) -> Result<()> {
        let timer = OperationTimer::new("create");
        let client = JiraClient::new(&self.config.jira)?;

        let created = client.create_issue(&self.request).await?;
        println!("🆕 Created {}", created.key);
        println!("   {}", created.url);

        client.metrics().log_stats();
        timer.finish();
        Ok(())
    }
}
