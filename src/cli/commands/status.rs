use anyhow::Result;
use std::sync::Arc;

use super::Command;
use crate::config::AppConfig;
use crate::jira::{ConsistencyPoller, IssueKey, JiraClient};
use crate::observability::OperationTimer;

/// Read-only view of an issue: status, next step and the URL.
pub struct StatusCommand {
    config: AppConfig,
    issue: String,
}

impl StatusCommand {
    pub fn new(config: AppConfig, issue: impl Into<String>) -> Self {
        Self {
            config,
            issue: issue.into(),
        }
    }
}

impl Command for StatusCommand {
    async fn execute(&self) -> Result<()> {
        let timer = OperationTimer::new("status");
        let key = IssueKey::parse(&self.issue)?;
        let client = Arc::new(JiraClient::new(&self.config.jira)?);
        let metrics = client.metrics();
        let url = client.issue_url(&key);
        let poller = ConsistencyPoller::new(Arc::clone(&client), self.config.poll.clone())
            .with_metrics(Arc::clone(&metrics));

        let status = poller.read_with_retry(&key).await?;
        println!("📋 {key}  {url}");
        println!("   Current status: {status}");

        match self.config.flow.build_table() {
            Ok(table) => match table.decide_next(&status) {
                Some(step) => println!("   Next step: {} (transition \"{}\")", step.label, step.transition_name),
                None => println!("   Next step: none for this status"),
            },
            Err(e) => println!("   Next step: unavailable ({e})"),
        }

        metrics.log_stats();
        timer.finish();
        Ok(())
    }
}
