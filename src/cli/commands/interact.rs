use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use super::{build_controller, build_surface, interaction_context, resolve_channel, Command};
use crate::cli::GlobalArgs;
use crate::config::AppConfig;
use crate::observability::OperationTimer;
use crate::workflows::{
    BlockAction, ExecuteResult, FlowAction, HandledInteraction, Interaction, InteractionOutcome, Panel, PanelNote,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Start,
    Refresh,
    Execute,
}

/// One start, refresh or execute interaction driven from the command line.
pub struct InteractCommand {
    config: AppConfig,
    global: GlobalArgs,
    action: PanelAction,
    issue: String,
}

impl InteractCommand {
    pub fn new(config: AppConfig, global: GlobalArgs, action: PanelAction, issue: impl Into<String>) -> Self {
        Self {
            config,
            global,
            action,
            issue: issue.into(),
        }
    }
}

impl Command for InteractCommand {
    async fn execute(&self) -> Result<()> {
        let timer = OperationTimer::new("interact");
        let ctx = interaction_context(&self.config, &self.global, &self.issue)?;

        let metrics = match self.action {
            PanelAction::Start => {
                let (surface, _, metrics) = build_surface(&self.config, &self.global)?;
                let message = surface.start(&ctx).await?;
                println!("📌 Panel posted to {} (ts {})", message.channel, message.ts);
                println!("   Pass --message-ts {} to refresh or execute it in place", message.ts);
                metrics
            }
            PanelAction::Refresh | PanelAction::Execute => {
                let (controller, metrics) = build_controller(&self.config, &self.global)?;
                let action = if self.action == PanelAction::Refresh {
                    FlowAction::Refresh
                } else {
                    FlowAction::Execute
                };
                let handled = controller.handle(Interaction { action, context: ctx }).await;
                report(&handled);
                metrics
            }
        };

        metrics.log_stats();
        timer.finish();
        Ok(())
    }
}

/// Replays a Slack `block_actions` payload through the controller.
pub struct DispatchCommand {
    config: AppConfig,
    global: GlobalArgs,
    payload: String,
    fallback_issue: Option<String>,
}

impl DispatchCommand {
    pub fn new(config: AppConfig, global: GlobalArgs, payload: impl Into<String>, fallback_issue: Option<String>) -> Self {
        Self {
            config,
            global,
            payload: payload.into(),
            fallback_issue,
        }
    }

    async fn read_payload(&self) -> Result<String> {
        if self.payload == "-" {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read payload from stdin")?;
            return Ok(raw);
        }
        tokio::fs::read_to_string(&self.payload)
            .await
            .with_context(|| format!("failed to read payload file {}", self.payload))
    }
}

impl Command for DispatchCommand {
    async fn execute(&self) -> Result<()> {
        let timer = OperationTimer::new("dispatch");
        let raw = self.read_payload().await?;
        let fallback_channel = resolve_channel(&self.config, &self.global).ok();
        let interaction = BlockAction::from_json(&raw)?
            .into_interaction(self.fallback_issue.as_deref(), fallback_channel.as_deref())?;

        let (controller, metrics) = build_controller(&self.config, &self.global)?;
        let handled = controller.handle(interaction).await;
        report(&handled);

        metrics.log_stats();
        timer.finish();
        Ok(())
    }
}

fn report(handled: &HandledInteraction) {
    match handled {
        HandledInteraction::Refreshed(panel) => report_refresh(panel),
        HandledInteraction::Executed(outcome) => report_execute(outcome),
    }
}

fn report_refresh(panel: &Panel) {
    println!("{}", refresh_report(panel));
}

fn refresh_report(panel: &Panel) -> String {
    let detail = match &panel.note {
        Some(PanelNote::ReadFailed { error }) => format!("Could not read status: {error}"),
        _ if panel.offers_execute() => "Next step is available; run execute to apply it".to_string(),
        _ => "No next step for this status".to_string(),
    };
    format!("🔄 {} is {}\n   {detail}", panel.issue_key, panel.status)
}

fn report_execute(outcome: &InteractionOutcome) {
    let key = &outcome.completion.issue_key;
    match &outcome.result {
        ExecuteResult::Applied { before, transition } => {
            println!("✅ {key}: {before} → {} (via {transition})", outcome.completion.status);
        }
        ExecuteResult::NoStep => println!("⏹️  {key}: no next step from {}", outcome.completion.status),
        ExecuteResult::Denied(_) => println!("⛔ {key}: {} may not run this step", outcome.completion.updated_by),
        ExecuteResult::Failed { transition, error } => {
            println!("❌ {key}: {transition} failed: {error}");
        }
        ExecuteResult::ReadFailed { error } => println!("❌ {key}: could not read status: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::IssueKey;
    use crate::workflows::Phase;

    fn panel(phase: Phase, status: &str, step: Option<(&str, &str)>, note: PanelNote) -> Panel {
        Panel::for_phase(
            phase,
            IssueKey::parse("KAN-1").unwrap(),
            "https://acme.atlassian.net/browse/KAN-1".to_string(),
            status.to_string(),
            None,
            step,
            Some(note),
        )
    }

    #[test]
    fn test_refresh_report_names_read_failure() {
        let report = refresh_report(&panel(
            Phase::AwaitingRefresh,
            "Unknown",
            None,
            PanelNote::ReadFailed {
                error: "GET https://acme.atlassian.net/rest/api/3/issue/KAN-1 failed (read). status=503".to_string(),
            },
        ));
        assert!(report.contains("KAN-1 is Unknown"));
        assert!(report.contains("Could not read status: GET"));
        assert!(!report.contains("No next step"));
    }

    #[test]
    fn test_refresh_report_for_terminal_and_ready_panels() {
        let done = refresh_report(&panel(Phase::AwaitingRefresh, "Done", None, PanelNote::NoNextStep));
        assert!(done.contains("No next step for this status"));

        let ready = refresh_report(&panel(
            Phase::AwaitingExecute,
            "To Do",
            Some(("Move to Pending Approval", "Task Create")),
            PanelNote::Ready {
                transition: "Task Create".to_string(),
            },
        ));
        assert!(ready.contains("Next step is available"));
    }
}
