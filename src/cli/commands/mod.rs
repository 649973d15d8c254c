use anyhow::Result;
use std::sync::Arc;

use super::GlobalArgs;
use crate::config::AppConfig;
use crate::jira::{IssueKey, JiraClient};
use crate::notify::{ConsoleNotifier, Notifier, SlackNotifier};
use crate::observability::JiraApiMetrics;
use crate::workflows::{AuthorizationPolicy, FlowController, InteractionContext, PanelSurface};

pub mod config;
pub mod create;
pub mod flow;
pub mod interact;
pub mod status;

pub const DEFAULT_ACTOR: &str = "cli";
pub const CONSOLE_CHANNEL: &str = "console";

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

pub type Controller = FlowController<JiraClient, Box<dyn Notifier>>;
pub type Surface = PanelSurface<JiraClient, Box<dyn Notifier>>;

pub fn build_notifier(config: &AppConfig, slack: bool) -> Result<Box<dyn Notifier>> {
    if slack {
        Ok(Box::new(SlackNotifier::new(&config.slack)?))
    } else {
        Ok(Box::new(ConsoleNotifier::new()))
    }
}

/// Wire the Jira client and notifier into a panel surface. Needs the Jira
/// connection only; the flow table is left unread.
pub fn build_surface(config: &AppConfig, global: &GlobalArgs) -> Result<(Surface, Arc<JiraClient>, Arc<JiraApiMetrics>)> {
    let client = Arc::new(JiraClient::new(&config.jira)?);
    let metrics = client.metrics();
    let base_url = client.base_url().to_string();
    let notifier = build_notifier(config, global.slack)?;

    let surface = PanelSurface::new(Arc::clone(&client), notifier, config.poll.clone(), base_url)
        .with_metrics(Arc::clone(&metrics));
    Ok((surface, client, metrics))
}

/// Wire the surface, flow table and policy into a controller.
/// Returns the client's metrics so the caller can log them afterwards.
pub fn build_controller(config: &AppConfig, global: &GlobalArgs) -> Result<(Controller, Arc<JiraApiMetrics>)> {
    let (surface, client, metrics) = build_surface(config, global)?;
    let table = config.flow.build_table()?;
    let policy = AuthorizationPolicy::from_config(&config.flow, &config.approval);

    Ok((FlowController::from_surface(client, surface, table, policy), metrics))
}

/// Channel for panels: the flag, then configuration. The terminal surface
/// does not need a real one.
pub fn resolve_channel(config: &AppConfig, global: &GlobalArgs) -> Result<String> {
    if let Some(channel) = global.channel.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        return Ok(channel.to_string());
    }
    if global.slack {
        return Ok(config.slack.require_channel()?);
    }
    Ok(config
        .slack
        .channel
        .clone()
        .unwrap_or_else(|| CONSOLE_CHANNEL.to_string()))
}

pub fn interaction_context(config: &AppConfig, global: &GlobalArgs, issue: &str) -> Result<InteractionContext> {
    Ok(InteractionContext {
        issue_key: IssueKey::parse(issue)?,
        actor: global.actor.clone().unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
        channel: resolve_channel(config, global)?,
        message_ts: global.message_ts.clone(),
        execution_id: global.execution_id.clone(),
        interactivity: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_channel_needs_no_configuration() {
        let config = AppConfig::default();
        let global = GlobalArgs::default();
        assert_eq!(resolve_channel(&config, &global).unwrap(), CONSOLE_CHANNEL);
    }

    #[test]
    fn test_slack_channel_is_required() {
        let config = AppConfig::default();
        let global = GlobalArgs {
            slack: true,
            ..Default::default()
        };
        let err = resolve_channel(&config, &global).unwrap_err();
        assert!(err.to_string().contains("SLACK_CHANNEL_ID"));
    }

    #[test]
    fn test_interaction_context_from_flags() {
        let config = AppConfig::default();
        let global = GlobalArgs {
            channel: Some("C42".to_string()),
            actor: Some("U7".to_string()),
            message_ts: Some("1.5".to_string()),
            ..Default::default()
        };
        let ctx = interaction_context(&config, &global, "https://acme.atlassian.net/browse/kan-8").unwrap();
        assert_eq!(ctx.issue_key.as_str(), "KAN-8");
        assert_eq!(ctx.actor, "U7");
        assert_eq!(ctx.channel, "C42");
        assert_eq!(ctx.message_ts.as_deref(), Some("1.5"));
        assert_eq!(ctx.execution_id, None);
    }
}
