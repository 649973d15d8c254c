//! Slack Web API surface: Block Kit panels, notices and function completion.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{button_text, panel_text, Audience, Completion, MessageRef, Notice, Notifier};
use crate::config::SlackConfig;
use crate::jira::JiraError;
use crate::workflows::interaction::{ButtonPayload, FlowAction};
use crate::workflows::panel::{Affordance, Panel};

#[derive(Debug, Clone, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self, JiraError> {
        let bot_token = config.require_bot_token()?;
        let http = reqwest::Client::builder()
            .user_agent("jira-flow")
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .map_err(|e| JiraError::Notification {
                operation: "client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_base: config.api_base.trim().trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    async fn call(&self, method: &str, payload: &Value) -> Result<SlackApiResponse, JiraError> {
        let failure = |message: String| JiraError::Notification {
            operation: method.to_string(),
            message,
        };

        let response = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failure(format!("status={} body={body}", status.as_u16())));
        }

        let parsed: SlackApiResponse = response.json().await.map_err(|e| failure(e.to_string()))?;
        if !parsed.ok {
            return Err(failure(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        debug!(method, "Slack call succeeded");
        Ok(parsed)
    }
}

/// Section with the status text plus a single action button.
pub fn panel_blocks(panel: &Panel) -> Value {
    let value = ButtonPayload::for_issue(&panel.issue_key).encode();
    let mut button = json!({
        "type": "button",
        "text": { "type": "plain_text", "text": button_text(&panel.affordance) },
        "value": value,
    });
    match &panel.affordance {
        Affordance::Refresh => {
            button["action_id"] = json!(FlowAction::Refresh.action_id());
        }
        Affordance::Execute { .. } => {
            button["action_id"] = json!(FlowAction::Execute.action_id());
            button["style"] = json!("primary");
        }
    }

    json!([
        {
            "type": "section",
            "text": { "type": "mrkdwn", "text": panel_text(panel) },
        },
        {
            "type": "actions",
            "elements": [button],
        },
    ])
}

fn fallback_text(panel: &Panel) -> String {
    format!("Jira: {} ({})", panel.issue_key, panel.status)
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_panel(&self, channel: &str, panel: &Panel) -> Result<MessageRef, JiraError> {
        let payload = json!({
            "channel": channel,
            "text": fallback_text(panel),
            "blocks": panel_blocks(panel),
        });
        let response = self.call("chat.postMessage", &payload).await?;
        let ts = response.ts.ok_or_else(|| JiraError::Notification {
            operation: "chat.postMessage".to_string(),
            message: "response did not include ts".to_string(),
        })?;
        info!(channel, ts = %ts, issue_key = %panel.issue_key, "Posted panel");
        Ok(MessageRef {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts,
        })
    }

    async fn update_panel(&self, message: &MessageRef, panel: &Panel) -> Result<(), JiraError> {
        let payload = json!({
            "channel": message.channel,
            "ts": message.ts,
            "text": fallback_text(panel),
            "blocks": panel_blocks(panel),
        });
        self.call("chat.update", &payload).await?;
        Ok(())
    }

    async fn send_notice(&self, notice: &Notice) -> Result<(), JiraError> {
        match &notice.audience {
            Audience::Channel { channel } => {
                let payload = json!({ "channel": channel, "text": notice.text });
                self.call("chat.postMessage", &payload).await?;
            }
            Audience::Private { channel, actor } => {
                let payload = json!({ "channel": channel, "user": actor, "text": notice.text });
                self.call("chat.postEphemeral", &payload).await?;
            }
            Audience::Direct { actor } => {
                // Posting to a user id delivers to the app's DM with that user.
                let payload = json!({ "channel": actor, "text": notice.text });
                self.call("chat.postMessage", &payload).await?;
            }
        }
        Ok(())
    }

    async fn complete(&self, execution_id: Option<&str>, completion: &Completion) -> Result<(), JiraError> {
        let Some(execution_id) = execution_id else {
            debug!(issue_key = %completion.issue_key, "No execution id, nothing to complete");
            return Ok(());
        };
        let payload = json!({
            "function_execution_id": execution_id,
            "outputs": completion,
        });
        self.call("functions.completeSuccess", &payload).await?;
        Ok(())
    }
}
