// Inbound interaction: which button was pressed, by whom, on which panel.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::jira::{IssueKey, JiraError};

pub const REFRESH_ACTION_ID: &str = "jira_machine_refresh";
pub const EXECUTE_ACTION_ID: &str = "jira_machine_execute";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowAction {
    Refresh,
    Execute,
}

impl FlowAction {
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        match action_id {
            REFRESH_ACTION_ID => Some(FlowAction::Refresh),
            EXECUTE_ACTION_ID => Some(FlowAction::Execute),
            _ => None,
        }
    }

    pub fn action_id(&self) -> &'static str {
        match self {
            FlowAction::Refresh => REFRESH_ACTION_ID,
            FlowAction::Execute => EXECUTE_ACTION_ID,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowAction::Refresh => "refresh",
            FlowAction::Execute => "execute",
        }
    }
}

/// Value carried by every panel button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonPayload {
    pub issue_key: String,
}

impl ButtonPayload {
    pub fn for_issue(key: &IssueKey) -> Self {
        Self {
            issue_key: key.as_str().to_string(),
        }
    }

    pub fn encode(&self) -> String {
        serde_json::json!({ "issueKey": self.issue_key }).to_string()
    }

    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Key from the button payload when it parses, otherwise the key the
/// invocation was started with.
pub fn resolve_issue_key(button_value: Option<&str>, fallback: Option<&str>) -> Result<IssueKey, JiraError> {
    if let Some(payload) = button_value.and_then(ButtonPayload::decode) {
        if let Ok(key) = IssueKey::parse(&payload.issue_key) {
            return Ok(key);
        }
    }
    debug!(button_value = ?button_value, "Button payload unusable, using invocation key");
    IssueKey::parse(fallback.unwrap_or_default())
}

/// Where the panel lives and who is acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionContext {
    pub issue_key: IssueKey,
    pub actor: String,
    pub channel: String,
    /// Timestamp of the panel message; absent before the panel is posted.
    pub message_ts: Option<String>,
    /// Handle used to signal completion to the caller.
    pub execution_id: Option<String>,
    /// Opaque interactivity handle, echoed back on completion.
    pub interactivity: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub action: FlowAction,
    pub context: InteractionContext,
}

// Subset of a Slack `block_actions` payload.

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAction {
    pub user: SlackUser,
    #[serde(default)]
    pub channel: Option<SlackChannel>,
    #[serde(default)]
    pub container: Option<SlackContainer>,
    #[serde(default)]
    pub message: Option<SlackMessage>,
    #[serde(default)]
    pub function_data: Option<FunctionData>,
    #[serde(default)]
    pub actions: Vec<SlackAction>,
    #[serde(default)]
    pub interactivity: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackUser {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackChannel {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackContainer {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub message_ts: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackMessage {
    pub ts: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionData {
    pub execution_id: String,
    #[serde(default)]
    pub inputs: Option<FunctionInputs>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionInputs {
    #[serde(default)]
    pub interactivity: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl BlockAction {
    pub fn from_json(raw: &str) -> Result<Self, JiraError> {
        serde_json::from_str(raw).map_err(|e| JiraError::invalid_config("payload", e.to_string()))
    }

    /// Turn the payload into an interaction. `fallback_key` and
    /// `fallback_channel` stand in for what the payload does not carry.
    pub fn into_interaction(
        self,
        fallback_key: Option<&str>,
        fallback_channel: Option<&str>,
    ) -> Result<Interaction, JiraError> {
        let action = self
            .actions
            .first()
            .ok_or_else(|| JiraError::invalid_config("payload", "no actions in payload"))?;
        let flow_action = FlowAction::from_action_id(&action.action_id).ok_or_else(|| {
            JiraError::invalid_config("payload", format!("unknown action id {}", action.action_id))
        })?;
        let issue_key = resolve_issue_key(action.value.as_deref(), fallback_key)?;

        let container = self.container.as_ref();
        let channel = container
            .and_then(|c| c.channel_id.clone())
            .or_else(|| self.channel.as_ref().map(|c| c.id.clone()))
            .or_else(|| fallback_channel.map(str::to_string))
            .ok_or_else(|| JiraError::config("SLACK_CHANNEL_ID"))?;
        let message_ts = container
            .and_then(|c| c.message_ts.clone())
            .or_else(|| self.message.as_ref().map(|m| m.ts.clone()));
        // The function's own input wins over the payload-level handle.
        let (execution_id, inputs) = match self.function_data {
            Some(data) => (Some(data.execution_id), data.inputs),
            None => (None, None),
        };
        let interactivity = inputs.and_then(|i| i.interactivity).or(self.interactivity);

        Ok(Interaction {
            action: flow_action,
            context: InteractionContext {
                issue_key,
                actor: self.user.id,
                channel,
                message_ts,
                execution_id,
                interactivity,
            },
        })
    }
}
