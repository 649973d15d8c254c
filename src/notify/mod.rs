//! Outbound side of an interaction: panels, notices and completion.
//!
//! The controller only talks to [`Notifier`]. Rendering to text lives here so
//! the Slack and console surfaces show the same words.

use async_trait::async_trait;
use serde::Serialize;

use crate::jira::JiraError;
use crate::workflows::authorization::Restriction;
use crate::workflows::panel::{Affordance, Panel, PanelNote};

pub mod console;
pub mod slack;

pub use console::ConsoleNotifier;
pub use slack::SlackNotifier;

pub const REFRESH_BUTTON_TEXT: &str = "Refresh Status";

/// A posted panel message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Everyone in the channel.
    Channel { channel: String },
    /// Only `actor`, inside `channel`.
    Private { channel: String, actor: String },
    /// Direct message to `actor`.
    Direct { actor: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub audience: Audience,
    pub text: String,
}

/// What happened in a successful execute, for the announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSummary {
    pub issue_key: String,
    pub issue_url: String,
    pub before: String,
    pub after: String,
    pub transition: String,
    pub label: String,
    pub actor: String,
}

/// Outputs handed back to the caller when an interaction finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub issue_key: String,
    pub status: String,
    pub updated_by: String,
    /// Passed back verbatim so the calling workflow can keep interacting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactivity: Option<serde_json::Value>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_panel(&self, channel: &str, panel: &Panel) -> Result<MessageRef, JiraError>;

    async fn update_panel(&self, message: &MessageRef, panel: &Panel) -> Result<(), JiraError>;

    async fn send_notice(&self, notice: &Notice) -> Result<(), JiraError>;

    /// Signal that the interaction is over. `execution_id` is absent when the
    /// caller did not hand one out.
    async fn complete(&self, execution_id: Option<&str>, completion: &Completion) -> Result<(), JiraError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    async fn post_panel(&self, channel: &str, panel: &Panel) -> Result<MessageRef, JiraError> {
        (**self).post_panel(channel, panel).await
    }

    async fn update_panel(&self, message: &MessageRef, panel: &Panel) -> Result<(), JiraError> {
        (**self).update_panel(message, panel).await
    }

    async fn send_notice(&self, notice: &Notice) -> Result<(), JiraError> {
        (**self).send_notice(notice).await
    }

    async fn complete(&self, execution_id: Option<&str>, completion: &Completion) -> Result<(), JiraError> {
        (**self).complete(execution_id, completion).await
    }
}

pub fn mention(actor: &str) -> String {
    format!("<@{actor}>")
}

pub fn note_text(note: &PanelNote) -> String {
    match note {
        PanelNote::Intro => "Click *Refresh Status* to load the next executable action.".to_string(),
        PanelNote::NoNextStep => "No next step for this status.".to_string(),
        PanelNote::NoNextStepAfterDrift => "No next step available. Please refresh.".to_string(),
        PanelNote::Ready { transition } => format!("✅ Ready. Next transition: *{transition}*"),
        PanelNote::Restricted(restriction) => format!("⚠️ Restricted: {}", restriction_text(restriction)),
        PanelNote::Failed { transition, error } => format!("⚠️ Failed: *{transition}*\n`{error}`"),
        PanelNote::Applied { transition } => {
            format!("✅ Applied: *{transition}*. Click *Refresh Status* to load the next action.")
        }
        PanelNote::ReadFailed { error } => format!("⚠️ Could not read status.\n`{error}`"),
    }
}

pub fn restriction_text(restriction: &Restriction) -> String {
    match restriction {
        Restriction::ApproverOnly { approver } => format!("only {} can approve.", mention(approver)),
        Restriction::NoApproverConfigured => "no approver is configured for this step.".to_string(),
        Restriction::NotOnAllowList => "this step is limited to specific users.".to_string(),
    }
}

/// Private message for a denied actor.
pub fn restriction_notice(restriction: &Restriction) -> String {
    match restriction {
        Restriction::ApproverOnly { approver } => format!("Only {} can approve.", mention(approver)),
        Restriction::NoApproverConfigured => "Approval is disabled: no approver is configured.".to_string(),
        Restriction::NotOnAllowList => "You are not allowed to run this step.".to_string(),
    }
}

/// Status block shared by every panel render (Slack mrkdwn).
pub fn panel_text(panel: &Panel) -> String {
    let actor = panel
        .last_actor
        .as_deref()
        .map(mention)
        .unwrap_or_else(|| "-".to_string());
    let mut text = format!(
        "*Jira:* <{}|{}>\n*Current Status:* *{}*\n*Last Action By:* {}",
        panel.issue_url, panel.issue_key, panel.status, actor
    );
    if let Some(note) = &panel.note {
        text.push_str("\n\n");
        text.push_str(&note_text(note));
    }
    text
}

pub fn button_text(affordance: &Affordance) -> String {
    match affordance {
        Affordance::Refresh => REFRESH_BUTTON_TEXT.to_string(),
        Affordance::Execute { label, .. } => format!("Execute: {label}"),
    }
}

/// Default announcement: `before → after (via transition)` and who did it.
pub fn summary_text(summary: &TransitionSummary) -> String {
    format!(
        "✅ *Jira updated* <{}|{}>\n• {} → {} (via *{}*)\n• By: {}",
        summary.issue_url,
        summary.issue_key,
        summary.before,
        summary.after,
        summary.transition,
        mention(&summary.actor)
    )
}

/// Fill `{issue_key}`-style placeholders. Unknown placeholders stay as written.
pub fn render_template(template: &str, summary: &TransitionSummary) -> String {
    let actor = mention(&summary.actor);
    let replacements: [(&str, &str); 7] = [
        ("{issue_key}", &summary.issue_key),
        ("{issue_url}", &summary.issue_url),
        ("{before}", &summary.before),
        ("{after}", &summary.after),
        ("{transition}", &summary.transition),
        ("{actor}", &actor),
        ("{label}", &summary.label),
    ];
    replacements
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| text.replace(placeholder, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::IssueKey;

    fn summary() -> TransitionSummary {
        TransitionSummary {
            issue_key: "KAN-1".to_string(),
            issue_url: "https://acme.atlassian.net/browse/KAN-1".to_string(),
            before: "To Do".to_string(),
            after: "Pending Approval".to_string(),
            transition: "Task Create".to_string(),
            label: "Move to Pending Approval".to_string(),
            actor: "U1".to_string(),
        }
    }

    #[test]
    fn test_summary_text() {
        let text = summary_text(&summary());
        assert!(text.contains("To Do → Pending Approval (via *Task Create*)"));
        assert!(text.contains("By: <@U1>"));
    }

    #[test]
    fn test_render_template_fills_placeholders() {
        let text = render_template("{issue_key}: {before} -> {after} by {actor} ({label}) {unknown}", &summary());
        assert_eq!(
            text,
            "KAN-1: To Do -> Pending Approval by <@U1> (Move to Pending Approval) {unknown}"
        );
    }

    #[test]
    fn test_panel_text_without_actor() {
        let panel = Panel {
            issue_key: IssueKey::parse("KAN-1").unwrap(),
            issue_url: "https://acme.atlassian.net/browse/KAN-1".to_string(),
            status: "To Do".to_string(),
            last_actor: None,
            affordance: Affordance::Refresh,
            note: Some(PanelNote::Intro),
        };
        let text = panel_text(&panel);
        assert!(text.starts_with("*Jira:* <https://acme.atlassian.net/browse/KAN-1|KAN-1>"));
        assert!(text.contains("*Current Status:* *To Do*"));
        assert!(text.contains("*Last Action By:* -"));
        assert!(text.ends_with("load the next executable action."));
    }

    #[test]
    fn test_restriction_notice_names_approver() {
        let restriction = Restriction::ApproverOnly {
            approver: "UBOSS".to_string(),
        };
        assert_eq!(restriction_notice(&restriction), "Only <@UBOSS> can approve.");
    }

    #[test]
    fn test_allow_list_note_does_not_address_the_channel() {
        let note = note_text(&PanelNote::Restricted(Restriction::NotOnAllowList));
        assert_eq!(note, "⚠️ Restricted: this step is limited to specific users.");
        assert!(!note.to_lowercase().contains("you"));
        assert_eq!(
            restriction_notice(&Restriction::NotOnAllowList),
            "You are not allowed to run this step."
        );
    }

    #[test]
    fn test_completion_outputs() {
        let mut completion = Completion {
            issue_key: "KAN-1".to_string(),
            status: "Approved".to_string(),
            updated_by: "U1".to_string(),
            interactivity: None,
        };
        assert_eq!(
            serde_json::to_value(&completion).unwrap(),
            serde_json::json!({ "issueKey": "KAN-1", "status": "Approved", "updatedBy": "U1" })
        );

        completion.interactivity = Some(serde_json::json!({ "interactivity_pointer": "123.abc" }));
        assert_eq!(
            serde_json::to_value(&completion).unwrap()["interactivity"]["interactivity_pointer"],
            "123.abc"
        );
    }

    #[test]
    fn test_button_text() {
        assert_eq!(button_text(&Affordance::Refresh), "Refresh Status");
        let execute = Affordance::Execute {
            label: "Approve".to_string(),
            transition: "Approve".to_string(),
        };
        assert_eq!(button_text(&execute), "Execute: Approve");
    }
}
