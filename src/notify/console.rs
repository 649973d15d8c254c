//! Plain-text surface for running interactions from a terminal.

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{button_text, note_text, Audience, Completion, MessageRef, Notice, Notifier};
use crate::jira::JiraError;
use crate::workflows::panel::Panel;

/// Writes every panel, notice and completion to a sink (stdout by default).
#[derive(Clone)]
pub struct ConsoleNotifier {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    next_ts: Arc<AtomicU64>,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            next_ts: Arc::new(AtomicU64::new(1)),
        }
    }

    fn emit(&self, text: &str) -> Result<(), JiraError> {
        let mut out = self.out.lock().map_err(|_| JiraError::Notification {
            operation: "console".to_string(),
            message: "output lock poisoned".to_string(),
        })?;
        writeln!(out, "{text}")
            .and_then(|_| out.flush())
            .map_err(|e| JiraError::Notification {
                operation: "console".to_string(),
                message: e.to_string(),
            })
    }
}

pub fn render_panel(panel: &Panel) -> String {
    let mut lines = vec![
        format!("Jira: {} <{}>", panel.issue_key, panel.issue_url),
        format!("Current Status: {}", panel.status),
        format!("Last Action By: {}", panel.last_actor.as_deref().unwrap_or("-")),
    ];
    if let Some(note) = &panel.note {
        lines.push(note_text(note));
    }
    lines.push(format!("[{}]", button_text(&panel.affordance)));
    lines.join("\n")
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn post_panel(&self, channel: &str, panel: &Panel) -> Result<MessageRef, JiraError> {
        let ts = format!("console.{}", self.next_ts.fetch_add(1, Ordering::SeqCst));
        self.emit(&format!("--- panel {channel}/{ts} ---\n{}", render_panel(panel)))?;
        Ok(MessageRef {
            channel: channel.to_string(),
            ts,
        })
    }

    async fn update_panel(&self, message: &MessageRef, panel: &Panel) -> Result<(), JiraError> {
        self.emit(&format!(
            "--- panel {}/{} (updated) ---\n{}",
            message.channel,
            message.ts,
            render_panel(panel)
        ))
    }

    async fn send_notice(&self, notice: &Notice) -> Result<(), JiraError> {
        let target = match &notice.audience {
            Audience::Channel { channel } => format!("#{channel}"),
            Audience::Private { channel, actor } => format!("#{channel} (only {actor})"),
            Audience::Direct { actor } => format!("@{actor}"),
        };
        self.emit(&format!("--- notice to {target} ---\n{}", notice.text))
    }

    async fn complete(&self, execution_id: Option<&str>, completion: &Completion) -> Result<(), JiraError> {
        let outputs = serde_json::to_string(completion).map_err(|e| JiraError::Notification {
            operation: "complete".to_string(),
            message: e.to_string(),
        })?;
        self.emit(&format!(
            "--- complete {} ---\n{outputs}",
            execution_id.unwrap_or("-")
        ))
    }
}
