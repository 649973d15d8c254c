// Test doubles for the controller: an in-memory Jira and a notifier that
// records every call.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::jira::types::NamedRef;
use crate::jira::{
    resolve_transition, AppliedTransition, IssueKey, JiraError, JiraTransition, StatusReader, TransitionExecutor,
};
use crate::notify::{Completion, MessageRef, Notice, Notifier};
use crate::workflows::panel::Panel;

/// Single-issue remote. Transitions are offered per status and move the issue
/// immediately, so wait-for-change sees the new status on its first poll.
#[derive(Debug, Default)]
pub struct InMemoryJira {
    status: Mutex<String>,
    offered: Mutex<HashMap<String, Vec<JiraTransition>>>,
    applied: Mutex<Vec<String>>,
    fail_reads: AtomicBool,
}

impl InMemoryJira {
    pub fn new(status: &str) -> Self {
        Self {
            status: Mutex::new(status.to_string()),
            ..Default::default()
        }
    }

    pub fn with_transition(self, from: &str, name: &str, to: &str) -> Self {
        {
            let mut offered = self.offered.lock().unwrap();
            let list = offered.entry(from.to_string()).or_default();
            list.push(JiraTransition {
                id: Some(format!("{}", list.len() + 11)),
                name: Some(name.to_string()),
                to: Some(NamedRef {
                    name: Some(to.to_string()),
                }),
            });
        }
        self
    }

    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub fn status(&self) -> String {
        self.status.lock().unwrap().clone()
    }

    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusReader for InMemoryJira {
    async fn read_status(&self, _key: &IssueKey) -> Result<String, JiraError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(JiraError::RemoteRead {
                method: "GET".to_string(),
                url: "memory://issue".to_string(),
                status: Some(503),
                body: "unavailable".to_string(),
            });
        }
        Ok(self.status())
    }
}

#[async_trait]
impl TransitionExecutor for InMemoryJira {
    async fn apply_transition(&self, _key: &IssueKey, transition_name: &str) -> Result<AppliedTransition, JiraError> {
        let current = self.status();
        let offered = self
            .offered
            .lock()
            .unwrap()
            .get(&current)
            .cloned()
            .unwrap_or_default();

        let applied = resolve_transition(&offered, transition_name)?;
        if let Some(target) = &applied.to_status {
            self.set_status(target);
        }
        self.applied.lock().unwrap().push(applied.name.clone());
        Ok(applied)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    PostPanel,
    UpdatePanel,
    Notice,
    Complete,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    fail: bool,
    calls: Mutex<Vec<RecordedCall>>,
    panels: Mutex<Vec<Panel>>,
    notices: Mutex<Vec<Notice>>,
    completions: Mutex<Vec<(Option<String>, Completion)>>,
}

impl RecordingNotifier {
    /// Records every call, then reports failure for all of them.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn panels(&self) -> Vec<Panel> {
        self.panels.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn completions(&self) -> usize {
        self.completions.lock().unwrap().len()
    }

    fn outcome(&self, operation: &str) -> Result<(), JiraError> {
        if self.fail {
            return Err(JiraError::Notification {
                operation: operation.to_string(),
                message: "recording notifier set to fail".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post_panel(&self, channel: &str, panel: &Panel) -> Result<MessageRef, JiraError> {
        self.calls.lock().unwrap().push(RecordedCall::PostPanel);
        self.panels.lock().unwrap().push(panel.clone());
        self.outcome("post_panel")?;
        Ok(MessageRef {
            channel: channel.to_string(),
            ts: format!("{}.0", self.panels.lock().unwrap().len()),
        })
    }

    async fn update_panel(&self, _message: &MessageRef, panel: &Panel) -> Result<(), JiraError> {
        self.calls.lock().unwrap().push(RecordedCall::UpdatePanel);
        self.panels.lock().unwrap().push(panel.clone());
        self.outcome("update_panel")
    }

    async fn send_notice(&self, notice: &Notice) -> Result<(), JiraError> {
        self.calls.lock().unwrap().push(RecordedCall::Notice);
        self.notices.lock().unwrap().push(notice.clone());
        self.outcome("send_notice")
    }

    async fn complete(&self, execution_id: Option<&str>, completion: &Completion) -> Result<(), JiraError> {
        self.calls.lock().unwrap().push(RecordedCall::Complete);
        self.completions
            .lock()
            .unwrap()
            .push((execution_id.map(str::to_string), completion.clone()));
        self.outcome("complete")
    }
}
