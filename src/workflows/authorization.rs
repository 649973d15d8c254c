// Authorization gate: a pure predicate over (actor, step)

use super::flow::{FlowConfig, NextStep};
use crate::config::ApprovalConfig;

/// Why an actor was turned away. Carries only what may be shown publicly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Restriction {
    /// Approval step; only the configured approver may run it.
    ApproverOnly { approver: String },
    /// Approval step with no approver configured; nobody may run it.
    NoApproverConfigured,
    /// Actor is not on the step's allow-list. The list itself stays private.
    NotOnAllowList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    Denied(Restriction),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorizationPolicy {
    approver: Option<String>,
    approval_transition: Option<String>,
    approval_status: Option<String>,
}

impl AuthorizationPolicy {
    pub fn new(
        approver: Option<String>,
        approval_transition: Option<String>,
        approval_status: Option<String>,
    ) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            approver: clean(approver),
            approval_transition: clean(approval_transition),
            approval_status: clean(approval_status),
        }
    }

    /// Approval is the `pending_to_approved` transition, taken from the
    /// pending status when that status is configured.
    pub fn from_config(flow: &FlowConfig, approval: &ApprovalConfig) -> Self {
        Self::new(
            approval.approver(),
            Some(flow.transitions.pending_to_approved.clone()),
            flow.statuses.pending.clone(),
        )
    }

    pub fn approver(&self) -> Option<&str> {
        self.approver.as_deref()
    }

    pub fn is_approval_step(&self, step: &NextStep<'_>) -> bool {
        let Some(transition) = self.approval_transition.as_deref() else {
            return false;
        };
        if step.transition_name != transition {
            return false;
        }
        match self.approval_status.as_deref() {
            Some(status) => step.status == status,
            None => true,
        }
    }

    /// Unrestricted unless the step carries a guard or is the approval step.
    /// Both checks apply when both are present.
    pub fn authorize(&self, actor: &str, step: &NextStep<'_>) -> Authorization {
        if let Some(guard) = step.guard() {
            if !guard.allow_users.iter().any(|allowed| allowed == actor) {
                return Authorization::Denied(Restriction::NotOnAllowList);
            }
        }

        if self.is_approval_step(step) {
            return match self.approver.as_deref() {
                Some(approver) if approver == actor => Authorization::Allowed,
                Some(approver) => Authorization::Denied(Restriction::ApproverOnly {
                    approver: approver.to_string(),
                }),
                None => Authorization::Denied(Restriction::NoApproverConfigured),
            };
        }

        Authorization::Allowed
    }
}
