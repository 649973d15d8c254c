use anyhow::Result;

use super::Command;
use crate::config::AppConfig;
use crate::workflows::{AuthorizationPolicy, FlowTable, NotifyMode};

/// Prints the resolved decision table, one status per line.
pub struct FlowCommand {
    config: AppConfig,
}

impl FlowCommand {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

pub fn describe_table(table: &FlowTable, policy: &AuthorizationPolicy) -> Vec<String> {
    table
        .statuses()
        .filter_map(|status| table.decide_next(status))
        .map(|step| {
            let mut line = format!("{} → \"{}\" ({})", step.status, step.transition_name, step.label);
            if policy.is_approval_step(&step) {
                match policy.approver() {
                    Some(approver) => line.push_str(&format!(" [approver: {approver}]")),
                    None => line.push_str(" [approver: none configured]"),
                }
            }
            if let Some(guard) = step.guard() {
                line.push_str(&format!(" [allow: {}]", guard.allow_users.join(", ")));
            }
            if let Some(notify) = &step.step.notify {
                if notify.mode == NotifyMode::None {
                    line.push_str(" [silent]");
                }
            }
            line
        })
        .collect()
}

impl Command for FlowCommand {
    async fn execute(&self) -> Result<()> {
        let table = self.config.flow.build_table()?;
        let policy = AuthorizationPolicy::from_config(&self.config.flow, &self.config.approval);

        println!("🧭 Flow table ({} steps)", table.len());
        for line in describe_table(&table, &policy) {
            println!("   {line}");
        }
        Ok(())
    }
}
