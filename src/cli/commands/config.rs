use anyhow::Result;

use super::Command;
use crate::config::AppConfig;

pub struct ConfigCommand {
    config: AppConfig,
    dump: bool,
}

impl ConfigCommand {
    pub fn new(config: AppConfig, dump: bool) -> Self {
        Self { config, dump }
    }

    fn check(&self) -> Vec<(&'static str, Result<(), String>)> {
        vec![
            ("Jira base URL", self.config.jira.require_base_url().map(|_| ()).map_err(|e| e.to_string())),
            ("Jira credentials", self.config.jira.require_credentials().map(|_| ()).map_err(|e| e.to_string())),
            ("Flow table", self.config.flow.build_table().map(|_| ()).map_err(|e| e.to_string())),
            (
                "Approver",
                self.config
                    .approval
                    .approver()
                    .map(|_| ())
                    .ok_or_else(|| "Missing configuration: JIRA_APPROVER_ID".to_string()),
            ),
            ("Slack bot token", self.config.slack.require_bot_token().map(|_| ()).map_err(|e| e.to_string())),
        ]
    }
}

impl Command for ConfigCommand {
    async fn execute(&self) -> Result<()> {
        if self.dump {
            print!("{}", self.config.to_redacted_toml()?);
            return Ok(());
        }

        println!("⚙️  Configuration check");
        for (name, outcome) in self.check() {
            match outcome {
                Ok(()) => println!("   ✅ {name}"),
                Err(e) => println!("   ❌ {name}: {e}"),
            }
        }
        Ok(())
    }
}
