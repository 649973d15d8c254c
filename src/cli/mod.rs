use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "jira-flow")]
#[command(version)]
#[command(about = "Move Jira issues through a configured status flow")]
#[command(long_about = "jira-flow reads an issue's current Jira status, offers the single next transition \
                       from the configured flow table, and applies it on request. Panels and announcements go \
                       to Slack with --slack, or to the terminal by default.")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Execution context shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (defaults to ./jira-flow.toml when present)
    #[arg(long, global = true, help = "Path to a jira-flow.toml configuration file")]
    pub config: Option<PathBuf>,

    /// Render panels and notices in Slack instead of the terminal
    #[arg(long, global = true, help = "Use the Slack notifier (needs SLACK_BOT_TOKEN)")]
    pub slack: bool,

    #[arg(long, global = true, help = "Channel for panels and announcements")]
    pub channel: Option<String>,

    #[arg(long, global = true, help = "User id acting on the panel")]
    pub actor: Option<String>,

    #[arg(long, global = true, help = "Timestamp of an existing panel message to update")]
    pub message_ts: Option<String>,

    #[arg(long, global = true, help = "Function execution id to complete when the interaction ends")]
    pub execution_id: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the current status of an issue and its next step
    Status {
        #[arg(help = "Issue key or browse URL, e.g. KAN-12")]
        issue: String,
    },
    /// Post a panel for an issue with a Refresh button
    Start {
        #[arg(help = "Issue key or browse URL")]
        issue: String,
    },
    /// Re-read the status and offer the next transition
    Refresh {
        #[arg(help = "Issue key or browse URL")]
        issue: String,
    },
    /// Apply the next transition for the issue's current status
    Execute {
        #[arg(help = "Issue key or browse URL")]
        issue: String,
    },
    /// Handle a Slack block_actions payload
    Dispatch {
        /// Payload file, or '-' for stdin
        #[arg(long, help = "Path to the JSON payload, or '-' to read stdin")]
        payload: String,
        /// Key to use when the button payload carries none
        #[arg(long, help = "Fallback issue key when the payload's button value is unusable")]
        issue: Option<String>,
    },
    /// Create a Jira issue
    Create {
        #[arg(long, help = "Task name, shown in brackets before the summary")]
        task: String,
        #[arg(long, help = "Issue summary")]
        summary: String,
        #[arg(long, help = "User id recorded as the requester")]
        requester: String,
        #[arg(long, help = "Extra description text")]
        description: Option<String>,
        #[arg(long, help = "Project key (defaults to jira.project_key)")]
        project: Option<String>,
    },
    /// Show the resolved flow table
    Flow,
    /// Show configuration
    Config {
        #[arg(long, help = "Print the effective configuration as TOML with secrets masked")]
        dump: bool,
    },
}
