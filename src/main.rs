use anyhow::Result;
use clap::Parser;

use jira_flow::cli::commands::config::ConfigCommand;
use jira_flow::cli::commands::create::CreateCommand;
use jira_flow::cli::commands::flow::FlowCommand;
use jira_flow::cli::commands::interact::{DispatchCommand, InteractCommand, PanelAction};
use jira_flow::cli::commands::status::StatusCommand;
use jira_flow::cli::commands::Command;
use jira_flow::cli::{Cli, Commands};
use jira_flow::config::AppConfig;
use jira_flow::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    AppConfig::load_env_file()?;
    let config = AppConfig::load(cli.global.config.as_deref())?;
    init_telemetry(&config.observability)?;

    let global = cli.global;
    match cli.command {
        // No subcommand: explain how to get started
        None => {
            show_usage();
            Ok(())
        }
        Some(Commands::Status { issue }) => tokio::runtime::Runtime::new()?
            .block_on(async { StatusCommand::new(config, issue).execute().await }),
        Some(Commands::Start { issue }) => tokio::runtime::Runtime::new()?.block_on(async {
            InteractCommand::new(config, global, PanelAction::Start, issue)
                .execute()
                .await
        }),
        Some(Commands::Refresh { issue }) => tokio::runtime::Runtime::new()?.block_on(async {
            InteractCommand::new(config, global, PanelAction::Refresh, issue)
                .execute()
                .await
        }),
        Some(Commands::Execute { issue }) => tokio::runtime::Runtime::new()?.block_on(async {
            InteractCommand::new(config, global, PanelAction::Execute, issue)
                .execute()
                .await
        }),
        Some(Commands::Dispatch { payload, issue }) => tokio::runtime::Runtime::new()?.block_on(async {
            DispatchCommand::new(config, global, payload, issue)
                .execute()
                .await
        }),
        Some(Commands::Create {
            task,
            summary,
            requester,
            description,
            project,
        }) => tokio::runtime::Runtime::new()?.block_on(async {
            CreateCommand::new(config, task, summary, requester, description, project)
                .execute()
                .await
        }),
        Some(Commands::Flow) => {
            tokio::runtime::Runtime::new()?.block_on(async { FlowCommand::new(config).execute().await })
        }
        Some(Commands::Config { dump }) => {
            tokio::runtime::Runtime::new()?.block_on(async { ConfigCommand::new(config, dump).execute().await })
        }
    }
}

fn show_usage() {
    println!("🧭 jira-flow - move Jira issues through a configured status flow");
    println!();
    println!("To get started:");
    println!("  📋 jira-flow status KAN-12     # Current status and next step");
    println!("  📌 jira-flow start KAN-12      # Post a panel with a Refresh button");
    println!("  🔄 jira-flow refresh KAN-12    # Offer the next transition");
    println!("  ▶️  jira-flow execute KAN-12    # Apply it");
    println!();
    println!("Setup:");
    println!("  ⚙️  jira-flow config            # Check configuration");
    println!("  🧭 jira-flow flow              # Show the flow table");
}
