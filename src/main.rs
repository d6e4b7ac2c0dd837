use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::{delete, deploy, logs, rollback, run, status};
use services::{DeleteOptions, DeployOptions, LogsOptions, RollbackOptions, RunOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let debug = cli.verbose || std::env::var("DEBUG").map(|v| !v.is_empty()).unwrap_or(false);
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if debug {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false) // Disable ANSI escape codes for cleaner output
        .init();

    let result = match cli.command {
        Commands::Deploy {
            common,
            update_service,
            force_new_deployment,
            auto_log_group,
            no_wait,
            dry_run,
        } => {
            deploy::execute(
                common,
                DeployOptions {
                    update_service,
                    force_new_deployment,
                    auto_log_group,
                    no_wait,
                    dry_run,
                },
            )
            .await
        }
        Commands::Delete {
            common,
            force,
            dry_run,
        } => delete::execute(common, DeleteOptions { force, dry_run }).await,
        Commands::Run {
            common,
            service,
            task_definition,
            container,
            overrides,
            count,
            no_wait,
            command,
        } => {
            run::execute(
                common,
                service,
                RunOptions {
                    task_definition,
                    container,
                    overrides,
                    command: (!command.is_empty()).then_some(command),
                    count,
                    no_wait,
                },
            )
            .await
        }
        Commands::Rollback {
            common,
            no_wait,
            deregister,
            dry_run,
        } => {
            rollback::execute(
                common,
                RollbackOptions {
                    no_wait,
                    deregister,
                    dry_run,
                },
            )
            .await
        }
        Commands::Status { common, events } => status::execute(common, events).await,
        Commands::Logs {
            common,
            service,
            container,
            start_time,
            tail,
        } => {
            logs::execute(
                common,
                service,
                LogsOptions {
                    container,
                    start_time,
                    tail,
                },
            )
            .await
        }
    };

    if let Err(e) = result {
        ui::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
