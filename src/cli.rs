//! CLI definitions for ecsforge
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_param;

#[derive(Parser)]
#[command(
    name = "ecsforge",
    version,
    about = "Layered task definition and service deployer for container clusters",
    long_about = "Resolves layered YAML configs and templated JSON definitions,\nthen registers task definitions and creates, recreates or updates services."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Arguments shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to the config file (the top of the base chain)
    #[arg(short, long, env = "ECSFORGE_CONFIG")]
    pub config: PathBuf,

    /// Additional template parameter, overriding every config layer
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Control plane endpoint (defaults to the regional endpoint)
    #[arg(long, env = "ECSFORGE_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Log service endpoint (defaults to the regional endpoint)
    #[arg(long, env = "ECSFORGE_LOGS_ENDPOINT_URL")]
    pub logs_endpoint_url: Option<String>,

    /// Overall deadline, e.g. 15m
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register task definitions and create or update services
    Deploy {
        #[command(flatten)]
        common: CommonArgs,

        /// Also push every mutable service attribute
        #[arg(long)]
        update_service: bool,

        /// Start a new deployment even if nothing changed
        #[arg(long, alias = "force-new-deploy")]
        force_new_deployment: bool,

        /// Create missing awslogs log groups first
        #[arg(long)]
        auto_log_group: bool,

        /// Do not wait for services to become stable
        #[arg(long)]
        no_wait: bool,

        /// Show what would change without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the configured services
    Delete {
        #[command(flatten)]
        common: CommonArgs,

        /// Delete even if tasks are still running
        #[arg(long)]
        force: bool,

        /// Show what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// Run one-off tasks with a service's network and placement settings
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Service name (logical or full)
        #[arg(short, long)]
        service: String,

        /// Task definition template to register and run instead
        #[arg(long = "task-def")]
        task_definition: Option<PathBuf>,

        /// Container to override and follow (defaults to the first)
        #[arg(long)]
        container: Option<String>,

        /// Raw overrides JSON
        #[arg(long)]
        overrides: Option<String>,

        /// Number of tasks to start
        #[arg(long, default_value = "1")]
        count: i64,

        /// Do not wait for the tasks to stop
        #[arg(long)]
        no_wait: bool,

        /// Command for the selected container, after `--`
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Point services back at their previous task definition revision
    Rollback {
        #[command(flatten)]
        common: CommonArgs,

        /// Do not wait for services to become stable
        #[arg(long)]
        no_wait: bool,

        /// Deregister the rolled-back revision once stable
        #[arg(long)]
        deregister: bool,

        /// Show what would change without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show deployments, tasks and recent events of the configured services
    Status {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of events to show per service
        #[arg(long, default_value = "3")]
        events: usize,
    },

    /// Print or tail the logs of a service's running tasks
    Logs {
        #[command(flatten)]
        common: CommonArgs,

        /// Service name (logical or full)
        #[arg(short, long)]
        service: String,

        /// Container to read (defaults to the first)
        #[arg(long)]
        container: Option<String>,

        /// How far back to start, e.g. 5m, 2h, 1d
        #[arg(long, value_parser = humantime::parse_duration)]
        start_time: Option<Duration>,

        /// Keep following until interrupted
        #[arg(short, long)]
        tail: bool,
    },
}
