//! TSAE replica daemon
//!
//! Runs one replica of a shared recipe book. Sessions with peers run in the
//! background; commands on stdin issue operations and inspect state.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tsae_anti_entropy::{Replica, ReplicaNode, TsaeConfig};

mod commands;
mod recipes;

use commands::Command;
use recipes::{RecipeCommand, Recipes};

type Node = ReplicaNode<RecipeCommand, Recipes>;

#[derive(Parser)]
#[command(name = "tsae-node")]
#[command(about = "Replicate a recipe book with timestamped anti-entropy", long_about = None)]
struct Cli {
    /// Config file path (.toml or .json)
    #[arg(short, long)]
    config: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = TsaeConfig::load_from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.merge_with_env()?;
    config.validate()?;

    let replica = Arc::new(Replica::from_config(&config, Recipes::default()));
    let node = Node::start(replica, config).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match commands::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => execute(&node, command).await,
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }

    tracing::info!(replica = %node.replica().id(), "shutting down");
    node.shutdown();
    Ok(())
}

async fn execute(node: &Node, command: Command) {
    let replica = node.replica();
    match command {
        Command::Add { title, body } => {
            let op = replica.issue(RecipeCommand::Add { title, body });
            println!("{op}");
        }
        Command::Remove { title } => {
            if replica.handler().contains(&title) {
                let op = replica.issue(RecipeCommand::Remove { title });
                println!("{op}");
            } else {
                println!("no recipe named {title}");
            }
        }
        Command::List => {
            for (title, body) in replica.handler().entries() {
                println!("{title}: {body}");
            }
        }
        Command::Log => print!("{}", replica.log_snapshot()),
        Command::Summary => {
            println!("summary:\n{}", replica.summary());
            println!("ack:\n{}", replica.ack());
        }
        Command::Disconnect => replica.set_connected(false),
        Command::Connect => replica.set_connected(true),
        Command::Sync => {
            let reports = node.sync_now().await;
            for report in &reports {
                println!(
                    "session {}: sent {}, received {}, admitted {}",
                    report.session_number,
                    report.operations_sent,
                    report.operations_received,
                    report.operations_admitted
                );
            }
            if reports.is_empty() {
                println!("no session completed");
            }
        }
        Command::Quit => {}
    }
}
