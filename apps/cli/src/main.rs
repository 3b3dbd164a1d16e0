//! quotesync command-line client.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod config;
mod context;
mod shell;

use cli::{Cli, Command};
use config::AppConfig;
use context::AppContext;
use quotesync_core::{KeyValueStore, MemoryKeyValueStore};

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn watch(ctx: &AppContext) -> Result<()> {
    ctx.scheduler.ensure_started(ctx.engine.clone()).await;
    info!(
        "Syncing every {}s against {} (Ctrl-C to stop)",
        ctx.scheduler.interval().as_secs(),
        ctx.config.server_url
    );

    let mut status = ctx.engine.subscribe_status();
    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                info!("{}", current);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    ctx.scheduler.stop().await;
    info!("Stopped");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?.with_overrides(cli.data_dir, cli.server_url);

    let session: Arc<dyn KeyValueStore> = match cli.cmd {
        Command::Shell => Arc::new(MemoryKeyValueStore::new()),
        _ => AppContext::file_session(&config)?,
    };
    let ctx = AppContext::open(config, session)?;

    match cli.cmd {
        Command::List { category } => commands::list(&ctx, category.as_deref()).await,
        Command::Categories => commands::categories(&ctx).await,
        Command::Show { category } => commands::show(&ctx, category.as_deref()).await,
        Command::Last => commands::last(&ctx).await,
        Command::Add { text, category } => commands::add(&ctx, &text, &category).await,
        Command::Remove { id } => commands::remove(&ctx, &id).await,
        Command::Export { path } => commands::export(&ctx, path.as_deref()).await.map(|_| ()),
        Command::Import { path } => commands::import(&ctx, &path).await,
        Command::Sync {
            keep_local,
            accept_remote,
        } => {
            commands::sync(&ctx).await?;
            for id in &accept_remote {
                commands::accept_remote(&ctx, id).await?;
            }
            for id in &keep_local {
                commands::keep_local(&ctx, id).await?;
            }
            if keep_local.is_empty() && accept_remote.is_empty() {
                commands::conflicts(&ctx).await?;
            }
            Ok(())
        }
        Command::Watch => watch(&ctx).await,
        Command::Shell => shell::run(&ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let interactive = matches!(cli.cmd, Command::Watch | Command::Shell);
    init_logging(if interactive { "info" } else { "warn" });

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
