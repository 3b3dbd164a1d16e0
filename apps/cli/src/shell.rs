//! Interactive session: one quote per prompt, sync running in the background.

use anyhow::Result;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::commands;
use crate::context::AppContext;

const HELP: &str = "\
Commands:
  show                       random quote under the current filter
  filter <category|all>      change the filter
  last                       last quote shown in this session
  list [category]            list quotes
  categories                 list categories
  add <text> | <category>    add a quote
  remove <id>                remove a quote
  export [path]              write all quotes to a JSON file
  import <path>              append quotes from a JSON file
  sync                       sync with the server now
  conflicts                  pending conflicts
  keep-local <id>            resolve a conflict with the local version
  accept-remote <id>         resolve a conflict with the server version
  status                     current sync status
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Help,
    Show,
    Filter(String),
    Last,
    List(Option<String>),
    Categories,
    Add { text: String, category: String },
    Remove(String),
    Export(Option<PathBuf>),
    Import(PathBuf),
    Sync,
    Conflicts,
    KeepLocal(String),
    AcceptRemote(String),
    Status,
    Quit,
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(rest.to_string())
    }
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Parse one input line. The verb is the first word; the rest is its argument.
pub fn parse_shell_line(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "help" | "?" => ShellCommand::Help,
        "show" | "next" => ShellCommand::Show,
        "filter" => ShellCommand::Filter(required(rest, "filter <category|all>")?),
        "last" => ShellCommand::Last,
        "list" | "ls" => ShellCommand::List(optional(rest)),
        "categories" => ShellCommand::Categories,
        "add" => {
            let Some((text, category)) = rest.rsplit_once('|') else {
                return Err("usage: add <text> | <category>".to_string());
            };
            ShellCommand::Add {
                text: text.trim().to_string(),
                category: category.trim().to_string(),
            }
        }
        "remove" | "rm" => ShellCommand::Remove(required(rest, "remove <id>")?),
        "export" => ShellCommand::Export(optional(rest).map(PathBuf::from)),
        "import" => ShellCommand::Import(PathBuf::from(required(rest, "import <path>")?)),
        "sync" => ShellCommand::Sync,
        "conflicts" => ShellCommand::Conflicts,
        "keep-local" => ShellCommand::KeepLocal(required(rest, "keep-local <id>")?),
        "accept-remote" => ShellCommand::AcceptRemote(required(rest, "accept-remote <id>")?),
        "status" => ShellCommand::Status,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(command)
}

async fn dispatch(ctx: &AppContext, command: ShellCommand) -> Result<()> {
    match command {
        ShellCommand::Empty | ShellCommand::Quit => {}
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Show => commands::show(ctx, None).await?,
        ShellCommand::Filter(raw) => commands::set_filter(ctx, &raw).await?,
        ShellCommand::Last => commands::last(ctx).await?,
        ShellCommand::List(category) => commands::list(ctx, category.as_deref()).await?,
        ShellCommand::Categories => commands::categories(ctx).await?,
        ShellCommand::Add { text, category } => commands::add(ctx, &text, &category).await?,
        ShellCommand::Remove(id) => commands::remove(ctx, &id).await?,
        ShellCommand::Export(path) => {
            commands::export(ctx, path.as_deref()).await?;
        }
        ShellCommand::Import(path) => commands::import(ctx, &path).await?,
        ShellCommand::Sync => {
            commands::sync(ctx).await?;
        }
        ShellCommand::Conflicts => commands::conflicts(ctx).await?,
        ShellCommand::KeepLocal(id) => commands::keep_local(ctx, &id).await?,
        ShellCommand::AcceptRemote(id) => commands::accept_remote(ctx, &id).await?,
        ShellCommand::Status => commands::status(ctx),
    }
    Ok(())
}

async fn prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"quotes> ").await?;
    stdout.flush().await?;
    Ok(())
}

/// Run the interactive loop until `quit`, end of input or Ctrl-C.
pub async fn run(ctx: &AppContext) -> Result<()> {
    ctx.scheduler.ensure_started(ctx.engine.clone()).await;
    info!(
        "Background sync every {}s against {}",
        ctx.scheduler.interval().as_secs(),
        ctx.config.server_url
    );

    println!("Type 'help' for commands.");
    commands::show(ctx, None).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            debug!("stdin closed");
            break;
        };

        match parse_shell_line(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(command) => {
                if let Err(err) = dispatch(ctx, command).await {
                    eprintln!("Error: {:#}", err);
                }
            }
            Err(message) => eprintln!("{}", message),
        }
    }

    ctx.scheduler.stop().await;
    Ok(())
}
