//! Command handlers shared by one-shot invocations and the shell.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use quotesync_core::quotes::{export_document, export_file_name, import_document, ImportOutcome};
use quotesync_core::sync::{SyncCycleResult, SyncCycleStatus};
use quotesync_core::viewer::render;
use quotesync_core::{AddOutcome, CategoryFilter, Pick, QuoteId, QuoteViewer};

use crate::context::AppContext;

fn parse_id(raw: &str) -> Result<QuoteId> {
    raw.parse::<QuoteId>()
        .with_context(|| format!("'{}' is not a quote id", raw))
}

/// Resolve an explicit category argument, or fall back to the saved filter.
async fn resolve_filter(ctx: &AppContext, category: Option<&str>) -> Result<CategoryFilter> {
    match category {
        Some(raw) => Ok(CategoryFilter::parse(raw)),
        None => {
            let store = ctx.store.lock().await;
            Ok(ctx.viewer.current_filter(&store)?)
        }
    }
}

pub async fn list(ctx: &AppContext, category: Option<&str>) -> Result<()> {
    let filter = category.map(CategoryFilter::parse).unwrap_or_default();
    let store = ctx.store.lock().await;
    let records = QuoteViewer::matching(&store, &filter);
    if records.is_empty() {
        println!("No quotes for {}.", filter);
        return Ok(());
    }
    for record in records {
        println!("{}  [{}] {}", record.id, record.category, record.text);
    }
    Ok(())
}

pub async fn categories(ctx: &AppContext) -> Result<()> {
    let store = ctx.store.lock().await;
    let current = ctx.viewer.current_filter(&store)?;
    let mark = |filter: &CategoryFilter| if *filter == current { "*" } else { " " };

    println!("{} {}", mark(&CategoryFilter::All), CategoryFilter::All);
    for category in store.categories() {
        let filter = CategoryFilter::Category(category);
        println!("{} {}", mark(&filter), filter);
    }
    Ok(())
}

/// Change the saved filter, then show a random quote under it.
pub async fn set_filter(ctx: &AppContext, raw: &str) -> Result<()> {
    let filter = CategoryFilter::parse(raw);
    ctx.viewer.set_filter(&filter)?;
    println!("Filter: {}", filter);
    show_under(ctx, &filter).await
}

pub async fn show(ctx: &AppContext, category: Option<&str>) -> Result<()> {
    let filter = resolve_filter(ctx, category).await?;
    if category.is_some() {
        ctx.viewer.set_filter(&filter)?;
    }
    show_under(ctx, &filter).await
}

async fn show_under(ctx: &AppContext, filter: &CategoryFilter) -> Result<()> {
    let pick = {
        let store = ctx.store.lock().await;
        ctx.viewer
            .pick_random(&store, filter, &mut rand::thread_rng())?
    };
    match pick {
        Pick::Shown(record) => println!("{}", render(&record)),
        Pick::Empty => println!("No quotes for this category."),
    }
    Ok(())
}

pub async fn last(ctx: &AppContext) -> Result<()> {
    let filter = resolve_filter(ctx, None).await?;
    last_for(ctx, &filter)
}

fn last_for(ctx: &AppContext, filter: &CategoryFilter) -> Result<()> {
    match ctx.viewer.last_viewed(filter)? {
        Some(record) => println!("{}", render(&record)),
        None => println!("No quote shown yet in this session."),
    }
    Ok(())
}

pub async fn add(ctx: &AppContext, text: &str, category: &str) -> Result<()> {
    let outcome = ctx.store.lock().await.add(text, category)?;
    match outcome {
        AddOutcome::Added(record) => {
            info!("Added {}", record.id);
            println!("Quote added.");
            println!("{}", render(&record));
        }
        AddOutcome::Duplicate => println!("This quote already exists."),
    }
    Ok(())
}

pub async fn remove(ctx: &AppContext, raw_id: &str) -> Result<()> {
    let id = parse_id(raw_id)?;
    if ctx.store.lock().await.remove(&id)? {
        println!("Removed {}.", id);
    } else {
        bail!("No quote with id {}", id);
    }
    Ok(())
}

pub async fn export(ctx: &AppContext, path: Option<&Path>) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(export_file_name(chrono::Utc::now())));
    let (document, count) = {
        let store = ctx.store.lock().await;
        (export_document(store.all())?, store.len())
    };
    std::fs::write(&path, document)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Exported {} quote(s) to {}", count, path.display());
    println!("Exported {} quote(s) to {}.", count, path.display());
    Ok(path)
}

pub async fn import(ctx: &AppContext, path: &Path) -> Result<()> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report = {
        let mut store = ctx.store.lock().await;
        import_document(&mut store, &document)
            .with_context(|| format!("Failed to import {}", path.display()))?
    };
    if report.invalid > 0 {
        warn!("Skipped {} invalid element(s) in {}", report.invalid, path.display());
    }
    match report.outcome() {
        ImportOutcome::Added(n) => println!("Imported {} quote(s).", n),
        ImportOutcome::AllDuplicates => println!("All quotes were already present."),
        ImportOutcome::NothingToImport => println!("No valid quotes to import."),
    }
    Ok(())
}

pub async fn sync(ctx: &AppContext) -> Result<SyncCycleResult> {
    let result = ctx.engine.run_sync_cycle().await;
    print_cycle(&result);
    if result.status.is_failure() {
        bail!(
            "Sync failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(result)
}

fn print_cycle(result: &SyncCycleResult) {
    match result.status {
        SyncCycleStatus::Skipped => println!("Sync already in progress."),
        SyncCycleStatus::Ok => {
            println!(
                "Synced: {} fetched, {} new, {} pushed",
                result.pulled_count, result.added_count, result.pushed_count
            );
            if result.push_failed_count > 0 {
                println!("{} local quote(s) could not be pushed.", result.push_failed_count);
            }
            if result.conflict_count > 0 {
                println!("{} conflict(s) detected.", result.conflict_count);
            }
        }
        SyncCycleStatus::FetchError | SyncCycleStatus::MergeError => {}
    }
}

pub async fn conflicts(ctx: &AppContext) -> Result<()> {
    let pending = ctx.engine.pending_conflicts().await;
    if pending.is_empty() {
        println!("No pending conflicts.");
        return Ok(());
    }
    for conflict in pending {
        println!("{}", conflict.id);
        println!(
            "  local:  [{}] {}",
            conflict.local_version.category, conflict.local_version.text
        );
        println!(
            "  server: [{}] {}",
            conflict.remote_version.category, conflict.remote_version.text
        );
    }
    Ok(())
}

pub async fn accept_remote(ctx: &AppContext, raw_id: &str) -> Result<()> {
    let id = parse_id(raw_id)?;
    ctx.engine.accept_remote(&id).await?;
    println!("Server version kept for {}.", id);
    Ok(())
}

pub async fn keep_local(ctx: &AppContext, raw_id: &str) -> Result<()> {
    let id = parse_id(raw_id)?;
    let record = ctx
        .engine
        .keep_local(&id)
        .await
        .with_context(|| format!("Failed to keep local version of {}", id))?;
    println!("Local version kept and pushed as {}.", record.id);
    Ok(())
}

pub fn status(ctx: &AppContext) {
    println!("{}", ctx.engine.status());
}
