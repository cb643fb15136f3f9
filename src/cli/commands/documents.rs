//! Document commands.

use std::path::Path;

use console::style;

use crate::cli::helpers::{spinner, truncate, Context};
use crate::cli::icons::{arrow, success};
use crate::services::DocumentService;

pub async fn cmd_list(ctx: &Context, query: &str, page: usize) -> anyhow::Result<()> {
    let docs = DocumentService::new(&ctx.client);
    let listing = docs.page(query, page).await?;

    if listing.total == 0 {
        if query.trim().is_empty() {
            println!("No documents yet. Add one with 'annobench documents add' or 'import'.");
        } else {
            println!("No documents match '{}'.", query.trim());
        }
        return Ok(());
    }

    println!(
        "{:<6} {:<40} {:>8} {:>9}  STATUS",
        "ID", "TITLE", "ENTITIES", "RELATIONS"
    );
    for summary in &listing.items {
        let status = if summary.is_annotated() {
            style("annotated").green()
        } else {
            style("pending").dim()
        };
        println!(
            "{:<6} {:<40} {:>8} {:>9}  {}",
            summary.document.id,
            truncate(&summary.document.title, 40),
            summary.entity_count,
            summary.relation_count,
            status
        );
    }
    println!(
        "{}",
        style(format!(
            "page {}/{} ({} documents)",
            listing.page, listing.total_pages, listing.total
        ))
        .dim()
    );
    Ok(())
}

pub async fn cmd_show(ctx: &Context, id: i64, tokens: bool) -> anyhow::Result<()> {
    if tokens {
        let tokens = ctx.client.document_tokens(id).await?;
        for token in tokens {
            println!("{:>5}  {:?}", token.token_index, token.token_text);
        }
        return Ok(());
    }

    let document = ctx.client.get_document(id).await?;
    println!("{}", style(&document.title).bold());
    if let Some(created) = document.created_at {
        println!("{}", style(created.format("%Y-%m-%d %H:%M")).dim());
    }
    println!();
    println!("{}", document.text());
    Ok(())
}

pub async fn cmd_add(ctx: &Context, title: &str, content: &str) -> anyhow::Result<()> {
    let document = DocumentService::new(&ctx.client)
        .create(title, content)
        .await?;
    println!("{} Created document {} '{}'", success(), document.id, document.title);
    Ok(())
}

pub async fn cmd_import(ctx: &Context, path: &Path, title: Option<&str>) -> anyhow::Result<()> {
    let pb = spinner(format!("Importing {}...", path.display()));
    let result = DocumentService::new(&ctx.client).import(path, title).await;
    pb.finish_and_clear();
    let document = result?;
    println!("{} Created document {} '{}'", success(), document.id, document.title);
    println!(
        "  {} {} characters",
        arrow(),
        document.text().chars().count()
    );
    Ok(())
}

/// Update a document, keeping fields that were not given.
pub async fn cmd_update(
    ctx: &Context,
    id: i64,
    title: Option<&str>,
    content: Option<&str>,
) -> anyhow::Result<()> {
    if title.is_none() && content.is_none() {
        anyhow::bail!("nothing to update: give --title and/or --content");
    }
    let current = ctx.client.get_document(id).await?;
    DocumentService::new(&ctx.client)
        .update(
            id,
            title.unwrap_or(&current.title),
            content.unwrap_or(current.text()),
        )
        .await?;
    println!("{} Updated document {}", success(), id);
    Ok(())
}

pub async fn cmd_delete(ctx: &Context, id: i64) -> anyhow::Result<()> {
    DocumentService::new(&ctx.client).delete(id).await?;
    println!("{} Deleted document {}", success(), id);
    Ok(())
}
