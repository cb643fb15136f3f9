//! AI-assisted extraction, CSV analysis and business reports.

use std::path::PathBuf;

use console::style;
use futures::future::AbortHandle;

use crate::api::ApiError;
use crate::cli::helpers::{spinner, Context};
use crate::cli::icons::{arrow, success, warning};
use crate::export::{export_report, DEFAULT_REPORT_TITLE};

pub struct ReportOptions {
    pub files: Vec<String>,
    pub analysis: Option<PathBuf>,
    pub export: bool,
    pub title: Option<String>,
    pub out_dir: Option<PathBuf>,
}

pub async fn cmd_extract(ctx: &Context, document: i64) -> anyhow::Result<()> {
    let pb = spinner(format!("Extracting entities from document {}...", document));
    let reply = ctx.client.auto_extract(document).await;
    pb.finish_and_clear();
    println!("{}", reply?.to_display());
    Ok(())
}

pub async fn cmd_csv_files(ctx: &Context) -> anyhow::Result<()> {
    let files = ctx.client.csv_files().await?;
    if files.is_empty() {
        println!("No CSV files available.");
        return Ok(());
    }
    for file in files {
        println!("  {} {}", arrow(), file);
    }
    Ok(())
}

/// Run a CSV analysis; Ctrl-C cancels the request. Returns `None` when
/// cancelled.
async fn analyze(ctx: &Context, document: i64, files: &[String]) -> anyhow::Result<Option<String>> {
    let (handle, registration) = AbortHandle::new_pair();
    let pb = spinner(format!(
        "Analysing document {} against {} CSV file(s) (Ctrl-C to cancel)...",
        document,
        files.len()
    ));

    let call = ctx.client.analyze_csv(document, files, Some(registration));
    tokio::pin!(call);
    let result = tokio::select! {
        result = &mut call => result,
        _ = tokio::signal::ctrl_c() => {
            handle.abort();
            call.await
        }
    };
    pb.finish_and_clear();

    match result {
        Ok(analysis) => Ok(Some(analysis)),
        Err(ApiError::Aborted) => {
            println!("{} Analysis cancelled", warning());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_analyze(ctx: &Context, document: i64, files: &[String]) -> anyhow::Result<()> {
    if let Some(analysis) = analyze(ctx, document, files).await? {
        println!("{}", analysis);
    }
    Ok(())
}

pub async fn cmd_report(ctx: &Context, document: i64, options: ReportOptions) -> anyhow::Result<()> {
    let raw = match options.analysis {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?,
        None => match analyze(ctx, document, &options.files).await? {
            Some(raw) => raw,
            None => return Ok(()),
        },
    };

    let pb = spinner("Generating business report...");
    let report = ctx.client.business_report(document, &raw).await;
    pb.finish_and_clear();
    let report = report?;
    println!("{}", report);

    if options.export {
        let title = options
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_REPORT_TITLE);
        let dir = options
            .out_dir
            .unwrap_or_else(|| ctx.settings.export_dir.clone());
        let today = chrono::Local::now().date_naive();
        let path = export_report(&report, title, &dir, title, today)?;
        println!();
        println!(
            "{} Report saved to {}",
            success(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}
