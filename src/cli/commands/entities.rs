//! Entity annotation commands.

use console::style;

use crate::annotation::{check_label_name, Annotated, MatchOutcome, Selection};
use crate::cli::helpers::{find_label, parse_chars, parse_range, truncate, Context};
use crate::cli::icons::{arrow, success, warning};
use crate::models::{EntityLabel, EntityLabelPayload};
use crate::services::AnnotationSession;

/// What `annotate` should mark.
pub enum Target {
    /// Every occurrence of a text
    Text(String),
    /// One occurrence of a text, as if selected by hand
    Select { needle: String, nth: usize },
    /// Characters `FROM:TO` of the document text
    Chars(String),
    /// An explicit `START:END` token range
    Range(String),
}

fn resolve_label(labels: &[EntityLabel], key: &str) -> anyhow::Result<i64> {
    Ok(find_label(labels, key, |l| l.id, |l| l.label_name.as_str())?.id)
}

/// List a document's entities grouped by label.
pub async fn cmd_list(ctx: &Context, document: i64) -> anyhow::Result<()> {
    let session = AnnotationSession::load(&ctx.client, document).await?;
    let entities = session.sorted_entities();
    if entities.is_empty() {
        println!("No entities annotated on document {}.", document);
        return Ok(());
    }

    println!("{}", style(format!("Entities of document {}", document)).bold());
    println!("{}", "-".repeat(60));
    println!("{:<6} {:<14} {:<10} TEXT", "ID", "LABEL", "TOKENS");
    for entity in entities {
        let label = session
            .label(entity.label_id)
            .map(|l| l.label_name.clone())
            .unwrap_or_else(|| format!("#{}", entity.label_id));
        println!(
            "{:<6} {:<14} {:<10} {}",
            entity.id,
            truncate(&label, 14),
            format!("[{},{}]", entity.token_start, entity.token_end),
            truncate(&entity.text, 40)
        );
    }
    Ok(())
}

/// Print the document text with each entity highlighted in its color.
pub async fn cmd_view(ctx: &Context, document: i64, legend: bool) -> anyhow::Result<()> {
    let session = AnnotationSession::load(&ctx.client, document).await?;
    let palette = ctx.config.annotation.palette();

    let mut out = String::new();
    for run in session.painted(palette.size()) {
        match run.color {
            Some(index) => out.push_str(
                &style(&run.text)
                    .black()
                    .on_color256(palette.ansi256(index))
                    .to_string(),
            ),
            None => out.push_str(&run.text),
        }
    }
    println!("{}", out);

    if legend {
        let colors = session.colors(palette.size());
        println!();
        for entity in session.sorted_entities() {
            let swatch = match colors.get(entity) {
                Some(index) => style("  ").on_color256(palette.ansi256(index)).to_string(),
                None => "  ".to_string(),
            };
            let label = session
                .label(entity.label_id)
                .map(|l| l.label_name.as_str())
                .unwrap_or("?");
            println!("{} #{} {} ({})", swatch, entity.id, entity.text, label);
        }
    }
    Ok(())
}

pub async fn cmd_annotate(
    ctx: &Context,
    document: i64,
    label: &str,
    target: Target,
) -> anyhow::Result<()> {
    let mut session = AnnotationSession::load(&ctx.client, document).await?;
    let label_id = resolve_label(session.labels(), label)?;

    match target {
        Target::Text(text) => {
            let report = session.annotate_text(label_id, &text).await?;
            match report.outcome {
                MatchOutcome::NoOccurrences => {
                    println!("{} '{}' does not occur in document {}", warning(), text, document)
                }
                MatchOutcome::AllExisting => println!(
                    "{} All {} occurrences of '{}' are already annotated",
                    warning(),
                    report.matched,
                    text
                ),
                MatchOutcome::New(_) => {
                    println!(
                        "{} Annotated {} of {} occurrences of '{}'",
                        success(),
                        report.created.len(),
                        report.matched,
                        text
                    );
                    for range in &report.created {
                        println!("  {} {}", arrow(), range);
                    }
                }
            }
        }
        Target::Select { needle, nth } => {
            let selection = Selection::nth_occurrence(session.text(), &needle, nth)
                .ok_or_else(|| {
                    anyhow::anyhow!("occurrence {} of '{}' not found in the text", nth, needle)
                })?;
            let range = session.annotate_selection(label_id, &selection).await?;
            println!("{} Annotated '{}' at {}", success(), needle, range);
        }
        Target::Chars(raw) => {
            let (from, to) = parse_chars(&raw)?;
            let selection = Selection::within(session.text(), from, to);
            let range = session.annotate_selection(label_id, &selection).await?;
            println!(
                "{} Annotated '{}' at {}",
                success(),
                selection.text.trim(),
                range
            );
        }
        Target::Range(raw) => {
            let range = parse_range(&raw)?;
            let text = session.range_text(range).ok_or_else(|| {
                anyhow::anyhow!(
                    "token range {} is outside the document ({} tokens)",
                    range,
                    session.tokens().len()
                )
            })?;
            session.create_range(label_id, range, &text).await?;
            println!("{} Annotated '{}' at {}", success(), text, range);
        }
    }
    Ok(())
}

pub async fn cmd_update(
    ctx: &Context,
    document: i64,
    id: i64,
    label: Option<&str>,
    range: Option<&str>,
) -> anyhow::Result<()> {
    let mut session = AnnotationSession::load(&ctx.client, document).await?;
    let entity = session
        .entity(id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("entity {} is not on document {}", id, document))?;

    let label_id = match label {
        Some(key) => resolve_label(session.labels(), key)?,
        None => entity.label_id,
    };
    let (range, text) = match range {
        Some(raw) => {
            let range = parse_range(raw)?;
            let text = session.range_text(range).unwrap_or_default();
            (range, text)
        }
        None => (entity.range(), entity.text.clone()),
    };

    session.update_entity(id, label_id, range, &text).await?;
    println!("{} Updated entity {}: '{}' at {}", success(), id, text, range);
    Ok(())
}

pub async fn cmd_delete(ctx: &Context, document: i64, id: i64) -> anyhow::Result<()> {
    let mut session = AnnotationSession::load(&ctx.client, document).await?;
    session.delete_entity(id).await?;
    println!("{} Deleted entity {}", success(), id);
    Ok(())
}

pub async fn cmd_labels(ctx: &Context) -> anyhow::Result<()> {
    let labels = ctx.client.list_entity_labels().await?;
    if labels.is_empty() {
        println!("No entity labels defined.");
        return Ok(());
    }
    println!("{:<6} {:<20} DESCRIPTION", "ID", "NAME");
    for label in labels {
        println!(
            "{:<6} {:<20} {}",
            label.id,
            truncate(&label.label_name, 20),
            label.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Create a label, or rename one when `editing` is set.
pub async fn cmd_label_save(
    ctx: &Context,
    editing: Option<i64>,
    name: &str,
    description: Option<&str>,
) -> anyhow::Result<()> {
    let labels = ctx.client.list_entity_labels().await?;
    if let Some(id) = editing {
        if !labels.iter().any(|l| l.id == id) {
            anyhow::bail!("no entity label with id {}", id);
        }
    }
    let label_name = check_label_name(&labels, name, editing)?;
    let payload = EntityLabelPayload {
        label_name,
        description: description.map(str::to_string),
    };
    let saved = match editing {
        Some(id) => ctx.client.put_entity_label(id, &payload).await?,
        None => ctx.client.post_entity_label(&payload).await?,
    };
    println!(
        "{} {} label {} '{}'",
        success(),
        if editing.is_some() { "Updated" } else { "Created" },
        saved.id,
        saved.label_name
    );
    Ok(())
}

pub async fn cmd_label_delete(ctx: &Context, id: i64) -> anyhow::Result<()> {
    ctx.client.remove_entity_label(id).await?;
    println!("{} Deleted label {}", success(), id);
    Ok(())
}
