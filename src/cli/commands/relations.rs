//! Relation commands.

use console::style;

use crate::annotation::ValidationError;
use crate::cli::helpers::{find_label, truncate, Context};
use crate::cli::icons::success;
use crate::models::{RelationLabel, RelationLabelPayload};
use crate::services::RelationSession;

fn resolve_label(labels: &[RelationLabel], key: &str) -> anyhow::Result<i64> {
    Ok(find_label(labels, key, |l| l.id, |l| l.relation_name.as_str())?.id)
}

pub async fn cmd_list(ctx: &Context, document: i64) -> anyhow::Result<()> {
    let session = RelationSession::load(&ctx.client, document).await?;
    let views = session.views();
    if views.is_empty() {
        println!("No relations on document {}.", document);
        return Ok(());
    }
    println!("{}", style(format!("Relations of document {}", document)).bold());
    for view in views {
        println!("{:<6} {}", view.relation.id, view.describe());
    }
    Ok(())
}

pub async fn cmd_add(
    ctx: &Context,
    document: i64,
    label: &str,
    head: i64,
    tail: i64,
) -> anyhow::Result<()> {
    let mut session = RelationSession::load(&ctx.client, document).await?;
    let label_id = resolve_label(session.labels(), label)?;
    session.create(label_id, head, tail).await?;
    println!("{} Linked entity {} to {}", success(), head, tail);
    Ok(())
}

/// Change a relation; unset fields keep their current value.
pub async fn cmd_update(
    ctx: &Context,
    document: i64,
    id: i64,
    label: Option<&str>,
    head: Option<i64>,
    tail: Option<i64>,
) -> anyhow::Result<()> {
    let mut session = RelationSession::load(&ctx.client, document).await?;
    let current = session
        .relations()
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("relation {} is not on document {}", id, document))?;
    let label_id = match label {
        Some(key) => resolve_label(session.labels(), key)?,
        None => current.relation_label_id,
    };
    session
        .update(
            id,
            label_id,
            head.unwrap_or(current.head_entity_id),
            tail.unwrap_or(current.tail_entity_id),
        )
        .await?;
    println!("{} Updated relation {}", success(), id);
    Ok(())
}

pub async fn cmd_delete(ctx: &Context, document: i64, id: i64) -> anyhow::Result<()> {
    let mut session = RelationSession::load(&ctx.client, document).await?;
    session.delete(id).await?;
    println!("{} Deleted relation {}", success(), id);
    Ok(())
}

pub async fn cmd_labels(ctx: &Context) -> anyhow::Result<()> {
    let labels = ctx.client.list_relation_labels().await?;
    if labels.is_empty() {
        println!("No relation labels defined.");
        return Ok(());
    }
    println!("{:<6} {:<20} DESCRIPTION", "ID", "NAME");
    for label in labels {
        println!(
            "{:<6} {:<20} {}",
            label.id,
            truncate(&label.relation_name, 20),
            label.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn cmd_label_save(
    ctx: &Context,
    editing: Option<i64>,
    name: &str,
    description: Option<&str>,
) -> anyhow::Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyField("relation name").into());
    }
    let labels = ctx.client.list_relation_labels().await?;
    let lowered = name.to_lowercase();
    if labels
        .iter()
        .any(|l| Some(l.id) != editing && l.relation_name.trim().to_lowercase() == lowered)
    {
        return Err(ValidationError::DuplicateLabel(name.to_string()).into());
    }

    let payload = RelationLabelPayload {
        id: editing,
        relation_name: name.to_string(),
        description: description.map(str::to_string),
    };
    match editing {
        Some(id) => {
            ctx.client.update_relation_label(&payload).await?;
            println!("{} Updated relation label {} '{}'", success(), id, name);
        }
        None => {
            ctx.client.create_relation_label(&payload).await?;
            println!("{} Created relation label '{}'", success(), name);
        }
    }
    Ok(())
}

pub async fn cmd_label_delete(ctx: &Context, id: i64) -> anyhow::Result<()> {
    ctx.client.delete_relation_label(id).await?;
    println!("{} Deleted relation label {}", success(), id);
    Ok(())
}
