//! Knowledge-graph commands.

use console::style;

use crate::api::BackendClient;
use crate::cli::helpers::{parse_vars, truncate, Context};
use crate::cli::icons::{arrow, success, warning};
use crate::models::Properties;
use crate::services::{EdgeDraft, GraphSession, NodeDraft};

async fn open(ctx: &mut Context, document: i64) -> anyhow::Result<GraphSession<'_, BackendClient>> {
    let layouts = ctx.layouts()?;
    Ok(GraphSession::load(&ctx.client, document, layouts).await?)
}

/// `KEY=VALUE` pairs as node properties. Values that parse as JSON keep
/// their type; anything else is a string.
fn properties(pairs: &[String]) -> anyhow::Result<Properties> {
    Ok(parse_vars(pairs)?
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            (key, value)
        })
        .collect())
}

pub async fn cmd_nodes(ctx: &mut Context, document: i64, filter: Option<&str>) -> anyhow::Result<()> {
    let session = open(ctx, document).await?;
    let nodes = session.filter_nodes(filter.unwrap_or(""));
    if nodes.is_empty() {
        println!("No nodes on document {}.", document);
        return Ok(());
    }
    println!("{:<6} {:<24} {:<8} {:<8} PROPERTIES", "ID", "NAME", "ENTITY", "LABEL");
    for node in nodes {
        let opt = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        let props = node
            .properties
            .as_ref()
            .filter(|p| !p.is_empty())
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_default();
        println!(
            "{:<6} {:<24} {:<8} {:<8} {}",
            node.id,
            truncate(&node.name, 24),
            opt(node.entity_id),
            opt(node.label_id),
            truncate(&props, 40)
        );
    }
    Ok(())
}

pub async fn cmd_edges(ctx: &mut Context, document: i64) -> anyhow::Result<()> {
    let session = open(ctx, document).await?;
    if session.edges().is_empty() {
        println!("No edges on document {}.", document);
        return Ok(());
    }
    let name = |id: i64| {
        session
            .node(id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    };
    for edge in session.edges() {
        println!(
            "{:<6} {} --{}--> {}",
            edge.id,
            name(edge.source_node_id),
            edge.edge_name.as_deref().unwrap_or(""),
            name(edge.target_node_id)
        );
    }
    Ok(())
}

pub async fn cmd_add_node(
    ctx: &mut Context,
    document: i64,
    name: Option<String>,
    entity: Option<i64>,
    label: Option<i64>,
    props: &[String],
) -> anyhow::Result<()> {
    let mut draft = match entity {
        Some(entity_id) => {
            let entity = ctx.client.get_entity_item(entity_id).await?;
            if entity.document_id != document {
                anyhow::bail!("entity {} is not on document {}", entity_id, document);
            }
            NodeDraft::from_entity(&entity)
        }
        None => NodeDraft::default(),
    };
    if let Some(name) = name {
        draft.name = name;
    }
    draft.label_id = label;
    draft.properties = properties(props)?;

    let display = draft.name.trim().to_string();
    let mut session = open(ctx, document).await?;
    session.save_node(draft).await?;
    println!("{} Created node '{}'", success(), display);
    Ok(())
}

pub async fn cmd_update_node(
    ctx: &mut Context,
    document: i64,
    id: i64,
    name: Option<String>,
    label: Option<i64>,
    props: &[String],
) -> anyhow::Result<()> {
    let mut session = open(ctx, document).await?;
    let node = session
        .node(id)
        .ok_or_else(|| anyhow::anyhow!("node {} is not on document {}", id, document))?;
    let mut draft = NodeDraft::from_node(node);
    if let Some(name) = name {
        draft.name = name;
    }
    if label.is_some() {
        draft.label_id = label;
    }
    draft.properties.extend(properties(props)?);

    session.save_node(draft).await?;
    println!("{} Updated node {}", success(), id);
    Ok(())
}

pub async fn cmd_delete_node(ctx: &mut Context, document: i64, id: i64) -> anyhow::Result<()> {
    let mut session = open(ctx, document).await?;
    session.delete_node(id).await?;
    println!("{} Deleted node {} and its edges", success(), id);
    Ok(())
}

pub async fn cmd_add_edge(
    ctx: &mut Context,
    document: i64,
    source: i64,
    target: i64,
    label: Option<i64>,
    name: Option<String>,
) -> anyhow::Result<()> {
    let mut session = open(ctx, document).await?;
    session
        .save_edge(EdgeDraft {
            source_node_id: source,
            target_node_id: target,
            relation_label_id: label,
            edge_name: name,
            ..EdgeDraft::default()
        })
        .await?;
    println!("{} Connected node {} to {}", success(), source, target);
    Ok(())
}

pub async fn cmd_delete_edge(ctx: &mut Context, document: i64, id: i64) -> anyhow::Result<()> {
    let mut session = open(ctx, document).await?;
    session.delete_edge(id).await?;
    println!("{} Deleted edge {}", success(), id);
    Ok(())
}

pub async fn cmd_pin(ctx: &mut Context, document: i64, node: i64, x: f64, y: f64) -> anyhow::Result<()> {
    let session = open(ctx, document).await?;
    if session.node(node).is_none() {
        anyhow::bail!("node {} is not on document {}", node, document);
    }
    session.pin_node(node, x, y)?;
    println!("{} Pinned node {} at ({}, {})", success(), node, x, y);
    Ok(())
}

pub async fn cmd_layout(
    ctx: &mut Context,
    document: i64,
    reset: bool,
    prune: bool,
) -> anyhow::Result<()> {
    let session = open(ctx, document).await?;
    if reset {
        session.reset_layout()?;
        println!("{} Layout of document {} reset", success(), document);
        return Ok(());
    }
    if prune {
        let removed = session.prune_layout()?;
        println!("{} Removed {} stale positions", success(), removed);
        return Ok(());
    }

    let layout = session.layout()?;
    if layout.is_empty() {
        println!("No saved positions for document {}.", document);
        return Ok(());
    }
    println!("{}", style(format!("Layout of document {}", document)).bold());
    for (node_id, position) in &layout {
        let name = node_id
            .parse::<i64>()
            .ok()
            .and_then(|id| session.node(id))
            .map(|n| n.name.as_str());
        match (position.fx, position.fy, name) {
            (Some(x), Some(y), Some(name)) => {
                println!("  {} {} ({}) at ({:.1}, {:.1})", arrow(), node_id, name, x, y)
            }
            (Some(x), Some(y), None) => println!(
                "  {} {} at ({:.1}, {:.1}) {}",
                warning(),
                node_id,
                x,
                y,
                style("(node deleted)").dim()
            ),
            _ => println!("  {} {} (free)", arrow(), node_id),
        }
    }
    Ok(())
}

pub async fn cmd_dump(ctx: &Context, document: i64) -> anyhow::Result<()> {
    let graph = ctx.client.full_graph(document).await?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
