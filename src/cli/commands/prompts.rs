//! Prompt template commands.

use std::path::PathBuf;

use console::style;

use crate::annotation::ValidationError;
use crate::cli::helpers::{parse_vars, truncate, Context};
use crate::cli::icons::{arrow, success};
use crate::models::{PromptFilter, PromptPayload};

/// Fields given on the command line for `add` and `update`.
pub struct PromptEdit {
    pub name: Option<String>,
    pub template: Option<String>,
    pub file: Option<PathBuf>,
    pub task_type: Option<String>,
    pub model: Option<String>,
    pub description: Option<String>,
}

impl PromptEdit {
    async fn template_text(&self) -> anyhow::Result<Option<String>> {
        match (&self.template, &self.file) {
            (Some(text), _) => Ok(Some(text.clone())),
            (None, Some(path)) => Ok(Some(tokio::fs::read_to_string(path).await.map_err(
                |e| anyhow::anyhow!("failed to read {}: {}", path.display(), e),
            )?)),
            (None, None) => Ok(None),
        }
    }
}

pub async fn cmd_list(
    ctx: &Context,
    task_type: Option<String>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let prompts = ctx
        .client
        .list_prompts(&PromptFilter { task_type, model })
        .await?;
    if prompts.is_empty() {
        println!("No prompt templates found.");
        return Ok(());
    }
    println!(
        "{:<6} {:<24} {:<16} {:<16} {:<4} ACTIVE",
        "ID", "NAME", "TASK", "MODEL", "VER"
    );
    for prompt in prompts {
        println!(
            "{:<6} {:<24} {:<16} {:<16} {:<4} {}",
            prompt.id,
            truncate(&prompt.name, 24),
            truncate(prompt.task_type.as_deref().unwrap_or("-"), 16),
            truncate(prompt.model.as_deref().unwrap_or("-"), 16),
            prompt.version.map(|v| v.to_string()).unwrap_or_default(),
            if prompt.active() {
                style("yes").green()
            } else {
                style("no").dim()
            }
        );
    }
    Ok(())
}

pub async fn cmd_show(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let prompt = ctx.client.get_prompt(id).await?;
    println!("{}", style(&prompt.name).bold());
    if let Some(ref task) = prompt.task_type {
        println!("  {} task: {}", arrow(), task);
    }
    if let Some(ref model) = prompt.model {
        println!("  {} model: {}", arrow(), model);
    }
    if let Some(ref description) = prompt.description {
        println!("  {} {}", arrow(), description);
    }
    println!(
        "  {} {}",
        arrow(),
        if prompt.active() { "active" } else { "inactive" }
    );
    println!();
    println!("{}", prompt.template_text);
    Ok(())
}

/// Create a template (`id = None`) or update one, keeping fields not given.
pub async fn cmd_save(ctx: &Context, id: Option<i64>, edit: PromptEdit) -> anyhow::Result<()> {
    let template_text = edit.template_text().await?;
    let payload = match id {
        Some(id) => {
            let current = ctx.client.get_prompt(id).await?;
            PromptPayload {
                id: Some(id),
                name: edit.name.unwrap_or(current.name),
                task_type: edit.task_type.or(current.task_type),
                model: edit.model.or(current.model),
                template_text: template_text.unwrap_or(current.template_text),
                description: edit.description.or(current.description),
            }
        }
        None => PromptPayload {
            id: None,
            name: edit.name.unwrap_or_default(),
            task_type: edit.task_type,
            model: edit.model,
            template_text: template_text.unwrap_or_default(),
            description: edit.description,
        },
    };
    if payload.name.trim().is_empty() {
        return Err(ValidationError::EmptyField("prompt name").into());
    }
    if payload.template_text.trim().is_empty() {
        return Err(ValidationError::EmptyField("template text").into());
    }

    match id {
        Some(id) => {
            ctx.client.update_prompt(&payload).await?;
            println!("{} Updated prompt {} '{}'", success(), id, payload.name);
        }
        None => {
            ctx.client.create_prompt(&payload).await?;
            println!("{} Created prompt '{}'", success(), payload.name);
        }
    }
    Ok(())
}

pub async fn cmd_delete(ctx: &Context, id: i64) -> anyhow::Result<()> {
    ctx.client.delete_prompt(id).await?;
    println!("{} Deleted prompt {}", success(), id);
    Ok(())
}

pub async fn cmd_set_active(ctx: &Context, id: i64, active: bool) -> anyhow::Result<()> {
    ctx.client.set_prompt_active(id, active).await?;
    println!(
        "{} Prompt {} {}",
        success(),
        id,
        if active { "activated" } else { "deactivated" }
    );
    Ok(())
}

pub async fn cmd_render(ctx: &Context, id: i64, vars: &[String]) -> anyhow::Result<()> {
    let prompt = ctx.client.get_prompt(id).await?;
    let vars = parse_vars(vars)?;
    let pairs: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    println!("{}", prompt.render(&pairs));
    Ok(())
}
