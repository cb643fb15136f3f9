//! Chat assistant commands.

use std::io::Write;

use chrono::{DateTime, Local};
use console::style;
use tokio::sync::mpsc;

use crate::cli::helpers::{truncate, Context};
use crate::cli::icons::success;
use crate::models::{Conversation, Role};
use crate::services::{ChatEvent, ChatService};

fn open(ctx: &mut Context) -> anyhow::Result<ChatService> {
    let store = ctx.store()?;
    Ok(ChatService::open(store, ctx.config.chat.clone())?)
}

fn when(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Send a message and print the reply as it streams in.
pub async fn cmd_send(ctx: &mut Context, message: &str) -> anyhow::Result<()> {
    let mut chat = open(ctx)?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let printer = async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Delta(text) => {
                    print!("{}", text);
                    let _ = stdout.flush();
                }
                // A failure is reported through the returned error.
                ChatEvent::Finished { .. } | ChatEvent::Failed { .. } => println!(),
            }
        }
    };

    let (result, ()) = tokio::join!(chat.send(message, Some(tx)), printer);
    result?;
    Ok(())
}

pub fn cmd_list(ctx: &mut Context) -> anyhow::Result<()> {
    let chat = open(ctx)?;
    for conversation in chat.conversations() {
        let marker = if conversation.id == chat.active_id() {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:<15} {:<26} {:>4} msgs  {}",
            marker,
            conversation.id,
            truncate(&conversation.title, 26),
            conversation.messages.len(),
            style(when(conversation.updated_at)).dim()
        );
    }
    Ok(())
}

pub fn cmd_new(ctx: &mut Context) -> anyhow::Result<()> {
    let mut chat = open(ctx)?;
    let id = chat.new_conversation()?;
    println!("{} Started conversation {}", success(), id);
    Ok(())
}

pub fn cmd_use(ctx: &mut Context, id: &str) -> anyhow::Result<()> {
    let mut chat = open(ctx)?;
    if !chat.select(id)? {
        anyhow::bail!("no conversation with id {}", id);
    }
    println!("{} Switched to conversation {}", success(), id);
    Ok(())
}

fn print_conversation(conversation: &Conversation) {
    println!("{}", style(&conversation.title).bold());
    for message in &conversation.messages {
        let who = match message.role {
            Role::User => style("you").cyan(),
            Role::Assistant => style("assistant").green(),
            Role::System => style("system").dim(),
        };
        let body = if message.error {
            style(message.content.as_str()).red().to_string()
        } else {
            message.content.clone()
        };
        println!();
        println!("{} {}", who, style(message.ts.with_timezone(&Local).format("%H:%M")).dim());
        println!("{}", body);
    }
}

pub fn cmd_history(ctx: &mut Context, id: Option<&str>) -> anyhow::Result<()> {
    let chat = open(ctx)?;
    let conversation = match id {
        Some(id) => chat.conversations().iter().find(|c| c.id == id),
        None => chat.active(),
    }
    .ok_or_else(|| anyhow::anyhow!("no conversation with id {}", id.unwrap_or("?")))?;
    print_conversation(conversation);
    Ok(())
}

pub fn cmd_clear(ctx: &mut Context) -> anyhow::Result<()> {
    let mut chat = open(ctx)?;
    chat.clear()?;
    println!("{} Cleared conversation {}", success(), chat.active_id());
    Ok(())
}

pub fn cmd_delete(ctx: &mut Context, id: &str) -> anyhow::Result<()> {
    let mut chat = open(ctx)?;
    if !chat.conversations().iter().any(|c| c.id == id) {
        anyhow::bail!("no conversation with id {}", id);
    }
    chat.delete(id)?;
    println!(
        "{} Deleted conversation {}; active is now {}",
        success(),
        id,
        chat.active_id()
    );
    Ok(())
}
