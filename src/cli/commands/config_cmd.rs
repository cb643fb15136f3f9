//! Configuration inspection commands.

use console::style;

use crate::cli::helpers::Context;
use crate::cli::icons::arrow;
use crate::config::Config;

const MASK: &str = "********";

/// Effective configuration with secrets masked.
fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    if shown.chat.api_key.is_some() {
        shown.chat.api_key = Some(MASK.to_string());
    }
    shown
}

pub fn cmd_config_show(ctx: &Context) -> anyhow::Result<()> {
    match ctx.config.source_path {
        Some(ref path) => println!("# Loaded from {}", path.display()),
        None => println!("# No config file found; showing defaults"),
    }
    let shown = masked(&ctx.config);
    let mut value = toml::Value::try_from(&shown)?;
    // Sections equal to their defaults are skipped when serializing; show them anyway.
    if let toml::Value::Table(ref mut table) = value {
        if !table.contains_key("backend") {
            table.insert("backend".to_string(), toml::Value::try_from(&shown.backend)?);
        }
        if !table.contains_key("chat") {
            table.insert("chat".to_string(), toml::Value::try_from(&shown.chat)?);
        }
    }
    println!("{}", toml::to_string_pretty(&value)?);
    Ok(())
}

pub fn cmd_config_paths(ctx: &Context) -> anyhow::Result<()> {
    let settings = &ctx.settings;
    println!("{}", style("Paths").bold());
    println!("  {} data:    {}", arrow(), settings.data_dir.display());
    println!("  {} store:   {}", arrow(), settings.store_dir.display());
    println!("  {} exports: {}", arrow(), settings.export_dir.display());
    println!("  {} backend: {}", arrow(), ctx.client.base_url());
    Ok(())
}
