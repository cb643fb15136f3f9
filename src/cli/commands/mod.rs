//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod ai;
mod chat;
mod config_cmd;
mod documents;
mod entities;
mod graph;
mod prompts;
mod relations;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::helpers::Context;
use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "annobench")]
#[command(about = "Entity and relation annotation workbench")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for the local store (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Backend API base URL, including the /api prefix
    #[arg(long, global = true, env = "ANNOBENCH_BACKEND_URL")]
    backend: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// List, search, create and import documents
    #[command(alias = "doc")]
    Documents {
        #[command(subcommand)]
        command: DocumentCommands,
    },

    /// Annotate entities on a document
    #[command(alias = "ent")]
    Entities {
        #[command(subcommand)]
        command: EntityCommands,
    },

    /// Link annotated entities with labelled relations
    #[command(alias = "rel")]
    Relations {
        #[command(subcommand)]
        command: RelationCommands,
    },

    /// Edit a document's knowledge graph
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },

    /// AI-assisted extraction and analysis
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },

    /// Talk to the chat assistant
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum DocumentCommands {
    /// List documents with entity and relation counts
    #[command(alias = "ls")]
    List {
        /// Only titles containing this text (case-insensitive)
        #[arg(short, long, default_value = "")]
        query: String,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Show a document's content
    Show {
        id: i64,
        /// Print the token list instead of the text
        #[arg(long)]
        tokens: bool,
    },
    /// Create a document from text
    Add {
        /// Document title
        title: String,
        /// Document content
        content: String,
    },
    /// Create a document from a .txt, .docx or .pdf file
    Import {
        /// File to import
        path: PathBuf,
        /// Title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Change a document's title or content
    Update {
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a document
    #[command(alias = "rm")]
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum EntityCommands {
    /// List a document's annotated entities
    #[command(alias = "ls")]
    List { document: i64 },
    /// Print a document with entities highlighted
    View {
        document: i64,
        /// Also print a legend of labels
        #[arg(long)]
        legend: bool,
    },
    /// Annotate text, a selection or a token range
    Annotate {
        document: i64,
        /// Label id or name
        #[arg(short, long)]
        label: String,
        /// Annotate every occurrence of this text
        #[arg(long, conflicts_with_all = ["select", "chars", "range"])]
        text: Option<String>,
        /// Select one occurrence of this text (see --nth)
        #[arg(long, conflicts_with_all = ["chars", "range"])]
        select: Option<String>,
        /// Which occurrence --select picks (0-based)
        #[arg(long, default_value = "0")]
        nth: usize,
        /// Select characters FROM:TO of the document text (TO exclusive)
        #[arg(long, conflicts_with = "range")]
        chars: Option<String>,
        /// Token range as START:END (inclusive)
        #[arg(long)]
        range: Option<String>,
    },
    /// Change an entity's label or range
    Update {
        document: i64,
        id: i64,
        /// Label id or name
        #[arg(short, long)]
        label: Option<String>,
        /// Token range as START:END (inclusive)
        #[arg(long)]
        range: Option<String>,
    },
    /// Delete an entity
    #[command(alias = "rm")]
    Delete { document: i64, id: i64 },
    /// Manage entity labels
    Labels {
        #[command(subcommand)]
        command: LabelCommands,
    },
}

#[derive(Subcommand)]
enum LabelCommands {
    /// List labels
    #[command(alias = "ls")]
    List,
    /// Create a label
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Rename a label or change its description
    Update {
        id: i64,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a label
    #[command(alias = "rm")]
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum RelationCommands {
    /// List a document's relations
    #[command(alias = "ls")]
    List { document: i64 },
    /// Relate two entities
    Add {
        document: i64,
        /// Relation label id or name
        #[arg(short, long)]
        label: String,
        /// Head entity id
        #[arg(long)]
        head: i64,
        /// Tail entity id
        #[arg(long)]
        tail: i64,
    },
    /// Change a relation
    Update {
        document: i64,
        id: i64,
        #[arg(short, long)]
        label: Option<String>,
        #[arg(long)]
        head: Option<i64>,
        #[arg(long)]
        tail: Option<i64>,
    },
    /// Delete a relation
    #[command(alias = "rm")]
    Delete { document: i64, id: i64 },
    /// Manage relation labels
    Labels {
        #[command(subcommand)]
        command: LabelCommands,
    },
}

#[derive(Subcommand)]
enum GraphCommands {
    /// List nodes
    Nodes {
        document: i64,
        /// Only names containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// List edges
    Edges { document: i64 },
    /// Create a node, optionally bound to an entity
    AddNode {
        document: i64,
        /// Node name (defaults to the bound entity's text)
        name: Option<String>,
        /// Bind to this entity
        #[arg(long)]
        entity: Option<i64>,
        /// Entity label id
        #[arg(long)]
        label: Option<i64>,
        /// Property as KEY=VALUE (repeatable)
        #[arg(short, long = "prop")]
        props: Vec<String>,
    },
    /// Change a node
    UpdateNode {
        document: i64,
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        label: Option<i64>,
        #[arg(short, long = "prop")]
        props: Vec<String>,
    },
    /// Delete a node and its edges
    RmNode { document: i64, id: i64 },
    /// Connect two nodes
    AddEdge {
        document: i64,
        source: i64,
        target: i64,
        /// Relation label id
        #[arg(long)]
        label: Option<i64>,
        /// Edge name
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete an edge
    RmEdge { document: i64, id: i64 },
    /// Fix a node's position in the saved layout
    Pin {
        document: i64,
        node: i64,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Show or maintain the saved layout
    Layout {
        document: i64,
        /// Forget all saved positions
        #[arg(long, conflicts_with = "prune")]
        reset: bool,
        /// Drop positions of deleted nodes
        #[arg(long)]
        prune: bool,
    },
    /// Print the full graph as JSON
    Dump { document: i64 },
}

#[derive(Subcommand)]
enum PromptCommands {
    /// List templates
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        task_type: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Show a template
    Show { id: i64 },
    /// Create a template
    Add {
        name: String,
        /// Template text with {placeholders}
        #[arg(long, conflicts_with = "file")]
        template: Option<String>,
        /// Read the template text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        task_type: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change a template
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "file")]
        template: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        task_type: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a template
    #[command(alias = "rm")]
    Delete { id: i64 },
    /// Mark a template active
    Activate { id: i64 },
    /// Mark a template inactive
    Deactivate { id: i64 },
    /// Fill a template's placeholders and print it
    Render {
        id: i64,
        /// Values as KEY=VALUE
        vars: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Run automatic entity extraction
    Extract { document: i64 },
    /// List CSV files available for analysis
    CsvFiles,
    /// Analyse a document against CSV files (Ctrl-C cancels)
    Analyze {
        document: i64,
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Generate a business report
    Report {
        document: i64,
        /// CSV files to analyse first
        #[arg(long = "csv", required_unless_present = "analysis")]
        files: Vec<String>,
        /// Use a saved raw analysis instead of analysing
        #[arg(long)]
        analysis: Option<PathBuf>,
        /// Save the report as .docx
        #[arg(long)]
        export: bool,
        /// Report title
        #[arg(long)]
        title: Option<String>,
        /// Output directory for --export
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ChatCommands {
    /// Send a message in the active conversation
    Send {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// List conversations
    #[command(alias = "ls")]
    List,
    /// Start a new conversation
    New,
    /// Switch the active conversation
    Use { id: String },
    /// Print a conversation
    History {
        /// Conversation id (defaults to the active one)
        id: Option<String>,
    },
    /// Clear the active conversation
    Clear,
    /// Delete a conversation
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show resolved paths
    Paths,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
        backend_url: cli.backend,
    };
    let (settings, config) = load_settings(options).await?;
    let mut ctx = Context::new(settings, config)?;

    match cli.command {
        Commands::Documents { command } => match command {
            DocumentCommands::List { query, page } => {
                documents::cmd_list(&ctx, &query, page).await
            }
            DocumentCommands::Show { id, tokens } => documents::cmd_show(&ctx, id, tokens).await,
            DocumentCommands::Add { title, content } => {
                documents::cmd_add(&ctx, &title, &content).await
            }
            DocumentCommands::Import { path, title } => {
                documents::cmd_import(&ctx, &path, title.as_deref()).await
            }
            DocumentCommands::Update { id, title, content } => {
                documents::cmd_update(&ctx, id, title.as_deref(), content.as_deref()).await
            }
            DocumentCommands::Delete { id } => documents::cmd_delete(&ctx, id).await,
        },
        Commands::Entities { command } => match command {
            EntityCommands::List { document } => entities::cmd_list(&ctx, document).await,
            EntityCommands::View { document, legend } => {
                entities::cmd_view(&ctx, document, legend).await
            }
            EntityCommands::Annotate {
                document,
                label,
                text,
                select,
                nth,
                chars,
                range,
            } => {
                let target = match (text, select, chars, range) {
                    (Some(text), _, _, _) => entities::Target::Text(text),
                    (_, Some(needle), _, _) => entities::Target::Select { needle, nth },
                    (_, _, Some(chars), _) => entities::Target::Chars(chars),
                    (_, _, _, Some(range)) => entities::Target::Range(range),
                    _ => anyhow::bail!("give one of --text, --select, --chars or --range"),
                };
                entities::cmd_annotate(&ctx, document, &label, target).await
            }
            EntityCommands::Update {
                document,
                id,
                label,
                range,
            } => {
                entities::cmd_update(&ctx, document, id, label.as_deref(), range.as_deref()).await
            }
            EntityCommands::Delete { document, id } => {
                entities::cmd_delete(&ctx, document, id).await
            }
            EntityCommands::Labels { command } => match command {
                LabelCommands::List => entities::cmd_labels(&ctx).await,
                LabelCommands::Add { name, description } => {
                    entities::cmd_label_save(&ctx, None, &name, description.as_deref()).await
                }
                LabelCommands::Update {
                    id,
                    name,
                    description,
                } => entities::cmd_label_save(&ctx, Some(id), &name, description.as_deref()).await,
                LabelCommands::Delete { id } => entities::cmd_label_delete(&ctx, id).await,
            },
        },
        Commands::Relations { command } => match command {
            RelationCommands::List { document } => relations::cmd_list(&ctx, document).await,
            RelationCommands::Add {
                document,
                label,
                head,
                tail,
            } => relations::cmd_add(&ctx, document, &label, head, tail).await,
            RelationCommands::Update {
                document,
                id,
                label,
                head,
                tail,
            } => relations::cmd_update(&ctx, document, id, label.as_deref(), head, tail).await,
            RelationCommands::Delete { document, id } => {
                relations::cmd_delete(&ctx, document, id).await
            }
            RelationCommands::Labels { command } => match command {
                LabelCommands::List => relations::cmd_labels(&ctx).await,
                LabelCommands::Add { name, description } => {
                    relations::cmd_label_save(&ctx, None, &name, description.as_deref()).await
                }
                LabelCommands::Update {
                    id,
                    name,
                    description,
                } => {
                    relations::cmd_label_save(&ctx, Some(id), &name, description.as_deref())
                        .await
                }
                LabelCommands::Delete { id } => relations::cmd_label_delete(&ctx, id).await,
            },
        },
        Commands::Graph { command } => match command {
            GraphCommands::Nodes { document, filter } => {
                graph::cmd_nodes(&mut ctx, document, filter.as_deref()).await
            }
            GraphCommands::Edges { document } => graph::cmd_edges(&mut ctx, document).await,
            GraphCommands::AddNode {
                document,
                name,
                entity,
                label,
                props,
            } => graph::cmd_add_node(&mut ctx, document, name, entity, label, &props).await,
            GraphCommands::UpdateNode {
                document,
                id,
                name,
                label,
                props,
            } => graph::cmd_update_node(&mut ctx, document, id, name, label, &props).await,
            GraphCommands::RmNode { document, id } => {
                graph::cmd_delete_node(&mut ctx, document, id).await
            }
            GraphCommands::AddEdge {
                document,
                source,
                target,
                label,
                name,
            } => graph::cmd_add_edge(&mut ctx, document, source, target, label, name).await,
            GraphCommands::RmEdge { document, id } => {
                graph::cmd_delete_edge(&mut ctx, document, id).await
            }
            GraphCommands::Pin { document, node, x, y } => {
                graph::cmd_pin(&mut ctx, document, node, x, y).await
            }
            GraphCommands::Layout {
                document,
                reset,
                prune,
            } => graph::cmd_layout(&mut ctx, document, reset, prune).await,
            GraphCommands::Dump { document } => graph::cmd_dump(&ctx, document).await,
        },
        Commands::Prompts { command } => match command {
            PromptCommands::List { task_type, model } => {
                prompts::cmd_list(&ctx, task_type, model).await
            }
            PromptCommands::Show { id } => prompts::cmd_show(&ctx, id).await,
            PromptCommands::Add {
                name,
                template,
                file,
                task_type,
                model,
                description,
            } => {
                let edit = prompts::PromptEdit {
                    name: Some(name),
                    template,
                    file,
                    task_type,
                    model,
                    description,
                };
                prompts::cmd_save(&ctx, None, edit).await
            }
            PromptCommands::Update {
                id,
                name,
                template,
                file,
                task_type,
                model,
                description,
            } => {
                let edit = prompts::PromptEdit {
                    name,
                    template,
                    file,
                    task_type,
                    model,
                    description,
                };
                prompts::cmd_save(&ctx, Some(id), edit).await
            }
            PromptCommands::Delete { id } => prompts::cmd_delete(&ctx, id).await,
            PromptCommands::Activate { id } => prompts::cmd_set_active(&ctx, id, true).await,
            PromptCommands::Deactivate { id } => prompts::cmd_set_active(&ctx, id, false).await,
            PromptCommands::Render { id, vars } => prompts::cmd_render(&ctx, id, &vars).await,
        },
        Commands::Ai { command } => match command {
            AiCommands::Extract { document } => ai::cmd_extract(&ctx, document).await,
            AiCommands::CsvFiles => ai::cmd_csv_files(&ctx).await,
            AiCommands::Analyze { document, files } => {
                ai::cmd_analyze(&ctx, document, &files).await
            }
            AiCommands::Report {
                document,
                files,
                analysis,
                export,
                title,
                out_dir,
            } => {
                let options = ai::ReportOptions {
                    files,
                    analysis,
                    export,
                    title,
                    out_dir,
                };
                ai::cmd_report(&ctx, document, options).await
            }
        },
        Commands::Chat { command } => match command {
            ChatCommands::Send { message } => chat::cmd_send(&mut ctx, &message.join(" ")).await,
            ChatCommands::List => chat::cmd_list(&mut ctx),
            ChatCommands::New => chat::cmd_new(&mut ctx),
            ChatCommands::Use { id } => chat::cmd_use(&mut ctx, &id),
            ChatCommands::History { id } => chat::cmd_history(&mut ctx, id.as_deref()),
            ChatCommands::Clear => chat::cmd_clear(&mut ctx),
            ChatCommands::Delete { id } => chat::cmd_delete(&mut ctx, &id),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&ctx),
            ConfigCommands::Paths => config_cmd::cmd_config_paths(&ctx),
        },
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_annotate_arguments_are_exclusive() {
        let parsed = Cli::try_parse_from([
            "annobench", "entities", "annotate", "3", "--label", "PER", "--text", "Paris",
            "--range", "0:1",
        ]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from([
            "annobench", "entities", "annotate", "3", "-l", "PER", "--select", "Paris", "--nth",
            "1",
        ]);
        assert!(parsed.is_ok());

        let parsed = Cli::try_parse_from([
            "annobench", "entities", "annotate", "3", "-l", "ORG", "--chars", "0:13",
        ]);
        assert!(parsed.is_ok());

        let parsed = Cli::try_parse_from([
            "annobench", "entities", "annotate", "3", "-l", "ORG", "--chars", "0:13",
            "--select", "Bank",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_report_needs_csv_or_analysis() {
        assert!(Cli::try_parse_from(["annobench", "ai", "report", "3"]).is_err());
        assert!(
            Cli::try_parse_from(["annobench", "ai", "report", "3", "--csv", "sales.csv"]).is_ok()
        );
    }
}
