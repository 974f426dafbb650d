//! # Command Dispatch
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Decides exit codes
//! - Installs the tracing subscriber
//!
//! ## Flow of One Invocation
//!
//! 1. Parse arguments, load [`ZenusConfig`] (flags override config).
//! 2. Start a current-thread tokio runtime.
//! 3. Load the space the command needs into a [`Notebook`].
//! 4. Dispatch, producing the text to print.
//! 5. Flush background writes; a failed write makes the run fail.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zenus::config::ZenusConfig;
use zenus::model::{BlockId, FieldUpdate, SaveStatus, Space};
use zenus::notebook::Notebook;
use zenus::refs::resolve::resolve;
use zenus::reorder::DragEnd;
use zenus::store::fs::FsRepository;
use zenus::tags::normalize_tag;

use super::render::{self, Listed, ReferenceRow};
use super::setup::{Cli, Commands, TagAction};

const LOG_ENV: &str = "ZENUS_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(execute(cli, config))
}

fn load_config(cli: &Cli) -> Result<ZenusConfig> {
    let mut config = ZenusConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

fn init_tracing(config: &ZenusConfig) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The space a command reads from.
fn space_for(command: &Commands, archived: bool) -> Space {
    match command {
        Commands::Unarchive { .. } => Space::Archived,
        _ if archived => Space::Archived,
        _ => Space::Active,
    }
}

async fn execute(cli: Cli, config: ZenusConfig) -> Result<()> {
    let data_dir = config.data_dir();
    debug!(data_dir = %data_dir.display(), "opening notebook");
    let repo = Arc::new(FsRepository::new(data_dir));
    let (mut notebook, mut events) = Notebook::new(repo, &config)?;

    let command = cli.command.unwrap_or(Commands::List {
        search: None,
        json: false,
    });
    notebook
        .load(space_for(&command, cli.archived))
        .await
        .context("failed to load blocks")?;

    let output = dispatch(&mut notebook, command).await?;
    notebook.flush().await;
    while let Ok(event) = events.try_recv() {
        debug!(?event, "view event");
    }

    print!("{}", output);
    if notebook.save_status() == SaveStatus::Error {
        bail!("some changes could not be saved (run with {}=warn for details)", LOG_ENV);
    }
    Ok(())
}

/// Resolves a `<block>` argument: a 1-based listing position, or an id.
fn find(notebook: &Notebook, raw: &str) -> Result<BlockId> {
    let visible = notebook.visible(None);
    if let Ok(position) = raw.parse::<usize>() {
        if (1..=visible.len()).contains(&position) {
            return Ok(visible[position - 1].id.clone());
        }
    }
    let id = BlockId::new(raw);
    if notebook.block(&id).is_some() {
        return Ok(id);
    }
    bail!("no block at '{}' in the {} space", raw, notebook.space())
}

fn listed<'a>(notebook: &'a Notebook, id: &BlockId) -> Option<Listed<'a>> {
    let document = notebook.document();
    let position = document.position(id)?;
    Some(Listed {
        position: position + 1,
        block: &document.blocks()[position],
    })
}

fn show(notebook: &Notebook, id: &BlockId) -> String {
    listed(notebook, id)
        .map(|l| render::block(&l))
        .unwrap_or_default()
}

async fn dispatch(notebook: &mut Notebook, command: Commands) -> Result<String> {
    let output = match command {
        Commands::List { search, json } => {
            let blocks = notebook.visible(search.as_deref());
            if json {
                let mut out = serde_json::to_string_pretty(&blocks)?;
                out.push('\n');
                out
            } else {
                let rows: Vec<Listed<'_>> = blocks
                    .into_iter()
                    .enumerate()
                    .map(|(i, block)| Listed {
                        position: i + 1,
                        block,
                    })
                    .collect();
                render::list(notebook.space(), &rows)
            }
        }

        Commands::New {
            title,
            content,
            tags,
        } => {
            for tag in &tags {
                if normalize_tag(tag).is_none() {
                    bail!("invalid tag '{}'", tag.escape_debug());
                }
            }
            let id = notebook.create().id;
            if let Some(title) = title {
                notebook.update_field(&id, FieldUpdate::Title(title));
            }
            if let Some(content) = content {
                notebook.update_field(&id, FieldUpdate::Content(content));
            }
            for tag in tags {
                notebook.update_field(&id, FieldUpdate::AddTag(tag));
            }
            let position = notebook.document().len();
            render::success(&format!("Created block {}", position))
        }

        Commands::Show { block } => {
            let id = find(notebook, &block)?;
            show(notebook, &id)
        }

        Commands::Edit {
            block,
            title,
            content,
        } => {
            if title.is_none() && content.is_none() {
                bail!("nothing to change: pass --title and/or --content");
            }
            let id = find(notebook, &block)?;
            if let Some(title) = title {
                notebook.update_field(&id, FieldUpdate::Title(title));
            }
            if let Some(content) = content {
                notebook.update_field(&id, FieldUpdate::Content(content));
            }
            show(notebook, &id)
        }

        Commands::Tag { block, action } => {
            let id = find(notebook, &block)?;
            let (update, verb) = match action {
                TagAction::Add { tag } => {
                    let Some(tag) = normalize_tag(&tag) else {
                        bail!("invalid tag '{}'", tag.escape_debug());
                    };
                    (FieldUpdate::AddTag(tag), "Tagged")
                }
                TagAction::Remove { tag } => (FieldUpdate::RemoveTag(tag), "Untagged"),
            };
            notebook.update_field(&id, update);
            render::success(&format!("{} block {}", verb, block))
        }

        Commands::Collapse { block } => {
            let id = find(notebook, &block)?;
            notebook.toggle_collapse(&id);
            let collapsed = notebook.block(&id).is_some_and(|b| b.is_collapsed);
            let state = if collapsed { "Collapsed" } else { "Expanded" };
            render::success(&format!("{} block {}", state, block))
        }

        Commands::Delete { block } => {
            let id = find(notebook, &block)?;
            notebook.delete(&id);
            render::success(&format!("Deleted block {}", block))
        }

        Commands::Archive { block } => {
            if notebook.space() != Space::Active {
                bail!("archive works on active blocks; drop --archived");
            }
            let id = find(notebook, &block)?;
            notebook.archive(&id);
            render::success(&format!("Archived block {}", block))
        }

        Commands::Unarchive { block } => {
            let id = find(notebook, &block)?;
            notebook.unarchive(&id);
            render::success(&format!("Restored block {} to the end of the list", block))
        }

        Commands::Move { from, to, search } => {
            if from == 0 || to == 0 {
                bail!("positions start at 1");
            }
            let drag = DragEnd::new(from - 1, to - 1);
            if notebook.reorder(drag, search.as_deref()) {
                let rows: Vec<Listed<'_>> = notebook
                    .visible(search.as_deref())
                    .into_iter()
                    .enumerate()
                    .map(|(i, block)| Listed {
                        position: i + 1,
                        block,
                    })
                    .collect();
                render::list(notebook.space(), &rows)
            } else {
                render::success("Nothing to move.")
            }
        }

        Commands::Refs { block } => {
            let id = find(notebook, &block)?;
            let spans = notebook.references(&id);
            let rows: Vec<ReferenceRow<'_>> = spans
                .iter()
                .map(|span| ReferenceRow {
                    span,
                    target: resolve(notebook.document().blocks(), &span.title)
                        .and_then(|target| listed(notebook, &target.id)),
                })
                .collect();
            render::references(&rows)
        }

        Commands::Open { title } => match notebook.navigate(&title).await {
            Some(target) => show(notebook, &target),
            None => render::not_found(&format!("[[{}]]", title)),
        },
    };
    Ok(output)
}
