use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "zenus",
    bin_name = "zenus",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Block notes with [[references]], from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (overrides config and ZENUS_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Config file to read before the user config
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Operate on archived blocks
    #[arg(short, long, global = true, help_heading = "Options")]
    pub archived: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List blocks
    #[command(alias = "ls", display_order = 1)]
    List {
        /// Only blocks whose title or content contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Print blocks as JSON records
        #[arg(long)]
        json: bool,
    },

    /// Create a new block at the end
    #[command(alias = "n", display_order = 2)]
    New {
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Tag to add (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Show a block in full
    #[command(alias = "v", display_order = 3)]
    Show { block: String },

    /// Change a block's title or content
    #[command(alias = "e", display_order = 4)]
    Edit {
        block: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,
    },

    /// Add or remove a tag
    #[command(display_order = 5)]
    Tag {
        block: String,

        #[command(subcommand)]
        action: TagAction,
    },

    /// Toggle a block's collapsed state
    #[command(display_order = 6)]
    Collapse { block: String },

    /// Permanently delete a block
    #[command(alias = "rm", display_order = 7)]
    Delete { block: String },

    /// Move a block to the archive
    #[command(display_order = 8)]
    Archive { block: String },

    /// Move an archived block back to the end of the active list
    #[command(display_order = 9)]
    Unarchive { block: String },

    /// Move a block to another position (positions as listed)
    #[command(alias = "mv", display_order = 10)]
    Move {
        from: usize,
        to: usize,

        /// Positions refer to this search's listing
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List the [[references]] in a block and where they lead
    #[command(display_order = 11)]
    Refs { block: String },

    /// Jump to the block with this title
    #[command(alias = "o", display_order = 12)]
    Open { title: String },
}

#[derive(Subcommand, Debug)]
pub enum TagAction {
    Add { tag: String },
    Remove { tag: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["zenus", "list", "--archived", "--data", "/tmp/x"]).unwrap();
        assert!(cli.archived);
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Some(Commands::List { json: false, .. })));
    }

    #[test]
    fn parses_repeated_tags() {
        let cli = Cli::try_parse_from(["zenus", "new", "-t", "Plan", "--tag", "a", "--tag", "b"]).unwrap();
        let Some(Commands::New { title, tags, .. }) = cli.command else {
            panic!("expected new");
        };
        assert_eq!(title.as_deref(), Some("Plan"));
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn parses_tag_actions() {
        let cli = Cli::try_parse_from(["zenus", "tag", "2", "remove", "work"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Tag { action: TagAction::Remove { .. }, .. })
        ));
    }

    #[test]
    fn move_requires_two_positions() {
        assert!(Cli::try_parse_from(["zenus", "move", "1"]).is_err());
    }
}
