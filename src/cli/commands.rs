use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tocmap")]
#[command(version)]
#[command(about = "A live mindmap of a markdown document's heading outline")]
#[command(
    long_about = "tocmap - Keep a mindmap of a markdown document's headings in sync with the file.\n\n\
    Launch without flags for interactive mode: the document on the left, the mindmap on the\n\
    right, rebuilt as the file is edited on disk. Folds survive edits, Enter jumps between a\n\
    heading and its node. Use flags for CLI mode to inspect the outline.\n\n\
    Examples:\n  \
    tocmap README.md                # Interactive TUI mode\n  \
    tocmap --paths README.md        # List heading paths\n  \
    tocmap --tree -o json doc.md    # Diagram tree as JSON\n  \
    tocmap --locate 120 doc.md      # Heading in view at line 120"
)]
pub struct Cli {
    /// Markdown file to map (.md or .markdown)
    ///
    /// The file is watched for changes while the TUI is open.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// List every heading with its outline path (non-interactive)
    ///
    /// A path is the heading's ancestor chain, joined with " > " in plain
    /// output. Headings sharing a leaf text get distinct paths when their
    /// ancestors differ.
    #[arg(long = "paths")]
    pub paths: bool,

    /// Show the diagram tree built from the headings (non-interactive)
    ///
    /// Renders the tree the mindmap is drawn from, with fold markers applied
    /// by --expand-level.
    #[arg(long = "tree", conflicts_with = "paths")]
    pub tree: bool,

    /// Show the heading in view with the given line at the top (non-interactive)
    ///
    /// Uses the same rule as the interactive fit command: a heading slightly
    /// above the viewport still counts as current.
    ///
    /// Example: --locate 120
    #[arg(long = "locate", value_name = "LINE", conflicts_with_all = ["paths", "tree"])]
    pub locate: Option<usize>,

    /// Output format for --paths, --tree and --locate
    ///
    ///   plain - Human-readable text (default)
    ///   json  - JSON for scripting
    #[arg(short = 'o', long = "output", default_value = "plain")]
    pub output: OutputFormat,

    /// Initial expand level (1-6)
    ///
    /// Diagram nodes deeper than this start folded. Overrides the config file.
    #[arg(short = 'e', long = "expand-level", value_name = "LEVEL",
          value_parser = clap::value_parser!(u8).range(1..=6))]
    pub expand_level: Option<u8>,

    /// Do not rebuild the mindmap when the file changes
    ///
    /// Press 'r' in the TUI to rebuild manually.
    #[arg(long = "no-live")]
    pub no_live: bool,

    /// Focus the current heading's node whenever the document scrolls
    #[arg(long = "follow-scroll")]
    pub follow_scroll: bool,

    /// Load configuration from this file instead of the default location
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file (RUST_LOG controls the level)
    ///
    /// In interactive mode nothing is logged unless this is set.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Whether any non-interactive mode was requested.
    pub fn is_batch(&self) -> bool {
        self.paths || self.tree || self.locate.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// JSON output
    Json,
}
