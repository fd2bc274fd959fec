//! # tocmap
//!
//! A live mindmap of a markdown document's heading outline.
//!
//! ## Usage
//!
//! Launch the interactive TUI:
//! ```sh
//! tocmap README.md
//! ```
//!
//! List heading paths:
//! ```sh
//! tocmap --paths README.md
//! ```
//!
//! Show the diagram tree:
//! ```sh
//! tocmap --tree README.md
//! ```

mod cli;

use clap::Parser as ClapParser;
use cli::{Cli, OutputFormat};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use std::sync::Mutex;
use tocmap::host::HostDocument;
use tocmap::nav::current_visible_heading;
use tocmap::{
    Config, DiagramNode, DiagramView, HeadingTransformer, MarkdownFile, MindmapView,
    OptionsPatch, OutlineView, ViewStatus, extract_headings,
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();
    init_logging(&args)?;

    // Priority: CLI args > config file > defaults
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => Config::load(),
    };
    config.apply(&OptionsPatch {
        initial_expand_level: args.expand_level.map(usize::from),
        realtime: args.no_live.then_some(false),
        follow_scroll: args.follow_scroll.then_some(true),
        ..Default::default()
    });

    let host = MarkdownFile::open(&args.file, &config.document)?;
    tracing::info!(file = %args.file.display(), "opened document");

    if args.is_batch() {
        return handle_cli_mode(&args, host, config);
    }

    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let ui = config.ui.clone();
    let outline = OutlineView::new(host, Box::new(HeadingTransformer), config);
    let app = tocmap::App::new(outline, filename, &ui);

    let mut terminal = ratatui::init();
    let result = tocmap::tui::run(&mut terminal, app);
    ratatui::restore();

    result
}

/// Log to `--log-file` if given; otherwise to stderr, but only outside the TUI.
fn init_logging(args: &Cli) -> Result<()> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    if let Some(path) = &args.log_file {
        let file = std::fs::File::create(path)
            .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else if args.is_batch() {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn handle_cli_mode(args: &Cli, mut host: MarkdownFile, config: Config) -> Result<()> {
    if args.paths {
        print_paths(&host, args.output)
    } else if let Some(line) = args.locate {
        host.set_scroll(line.saturating_sub(1));
        print_located(&host, &config, args.output)
    } else {
        let mut outline: OutlineView<_, MindmapView> =
            OutlineView::new(host, Box::new(HeadingTransformer), config);
        outline.show();
        if let ViewStatus::Error(msg) = outline.status() {
            color_eyre::eyre::bail!("failed to build diagram: {msg}");
        }
        match outline.view().and_then(|v| v.data()) {
            Some(root) => print_tree(root, args.output),
            None => {
                eprintln!("No headings found");
                Ok(())
            }
        }
    }
}

fn print_paths(host: &MarkdownFile, format: OutputFormat) -> Result<()> {
    let headings = extract_headings(host);
    match format {
        OutputFormat::Plain => {
            for heading in &headings {
                println!(
                    "{:>5}  {}",
                    heading.element.line + 1,
                    heading.path.replace('\n', " > ")
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&headings)?);
        }
    }
    Ok(())
}

fn print_located(host: &MarkdownFile, config: &Config, format: OutputFormat) -> Result<()> {
    let headings = extract_headings(host);
    let current = current_visible_heading(
        &headings,
        |e| host.heading_offset(e),
        host.viewport(),
        config.navigation.viewport_margin,
    );

    match (current, format) {
        (None, _) => eprintln!("No headings found"),
        (Some(heading), OutputFormat::Plain) => {
            println!(
                "{} (line {})",
                heading.path.replace('\n', " > "),
                heading.element.line + 1
            );
        }
        (Some(heading), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(heading)?);
        }
    }
    Ok(())
}

fn print_tree(root: &DiagramNode, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            if root.content.is_empty() {
                for (i, child) in root.children.iter().enumerate() {
                    let is_last = i == root.children.len() - 1;
                    print!("{}", render_box_tree(child, "", is_last));
                }
            } else {
                print!("{}", render_box_tree(root, "", true));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(root)?);
        }
    }
    Ok(())
}

fn render_box_tree(node: &DiagramNode, prefix: &str, is_last: bool) -> String {
    let connector = if is_last { "└── " } else { "├── " };
    let marker = if node.payload.fold { " [+]" } else { "" };
    let mut out = format!("{}{}{}{}\n", prefix, connector, node.text(), marker);

    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
    for (i, child) in node.children.iter().enumerate() {
        let last = i == node.children.len() - 1;
        out.push_str(&render_box_tree(child, &child_prefix, last));
    }
    out
}
