//! # tocmap
//!
//! A live mindmap of a markdown document's heading outline.
//!
//! Every heading is identified by its path, the newline-joined text of its
//! ancestor chain. The same path is computed for every node of the diagram,
//! which makes it possible to keep the two in sync: folds survive rebuilds,
//! clicking a node scrolls to its heading, and the heading in view can be
//! located in the diagram.
//!
//! ## Example
//!
//! ```rust
//! use tocmap::{Config, HeadingTransformer, MarkdownFile, MindmapView, OutlineView};
//!
//! let markdown = "# Guide\n## Setup\n## Usage\n";
//! let config = Config::default();
//! let host = MarkdownFile::from_content(markdown, &config.document);
//!
//! let mut outline: OutlineView<_, MindmapView> =
//!     OutlineView::new(host, Box::new(HeadingTransformer), config);
//! outline.show();
//!
//! for heading in outline.headings() {
//!     println!("{}", heading.path.replace('\n', " > "));
//! }
//! outline.navigate_to_heading("Guide\nUsage");
//! ```

/// Configuration module for persisting user preferences.
///
/// Covers diagram layout, change detection, navigation timing and highlight
/// colors, plus partial overrides applied at runtime.
pub mod config;

/// Error types shared by the library.
pub mod error;

/// Parser module for markdown headings.
pub mod parser;

/// Host document accessor: heading elements, viewport, styling and change
/// notification.
pub mod host;

/// Heading extraction and path identity.
pub mod outline;

/// Diagram tree, transform and the laid-out mindmap view.
pub mod diagram;

/// Rebuild pipeline, path index, fold preservation and change detection.
pub mod sync;

/// Navigation between headings and diagram nodes.
pub mod nav;

/// TUI module for the interactive terminal interface.
pub mod tui;

// Re-export commonly used types for convenience
pub use config::{Config, OptionsPatch};
pub use diagram::{DiagramNode, DiagramView, HeadingTransformer, MindmapView, Transformer};
pub use error::{Error, Result};
pub use host::{HostDocument, MarkdownFile};
pub use nav::Navigation;
pub use outline::{HeadingInfo, extract_headings};
pub use sync::{OutlineView, Rebuild, ViewStatus};
pub use tui::App;
