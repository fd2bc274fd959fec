//! Host document accessor.
//!
//! The host owns the document: its heading elements, raw text, scroll
//! position and styling. The outline engine only holds handles to host
//! elements and asks the host to act on them.

mod file;
mod watcher;

pub use file::{HeadingRef, MarkdownFile};
pub use watcher::{FileWatcher, diff_lines};

use crate::error::Result;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use strum::{Display, EnumIter};

/// A heading element as reported by the host, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHeading<E> {
    /// Heading level (1-6)
    pub level: usize,
    /// Rendered heading text, not yet normalized
    pub text: String,
    /// Host-assigned anchor id, if any
    pub id: Option<String>,
    /// Handle to the host element
    pub element: E,
}

/// Visible window of the document, in host units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Structural-change notification channels a host may expose, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum ChannelKind {
    /// The host reports outline (heading) changes directly
    OutlineChanged,
    /// The host reports any document-level change
    DocumentChanged,
}

/// What a structural mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationTarget {
    /// A heading element itself
    Heading,
    /// Text content inside a heading
    HeadingText,
    /// Anything else in the content container
    Other,
}

/// A structural mutation observed inside the document's content container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub target: MutationTarget,
    /// An added subtree contains a heading
    pub added_heading: bool,
    /// A removed subtree contains a heading
    pub removed_heading: bool,
}

impl Mutation {
    pub fn new(target: MutationTarget) -> Self {
        Self {
            target,
            added_heading: false,
            removed_heading: false,
        }
    }

    /// Whether this mutation can change the heading outline.
    pub fn affects_headings(&self) -> bool {
        matches!(
            self.target,
            MutationTarget::Heading | MutationTarget::HeadingText
        ) || self.added_heading
            || self.removed_heading
    }
}

/// A change signal delivered to the change detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The host notification channel fired
    Notified,
    /// The scoped observer recorded a mutation
    Mutated(Mutation),
}

/// A signal paired with the moment it was sent.
pub(crate) type Stamped = (Instant, Signal);

/// Sending half of the change detector's signal channel.
///
/// Cheap to clone and `Send`, so hosts may deliver signals from any thread.
/// Each signal is stamped on send; the debounce window runs from that stamp.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    tx: Sender<Stamped>,
}

impl ChangeSink {
    pub(crate) fn new(tx: Sender<Stamped>) -> Self {
        Self { tx }
    }

    fn send(&self, signal: Signal) {
        let _ = self.tx.send((Instant::now(), signal));
    }

    /// Report that the host's outline changed.
    pub fn notify(&self) {
        self.send(Signal::Notified);
    }

    /// Report a structural mutation.
    pub fn record(&self, mutation: Mutation) {
        self.send(Signal::Mutated(mutation));
    }
}

/// Keeps a listener or observer installed; dropping it disconnects.
pub struct Subscription {
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Run `disconnect` when the subscription is dropped.
    pub fn new(disconnect: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_drop: Some(Box::new(disconnect)),
        }
    }

    /// Keep `resource` alive for as long as the subscription lives.
    pub fn holding<T: Send + 'static>(resource: T) -> Self {
        Self::new(move || drop(resource))
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(disconnect) = self.on_drop.take() {
            disconnect();
        }
    }
}

/// The host document the outline view is attached to.
pub trait HostDocument {
    /// Handle to a heading element, owned by the host.
    type Element: Clone + Eq + Hash + Debug;

    /// Heading elements in document order.
    fn headings(&self) -> Vec<RawHeading<Self::Element>>;

    /// Raw document text.
    fn markdown(&self) -> String;

    /// Vertical offset of a heading in document space.
    fn heading_offset(&self, element: &Self::Element) -> Option<f64>;

    /// Currently visible window of the document.
    fn viewport(&self) -> Viewport;

    /// Base paragraph font size, if it can be measured.
    fn base_font_size(&self) -> Option<f64>;

    /// Scroll `element` to the top of the viewport, leaving `top_offset` above it.
    fn scroll_into_view(&mut self, element: &Self::Element, top_offset: f64);

    /// Pulse the heading's background to `color` and back over `duration`.
    fn highlight_heading(&mut self, element: &Self::Element, color: &str, duration: Duration);

    /// Remove scroll offset and highlight styling applied to `element`.
    fn clear_heading_styling(&mut self, element: &Self::Element);

    /// Pull the latest document state before an extraction cycle.
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    /// Register `sink` on a host notification channel, if the host has it.
    fn subscribe(&mut self, channel: ChannelKind, sink: ChangeSink) -> Option<Subscription> {
        let _ = (channel, sink);
        None
    }

    /// Install a structural observer scoped to the content container.
    fn observe(&mut self, sink: ChangeSink) -> Result<Subscription>;
}
