//! Outline view: keeps a diagram in sync with the host document.
//!
//! A rebuild cycle extracts the headings, skips out early when the outline
//! hash is unchanged, transforms heading-only markdown into a fresh tree,
//! annotates it with paths, carries folds over from the outgoing tree,
//! rebuilds the path index and finally replaces the diagram's data.

mod detector;
mod fold;
mod index;
mod timers;

pub use detector::{ChangeDetector, DetectorState, TriggerSource};
pub use fold::{FoldSnapshot, restore_folded, snapshot_folded};
pub use index::PathIndex;
pub use timers::{Task, Timers};

use crate::config::{Config, OptionsPatch};
use crate::diagram::{DiagramNode, DiagramView, Transformer, annotate};
use crate::error::Result;
use crate::host::HostDocument;
use crate::outline::{HeadingInfo, OutlineHash, build_toc_markdown, extract_headings};
use std::time::Instant;

/// What the diagram area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Hidden,
    /// The document has no headings
    Empty,
    Ready,
    /// The last rebuild failed; the previous diagram, if any, is kept
    Error(String),
}

/// Result of one rebuild cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebuild {
    /// The diagram was created or its data replaced
    Rebuilt,
    /// The outline hash matched the last rebuild
    Unchanged,
    /// No headings; the diagram was dropped
    Empty,
    /// The view is hidden
    Skipped,
    Failed,
}

pub struct OutlineView<H: HostDocument, V: DiagramView> {
    pub(crate) host: H,
    transformer: Box<dyn Transformer>,
    pub(crate) config: Config,
    pub(crate) view: Option<V>,
    visible: bool,
    status: ViewStatus,
    pub(crate) headings: Vec<HeadingInfo<H::Element>>,
    pub(crate) index: PathIndex<H::Element>,
    detector: ChangeDetector,
    pub(crate) timers: Timers<H::Element>,
    /// Path of the heading last reported by a viewport scroll
    pub(crate) followed: Option<String>,
    /// Time of the latest tick
    clock: Instant,
}

impl<H: HostDocument, V: DiagramView> OutlineView<H, V> {
    /// Attach to `host`. The view starts hidden.
    pub fn new(host: H, transformer: Box<dyn Transformer>, config: Config) -> Self {
        let detector = ChangeDetector::new(config.sync.debounce());
        Self {
            host,
            transformer,
            config,
            view: None,
            visible: false,
            status: ViewStatus::Hidden,
            headings: Vec::new(),
            index: PathIndex::new(),
            detector,
            timers: Timers::new(),
            followed: None,
            clock: Instant::now(),
        }
    }

    pub fn show(&mut self) -> Rebuild {
        if self.visible {
            return Rebuild::Skipped;
        }
        self.visible = true;
        tracing::info!("outline view shown");

        let outcome = self.refresh();
        if self.config.sync.realtime {
            self.detector.install(&mut self.host);
        }
        outcome
    }

    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;
        self.detector.teardown();
        self.detector.reset_hash();
        self.view = None;
        self.status = ViewStatus::Hidden;
        tracing::info!("outline view hidden");
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    /// Apply option overrides. Changing the initial expand level recreates
    /// the diagram.
    pub fn update_options(&mut self, patch: &OptionsPatch) {
        let was_realtime = self.config.sync.realtime;
        let diagram_changed = self.config.apply(patch);
        self.detector.set_debounce(self.config.sync.debounce());

        if self.visible && was_realtime != self.config.sync.realtime {
            if self.config.sync.realtime {
                self.detector.install(&mut self.host);
            } else {
                self.detector.teardown();
            }
        }

        if self.visible && diagram_changed {
            self.view = None;
            self.refresh();
        }
    }

    /// Tear down and hand the host back.
    pub fn destroy(mut self) -> H {
        self.hide();
        self.timers.clear();
        self.index = PathIndex::new();
        self.headings.clear();
        tracing::info!("outline view destroyed");
        self.host
    }

    /// Advance time: run a due rebuild, then due deferred tasks.
    pub fn tick(&mut self, now: Instant) -> Option<Rebuild> {
        self.clock = self.clock.max(now);
        let rebuild = (self.visible && self.detector.poll(now)).then(|| self.update());
        for task in self.timers.take_due(now) {
            self.run_task(task);
        }
        rebuild
    }

    /// Base time for deferred tasks: the later of the latest tick and the wall clock.
    ///
    /// Tasks only run from [`tick`](Self::tick), so they are measured on the
    /// same timeline the caller drives.
    pub(crate) fn now(&self) -> Instant {
        self.clock.max(Instant::now())
    }

    /// Run a rebuild cycle, skipped when the outline is unchanged.
    pub fn update(&mut self) -> Rebuild {
        self.rebuild(false)
    }

    /// Run a rebuild cycle unconditionally.
    pub fn refresh(&mut self) -> Rebuild {
        self.rebuild(true)
    }

    fn rebuild(&mut self, force: bool) -> Rebuild {
        if !self.visible {
            return Rebuild::Skipped;
        }

        if let Err(err) = self.host.refresh() {
            return self.fail(&err);
        }

        let headings = extract_headings(&self.host);
        let hash = OutlineHash::from(&headings[..]);
        if !force && self.detector.is_current(&hash) {
            tracing::debug!("outline unchanged, refreshing heading handles");
            if let Some(root) = self.view.as_ref().and_then(|v| v.data()) {
                self.index.rebuild(&headings, root);
            }
            self.headings = headings;
            return Rebuild::Unchanged;
        }

        if headings.is_empty() {
            self.view = None;
            self.index = PathIndex::new();
            self.headings = headings;
            self.status = ViewStatus::Empty;
            self.detector.record_hash(hash);
            tracing::debug!("document has no headings");
            return Rebuild::Empty;
        }

        match self.replace_diagram(&headings) {
            Ok(index) => {
                tracing::debug!(
                    headings = headings.len(),
                    indexed = index.len(),
                    "diagram rebuilt"
                );
                self.index = index;
                self.headings = headings;
                self.status = ViewStatus::Ready;
                self.detector.record_hash(hash);
                Rebuild::Rebuilt
            }
            Err(err) => self.fail(&err),
        }
    }

    fn fail(&mut self, err: &crate::Error) -> Rebuild {
        tracing::error!(%err, "outline rebuild failed");
        self.status = ViewStatus::Error(err.to_string());
        Rebuild::Failed
    }

    fn build_tree(&self, headings: &[HeadingInfo<H::Element>]) -> Result<DiagramNode> {
        let markdown = build_toc_markdown(headings);
        let mut root = self.transformer.transform(&markdown)?;
        annotate(&mut root);
        Ok(root)
    }

    /// Build the new tree and swap it in. Nothing changes on error.
    fn replace_diagram(
        &mut self,
        headings: &[HeadingInfo<H::Element>],
    ) -> Result<PathIndex<H::Element>> {
        let mut root = self.build_tree(headings)?;
        let mut index = PathIndex::new();

        match &mut self.view {
            Some(view) => {
                if let Some(old) = view.data() {
                    let snapshot = snapshot_folded(old);
                    restore_folded(&mut root, snapshot);
                }
                index.rebuild(headings, &root);
                view.set_data(root, &self.config.diagram)?;
            }
            None => {
                index.rebuild(headings, &root);
                self.view = Some(V::create(&self.config.diagram, root)?);
                let due = self.now() + self.config.navigation.settle();
                self.timers.schedule(due, Task::Fit);
            }
        }
        Ok(index)
    }

    pub fn status(&self) -> &ViewStatus {
        &self.status
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    pub fn view_mut(&mut self) -> Option<&mut V> {
        self.view.as_mut()
    }

    pub fn headings(&self) -> &[HeadingInfo<H::Element>] {
        &self.headings
    }

    pub fn index(&self) -> &PathIndex<H::Element> {
        &self.index
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn trigger_source(&self) -> Option<TriggerSource> {
        self.detector.source()
    }

    /// Earliest pending deadline, debounce or deferred task.
    pub fn next_deadline(&self) -> Option<Instant> {
        let debounce = match self.detector.state() {
            DetectorState::PendingRebuild { deadline } => Some(deadline),
            DetectorState::Idle => None,
        };
        match (debounce, self.timers.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
