//! Debounced detection of outline-affecting document changes.
//!
//! Signals come from a host notification channel when the host offers one,
//! otherwise from a structural observer scoped to the document. Either way
//! they arrive over one mpsc channel, and the detector only ever sees them
//! when polled.

use crate::host::{ChangeSink, ChannelKind, HostDocument, Signal, Stamped, Subscription};
use crate::outline::OutlineHash;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    PendingRebuild { deadline: Instant },
}

/// Where change signals come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Notification(ChannelKind),
    Observation,
}

#[derive(Debug)]
pub struct ChangeDetector {
    debounce: Duration,
    state: DetectorState,
    tx: Sender<Stamped>,
    rx: Receiver<Stamped>,
    subscription: Option<Subscription>,
    source: Option<TriggerSource>,
    last_hash: Option<OutlineHash>,
}

impl ChangeDetector {
    pub fn new(debounce: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            debounce,
            state: DetectorState::Idle,
            tx,
            rx,
            subscription: None,
            source: None,
            last_hash: None,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn source(&self) -> Option<TriggerSource> {
        self.source
    }

    pub fn is_installed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    fn sink(&self) -> ChangeSink {
        ChangeSink::new(self.tx.clone())
    }

    /// Connect to the host, preferring its notification channels.
    pub fn install<H: HostDocument>(&mut self, host: &mut H) -> Option<TriggerSource> {
        self.teardown();

        for channel in ChannelKind::iter() {
            if let Some(subscription) = host.subscribe(channel, self.sink()) {
                tracing::debug!(%channel, "listening for host notifications");
                self.subscription = Some(subscription);
                self.source = Some(TriggerSource::Notification(channel));
                return self.source;
            }
        }

        tracing::debug!("host has no notification channel, observing document structure");
        match host.observe(self.sink()) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.source = Some(TriggerSource::Observation);
            }
            Err(err) => {
                tracing::warn!(%err, "failed to observe document, live updates disabled");
            }
        }
        self.source
    }

    /// Disconnect from the host and drop pending work.
    pub fn teardown(&mut self) {
        if self.subscription.take().is_some() {
            tracing::debug!("change detector torn down");
        }
        self.source = None;
        self.state = DetectorState::Idle;
        while self.rx.try_recv().is_ok() {}
    }

    /// Start or restart the debounce window.
    pub fn trigger(&mut self, now: Instant) {
        self.state = DetectorState::PendingRebuild {
            deadline: now + self.debounce,
        };
    }

    /// Drain queued signals and report whether the debounce window expired.
    ///
    /// Each window starts when its signal was sent, never later than `now`.
    /// Returns true at most once per window; the detector is then Idle again.
    pub fn poll(&mut self, now: Instant) -> bool {
        while let Ok((sent, signal)) = self.rx.try_recv() {
            let arrived = sent.min(now);
            match signal {
                Signal::Notified => self.trigger(arrived),
                Signal::Mutated(mutation) if mutation.affects_headings() => {
                    self.trigger(arrived)
                }
                Signal::Mutated(mutation) => {
                    tracing::trace!(?mutation, "ignoring mutation outside headings");
                }
            }
        }

        match self.state {
            DetectorState::PendingRebuild { deadline } if now >= deadline => {
                self.state = DetectorState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Whether `hash` matches the outline of the last rebuild.
    pub fn is_current(&self, hash: &OutlineHash) -> bool {
        self.last_hash.as_ref() == Some(hash)
    }

    pub fn record_hash(&mut self, hash: OutlineHash) {
        self.last_hash = Some(hash);
    }

    /// Forget the stored hash so the next cycle always rebuilds.
    pub fn reset_hash(&mut self) {
        self.last_hash = None;
    }
}
