//! Fold state carried across diagram rebuilds by path.

use crate::diagram::DiagramNode;
use std::collections::HashSet;

/// Paths folded in the outgoing tree. Consumed by [`restore_folded`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldSnapshot(HashSet<String>);

impl FoldSnapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }
}

impl<S: Into<String>> FromIterator<S> for FoldSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

pub fn snapshot_folded(old_root: &DiagramNode) -> FoldSnapshot {
    let mut folded = HashSet::new();
    old_root.walk(&mut |node| {
        if node.payload.fold {
            if let Some(path) = &node.payload.path {
                folded.insert(path.clone());
            }
        }
    });
    FoldSnapshot(folded)
}

/// Fold every node of `new_root` whose path was folded before.
///
/// Other nodes keep their default. Snapshot paths that no longer exist are
/// dropped. Returns the number of nodes folded.
pub fn restore_folded(new_root: &mut DiagramNode, snapshot: FoldSnapshot) -> usize {
    let mut restored = 0;
    new_root.walk_mut(&mut |node| {
        if node
            .payload
            .path
            .as_deref()
            .is_some_and(|p| snapshot.contains(p))
        {
            node.payload.fold = true;
            restored += 1;
        }
    });
    if restored < snapshot.len() {
        tracing::debug!(
            stale = snapshot.len() - restored,
            "folded paths gone after rebuild"
        );
    }
    restored
}
