//! Path ↔ heading element index.

use crate::diagram::DiagramNode;
use crate::outline::HeadingInfo;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Bidirectional map between outline paths and heading elements.
///
/// Only paths present both among the headings and in the annotated diagram
/// are indexed. The two maps are always exact inverses.
#[derive(Debug, Clone)]
pub struct PathIndex<E> {
    path_to_element: HashMap<String, E>,
    element_to_path: HashMap<E, String>,
}

impl<E> Default for PathIndex<E> {
    fn default() -> Self {
        Self {
            path_to_element: HashMap::new(),
            element_to_path: HashMap::new(),
        }
    }
}

impl<E: Clone + Eq + Hash> PathIndex<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and repopulate from the headings and the annotated tree.
    pub fn rebuild(&mut self, headings: &[HeadingInfo<E>], root: &DiagramNode) {
        self.path_to_element.clear();
        self.element_to_path.clear();

        let mut node_paths = HashSet::new();
        root.walk(&mut |node| {
            if let Some(path) = node.payload.path.as_deref() {
                node_paths.insert(path);
            }
        });

        for heading in headings {
            if !node_paths.contains(heading.path.as_str())
                || self.path_to_element.contains_key(&heading.path)
                || self.element_to_path.contains_key(&heading.element)
            {
                continue;
            }
            self.path_to_element
                .insert(heading.path.clone(), heading.element.clone());
            self.element_to_path
                .insert(heading.element.clone(), heading.path.clone());
        }

        let skipped = headings.len() - self.len();
        if skipped > 0 {
            tracing::debug!(skipped, indexed = self.len(), "headings without a diagram node");
        }
    }

    pub fn lookup_element(&self, path: &str) -> Option<&E> {
        self.path_to_element.get(path)
    }

    pub fn lookup_path(&self, element: &E) -> Option<&str> {
        self.element_to_path.get(element).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.path_to_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_to_element.is_empty()
    }

    /// Indexed paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.path_to_element.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::annotate;
    use crate::outline::{extract_headings, tests::StaticHost};

    fn tree(root: DiagramNode) -> DiagramNode {
        let mut root = root;
        annotate(&mut root);
        root
    }

    #[test]
    fn test_rebuild_indexes_common_paths() {
        let headings = extract_headings(&StaticHost::new(&[(1, "A"), (2, "B"), (2, "Orphan")]));
        let root = tree(DiagramNode::new("A").with_children(vec![
            DiagramNode::new("B"),
            DiagramNode::new("Body only"),
        ]));

        let mut index = PathIndex::new();
        index.rebuild(&headings, &root);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup_element("A\nB"), Some(&1));
        assert_eq!(index.lookup_path(&0), Some("A"));
        assert_eq!(index.lookup_element("A\nOrphan"), None);
        assert_eq!(index.lookup_element("A\nBody only"), None);
        assert_eq!(index.lookup_path(&2), None);
    }

    #[test]
    fn test_duplicate_paths_first_wins() {
        let headings = extract_headings(&StaticHost::new(&[(1, "A"), (2, "B"), (2, "B")]));
        let root = tree(DiagramNode::new("A").with_children(vec![
            DiagramNode::new("B"),
            DiagramNode::new("B"),
        ]));

        let mut index = PathIndex::new();
        index.rebuild(&headings, &root);

        assert_eq!(index.lookup_element("A\nB"), Some(&1));
        assert_eq!(index.lookup_path(&2), None);
        for path in index.paths() {
            let element = index.lookup_element(path).unwrap();
            assert_eq!(index.lookup_path(element), Some(path));
        }
    }

    #[test]
    fn test_rebuild_clears_previous_entries() {
        let mut index = PathIndex::new();
        let first = extract_headings(&StaticHost::new(&[(1, "Old")]));
        index.rebuild(&first, &tree(DiagramNode::new("Old")));
        assert_eq!(index.len(), 1);

        let second = extract_headings(&StaticHost::new(&[(1, "New")]));
        index.rebuild(&second, &tree(DiagramNode::new("New")));
        assert_eq!(index.paths(), vec!["New"]);
        assert_eq!(index.lookup_element("Old"), None);
    }
}
