//! Derivation of the synthetic group tree from the dot-delimited GROUP strings on records (§4.8).
//!
//! The tree holds nothing but path strings: a parent path is always derivable from a child path
//! by trimming its last dot-delimited segment, so there is no back-pointer and no ownership
//! cycle to worry about (see the design notes on cyclic parent pointers).

use std::collections::{HashMap, HashSet};

/// A full, dot-delimited group path, e.g. `"Work.Email"`.
pub type GroupPath = String;

/// The synthetic tree of groups derived from a set of GROUP path strings.
///
/// Built fresh from the current state on every query-relevant mutation: it is cheap to
/// recompute and carries no identity of its own, so staleness is never a concern.
#[derive(Debug, Default)]
pub struct GroupTree {
    /// path -> ordered list of immediate child paths. The virtual root is keyed by `""`.
    children: HashMap<String, Vec<GroupPath>>,
}

impl GroupTree {
    /// Builds a tree from every group path mentioned by `paths` (duplicates and the root's own
    /// empty string are ignored; every dot-boundary prefix of a path is inserted too).
    pub fn build<'a>(paths: impl Iterator<Item = &'a str>) -> Self {
        let mut children: HashMap<String, Vec<GroupPath>> = HashMap::new();
        let mut seen: HashSet<GroupPath> = HashSet::new();
        children.entry(String::new()).or_default();

        for path in paths {
            if path.is_empty() {
                continue;
            }

            let mut parent = String::new();
            let mut prefix = String::new();
            for (i, segment) in path.split('.').enumerate() {
                if i == 0 {
                    prefix.push_str(segment);
                } else {
                    prefix.push('.');
                    prefix.push_str(segment);
                }

                if seen.insert(prefix.clone()) {
                    children.entry(parent.clone()).or_default().push(prefix.clone());
                    children.entry(prefix.clone()).or_default();
                }

                parent = prefix.clone();
            }
        }

        GroupTree { children }
    }

    /// Top-level group paths (those with no dot).
    pub fn roots(&self) -> &[GroupPath] {
        self.children.get("").map(Vec::as_slice).unwrap_or(&[])
    }

    /// Immediate child group paths of `path`. Empty if `path` is unknown or a leaf.
    pub fn subgroups(&self, path: &str) -> &[GroupPath] {
        self.children.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.children.contains_key(path)
    }
}

/// The display name of a group: the segment after the last dot (the whole path if there is no
/// dot).
pub fn name_of(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// The parent path of a group, or `None` at the root.
pub fn parent_of(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

/// Whether `path` is `group` itself or lives under it (`group` followed by a dot).
pub fn is_or_under(path: &str, group: &str) -> bool {
    path == group || path.strip_prefix(group).and_then(|rest| rest.strip_prefix('.')).is_some()
}
