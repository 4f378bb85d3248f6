//! One directory level of a compiled pack.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::domain::fragment::{Entries, Fragment};
use crate::domain::merge::{merge, MergePolicy};
use crate::domain::scalar::Scalar;

/// What a key of a level holds: a nested level or a parsed fragment value.
#[derive(Debug, Clone)]
pub enum PackChild<F: Fragment> {
    Level(PackNode<F>),
    Value(F),
}

impl<F: Fragment> PackChild<F> {
    pub fn into_fragment(self) -> F {
        match self {
            PackChild::Level(node) => node.into_fragment(),
            PackChild::Value(value) => value,
        }
    }

    fn is_mapping(&self) -> bool {
        match self {
            PackChild::Level(_) => true,
            PackChild::Value(value) => value.is_mapping(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackEntry<F: Fragment> {
    pub key: F::Key,
    pub child: PackChild<F>,
}

/// A directory level: keyed children plus the files and directories that
/// contributed to it, in processing order.
#[derive(Debug, Clone)]
pub struct PackNode<F: Fragment> {
    children: IndexMap<Scalar, PackEntry<F>>,
    source_paths: Vec<PathBuf>,
    /// Trailing comments of fragments whose entries were merged into this level.
    foot: Vec<String>,
}

impl<F: Fragment> Default for PackNode<F> {
    fn default() -> Self {
        Self {
            children: IndexMap::new(),
            source_paths: Vec::new(),
            foot: Vec::new(),
        }
    }
}

impl<F: Fragment> PackNode<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn children(&self) -> impl Iterator<Item = (&Scalar, &PackEntry<F>)> {
        self.children.iter()
    }

    pub fn get(&self, key: &str) -> Option<&PackChild<F>> {
        self.children
            .get(&Scalar::String(key.to_string()))
            .map(|entry| &entry.child)
    }

    pub fn source_paths(&self) -> &[PathBuf] {
        &self.source_paths
    }

    pub fn add_source(&mut self, path: &Path) {
        self.source_paths.push(path.to_path_buf());
    }

    /// Merge a child into the key `id`, creating it if absent.
    pub fn merge_child(&mut self, id: Scalar, key: F::Key, child: PackChild<F>, policy: MergePolicy) {
        let Some(existing) = self.children.get_mut(&id) else {
            self.children.insert(id, PackEntry { key, child });
            return;
        };

        if policy == MergePolicy::Shallow || !existing.child.is_mapping() || !child.is_mapping() {
            *existing = PackEntry { key, child };
            return;
        }

        let previous = std::mem::replace(&mut existing.child, PackChild::Level(PackNode::new()));
        existing.child = match (previous, child) {
            (PackChild::Level(mut base), PackChild::Level(overlay)) => {
                base.absorb(overlay, policy);
                PackChild::Level(base)
            }
            (base, overlay) => PackChild::Value(merge(
                base.into_fragment(),
                overlay.into_fragment(),
                policy,
            )),
        };
    }

    /// Merge mapping entries straight into this level (`@`-file collapse).
    pub fn merge_entries(&mut self, entries: Entries<F>, policy: MergePolicy) {
        for (id, (key, value)) in entries {
            self.merge_child(id, key, PackChild::Value(value), policy);
        }
    }

    /// Merge another level into this one (`@`-directory collapse).
    pub fn absorb(&mut self, other: PackNode<F>, policy: MergePolicy) {
        self.source_paths.extend(other.source_paths);
        self.foot.extend(other.foot);
        for (id, entry) in other.children {
            self.merge_child(id, entry.key, entry.child, policy);
        }
    }

    /// Collapse the level into a single mapping of the fragment type.
    pub fn into_fragment(self) -> F {
        let mut entries: Entries<F> = Entries::<F>::new();
        for (id, entry) in self.children {
            entries.insert(id, (entry.key, entry.child.into_fragment()));
        }
        let mut fragment = F::from_entries(entries);
        fragment.append_foot(self.foot);
        fragment
    }

    /// Merge a whole mapping fragment into this level, applying `policy` per key.
    pub fn merge_fragment(&mut self, mut fragment: F, policy: MergePolicy) -> Result<(), F> {
        let foot = fragment.take_foot();
        match fragment.into_entries() {
            Ok(entries) => {
                self.merge_entries(entries, policy);
                self.foot.extend(foot);
                Ok(())
            }
            Err(mut fragment) => {
                fragment.append_foot(foot);
                Err(fragment)
            }
        }
    }
}
