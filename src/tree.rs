//! Category tree builder
//!
//! Places every registered replica under the category node named by its
//! slash-delimited category path, creating intermediate nodes on the way,
//! and records which radio items are siblings. After placement it
//! cross-links the reverse dependency lists in the registry.

use std::collections::HashMap;

use tracing::debug;

use crate::registry::{ItemRegistry, RegistryError, ReplicaId};
use crate::types::CheckKind;

/// Path of the root node
pub const ROOT_PATH: &str = "/";

/// Position of a node in the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A child of a category node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntry {
    Category(NodeId),
    Item(ReplicaId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// Normalized path, e.g. `/Tools/Network`
    pub path: String,
    /// Last path segment; empty for the root
    pub name: String,
    /// Sub-categories and item leaves in insertion order
    pub children: Vec<TreeEntry>,
}

/// Category hierarchy with its radio-group index
#[derive(Debug, Clone)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    index: HashMap<String, NodeId>,
    /// Parent path -> ids of the radio items directly under it
    radio_groups: HashMap<String, Vec<String>>,
}

impl Default for CategoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryTree {
    /// An empty tree holding only the root node
    pub fn new() -> Self {
        let root = CategoryNode {
            path: ROOT_PATH.to_string(),
            name: String::new(),
            children: Vec::new(),
        };
        let mut index = HashMap::new();
        index.insert(ROOT_PATH.to_string(), NodeId(0));
        Self {
            nodes: vec![root],
            index,
            radio_groups: HashMap::new(),
        }
    }

    /// Place every replica of `registry` and cross-link its dependents
    pub fn build(registry: &mut ItemRegistry) -> Self {
        let mut tree = Self::new();

        let placements: Vec<(ReplicaId, String, CheckKind, String)> = registry
            .iter()
            .map(|(replica, item)| {
                (
                    replica,
                    item.category.clone(),
                    item.check_kind,
                    item.id.clone(),
                )
            })
            .collect();

        for (replica, category, kind, id) in placements {
            tree.place(replica, &category, kind, &id);
        }

        cross_link(registry);
        debug!(
            "Category tree built: {} categories, {} radio groups",
            tree.nodes.len() - 1,
            tree.radio_groups.len()
        );
        tree
    }

    /// Attach one replica as a leaf under `category`
    pub fn place(&mut self, replica: ReplicaId, category: &str, kind: CheckKind, id: &str) {
        let node = self.node_for_category(category);
        self.nodes[node.0].children.push(TreeEntry::Item(replica));

        if kind == CheckKind::Radio {
            let group = self
                .radio_groups
                .entry(self.nodes[node.0].path.clone())
                .or_default();
            if !group.iter().any(|member| member == id) {
                group.push(id.to_string());
            }
        }
    }

    /// Find or create the node for `category`, creating missing ancestors
    fn node_for_category(&mut self, category: &str) -> NodeId {
        let mut current = NodeId(0);
        let mut path = String::new();

        for segment in segments(category) {
            path.push('/');
            path.push_str(segment);

            current = match self.index.get(&path) {
                Some(&existing) => existing,
                None => {
                    let node = NodeId(self.nodes.len());
                    self.nodes.push(CategoryNode {
                        path: path.clone(),
                        name: segment.to_string(),
                        children: Vec::new(),
                    });
                    self.nodes[current.0].children.push(TreeEntry::Category(node));
                    self.index.insert(path.clone(), node);
                    node
                }
            };
        }

        current
    }

    pub fn root(&self) -> &CategoryNode {
        &self.nodes[0]
    }

    pub fn node(&self, node: NodeId) -> &CategoryNode {
        &self.nodes[node.0]
    }

    /// Node for a category string, in any spelling `category_path` accepts
    pub fn find(&self, category: &str) -> Option<&CategoryNode> {
        self.index
            .get(&category_path(category))
            .map(|node| &self.nodes[node.0])
    }

    /// Number of category nodes, excluding the root
    pub fn category_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Radio item ids directly under `category` (empty if none)
    pub fn radio_group(&self, category: &str) -> &[String] {
        self.radio_groups
            .get(&category_path(category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Other members of every radio group a `Radio` replica of `id` sits in
    pub fn radio_siblings(&self, registry: &ItemRegistry, id: &str) -> Vec<String> {
        let mut siblings: Vec<String> = Vec::new();
        for replica in registry.replicas(id) {
            if replica.check_kind != CheckKind::Radio {
                continue;
            }
            for member in self.radio_group(&replica.category) {
                if member != id && !siblings.contains(member) {
                    siblings.push(member.clone());
                }
            }
        }
        siblings
    }

    /// Check `id` in `registry`, first forcing its radio siblings off.
    /// Returns the siblings that were checked before.
    ///
    /// # Errors
    ///
    /// - `UnknownItem` if `id` is not registered
    pub fn check_exclusive(
        &self,
        registry: &mut ItemRegistry,
        id: &str,
    ) -> Result<Vec<String>, RegistryError> {
        if !registry.contains(id) {
            return Err(RegistryError::UnknownItem { id: id.to_string() });
        }

        let mut cleared = Vec::new();
        for sibling in self.radio_siblings(registry, id) {
            if registry.is_checked(&sibling)? {
                debug!("Radio exclusivity: clearing '{}' for '{}'", sibling, id);
                registry.set_checked(&sibling, false)?;
                cleared.push(sibling);
            }
        }
        registry.set_checked(id, true)?;
        Ok(cleared)
    }

    /// Visit every entry depth-first in display order, with its depth
    /// (children of the root are at depth 0)
    pub fn walk<F: FnMut(usize, &TreeEntry)>(&self, mut visit: F) {
        fn recurse<F: FnMut(usize, &TreeEntry)>(
            tree: &CategoryTree,
            node: NodeId,
            depth: usize,
            visit: &mut F,
        ) {
            for entry in &tree.nodes[node.0].children {
                visit(depth, entry);
                if let TreeEntry::Category(child) = entry {
                    recurse(tree, *child, depth + 1, visit);
                }
            }
        }
        recurse(self, NodeId(0), 0, &mut visit);
    }
}

/// Normalize a category string into a node path: segments trimmed, empty
/// segments dropped, rooted at `/`
pub fn category_path(category: &str) -> String {
    let path: String = segments(category).flat_map(|s| ["/", s]).collect();
    if path.is_empty() {
        ROOT_PATH.to_string()
    } else {
        path
    }
}

fn segments(category: &str) -> impl Iterator<Item = &str> {
    category.split('/').map(str::trim).filter(|s| !s.is_empty())
}

/// Fill `depended_by` on every replica: X lands on D's list iff X depends
/// on D. Dependencies that are not registered are skipped.
pub fn cross_link(registry: &mut ItemRegistry) {
    let links: Vec<(String, Vec<String>)> = registry
        .ids()
        .filter_map(|id| {
            registry
                .first(id)
                .map(|item| (id.to_string(), item.depends.clone()))
        })
        .collect();

    for (id, depends) in links {
        for dep in depends {
            if !registry.add_dependent(&dep, &id) {
                debug!("Item '{}' depends on unknown id '{}'", id, dep);
            }
        }
    }
}
