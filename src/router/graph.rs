//! Resource graph.
//!
//! The graph is declared as nested mappings ([`GraphSpec`]):
//!
//! ```yaml
//! articles:
//!   authors: {}      # owned child, no children of its own
//! authors:
//!   articles: ~      # link: resolves to the top-level `articles` entry
//! ```
//!
//! Each [`TreeEntry`] owns its forward children. A null child is a
//! [`Branch::Link`] that names a top-level entry and is resolved through the
//! root registry on lookup, so back-edges and cycles
//! (`authors → articles → authors`) need no shared ownership.
//!
//! Nodes are built once per resource name and shared by every entry that
//! names the same resource.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::dao::DaoRegistry;
use crate::error::ConfigError;
use crate::node::Node;

/// Declarative graph shape: child name → subtree, or `None` for a link.
///
/// At the top level a `None` value simply declares a resource without children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphSpec(pub BTreeMap<String, Option<GraphSpec>>);

impl GraphSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an owned child (or, at the top level, a resource) with `children`.
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, children: GraphSpec) -> Self {
        self.0.insert(name.into(), Some(children));
        self
    }

    /// Add a resource with no children.
    #[must_use]
    pub fn leaf(self, name: impl Into<String>) -> Self {
        self.child(name, GraphSpec::new())
    }

    /// Add a link to the top-level entry called `name`.
    #[must_use]
    pub fn link(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into(), None);
        self
    }

    /// Top-level resource names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Every resource name mentioned anywhere in the graph.
    #[must_use]
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names.sort_unstable();
        names.dedup();
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        for (name, children) in &self.0 {
            out.push(name.as_str());
            if let Some(children) = children {
                children.collect_names(out);
            }
        }
    }
}

/// A child edge in the graph.
#[derive(Debug)]
pub enum Branch {
    /// Exclusively owned subtree
    Owned(TreeEntry),
    /// Name of a top-level entry
    Link(String),
}

/// One position in the graph: the node for this resource plus its children.
#[derive(Debug)]
pub struct TreeEntry {
    node: Arc<Node>,
    children: BTreeMap<String, Branch>,
}

impl TreeEntry {
    #[must_use]
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Declared child names, links included.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }
}

/// Immutable resource graph shared by all requests.
///
/// The top-level entries double as the flat lookup table.
#[derive(Debug, Default)]
pub struct ResourceTree {
    roots: BTreeMap<String, TreeEntry>,
}

impl ResourceTree {
    /// Build the graph, binding each resource to its DAO.
    ///
    /// Fails when a name is empty, a resource has no DAO, or a link names
    /// something that is not a top-level entry.
    pub fn build(spec: &GraphSpec, daos: &DaoRegistry) -> Result<Self, ConfigError> {
        let mut nodes: BTreeMap<String, Arc<Node>> = BTreeMap::new();
        for name in spec.all_names() {
            if name.is_empty() {
                return Err(ConfigError::EmptyResourceName);
            }
            let dao = daos.get(name).ok_or_else(|| ConfigError::UnboundResource {
                resource: name.to_string(),
            })?;
            nodes.insert(name.to_string(), Arc::new(Node::new(name, Arc::clone(dao))));
        }

        let mut roots = BTreeMap::new();
        for (name, children) in &spec.0 {
            let entry = build_entry(name, children.as_ref(), spec, &nodes)?;
            roots.insert(name.clone(), entry);
        }

        debug!(
            resources = ?spec.names().collect::<Vec<_>>(),
            "Resource graph built"
        );
        Ok(Self { roots })
    }

    /// Top-level entry for `name`.
    #[must_use]
    pub fn root(&self, name: &str) -> Option<&TreeEntry> {
        self.roots.get(name)
    }

    /// Node of the top-level entry `name` (the flat table lookup).
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Arc<Node>> {
        self.root(name).map(TreeEntry::node)
    }

    /// Child `name` of `entry`, following links through the root registry.
    #[must_use]
    pub fn child<'a>(&'a self, entry: &'a TreeEntry, name: &str) -> Option<&'a TreeEntry> {
        match entry.children.get(name)? {
            Branch::Owned(child) => Some(child),
            Branch::Link(target) => self.roots.get(target),
        }
    }

    /// Top-level resource names.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn build_entry(
    name: &str,
    children: Option<&GraphSpec>,
    spec: &GraphSpec,
    nodes: &BTreeMap<String, Arc<Node>>,
) -> Result<TreeEntry, ConfigError> {
    let node = nodes
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::UnboundResource {
            resource: name.to_string(),
        })?;

    let mut branches = BTreeMap::new();
    if let Some(children) = children {
        for (child, grandchildren) in &children.0 {
            let branch = match grandchildren {
                Some(sub) => Branch::Owned(build_entry(child, Some(sub), spec, nodes)?),
                None if spec.0.contains_key(child) => Branch::Link(child.clone()),
                None => {
                    return Err(ConfigError::UnknownLink {
                        target: child.clone(),
                    })
                }
            };
            branches.insert(child.clone(), branch);
        }
    }

    Ok(TreeEntry {
        node,
        children: branches,
    })
}
