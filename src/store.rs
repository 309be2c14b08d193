//! YAML-backed content tree store.
//!
//! A store snapshot is a single YAML file holding a node-type registry and
//! the node tree itself. Nodes are read-only for the lifetime of one command
//! invocation; all lookups go through a [`Context`], which applies the
//! visibility flags and language dimension chosen by the caller.

use crate::types::{DOCUMENT_TYPE, NodePath, PropertyValue};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Type name assigned to nodes that declare none (structural helpers like
/// content collections).
pub const UNSTRUCTURED_TYPE: &str = "unstructured";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid node path: {0}")]
    InvalidPath(String),
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

#[derive(Debug, Deserialize, Default)]
struct RawNodeType {
    #[serde(default, rename = "superTypes")]
    super_types: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawVariant {
    hidden: Option<bool>,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Deserialize, Default)]
struct RawNode {
    #[serde(rename = "type")]
    node_type: Option<String>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    restricted: bool,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    variants: BTreeMap<String, RawVariant>,
    #[serde(default)]
    children: BTreeMap<String, RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default, rename = "nodeTypes")]
    node_types: BTreeMap<String, RawNodeType>,
    #[serde(default)]
    root: RawNode,
}

/// Node-type registry with supertype inheritance.
///
/// `instanceof` semantics: a type matches a target when it is the target or
/// transitively declares it as a supertype. Types absent from the registry
/// match only themselves.
#[derive(Debug, Default)]
pub struct NodeTypeRegistry {
    super_types: BTreeMap<String, Vec<String>>,
}

impl NodeTypeRegistry {
    pub fn is_of_type(&self, type_name: &str, target: &str) -> bool {
        if type_name == target {
            return true;
        }
        // Walk the supertype closure; the guard keeps cyclic declarations
        // from looping.
        let mut seen: HashSet<&str> = HashSet::new();
        let mut pending = vec![type_name];
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(supers) = self.super_types.get(current) {
                for super_type in supers {
                    if super_type == target {
                        return true;
                    }
                    pending.push(super_type.as_str());
                }
            }
        }
        false
    }
}

/// Handle to a node inside a [`ContentStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
    path: NodePath,
    node_type: String,
    hidden: bool,
    restricted: bool,
    properties: BTreeMap<String, PropertyValue>,
    variants: BTreeMap<String, RawVariant>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Immutable in-memory content tree loaded from a snapshot file.
#[derive(Debug)]
pub struct ContentStore {
    nodes: Vec<NodeData>,
    registry: NodeTypeRegistry,
}

impl ContentStore {
    /// Load a snapshot from a YAML file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        ContentStore::from_yaml(&content)
    }

    /// Parse a snapshot from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, StoreError> {
        let raw: RawSnapshot = serde_yaml::from_str(yaml)?;
        let registry = NodeTypeRegistry {
            super_types: raw
                .node_types
                .into_iter()
                .map(|(name, t)| (name, t.super_types))
                .collect(),
        };
        let mut store = ContentStore {
            nodes: Vec::new(),
            registry,
        };
        store.insert(raw.root, NodePath::root(), None);
        Ok(store)
    }

    fn insert(&mut self, raw: RawNode, path: NodePath, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            path: path.clone(),
            node_type: raw
                .node_type
                .unwrap_or_else(|| UNSTRUCTURED_TYPE.to_string()),
            hidden: raw.hidden,
            restricted: raw.restricted,
            properties: raw.properties,
            variants: raw.variants,
            parent,
            children: Vec::new(),
        });
        for (name, child) in raw.children {
            let child_id = self.insert(child, path.join(&name), Some(id));
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    /// Create a read view with the given visibility and dimension options.
    pub fn context(&self, options: ContextOptions) -> Context<'_> {
        Context {
            store: self,
            options,
        }
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// Options fixed at context creation, mirroring the per-invocation query
/// context of the original tool.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Also traverse nodes that are hidden or access-restricted.
    pub include_hidden: bool,
    /// Language dimension to resolve variants in; `None` uses base values.
    pub language: Option<String>,
}

/// Read view over a [`ContentStore`] for one invocation.
///
/// All property and hidden-flag lookups are overlay-aware: when a language is
/// selected and the node carries a variant for it, the variant's values win;
/// otherwise the node's base values apply.
pub struct Context<'a> {
    store: &'a ContentStore,
    options: ContextOptions,
}

impl<'a> Context<'a> {
    /// Resolve an absolute path string to a node. Failure here is fatal for
    /// the whole command.
    pub fn resolve(&self, raw_path: &str) -> Result<NodeId, StoreError> {
        let path = NodePath::parse(raw_path)
            .ok_or_else(|| StoreError::InvalidPath(raw_path.to_string()))?;
        let mut current = NodeId(0);
        for segment in path.segments() {
            let next = self
                .store
                .node(current)
                .children
                .iter()
                .copied()
                .find(|&c| self.store.node(c).path.segments().last() == Some(segment));
            match next {
                Some(child) => current = child,
                None => return Err(StoreError::NodeNotFound(raw_path.to_string())),
            }
        }
        Ok(current)
    }

    pub fn path(&self, id: NodeId) -> &NodePath {
        &self.store.node(id).path
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.store.node(id).path.depth()
    }

    pub fn node_type(&self, id: NodeId) -> &str {
        &self.store.node(id).node_type
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.store.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.store.node(id).children
    }

    /// The node's own hidden flag, overlay-aware. Independent of ancestors.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        let node = self.store.node(id);
        if let Some(language) = &self.options.language
            && let Some(variant) = node.variants.get(language)
            && let Some(hidden) = variant.hidden
        {
            return hidden;
        }
        node.hidden
    }

    /// Overlay-aware property lookup.
    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropertyValue> {
        let node = self.store.node(id);
        if let Some(language) = &self.options.language
            && let Some(variant) = node.variants.get(language)
            && let Some(value) = variant.properties.get(name)
        {
            return Some(value);
        }
        node.properties.get(name)
    }

    /// Whether traversal may enter this node. Hidden and restricted nodes
    /// are pruned together with their subtrees unless `include_hidden` is
    /// set (covering both the invisible and inaccessible classes).
    pub fn is_traversable(&self, id: NodeId) -> bool {
        self.options.include_hidden
            || (!self.is_hidden(id) && !self.store.node(id).restricted)
    }

    pub fn is_of_type(&self, id: NodeId, target: &str) -> bool {
        self.store.registry.is_of_type(self.node_type(id), target)
    }

    pub fn is_document(&self, id: NodeId) -> bool {
        self.is_of_type(id, DOCUMENT_TYPE)
    }
}
