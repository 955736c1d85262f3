//! Drive graph construction
//!
//! [`GraphBuilder`] turns the flat record list into an arena of [`Node`]s
//! with two synthetic folder roots:
//!
//! - **main**: the designated root (the user's drive)
//! - **orphaned**: everything not reachable from main through parent edges
//!
//! Edges are stored as [`NodeId`] indices on the owning node, so the graph
//! may contain cycles (malformed parents, shortcut targets). Cycle-breaking is
//! a property of the walk, see [`Walk`].
//!
//! Construction never fails. Records with no usable parent are attached to
//! `orphaned`; a folder cycle with no route to either root is attached to
//! `orphaned` through the member with the smallest id.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::ops::Index;
use std::sync::Arc;

use tracing::{debug, warn};

use super::mime::{FOLDER_MIME_TYPE, SHORTCUT_MIME_TYPE};
use super::path::sanitize_name;
use super::record::Record;
use super::walk::Walk;

/// Default name of the main tree root
pub const DEFAULT_MAIN_NAME: &str = "My Drive";

/// Default name of the orphaned tree root
pub const DEFAULT_ORPHANED_NAME: &str = "Other Files";

/// Index of a node inside its [`DriveGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

const MAIN: NodeId = NodeId(0);
const ORPHANED: NodeId = NodeId(1);

/// One element of the drive graph
///
/// Folders always carry a (possibly empty) child list; every other node has
/// none, so "leaf" and "empty folder" stay distinguishable.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    name: String,
    mime_type: String,
    record: Option<Arc<Record>>,
    children: Option<Vec<NodeId>>,
    parents: Vec<NodeId>,
    link_target: Option<NodeId>,
}

impl Node {
    fn synthetic(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            record: None,
            children: Some(Vec::new()),
            parents: Vec::new(),
            link_target: None,
        }
    }

    fn from_record(record: Record) -> Self {
        let children = record.is_folder().then(Vec::new);
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            mime_type: record.mime_type.clone(),
            record: Some(Arc::new(record)),
            children,
            parents: Vec::with_capacity(1),
            link_target: None,
        }
    }

    /// Remote id (empty for the orphaned root)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Source record; `None` for the synthetic roots
    pub fn record(&self) -> Option<&Arc<Record>> {
        self.record.as_ref()
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn is_shortcut(&self) -> bool {
        self.mime_type == SHORTCUT_MIME_TYPE
    }

    /// Sorted children; `None` for non-folders
    pub fn children(&self) -> Option<&[NodeId]> {
        self.children.as_deref()
    }

    /// Sorted parents
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Resolved shortcut target, if this node is a shortcut whose target exists
    pub fn link_target(&self) -> Option<NodeId> {
        self.link_target
    }
}

/// Builds a [`DriveGraph`] from flat records
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    main_name: String,
    orphaned_name: String,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            main_name: DEFAULT_MAIN_NAME.to_string(),
            orphaned_name: DEFAULT_ORPHANED_NAME.to_string(),
        }
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name of the main root
    #[must_use]
    pub fn main_name(mut self, name: impl Into<String>) -> Self {
        self.main_name = name.into();
        self
    }

    /// Sets the display name of the orphaned root
    #[must_use]
    pub fn orphaned_name(mut self, name: impl Into<String>) -> Self {
        self.orphaned_name = name.into();
        self
    }

    /// Builds the graph rooted at `root_id`
    pub fn build(&self, root_id: &str, records: Vec<Record>) -> DriveGraph {
        let mut nodes = Vec::with_capacity(records.len() + 2);
        nodes.push(Node::synthetic(root_id, &self.main_name));
        nodes.push(Node::synthetic("", &self.orphaned_name));

        let mut index: HashMap<String, NodeId> = HashMap::with_capacity(records.len() + 1);
        index.insert(root_id.to_string(), MAIN);

        for record in records {
            if record.id == root_id {
                debug!(id = %record.id, "Root record replaced by synthetic root");
                continue;
            }
            if index.contains_key(&record.id) {
                warn!(id = %record.id, name = %record.name, "Duplicate record id, keeping first");
                continue;
            }
            index.insert(record.id.clone(), NodeId(nodes.len()));
            nodes.push(Node::from_record(record));
        }

        resolve_shortcuts(&mut nodes, &index);
        connect_parents(&mut nodes, &index);
        attach_unreachable(&mut nodes);
        sort_edges(&mut nodes);

        debug!(
            nodes = nodes.len() - 2,
            main_children = child_count(&nodes[MAIN.0]),
            orphaned_children = child_count(&nodes[ORPHANED.0]),
            "Drive graph built"
        );

        DriveGraph { nodes, index }
    }
}

fn child_count(node: &Node) -> usize {
    node.children.as_ref().map_or(0, Vec::len)
}

fn resolve_shortcuts(nodes: &mut [Node], index: &HashMap<String, NodeId>) {
    for node in nodes.iter_mut().filter(|n| n.is_shortcut()) {
        let target = node
            .record
            .as_ref()
            .and_then(|r| r.shortcut_target_id.as_deref())
            .and_then(|target_id| index.get(target_id))
            .copied();
        if target.is_none() {
            debug!(id = %node.id, name = %node.name, "Shortcut target not found");
        }
        node.link_target = target;
    }
}

fn connect_parents(nodes: &mut [Node], index: &HashMap<String, NodeId>) {
    let mut edges = Vec::with_capacity(nodes.len());

    for (i, node) in nodes.iter().enumerate().skip(2) {
        let child = NodeId(i);
        let mut seen = HashSet::new();
        let mut found = false;

        let parent_ids = node.record.iter().flat_map(|r| r.parents.iter());
        for parent_id in parent_ids {
            if !seen.insert(parent_id.as_str()) {
                continue;
            }
            match index.get(parent_id) {
                Some(&parent) if nodes[parent.0].is_folder() => {
                    edges.push((parent, child));
                    found = true;
                }
                _ => {}
            }
        }

        if !found {
            edges.push((ORPHANED, child));
        }
    }

    for (parent, child) in edges {
        link(nodes, parent, child);
    }
}

fn link(nodes: &mut [Node], parent: NodeId, child: NodeId) {
    if let Some(children) = nodes[parent.0].children.as_mut() {
        children.push(child);
    }
    nodes[child.0].parents.push(parent);
}

/// Attaches folder cycles that neither root can reach
fn attach_unreachable(nodes: &mut [Node]) {
    let mut reachable = vec![false; nodes.len()];
    mark_reachable(nodes, MAIN, &mut reachable);
    mark_reachable(nodes, ORPHANED, &mut reachable);

    let mut stranded: Vec<NodeId> = (2..nodes.len())
        .filter(|&i| !reachable[i])
        .map(NodeId)
        .collect();
    stranded.sort_by(|a, b| nodes[a.0].id.cmp(&nodes[b.0].id));

    for start in stranded {
        if reachable[start.0] {
            continue;
        }
        let anchor = cycle_anchor(nodes, start);
        debug!(id = %nodes[anchor.0].id, "Attaching unreachable cycle to orphaned root");
        link(nodes, ORPHANED, anchor);
        mark_reachable(nodes, anchor, &mut reachable);
    }
}

/// Climbs first parents from `start` until a node repeats and returns the
/// smallest id on that cycle.
///
/// Every parent of an unreachable node is itself unreachable, so the climb
/// always ends on a cycle.
fn cycle_anchor(nodes: &[Node], start: NodeId) -> NodeId {
    let mut trail = Vec::new();
    let mut position = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&at) = position.get(&current) {
            return trail[at..]
                .iter()
                .copied()
                .min_by(|a: &NodeId, b: &NodeId| nodes[a.0].id.cmp(&nodes[b.0].id))
                .unwrap_or(current);
        }
        position.insert(current, trail.len());
        trail.push(current);
        match nodes[current.0].parents.first() {
            Some(&parent) => current = parent,
            None => return current,
        }
    }
}

fn mark_reachable(nodes: &[Node], from: NodeId, reachable: &mut [bool]) {
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if std::mem::replace(&mut reachable[current.0], true) {
            continue;
        }
        if let Some(children) = &nodes[current.0].children {
            stack.extend(children.iter().filter(|c| !reachable[c.0]));
        }
    }
}

fn sort_edges(nodes: &mut [Node]) {
    let keys: Vec<(String, String)> = nodes
        .iter()
        .map(|n| (sanitize_name(&n.name), n.id.clone()))
        .collect();
    let by_key = |a: &NodeId, b: &NodeId| -> Ordering { keys[a.0].cmp(&keys[b.0]) };

    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            children.sort_by(by_key);
        }
        node.parents.sort_by(by_key);
    }
}

/// Immutable drive graph with its two roots
#[derive(Debug, Clone)]
pub struct DriveGraph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl DriveGraph {
    /// Builds a graph with the default root names
    pub fn build(root_id: &str, records: Vec<Record>) -> Self {
        GraphBuilder::default().build(root_id, records)
    }

    /// Root of the user's drive
    pub fn main(&self) -> NodeId {
        MAIN
    }

    /// Root collecting everything unreachable from [`main`](Self::main)
    pub fn orphaned(&self) -> NodeId {
        ORPHANED
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Looks up a node by remote id
    pub fn find(&self, remote_id: &str) -> Option<NodeId> {
        self.index.get(remote_id).copied()
    }

    /// Number of nodes, including both synthetic roots
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }

    /// Lazy breadth-first walk of the tree under `root`
    pub fn walk(&self, root: NodeId) -> Walk<'_> {
        Walk::new(self, root)
    }

    /// Calls `visit` for every `(path, node)` of the walk, stopping at the
    /// first error
    pub fn walk_with<E, F>(&self, root: NodeId, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&str, &Node) -> Result<(), E>,
    {
        for (path, node) in self.walk(root) {
            visit(&path, node)?;
        }
        Ok(())
    }
}

impl Index<NodeId> for DriveGraph {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
    }
}
