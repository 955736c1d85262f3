//! Breadth-first, cycle-safe tree walk
//!
//! Every queued entry carries the chain of nodes visited on its own
//! root-to-entry path. A node already on that chain is dropped, which breaks
//! cycles without a global visited set: a node reachable through two
//! different parents is yielded once per path.
//!
//! Shortcuts are followed one level. The yielded node (and the one whose
//! children are enumerated) is the target, while the path segment keeps the
//! shortcut's own name.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use super::graph::{DriveGraph, Node, NodeId};
use super::path::{join_path, path_segment};

/// Persistent ancestor chain shared by all siblings of one parent
#[derive(Debug)]
struct Ancestry {
    node: NodeId,
    up: Option<Arc<Ancestry>>,
}

fn on_path(chain: &Option<Arc<Ancestry>>, node: NodeId) -> bool {
    let mut current = chain.as_deref();
    while let Some(link) = current {
        if link.node == node {
            return true;
        }
        current = link.up.as_deref();
    }
    false
}

fn extend(chain: Option<Arc<Ancestry>>, node: NodeId) -> Option<Arc<Ancestry>> {
    Some(Arc::new(Ancestry { node, up: chain }))
}

#[derive(Debug)]
struct Entry {
    node: NodeId,
    path: String,
    ancestry: Option<Arc<Ancestry>>,
}

/// Lazy walk yielding `(relative path, node)` pairs
///
/// Created by [`DriveGraph::walk`]. The root's path is its own sanitized
/// name; children follow in their sorted order.
#[derive(Debug)]
pub struct Walk<'g> {
    graph: &'g DriveGraph,
    queue: VecDeque<Entry>,
}

impl<'g> Walk<'g> {
    pub(crate) fn new(graph: &'g DriveGraph, root: NodeId) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(Entry {
            node: root,
            path: path_segment(graph[root].name()),
            ancestry: None,
        });
        Self { graph, queue }
    }
}

impl<'g> Iterator for Walk<'g> {
    type Item = (String, &'g Node);

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;

        while let Some(entry) = self.queue.pop_front() {
            if on_path(&entry.ancestry, entry.node) {
                trace!(path = %entry.path, "Dropping cyclic entry");
                continue;
            }

            let mut visited = entry.node;
            let mut ancestry = entry.ancestry;
            if let Some(target) = graph[entry.node].link_target() {
                if on_path(&ancestry, target) {
                    trace!(path = %entry.path, "Dropping shortcut to an ancestor");
                    continue;
                }
                ancestry = extend(ancestry, entry.node);
                visited = target;
            }

            let node = &graph[visited];
            if let Some(children) = node.children().filter(|c| !c.is_empty()) {
                let chain = extend(ancestry, visited);
                for &child in children {
                    self.queue.push_back(Entry {
                        node: child,
                        path: join_path(&entry.path, &path_segment(graph[child].name())),
                        ancestry: chain.clone(),
                    });
                }
            }

            return Some((entry.path, node));
        }

        None
    }
}
