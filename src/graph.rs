//! Dependency Graph
//!
//! Directed graph over arena handles. Every edge insertion eagerly
//! re-resolves the subgraph rooted at the source node so that a cycle is
//! surfaced at the insertion that closes it, naming both offending nodes,
//! instead of at some later batch resolve.

use crate::arena::Handle;
use crate::error::GraphError;

/// Graph node wrapping a handle.
///
/// Holds a non-owning reference into the registry via `handle`; edges are
/// handles as well, so the graph never extends an object's lifetime.
#[derive(Debug)]
pub struct DependencyNode {
    handle: Handle,
    debug_name: String,
    edges: Vec<Handle>,
}

impl DependencyNode {
    fn new(handle: Handle, debug_name: String) -> Self {
        Self {
            handle,
            debug_name,
            edges: Vec::new(),
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// Outgoing edges in insertion order.
    pub fn edges(&self) -> &[Handle] {
        &self.edges
    }
}

/// Dependency graph indexed by handle slot.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<Option<DependencyNode>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node for a freshly issued handle.
    pub fn add_node(&mut self, handle: Handle, debug_name: impl Into<String>) {
        let index = handle.index() as usize;
        if index >= self.nodes.len() {
            self.nodes.resize_with(index + 1, || None);
        }
        self.nodes[index] = Some(DependencyNode::new(handle, debug_name.into()));
    }

    /// Look up a node by handle.
    pub fn node(&self, handle: Handle) -> Result<&DependencyNode, GraphError> {
        self.nodes
            .get(handle.index() as usize)
            .and_then(|n| n.as_ref())
            .ok_or(GraphError::UnknownNode {
                index: handle.index(),
            })
    }

    fn node_at(&self, index: usize) -> &DependencyNode {
        self.nodes[index]
            .as_ref()
            .expect("edge points at a registered node")
    }

    /// Add a dependency edge `from -> to`, then eagerly resolve the subgraph
    /// rooted at `from`.
    ///
    /// An edge that closes a cycle fails with `CircularDependency` naming
    /// the probing node and the node already on the resolve stack; the edge
    /// is unlinked again before returning, so the graph stays acyclic.
    pub fn add_edge(&mut self, from: Handle, to: Handle) -> Result<(), GraphError> {
        self.node(from)?;
        self.node(to)?;

        let from_index = from.index() as usize;
        self.nodes[from_index]
            .as_mut()
            .expect("node checked above")
            .edges
            .push(to);

        if let Err(err) = self.resolve_indices(from_index) {
            self.nodes[from_index]
                .as_mut()
                .expect("node checked above")
                .edges
                .pop();
            return Err(err);
        }
        Ok(())
    }

    /// Resolve the dependency order of the subgraph rooted at `root`.
    ///
    /// Returns nodes dependencies-first; the root itself is always the last
    /// element. Each reachable node appears exactly once.
    pub fn resolve_order(&self, root: Handle) -> Result<Vec<Handle>, GraphError> {
        self.node(root)?;
        let order = self.resolve_indices(root.index() as usize)?;
        Ok(order
            .into_iter()
            .map(|index| self.node_at(index).handle)
            .collect())
    }

    /// Iterative depth-first topological sort.
    ///
    /// `unresolved` mirrors the DFS stack; meeting an edge already on it
    /// means the edge closes a cycle.
    fn resolve_indices(&self, root: usize) -> Result<Vec<usize>, GraphError> {
        let mut resolved: Vec<usize> = Vec::new();
        let mut done = vec![false; self.nodes.len()];
        let mut unresolved: Vec<usize> = vec![root];
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some((node, cursor)) = stack.last_mut() {
            let node = *node;
            let edges = &self.node_at(node).edges;
            if *cursor < edges.len() {
                let edge = edges[*cursor].index() as usize;
                *cursor += 1;
                if done[edge] {
                    continue;
                }
                if unresolved.contains(&edge) {
                    return Err(GraphError::CircularDependency {
                        from: self.node_at(node).debug_name.clone(),
                        to: self.node_at(edge).debug_name.clone(),
                    });
                }
                unresolved.push(edge);
                stack.push((edge, 0));
            } else {
                resolved.push(node);
                done[node] = true;
                unresolved.pop();
                stack.pop();
            }
        }

        Ok(resolved)
    }
}
