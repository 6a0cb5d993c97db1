//! Dependency connections between events.
//!
//! A [`ConnectionGraph`] is a directed multigraph over event identities,
//! drawn as dependency arrows by the rendering collaborator. It is
//! deliberately permissive: cycles, self-loops, duplicate edges and
//! opposite-direction pairs are all valid input — arrows are a display
//! concern, so no acyclicity is imposed here. Edge iteration is stable
//! insertion order, so repeated renders stack arrows identically.

use serde::{Deserialize, Serialize};

use crate::models::EventId;

/// One directed dependency arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: EventId,
    pub target: EventId,
}

/// Directed multigraph of dependency arrows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionGraph {
    edges: Vec<Connection>,
}

impl ConnectionGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an edge. Never fails: duplicates, reverses, self-loops and
    /// cycles are retained as-is.
    pub fn add_edge(&mut self, source: EventId, target: EventId) {
        self.edges.push(Connection { source, target });
    }

    /// Removes every edge where `id` is source or target. Called when the
    /// event is deleted so no edge list keeps a dangling reference.
    pub fn remove_edges_touching(&mut self, id: EventId) {
        self.edges.retain(|c| c.source != id && c.target != id);
    }

    /// Targets of edges leaving `id`, in insertion order.
    pub fn edges_from(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        self.edges
            .iter()
            .filter(move |c| c.source == id)
            .map(|c| c.target)
    }

    /// Sources of edges arriving at `id`, in insertion order.
    pub fn edges_to(&self, id: EventId) -> impl Iterator<Item = EventId> + '_ {
        self.edges
            .iter()
            .filter(move |c| c.target == id)
            .map(|c| c.source)
    }

    /// Whether at least one `source -> target` edge exists.
    pub fn has_edge(&self, source: EventId, target: EventId) -> bool {
        self.edges
            .iter()
            .any(|c| c.source == source && c.target == target)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> &[Connection] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_direction_edges_both_persist() {
        let (x, y) = (EventId::new(), EventId::new());
        let mut graph = ConnectionGraph::new();
        graph.add_edge(x, y);
        graph.add_edge(y, x);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edges_from(x).collect::<Vec<_>>(), vec![y]);
        assert_eq!(graph.edges_to(x).collect::<Vec<_>>(), vec![y]);
    }

    #[test]
    fn test_duplicates_and_self_loops_retained() {
        let (a, b) = (EventId::new(), EventId::new());
        let mut graph = ConnectionGraph::new();
        graph.add_edge(a, b);
        graph.add_edge(a, b);
        graph.add_edge(a, a);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edges_from(a).collect::<Vec<_>>(), vec![b, b, a]);
        assert!(graph.has_edge(a, a));
    }

    #[test]
    fn test_remove_edges_touching_prunes_both_directions() {
        let (a, b, c) = (EventId::new(), EventId::new(), EventId::new());
        let mut graph = ConnectionGraph::new();
        graph.add_edge(a, b);
        graph.add_edge(b, a);
        graph.add_edge(b, c);
        graph.add_edge(c, a);

        graph.remove_edges_touching(a);

        assert_eq!(graph.edges_from(a).count(), 0);
        assert_eq!(graph.edges_to(a).count(), 0);
        // Unrelated edge survives.
        assert_eq!(graph.edges(), &[Connection { source: b, target: c }]);
    }

    #[test]
    fn test_iteration_is_insertion_order() {
        let (a, b, c) = (EventId::new(), EventId::new(), EventId::new());
        let mut graph = ConnectionGraph::new();
        graph.add_edge(a, c);
        graph.add_edge(a, b);
        assert_eq!(graph.edges_from(a).collect::<Vec<_>>(), vec![c, b]);
    }
}
