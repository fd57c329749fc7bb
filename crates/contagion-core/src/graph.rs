use crate::{GraphError, NodeId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Directed edge: `u` can influence / infect `v`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub u: NodeId, // source node id
    pub v: NodeId, // target node id
}

impl Edge {
    pub fn new(u: NodeId, v: NodeId) -> Self {
        Self { u, v }
    }
}

/// Population graph. Topology is fixed once constructed.
#[derive(Clone, Debug, Serialize)]
pub struct Graph {
    labels: Vec<String>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<String, NodeId>,
    #[serde(skip)]
    predecessors: Vec<Vec<NodeId>>,
    #[serde(skip)]
    successors: Vec<Vec<NodeId>>,
}

impl Graph {
    /// Build a graph from node labels and index-based edges.
    ///
    /// Rejects duplicate labels, duplicate edges, self-loops and
    /// out-of-range endpoints.
    pub fn new(labels: Vec<String>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), id).is_some() {
                return Err(GraphError::DuplicateLabel(label.clone()));
            }
        }

        let n = labels.len();
        let mut seen = HashSet::with_capacity(edges.len());
        for edge in &edges {
            for endpoint in [edge.u, edge.v] {
                if endpoint >= n {
                    return Err(GraphError::UnknownEndpoint(endpoint.to_string()));
                }
            }
            if edge.u == edge.v {
                return Err(GraphError::SelfLoop(labels[edge.u].clone()));
            }
            if !seen.insert(*edge) {
                return Err(GraphError::DuplicateEdge(
                    labels[edge.u].clone(),
                    labels[edge.v].clone(),
                ));
            }
        }

        let mut g = Self {
            labels,
            edges,
            index,
            predecessors: Vec::new(),
            successors: Vec::new(),
        };
        g.build_adjacency();
        Ok(g)
    }

    /// Build a directed graph from labelled edges.
    pub fn from_labeled_edges<S: AsRef<str>>(
        nodes: &[S],
        edges: &[(S, S)],
    ) -> Result<Self, GraphError> {
        let labels: Vec<String> = nodes.iter().map(|s| s.as_ref().to_string()).collect();
        let edges = {
            let lookup = label_lookup(&labels);
            edges
                .iter()
                .map(|(a, b)| Ok(Edge::new(lookup(a.as_ref())?, lookup(b.as_ref())?)))
                .collect::<Result<Vec<_>, GraphError>>()?
        };
        Self::new(labels, edges)
    }

    /// Build a directed graph from undirected pairs: every pair `{a, b}`
    /// becomes the two edges `a -> b` and `b -> a`. A pair listed in both
    /// orientations is the same undirected edge and is kept once.
    pub fn from_undirected<S: AsRef<str>>(
        nodes: &[S],
        pairs: &[(S, S)],
    ) -> Result<Self, GraphError> {
        let labels: Vec<String> = nodes.iter().map(|s| s.as_ref().to_string()).collect();
        let mut edges = Vec::with_capacity(pairs.len() * 2);
        {
            let lookup = label_lookup(&labels);
            let mut seen = HashSet::new();
            for (a, b) in pairs {
                let (u, v) = (lookup(a.as_ref())?, lookup(b.as_ref())?);
                if u == v {
                    return Err(GraphError::SelfLoop(a.as_ref().to_string()));
                }
                if seen.insert((u.min(v), u.max(v))) {
                    edges.push(Edge::new(u, v));
                    edges.push(Edge::new(v, u));
                }
            }
        }
        Self::new(labels, edges)
    }

    pub fn num_nodes(&self) -> usize {
        self.labels.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_ids(&self) -> std::ops::Range<NodeId> {
        0..self.labels.len()
    }

    pub fn node_id(&self, label: &str) -> Option<NodeId> {
        self.index.get(label).copied()
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Nodes with an edge into `v`
    pub fn predecessors(&self, v: NodeId) -> &[NodeId] {
        self.predecessors.get(v).map(|p| p.as_slice()).unwrap_or(&[])
    }

    /// Nodes that `u` has an edge into
    pub fn successors(&self, u: NodeId) -> &[NodeId] {
        self.successors.get(u).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn in_degree(&self, v: NodeId) -> usize {
        self.predecessors(v).len()
    }

    pub fn out_degree(&self, u: NodeId) -> usize {
        self.successors(u).len()
    }

    fn build_adjacency(&mut self) {
        let n = self.labels.len();
        let mut pred = vec![Vec::new(); n];
        let mut succ = vec![Vec::new(); n];

        for edge in &self.edges {
            succ[edge.u].push(edge.v);
            pred[edge.v].push(edge.u);
        }

        self.predecessors = pred;
        self.successors = succ;
    }

    /// Directed cycle `0 -> 1 -> ... -> n-1 -> 0`
    pub fn cycle(n: usize) -> Result<Self, GraphError> {
        let labels = (0..n).map(|i| i.to_string()).collect();
        let edges = (0..n).map(|i| Edge::new(i, (i + 1) % n)).collect();
        Self::new(labels, edges)
    }

    /// Symmetric ring lattice: every node linked both ways to its `k`
    /// nearest clockwise neighbours.
    pub fn ring_lattice(n: usize, k: usize) -> Result<Self, GraphError> {
        let labels = (0..n).map(|i| i.to_string()).collect();
        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for i in 0..n {
            for offset in 1..=k.min(n.saturating_sub(1) / 2) {
                let j = (i + offset) % n;
                if seen.insert((i.min(j), i.max(j))) {
                    edges.push(Edge::new(i, j));
                    edges.push(Edge::new(j, i));
                }
            }
        }

        Self::new(labels, edges)
    }
}

fn label_lookup(labels: &[String]) -> impl Fn(&str) -> Result<NodeId, GraphError> + '_ {
    let index: HashMap<&str, NodeId> = labels
        .iter()
        .enumerate()
        .map(|(id, label)| (label.as_str(), id))
        .collect();
    move |label| {
        index
            .get(label)
            .copied()
            .ok_or_else(|| GraphError::UnknownEndpoint(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_graph() {
        let g = Graph::cycle(5).unwrap();
        assert_eq!(g.num_nodes(), 5);
        assert_eq!(g.num_edges(), 5);

        for v in g.node_ids() {
            assert_eq!(g.in_degree(v), 1);
            assert_eq!(g.out_degree(v), 1);
        }
        assert_eq!(g.predecessors(0), &[4]);
        assert_eq!(g.successors(4), &[0]);
    }

    #[test]
    fn test_rejects_self_loop() {
        let err = Graph::from_labeled_edges(&["a", "b"], &[("a", "a")]).unwrap_err();
        assert_eq!(err, GraphError::SelfLoop("a".into()));
    }

    #[test]
    fn test_rejects_duplicate_edge() {
        let err = Graph::from_labeled_edges(&["a", "b"], &[("a", "b"), ("a", "b")]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateEdge("a".into(), "b".into()));

        // Opposite directions are distinct edges
        assert!(Graph::from_labeled_edges(&["a", "b"], &[("a", "b"), ("b", "a")]).is_ok());
    }

    #[test]
    fn test_rejects_unknown_endpoint() {
        let err = Graph::from_labeled_edges(&["a"], &[("a", "z")]).unwrap_err();
        assert_eq!(err, GraphError::UnknownEndpoint("z".into()));

        let err = Graph::new(vec!["a".into()], vec![Edge::new(0, 3)]).unwrap_err();
        assert_eq!(err, GraphError::UnknownEndpoint("3".into()));
    }

    #[test]
    fn test_rejects_duplicate_label() {
        let err = Graph::new(vec!["a".into(), "a".into()], vec![]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateLabel("a".into()));
    }

    #[test]
    fn test_undirected_expands_both_ways() {
        let g = Graph::from_undirected(&["x", "y", "z"], &[("x", "y"), ("y", "x"), ("y", "z")])
            .unwrap();
        assert_eq!(g.num_edges(), 4);

        let y = g.node_id("y").unwrap();
        assert_eq!(g.in_degree(y), 2);
        assert_eq!(g.out_degree(y), 2);
        assert_eq!(g.label(y), Some("y"));
    }

    #[test]
    fn test_ring_lattice() {
        let g = Graph::ring_lattice(10, 2).unwrap();
        for v in g.node_ids() {
            assert_eq!(g.in_degree(v), 4);
            assert_eq!(g.out_degree(v), 4);
        }
    }
}
