use anyhow::Context;
use contagion_core::{Graph, GraphError};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Node identifier as written in a graph file: text or integer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeLabel {
    Text(String),
    Number(i64),
}

impl NodeLabel {
    fn into_string(self) -> String {
        match self {
            NodeLabel::Text(s) => s,
            NodeLabel::Number(n) => n.to_string(),
        }
    }
}

/// JSON graph description:
/// `{ "directed": true, "nodes": ["a", "b"], "edges": [["a", "b"]] }`
///
/// Undirected files are expanded to both edge directions. Endpoints not
/// listed under `nodes` are added in order of first appearance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphFile {
    #[serde(default = "default_directed")]
    pub directed: bool,
    #[serde(default)]
    pub nodes: Vec<NodeLabel>,
    pub edges: Vec<(NodeLabel, NodeLabel)>,
}

fn default_directed() -> bool {
    true
}

impl GraphFile {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Graph> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading graph file {}", path.display()))?;
        let file = Self::from_json(&json)
            .with_context(|| format!("parsing graph file {}", path.display()))?;
        Ok(file.into_graph()?)
    }

    pub fn into_graph(self) -> Result<Graph, GraphError> {
        let mut nodes: Vec<String> = self.nodes.into_iter().map(NodeLabel::into_string).collect();
        let edges: Vec<(String, String)> = self
            .edges
            .into_iter()
            .map(|(a, b)| (a.into_string(), b.into_string()))
            .collect();

        let mut known: std::collections::HashSet<String> = nodes.iter().cloned().collect();
        for (a, b) in &edges {
            for endpoint in [a, b] {
                if known.insert(endpoint.clone()) {
                    nodes.push(endpoint.clone());
                }
            }
        }

        if self.directed {
            Graph::from_labeled_edges(&nodes, &edges)
        } else {
            Graph::from_undirected(&nodes, &edges)
        }
    }
}
