use serde::{Deserialize, Serialize};

/// Which edge list a view draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeView {
    /// Canonical categories.
    #[default]
    Merged,
    /// Original label of the winning response.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
    /// Always derived from the canonical category, even in the raw view.
    pub color: String,
}

/// Persons plus both edge lists. Rebuilt wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// First-appearance order; layout depends on it.
    pub nodes: Vec<Node>,
    pub edges_merged: Vec<Edge>,
    pub edges_raw: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edges(&self, view: EdgeView) -> &[Edge] {
        match view {
            EdgeView::Merged => &self.edges_merged,
            EdgeView::Raw => &self.edges_raw,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || (self.edges_merged.is_empty() && self.edges_raw.is_empty())
    }
}
