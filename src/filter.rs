use crate::config::RelationConfig;
use crate::ir::{Edge, EdgeView, Graph, Node};
use crate::relation::compare_labels;
use indexmap::IndexSet;
use std::collections::{BTreeSet, HashSet};

/// Transient display selections. Changing them never touches the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub view: EdgeView,
    /// Source persons to keep. Empty keeps everyone.
    pub persons: BTreeSet<String>,
    /// Edge labels to keep. Empty keeps every label.
    pub relations: BTreeSet<String>,
}

impl ViewState {
    /// Switches between merged and raw labels. The relation selection is
    /// cleared since the two views use different label sets.
    pub fn set_view(&mut self, view: EdgeView) {
        if self.view != view {
            self.view = view;
            self.relations.clear();
        }
    }

    pub fn toggle_view(&mut self) {
        let next = match self.view {
            EdgeView::Merged => EdgeView::Raw,
            EdgeView::Raw => EdgeView::Merged,
        };
        self.set_view(next);
    }
}

/// Nodes and edges left after filtering, in graph order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

pub fn apply_view(graph: &Graph, state: &ViewState) -> VisibleGraph {
    let mut edges: Vec<Edge> = graph.edges(state.view).to_vec();
    let mut nodes: Vec<Node> = graph.nodes.clone();

    if !state.persons.is_empty() {
        edges.retain(|edge| state.persons.contains(&edge.from));
        let referenced: HashSet<&str> = edges
            .iter()
            .flat_map(|edge| [edge.from.as_str(), edge.to.as_str()])
            .collect();
        nodes.retain(|node| referenced.contains(node.id.as_str()));
    }

    // Nodes stay put under the relation filter, even when left without edges.
    if !state.relations.is_empty() {
        edges.retain(|edge| state.relations.contains(&edge.label));
    }

    VisibleGraph { nodes, edges }
}

/// Persons offered for selection, sorted by label.
pub fn person_options(graph: &Graph) -> Vec<&Node> {
    let mut nodes: Vec<&Node> = graph.nodes.iter().collect();
    nodes.sort_by(|a, b| compare_labels(&a.label, &b.label));
    nodes
}

/// Labels offered for selection in the given view.
///
/// Merged: hierarchy categories present in the graph, in hierarchy order.
/// Raw: every distinct label, sorted; labels equal up to case and accents
/// stay in first-seen order.
pub fn relation_options(graph: &Graph, view: EdgeView, relations: &RelationConfig) -> Vec<String> {
    match view {
        EdgeView::Merged => {
            let present: HashSet<&str> =
                graph.edges_merged.iter().map(|edge| edge.label.as_str()).collect();
            relations
                .hierarchy
                .iter()
                .filter(|category| present.contains(category.as_str()))
                .cloned()
                .collect()
        }
        EdgeView::Raw => {
            let mut labels: Vec<String> = graph
                .edges_raw
                .iter()
                .map(|edge| edge.label.clone())
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect();
            labels.sort_by(|a, b| compare_labels(a, b));
            labels
        }
    }
}
