use crate::config::LayoutConfig;
use crate::filter::VisibleGraph;
use crate::ir::{Edge, Node};
use std::collections::HashMap;
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
}

impl NodeLayout {
    fn place(node: &Node, (x, y): (f32, f32)) -> Self {
        Self {
            id: node.id.clone(),
            label: node.label.clone(),
            x,
            y,
        }
    }
}

/// Positioned nodes plus the edges drawn between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<Edge>,
}

impl Layout {
    /// Placed nodes by id, built once per pass over edges.
    pub fn positions(&self) -> HashMap<&str, &NodeLayout> {
        self.nodes.iter().map(|node| (node.id.as_str(), node)).collect()
    }
}

pub fn circle_radius(count: usize, config: &LayoutConfig) -> f32 {
    config.min_radius.max(count as f32 * config.radius_per_node)
}

/// Evenly spaced points on a circle centered at the origin, starting on the
/// positive x axis. No points for an empty sequence.
pub fn circular_positions(count: usize, config: &LayoutConfig) -> Vec<(f32, f32)> {
    if count == 0 {
        return Vec::new();
    }
    let radius = f64::from(circle_radius(count, config));
    let step = TAU / count as f64;
    (0..count)
        .map(|idx| {
            let angle = idx as f64 * step;
            ((radius * angle.cos()) as f32, (radius * angle.sin()) as f32)
        })
        .collect()
}

/// Lays out the visible nodes from scratch; only their order and count
/// matter.
pub fn compute_layout(visible: &VisibleGraph, config: &LayoutConfig) -> Layout {
    let positions = circular_positions(visible.nodes.len(), config);
    let nodes = visible
        .nodes
        .iter()
        .zip(positions)
        .map(|(node, point)| NodeLayout::place(node, point))
        .collect();
    Layout {
        nodes,
        edges: visible.edges.clone(),
    }
}
