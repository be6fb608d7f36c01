use crate::ir::{Edge, Graph};
use crate::layout::Layout;
use serde::Serialize;
use std::io::Write;

/// Graph in the shape handed to external renderers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDump<'a> {
    pub nodes: Vec<NodeDump<'a>>,
    pub edges_merged: &'a [Edge],
    pub edges_raw: &'a [Edge],
}

#[derive(Debug, Serialize)]
pub struct NodeDump<'a> {
    pub id: &'a str,
    pub label: &'a str,
    /// Only set for nodes placed by the current layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
}

impl<'a> GraphDump<'a> {
    pub fn new(graph: &'a Graph, layout: Option<&Layout>) -> Self {
        let positions = layout.map(Layout::positions).unwrap_or_default();
        let nodes = graph
            .nodes
            .iter()
            .map(|node| {
                let placed = positions.get(node.id.as_str());
                NodeDump {
                    id: &node.id,
                    label: &node.label,
                    x: placed.map(|p| p.x),
                    y: placed.map(|p| p.y),
                }
            })
            .collect();
        Self {
            nodes,
            edges_merged: &graph.edges_merged,
            edges_raw: &graph.edges_raw,
        }
    }
}

pub fn write_graph_dump<W: Write>(
    writer: W,
    graph: &Graph,
    layout: Option<&Layout>,
) -> anyhow::Result<()> {
    let dump = GraphDump::new(graph, layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
