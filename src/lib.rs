pub mod builder;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod header;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod relation;
pub mod render;
pub mod session;
pub mod theme;

pub use builder::{build_graph, parse_relations};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, ExportConfig, LayoutConfig, RelationConfig};
pub use error::{ExportError, GraphError};
pub use filter::{ViewState, VisibleGraph, apply_view};
pub use ir::{Edge, EdgeView, Graph, Node};
pub use layout::{Layout, compute_layout};
pub use render::render_svg;
pub use session::{NullRenderer, Renderer, Session};
pub use theme::Theme;

/// Builds, filters, lays out and renders survey text in one call.
pub fn render_relations_svg(
    input: &str,
    config: &Config,
    state: &ViewState,
) -> Result<String, GraphError> {
    let graph = parse_relations(input, &config.relations)?;
    let visible = apply_view(&graph, state);
    let layout = compute_layout(&visible, &config.layout);
    Ok(render_svg(&layout, &config.theme, &config.export))
}
