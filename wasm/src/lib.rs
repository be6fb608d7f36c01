use relation_graph::config::ConfigFile;
use relation_graph::layout_dump::write_graph_dump;
use relation_graph::{Config, EdgeView, ViewState, apply_view, compute_layout, parse_relations, render_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphOptions {
    /// "raw" shows original labels; anything else the merged categories.
    view: Option<String>,
    #[serde(default)]
    persons: Vec<String>,
    #[serde(default)]
    relations: Vec<String>,
    /// Relation config document, same shape as relation-config.json.
    config: Option<serde_json::Value>,
}

fn parse_options(options_json: Option<String>) -> Result<GraphOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str(&raw).map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(GraphOptions::default()),
    }
}

fn build_config(options: &GraphOptions) -> Result<Config, String> {
    let config = Config::default();
    match &options.config {
        Some(value) => {
            let file = ConfigFile::parse(&value.to_string()).map_err(|error| error.to_string())?;
            Ok(config.merge_file(file))
        }
        None => Ok(config),
    }
}

fn build_view_state(options: &GraphOptions) -> ViewState {
    let mut state = ViewState::default();
    if options.view.as_deref() == Some("raw") {
        state.set_view(EdgeView::Raw);
    }
    state.persons = options.persons.iter().cloned().collect();
    state.relations = options.relations.iter().cloned().collect();
    state
}

fn render(csv: &str, options: &GraphOptions) -> Result<String, String> {
    let config = build_config(options)?;
    let graph = parse_relations(csv, &config.relations).map_err(|error| error.to_string())?;
    let visible = apply_view(&graph, &build_view_state(options));
    let layout = compute_layout(&visible, &config.layout);
    Ok(render_svg(&layout, &config.theme, &config.export))
}

fn dump(csv: &str, options: &GraphOptions) -> Result<String, String> {
    let config = build_config(options)?;
    let graph = parse_relations(csv, &config.relations).map_err(|error| error.to_string())?;
    let mut out = Vec::new();
    write_graph_dump(&mut out, &graph, None).map_err(|error| error.to_string())?;
    String::from_utf8(out).map_err(|error| error.to_string())
}

/// Renders survey CSV text to SVG after applying the view and filters.
#[wasm_bindgen]
pub fn render_relations_svg(csv: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    render(csv, &options).map_err(|error| JsValue::from_str(&error))
}

/// Returns the graph with both edge views as JSON, for hosts doing their
/// own drawing.
#[wasm_bindgen]
pub fn parse_relations_json(csv: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json)?;
    dump(csv, &options).map_err(|error| JsValue::from_str(&error))
}
