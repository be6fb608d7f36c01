//! Single-threaded owner of the current graph and everything derived from it.
//!
//! A new upload or configuration produces a brand new [`Graph`] and a freshly
//! created renderer; filter and view changes only re-derive the visible
//! subset and its layout.

use crate::builder::parse_relations_bytes;
use crate::config::{Config, ConfigLoad, ConfigPoll};
use crate::error::{ExportError, GraphError};
use crate::filter::{ViewState, VisibleGraph, apply_view, person_options, relation_options};
use crate::ir::{EdgeView, Graph, Node};
use crate::layout::{Layout, compute_layout};
use crate::render::render_svg;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Interactive display driven by the session.
pub trait Renderer {
    /// Releases the current instance, if any.
    fn destroy(&mut self);
    /// Starts a new instance for a freshly built graph.
    fn create(&mut self, layout: &Layout);
    /// Replaces the data of the live instance.
    fn update(&mut self, layout: &Layout);
}

/// Renderer for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn destroy(&mut self) {}
    fn create(&mut self, _layout: &Layout) {}
    fn update(&mut self, _layout: &Layout) {}
}

pub struct Session<R: Renderer> {
    config: Config,
    /// Last accepted input, kept so a configuration change can rebuild.
    source: Option<Vec<u8>>,
    graph: Graph,
    state: ViewState,
    visible: VisibleGraph,
    layout: Layout,
    renderer: R,
    pending_config: Option<ConfigLoad>,
    message: Option<String>,
}

impl<R: Renderer> Session<R> {
    pub fn new(config: Config, renderer: R) -> Self {
        Self {
            config,
            source: None,
            graph: Graph::new(),
            state: ViewState::default(),
            visible: VisibleGraph::default(),
            layout: Layout::default(),
            renderer,
            pending_config: None,
            message: None,
        }
    }

    /// Reads an override document in the background. Building never waits
    /// for it; see [`Session::poll_config`].
    pub fn start_config_load(&mut self, path: impl Into<PathBuf>) {
        self.pending_config = Some(ConfigLoad::spawn(path, Config::default()));
    }

    /// Applies a finished background load. Returns whether the
    /// configuration changed.
    pub fn poll_config(&mut self) -> bool {
        let Some(load) = self.pending_config.as_ref() else {
            return false;
        };
        match load.poll() {
            ConfigPoll::Pending => false,
            ConfigPoll::Unavailable => {
                self.pending_config = None;
                false
            }
            ConfigPoll::Loaded(config) => {
                self.pending_config = None;
                self.apply_config(config);
                true
            }
        }
    }

    /// Blocks on a pending background load, then applies it.
    pub fn finish_config_load(&mut self) -> bool {
        let Some(load) = self.pending_config.take() else {
            return false;
        };
        match load.wait() {
            Some(config) => {
                self.apply_config(config);
                true
            }
            None => false,
        }
    }

    /// Replaces the configuration, rebuilding the graph from the last input.
    pub fn apply_config(&mut self, config: Config) {
        self.config = config;
        if let Some(source) = self.source.take() {
            info!("configuration changed, rebuilding graph");
            // Failures are kept as the session message.
            let _ = self.load_csv(source);
        }
    }

    /// Builds a new graph from survey text.
    ///
    /// On failure the previous graph and display are cleared, never kept stale.
    pub fn load_csv(&mut self, input: impl Into<Vec<u8>>) -> Result<&Graph, GraphError> {
        let input = input.into();
        match parse_relations_bytes(&input, &self.config.relations) {
            Ok(graph) => {
                info!(
                    nodes = graph.nodes.len(),
                    edges = graph.edges_merged.len(),
                    "survey loaded"
                );
                self.graph = graph;
                self.source = Some(input);
                self.message = None;
                self.recreate();
                Ok(&self.graph)
            }
            Err(err) => {
                warn!(%err, "survey rejected");
                self.clear();
                self.message = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        self.graph = Graph::new();
        self.source = None;
        self.visible = VisibleGraph::default();
        self.layout = Layout::default();
        self.renderer.destroy();
    }

    pub fn set_view(&mut self, view: EdgeView) {
        self.state.set_view(view);
        self.refresh();
    }

    pub fn toggle_view(&mut self) {
        self.state.toggle_view();
        self.refresh();
    }

    pub fn set_person_filter<I, S>(&mut self, persons: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.persons = persons.into_iter().map(Into::into).collect();
        self.refresh();
    }

    pub fn set_relation_filter<I, S>(&mut self, relations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.relations = relations.into_iter().map(Into::into).collect();
        self.refresh();
    }

    fn derive(&mut self) {
        self.visible = apply_view(&self.graph, &self.state);
        self.layout = compute_layout(&self.visible, &self.config.layout);
    }

    fn recreate(&mut self) {
        self.derive();
        self.renderer.destroy();
        self.renderer.create(&self.layout);
        debug!(nodes = self.layout.nodes.len(), "renderer recreated");
    }

    fn refresh(&mut self) {
        self.derive();
        if !self.graph.nodes.is_empty() {
            self.renderer.update(&self.layout);
        }
    }

    pub fn export_svg(&self) -> String {
        render_svg(&self.layout, &self.config.theme, &self.config.export)
    }

    /// Rasterized export. Failures are recorded as the session message and
    /// leave the graph untouched.
    #[cfg(feature = "png")]
    pub fn export_png(&mut self) -> Result<Vec<u8>, ExportError> {
        let svg = self.export_svg();
        crate::render::render_png(&svg, self.config.export.clamped_png_scale()).inspect_err(|err| {
            self.message = Some(err.to_string());
        })
    }

    /// Records an export failure raised outside the session.
    pub fn report_export_error(&mut self, err: &ExportError) {
        self.message = Some(err.to_string());
    }

    pub fn person_options(&self) -> Vec<&Node> {
        person_options(&self.graph)
    }

    pub fn relation_options(&self) -> Vec<String> {
        relation_options(&self.graph, self.state.view, &self.config.relations)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn view_state(&self) -> &ViewState {
        &self.state
    }

    pub fn visible(&self) -> &VisibleGraph {
        &self.visible
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// User-facing message from the last failed load or export.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug, Default)]
    struct RecordingRenderer {
        events: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn destroy(&mut self) {
            self.events.push("destroy".to_string());
        }
        fn create(&mut self, layout: &Layout) {
            self.events.push(format!("create:{}", layout.nodes.len()));
        }
        fn update(&mut self, layout: &Layout) {
            self.events.push(format!("update:{}/{}", layout.nodes.len(), layout.edges.len()));
        }
    }

    const SURVEY: &str = "t,Nom,Alice,Bob,Carol\n1,Alice,,ami,haine\n2,Bob,Pote,,\n";

    fn session() -> Session<RecordingRenderer> {
        Session::new(Config::default(), RecordingRenderer::default())
    }

    #[test]
    fn new_graph_destroys_then_creates() {
        let mut s = session();
        s.load_csv(SURVEY).unwrap();
        s.load_csv(SURVEY).unwrap();
        assert_eq!(
            s.renderer().events,
            vec!["destroy", "create:3", "destroy", "create:3"]
        );
    }

    #[test]
    fn filters_update_without_rebuilding() {
        let mut s = session();
        s.load_csv(SURVEY).unwrap();
        let before = s.graph().clone();
        s.set_person_filter(["Bob"]);
        assert_eq!(s.graph(), &before);
        assert_eq!(s.layout().nodes.len(), 2);
        assert_eq!(s.renderer().events.last().unwrap(), "update:2/1");
        s.set_person_filter(Vec::<String>::new());
        s.set_relation_filter(["haine"]);
        assert_eq!(s.renderer().events.last().unwrap(), "update:3/1");
    }

    #[test]
    fn failed_load_clears_previous_graph() {
        let mut s = session();
        s.load_csv(SURVEY).unwrap();
        let err = s.load_csv("t,Nom,Bob\n1,Alice,\n").unwrap_err();
        assert!(err.is_empty_result());
        assert!(s.graph().nodes.is_empty());
        assert!(s.layout().nodes.is_empty());
        assert_eq!(s.message(), Some("No data found in the CSV."));
        assert_eq!(s.renderer().events.last().unwrap(), "destroy");

        s.load_csv(SURVEY).unwrap();
        assert_eq!(s.message(), None);
    }

    #[test]
    fn toggling_view_switches_labels_and_options() {
        let mut s = session();
        s.load_csv(SURVEY).unwrap();
        assert_eq!(s.relation_options(), vec!["ami", "haine"]);
        s.set_relation_filter(["ami"]);
        s.toggle_view();
        assert!(s.view_state().relations.is_empty());
        assert_eq!(s.relation_options(), vec!["ami", "haine", "Pote"]);
        assert_eq!(s.visible().edges.len(), 3);
    }

    #[test]
    fn config_change_rebuilds_from_last_input() {
        let mut s = session();
        s.load_csv(SURVEY).unwrap();
        let pote = |s: &Session<RecordingRenderer>| {
            s.graph()
                .edges_merged
                .iter()
                .find(|e| e.from == "Bob")
                .map(|e| e.label.clone())
        };
        assert_eq!(pote(&s).as_deref(), Some("pote"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"relationGroups": {{"ami": ["pote"]}}}}"#).unwrap();
        s.start_config_load(file.path());
        assert!(s.finish_config_load());
        assert_eq!(pote(&s).as_deref(), Some("ami"));
        assert_eq!(s.renderer().events.last().unwrap(), "create:3");
    }

    #[test]
    fn missing_config_keeps_defaults() {
        let mut s = session();
        s.start_config_load("/no/such/relation-config.json");
        assert!(!s.finish_config_load());
        assert_eq!(s.config().relations.hierarchy[0], "amour");
        assert!(!s.poll_config());
    }

    #[test]
    fn export_reflects_visible_subset() {
        let mut s = session();
        s.load_csv(SURVEY).unwrap();
        s.set_person_filter(["Alice"]);
        let svg = s.export_svg();
        assert_eq!(svg.matches("<circle ").count(), s.visible().nodes.len());
        assert_eq!(svg.matches("<line ").count(), s.visible().edges.len());
    }
}
