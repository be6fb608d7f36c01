use crate::theme::Theme;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use tracing::{debug, info};

/// File looked up next to the input when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "relation-config.json";

/// Color used for categories missing from the color table.
pub const FALLBACK_COLOR: &str = "#808080";

const DEFAULT_HIERARCHY: [&str; 12] = [
    "amour",
    "meilleur ami",
    "ami ++",
    "ami",
    "entre ami et neutre",
    "neutre",
    "entre neutre et haine",
    "haine",
    "dégoût",
    "famille",
    "famille conjoint",
    "connaît pas",
];

const DEFAULT_COLORS: [(&str, &str); 12] = [
    ("amour", "#FF00DC"),
    ("meilleur ami", "#0026FF"),
    ("ami ++", "#5A8CFF"),
    ("ami", "#00AA00"),
    ("entre ami et neutre", "#AAAA00"),
    ("neutre", "#808080"),
    ("entre neutre et haine", "#FF8800"),
    ("haine", "#FF0000"),
    ("dégoût", "#A80000"),
    ("famille", "#00FFD0"),
    ("famille conjoint", "#00FFF0"),
    ("connaît pas", "#C0C0C0"),
];

/// Relation categories, their colors and the synonym groups folded into them.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationConfig {
    /// Most favorable category first.
    pub hierarchy: Vec<String>,
    pub colors: BTreeMap<String, String>,
    /// Canonical category -> free-text variants, in document order.
    pub relation_groups: IndexMap<String, Vec<String>>,
}

impl RelationConfig {
    pub fn color_for(&self, category: &str) -> &str {
        self.colors
            .get(category)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            hierarchy: DEFAULT_HIERARCHY.iter().map(|value| value.to_string()).collect(),
            colors: DEFAULT_COLORS
                .iter()
                .map(|(category, color)| (category.to_string(), color.to_string()))
                .collect(),
            // No synonym folding until an external document provides groups.
            relation_groups: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub min_radius: f32,
    pub radius_per_node: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_radius: 250.0,
            radius_per_node: 25.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub margin: f32,
    pub node_radius: f32,
    /// Canvas size used when there is nothing to bound.
    pub default_width: f32,
    pub default_height: f32,
    pub edge_label_offset: f32,
    pub node_label_offset: f32,
    pub png_scale: u32,
}

impl ExportConfig {
    pub const MAX_PNG_SCALE: u32 = 10;

    pub fn clamped_png_scale(&self) -> u32 {
        self.png_scale.clamp(1, Self::MAX_PNG_SCALE)
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            margin: 60.0,
            node_radius: 22.0,
            default_width: 800.0,
            default_height: 600.0,
            edge_label_offset: 4.0,
            node_label_offset: 5.0,
            png_scale: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub relations: RelationConfig,
    pub layout: LayoutConfig,
    pub export: ExportConfig,
    pub theme: Theme,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    min_radius: Option<f32>,
    radius_per_node: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ExportConfigFile {
    margin: Option<f32>,
    node_radius: Option<f32>,
    png_scale: Option<u32>,
}

/// Override document. Every field is optional and replaces the matching
/// default on its own.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    hierarchy: Option<Vec<String>>,
    colors: Option<BTreeMap<String, String>>,
    relation_groups: Option<IndexMap<String, Vec<String>>>,
    theme: Option<String>,
    layout: Option<LayoutConfigFile>,
    export: Option<ExportConfigFile>,
}

impl ConfigFile {
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        match serde_json::from_str(contents) {
            Ok(parsed) => Ok(parsed),
            // Hand-edited files often carry comments or trailing commas.
            Err(json_err) => json5::from_str(contents)
                .map_err(|_| anyhow::anyhow!("invalid relation config: {json_err}")),
        }
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

impl Config {
    pub fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(hierarchy) = file.hierarchy {
            self.relations.hierarchy = hierarchy;
        }
        if let Some(colors) = file.colors {
            self.relations.colors = colors;
        }
        if let Some(groups) = file.relation_groups {
            self.relations.relation_groups = groups;
        }
        match file.theme.as_deref() {
            Some("dark") => self.theme = Theme::dark(),
            Some("classic") | Some("default") => self.theme = Theme::classic(),
            _ => {}
        }
        if let Some(layout) = file.layout {
            if let Some(v) = layout.min_radius {
                self.layout.min_radius = v;
            }
            if let Some(v) = layout.radius_per_node {
                self.layout.radius_per_node = v;
            }
        }
        if let Some(export) = file.export {
            if let Some(v) = export.margin {
                self.export.margin = v;
            }
            if let Some(v) = export.node_radius {
                self.export.node_radius = v;
            }
            if let Some(v) = export.png_scale {
                self.export.png_scale = v;
            }
        }
        self
    }
}

/// Loads an explicitly requested config file; errors are reported.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };
    let file = ConfigFile::read(path)?;
    info!(path = %path.display(), "relation config loaded");
    Ok(config.merge_file(file))
}

/// Outcome of polling a [`ConfigLoad`].
#[derive(Debug)]
pub enum ConfigPoll {
    Pending,
    Loaded(Config),
    /// Missing, unreadable, invalid, or cancelled. Keep the defaults.
    Unavailable,
}

/// Optional override document read off the caller's thread.
///
/// Cancelling (or dropping) the handle discards a result that arrives later.
pub struct ConfigLoad {
    receiver: Receiver<Option<Config>>,
    cancelled: Arc<AtomicBool>,
}

impl ConfigLoad {
    pub fn spawn(path: impl Into<PathBuf>, base: Config) -> Self {
        let path = path.into();
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            let loaded = match ConfigFile::read(&path) {
                Ok(file) => Some(base.merge_file(file)),
                Err(err) => {
                    debug!(path = %path.display(), %err, "relation config unavailable, using defaults");
                    None
                }
            };
            if !flag.load(Ordering::Acquire) {
                let _ = sender.send(loaded);
            }
        });
        Self {
            receiver,
            cancelled,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn poll(&self) -> ConfigPoll {
        if self.is_cancelled() {
            return ConfigPoll::Unavailable;
        }
        match self.receiver.try_recv() {
            Ok(Some(config)) => ConfigPoll::Loaded(config),
            Ok(None) | Err(TryRecvError::Disconnected) => ConfigPoll::Unavailable,
            Err(TryRecvError::Empty) => ConfigPoll::Pending,
        }
    }

    /// Blocks until the load settles.
    pub fn wait(self) -> Option<Config> {
        if self.is_cancelled() {
            return None;
        }
        let loaded = self.receiver.recv().ok().flatten();
        if self.is_cancelled() { None } else { loaded }
    }
}

impl Drop for ConfigLoad {
    fn drop(&mut self) {
        self.cancel();
    }
}
