use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::layout::{Layout, NodeLayout};
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

/// Axis-aligned box around the node centers.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    fn of(nodes: &[NodeLayout]) -> Option<Self> {
        let first = nodes.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for node in &nodes[1..] {
            bounds.min_x = bounds.min_x.min(node.x);
            bounds.min_y = bounds.min_y.min(node.y);
            bounds.max_x = bounds.max_x.max(node.x);
            bounds.max_y = bounds.max_y.max(node.y);
        }
        Some(bounds)
    }
}

/// Renders the visible graph as a standalone SVG document.
///
/// Coordinates are shifted so the bounding box's minimum corner lands at
/// `(margin, margin)`.
pub fn render_svg(layout: &Layout, theme: &Theme, config: &ExportConfig) -> String {
    let margin = config.margin;
    let (width, height, min_x, min_y) = match Bounds::of(&layout.nodes) {
        Some(b) => (
            (b.max_x - b.min_x) + margin * 2.0,
            (b.max_y - b.min_y) + margin * 2.0,
            b.min_x,
            b.min_y,
        ),
        None => (config.default_width, config.default_height, 0.0, 0.0),
    };
    let shift = |node: &NodeLayout| (node.x - min_x + margin, node.y - min_y + margin);

    let positions = layout.positions();

    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\" font-family=\"{}\">\n",
        escape_xml(&theme.font_family)
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        escape_xml(&theme.background)
    ));
    svg.push_str(&format!(
        "<defs><marker id=\"arrowhead\" markerWidth=\"12\" markerHeight=\"12\" refX=\"10\" refY=\"6\" orient=\"auto\" markerUnits=\"strokeWidth\"><path d=\"M0,0 L12,6 L0,12 z\" fill=\"{}\"/></marker></defs>\n",
        escape_xml(&theme.marker_color)
    ));

    for edge in &layout.edges {
        let (Some(from), Some(to)) = (
            positions.get(edge.from.as_str()).copied(),
            positions.get(edge.to.as_str()).copied(),
        ) else {
            continue;
        };
        let (sx, sy) = shift(from);
        let (tx, ty) = shift(to);
        let color = if edge.color.is_empty() {
            theme.line_color.as_str()
        } else {
            edge.color.as_str()
        };
        let color = escape_xml(color);
        svg.push_str(&format!(
            "<line x1=\"{sx:.2}\" y1=\"{sy:.2}\" x2=\"{tx:.2}\" y2=\"{ty:.2}\" stroke=\"{color}\" stroke-width=\"{}\" marker-end=\"url(#arrowhead)\"/>\n",
            theme.line_width
        ));
        if !edge.label.is_empty() {
            let mx = (sx + tx) / 2.0;
            let my = (sy + ty) / 2.0 - config.edge_label_offset;
            svg.push_str(&format!(
                "<text x=\"{mx:.2}\" y=\"{my:.2}\" font-size=\"{}\" text-anchor=\"middle\" fill=\"{color}\">{}</text>\n",
                theme.edge_font_size,
                escape_xml(&edge.label)
            ));
        }
    }

    for node in &layout.nodes {
        let (x, y) = shift(node);
        svg.push_str(&format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
            config.node_radius,
            escape_xml(&theme.node_fill),
            escape_xml(&theme.node_border_color),
            theme.node_border_width
        ));
        let label = if node.label.is_empty() { &node.id } else { &node.label };
        svg.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{:.2}\" font-size=\"{}\" text-anchor=\"middle\" fill=\"{}\">{}</text>\n",
            y + config.node_label_offset,
            theme.node_font_size,
            escape_xml(&theme.node_text_color),
            escape_xml(label)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Svg,
    Png { scale: u32 },
}

pub fn export_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// `graph_<ts>.svg`, `graph_<ts>.png`, or `graph_x<scale>_<ts>.png`.
pub fn export_file_name(format: ExportFormat, now: DateTime<Utc>) -> String {
    let ts = export_timestamp(now);
    match format {
        ExportFormat::Svg => format!("graph_{ts}.svg"),
        ExportFormat::Png { scale } if scale <= 1 => format!("graph_{ts}.png"),
        ExportFormat::Png { scale } => format!("graph_x{scale}_{ts}.png"),
    }
}

/// Resolves where an export goes: a directory gets a timestamped file name,
/// anything else is used as-is.
pub fn resolve_output_path(output: &Path, format: ExportFormat, now: DateTime<Utc>) -> PathBuf {
    if output.is_dir() {
        output.join(export_file_name(format, now))
    } else {
        output.to_path_buf()
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<(), ExportError> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
            info!(path = %path.display(), "svg written");
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Rasterizes an exported SVG at `scale` times its natural size.
#[cfg(feature = "png")]
pub fn render_png(svg: &str, scale: u32) -> Result<Vec<u8>, ExportError> {
    let scale = scale.clamp(1, ExportConfig::MAX_PNG_SCALE) as f32;
    let mut opt = usvg::Options::default();
    opt.font_family = "Arial".to_string();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let width = (size.width() as f32 * scale).ceil() as u32;
    let height = (size.height() as f32 * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or(ExportError::Pixmap { width, height })?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap
        .encode_png()
        .map_err(|err| ExportError::Encode(err.to_string()))
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, scale: u32) -> Result<(), ExportError> {
    let png = render_png(svg, scale)?;
    std::fs::write(output, png)?;
    info!(path = %output.display(), scale, "png written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::filter::VisibleGraph;
    use crate::ir::{Edge, Node};
    use crate::layout::compute_layout;
    use chrono::TimeZone;

    fn edge(from: &str, to: &str, label: &str, color: &str) -> Edge {
        Edge {
            from: from.to_string(),
            to: to.to_string(),
            label: label.to_string(),
            color: color.to_string(),
        }
    }

    fn layout_of(nodes: &[&str], edges: Vec<Edge>) -> Layout {
        let visible = VisibleGraph {
            nodes: nodes.iter().map(|id| Node::new(*id)).collect(),
            edges,
        };
        compute_layout(&visible, &LayoutConfig::default())
    }

    #[test]
    fn render_svg_basic() {
        let layout = layout_of(
            &["Alice", "Bob"],
            vec![edge("Alice", "Bob", "ami", "#00AA00")],
        );
        let svg = render_svg(&layout, &Theme::classic(), &ExportConfig::default());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<marker id=\"arrowhead\""));
        assert!(svg.contains("stroke=\"#00AA00\""));
        assert!(svg.contains(">ami</text>"));
        assert!(svg.contains(">Alice</text>"));
        assert!(svg.trim_end().ends_with("</svg>"));
        let marker = svg.find("<marker").unwrap();
        let line = svg.find("<line").unwrap();
        let circle = svg.find("<circle").unwrap();
        assert!(marker < line && line < circle);
    }

    #[test]
    fn canvas_wraps_bounding_box_with_margin() {
        // Two nodes at (250, 0) and (-250, 0).
        let layout = layout_of(&["A", "B"], Vec::new());
        let svg = render_svg(&layout, &Theme::classic(), &ExportConfig::default());
        assert!(svg.contains("width=\"620.00\""), "{svg}");
        assert!(svg.contains("viewBox=\"0 0 620.00 120.00\""), "{svg}");
        assert!(svg.contains("<circle cx=\"560.00\" cy=\"60.00\""), "{svg}");
        assert!(svg.contains("<circle cx=\"60.00\" cy=\"60.00\""), "{svg}");
    }

    #[test]
    fn empty_layout_uses_default_canvas() {
        let svg = render_svg(&Layout::default(), &Theme::classic(), &ExportConfig::default());
        assert!(svg.contains("viewBox=\"0 0 800.00 600.00\""));
        assert!(!svg.contains("<circle"));
        assert!(!svg.contains("<line"));
    }

    #[test]
    fn text_is_escaped() {
        let layout = layout_of(
            &["<Tom & \"Jerry\">", "O'Neil"],
            vec![edge("<Tom & \"Jerry\">", "O'Neil", "a<b>&\"c'", "#123")],
        );
        let svg = render_svg(&layout, &Theme::classic(), &ExportConfig::default());
        assert!(svg.contains("&lt;Tom &amp; &quot;Jerry&quot;&gt;"));
        assert!(svg.contains("O&apos;Neil"));
        assert!(svg.contains("a&lt;b&gt;&amp;&quot;c&apos;"));
        assert!(!svg.contains("<Tom"));
    }

    #[test]
    fn edges_without_positions_or_labels() {
        let layout = layout_of(
            &["A", "B"],
            vec![edge("A", "B", "", "#123"), edge("A", "Ghost", "ami", "#123")],
        );
        let svg = render_svg(&layout, &Theme::classic(), &ExportConfig::default());
        assert_eq!(svg.matches("<line ").count(), 1);
        // Only the two node labels.
        assert_eq!(svg.matches("<text ").count(), 2);
    }

    #[test]
    fn export_names_are_deterministic() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 8, 5, 9).unwrap();
        assert_eq!(
            export_file_name(ExportFormat::Svg, now),
            "graph_2026-10-15-08-05-09.svg"
        );
        assert_eq!(
            export_file_name(ExportFormat::Png { scale: 1 }, now),
            "graph_2026-10-15-08-05-09.png"
        );
        assert_eq!(
            export_file_name(ExportFormat::Png { scale: 3 }, now),
            "graph_x3_2026-10-15-08-05-09.png"
        );
    }

    #[test]
    fn directory_outputs_get_timestamped_names() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let path = resolve_output_path(dir.path(), ExportFormat::Svg, now);
        assert_eq!(path, dir.path().join("graph_2026-01-02-03-04-05.svg"));
        let file = dir.path().join("out.svg");
        assert_eq!(resolve_output_path(&file, ExportFormat::Svg, now), file);
    }

    #[test]
    fn large_layouts_draw_every_edge() {
        let ids: Vec<String> = (0..400).map(|i| format!("P{i}")).collect();
        let names: Vec<&str> = ids.iter().map(String::as_str).collect();
        let edges = (0..400)
            .map(|i| edge(&ids[i], &ids[(i * 7 + 1) % 400], "ami", "#00AA00"))
            .collect();
        let layout = layout_of(&names, edges);
        let svg = render_svg(&layout, &Theme::classic(), &ExportConfig::default());
        assert_eq!(svg.matches("<circle ").count(), 400);
        assert_eq!(svg.matches("<line ").count(), 400);
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_is_scaled() {
        let layout = layout_of(&["A", "B"], vec![edge("A", "B", "ami", "#00AA00")]);
        let svg = render_svg(&layout, &Theme::classic(), &ExportConfig::default());
        let png = render_png(&svg, 2).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        // IHDR width/height, big endian.
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        assert_eq!((width, height), (1240, 240));
    }
}
