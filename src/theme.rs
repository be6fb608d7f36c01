#[derive(Debug, Clone)]
pub struct Theme {
    pub font_family: String,
    pub node_font_size: f32,
    pub edge_font_size: f32,
    pub node_fill: String,
    pub node_border_color: String,
    pub node_text_color: String,
    pub marker_color: String,
    /// Stroke used for edges whose color is missing.
    pub line_color: String,
    pub line_width: f32,
    pub node_border_width: f32,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            node_font_size: 12.0,
            edge_font_size: 14.0,
            node_fill: "#ffffff".to_string(),
            node_border_color: "#333".to_string(),
            node_text_color: "#111".to_string(),
            marker_color: "#555".to_string(),
            line_color: "#999".to_string(),
            line_width: 2.0,
            node_border_width: 2.0,
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            node_font_size: 12.0,
            edge_font_size: 13.0,
            node_fill: "#1C2430".to_string(),
            node_border_color: "#C7D2E5".to_string(),
            node_text_color: "#F8FAFF".to_string(),
            marker_color: "#C7D2E5".to_string(),
            line_color: "#7A8AA6".to_string(),
            line_width: 2.0,
            node_border_width: 1.5,
            background: "#10151C".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
