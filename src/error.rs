//! Error types surfaced to callers of the graph pipeline.

use thiserror::Error;

/// Failures while turning survey text into a [`Graph`](crate::ir::Graph).
///
/// Both variants are displayed the same way to end users (the previous graph
/// is cleared) but stay distinct so callers can tell them apart.
#[derive(Error, Debug)]
pub enum GraphError {
    /// The input could not be tokenized as tabular text.
    #[error("Unable to read the CSV: unrecognized format.")]
    Parse(#[from] csv::Error),

    /// The input parsed but produced no nodes or no edges.
    #[error("No data found in the CSV.")]
    Empty,
}

impl GraphError {
    pub fn is_empty_result(&self) -> bool {
        matches!(self, GraphError::Empty)
    }
}

/// Failures while composing or writing an exported image.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export failed: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "png")]
    #[error("SVG export could not be rasterized: {0}")]
    Svg(#[from] usvg::Error),

    #[error("failed to allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
