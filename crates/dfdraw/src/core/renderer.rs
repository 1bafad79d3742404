//! Renderer trait for diagram output
//!
//! A renderer turns a graph snapshot into an output artifact (SVG markup,
//! PNG bytes). Implementations live in [`crate::scene::export`].

use super::{DfdError, Graph};

/// Core trait for diagram renderers
///
/// # Example
/// ```
/// use dfdraw::core::{Graph, Renderer};
/// use dfdraw::scene::SvgRenderer;
///
/// let renderer = SvgRenderer::new();
/// let svg = renderer.render(&Graph::new()).unwrap();
/// assert!(svg.starts_with("<svg"));
/// ```
pub trait Renderer: Send + Sync {
    /// The output type of this renderer
    type Output;

    /// Render the graph into the output format
    fn render(&self, graph: &Graph) -> Result<Self::Output, DfdError>;

    /// Get the name of this renderer
    fn name(&self) -> &'static str;

    /// Get the supported output format
    fn format(&self) -> &'static str;
}
