//! SVG and PNG export of a mounted scene
//!
//! Standalone exports frame the content bounding box plus padding and ignore
//! the on-screen zoom. PNG output rasterizes the same SVG with `resvg`.

use std::fmt::Write;

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use tracing::{debug, info, span, Level};

use super::{flow_label_primitive, FlowVisual, NodeVisual, Primitive, SceneConfig, SceneHandle};
use crate::core::{Bounds, DfdError, Graph, Point, Renderer};

const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";
const BACKGROUND: &str = "#ffffff";
const HALO: &str = "#ffffff";

fn escape_xml(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn write_primitive(out: &mut String, primitive: &Primitive) -> std::fmt::Result {
    match primitive {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            rx,
            fill,
            stroke,
            stroke_width,
        } => writeln!(
            out,
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" rx="{rx}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        ),
        Primitive::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
        } => writeln!(
            out,
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        ),
        Primitive::Text {
            x,
            y,
            content,
            font_size,
            font_weight,
            fill,
            anchor,
        } => writeln!(
            out,
            r#"<text x="{x}" y="{y}" text-anchor="{}" dominant-baseline="central" font-family="{FONT_FAMILY}" font-size="{font_size}" font-weight="{font_weight}" fill="{fill}">{}</text>"#,
            anchor.as_str(),
            escape_xml(content)
        ),
    }
}

fn write_flow(out: &mut String, flow: &FlowVisual) -> std::fmt::Result {
    let (start, end) = (flow.route.start, flow.route.end);
    write!(
        out,
        r#"<g class="flow" data-id="{}"><path d="M{},{}L{},{}" fill="none" stroke="{}" stroke-width="{}" marker-end="url(#{})""#,
        escape_xml(&flow.id),
        start.x,
        start.y,
        end.x,
        end.y,
        flow.stroke,
        flow.stroke_width,
        flow.marker_end.id()
    )?;
    if let Some(marker) = &flow.marker_start {
        write!(out, r#" marker-start="url(#{})""#, marker.id())?;
    }
    out.push_str("/>");

    if let Primitive::Text {
        x,
        y,
        content,
        font_size,
        font_weight,
        fill,
        anchor,
    } = flow_label_primitive(flow)
    {
        write!(
            out,
            r#"<text x="{x}" y="{y}" text-anchor="{}" font-family="{FONT_FAMILY}" font-size="{font_size}" font-weight="{font_weight}" fill="{fill}" stroke="{HALO}" stroke-width="3" paint-order="stroke">{}</text>"#,
            anchor.as_str(),
            escape_xml(&content)
        )?;
    }
    writeln!(out, "</g>")
}

fn write_node(out: &mut String, node: &NodeVisual) -> std::fmt::Result {
    let Point { x, y } = node.frame.center;
    writeln!(
        out,
        r#"<g class="node {}" data-id="{}" transform="translate({x},{y})">"#,
        node.kind,
        escape_xml(&node.id)
    )?;
    for primitive in &node.primitives {
        write_primitive(out, primitive)?;
    }
    writeln!(out, "</g>")
}

fn write_body(out: &mut String, scene: &SceneHandle) -> std::fmt::Result {
    out.push_str("<defs>");
    for marker in scene.markers() {
        out.push_str(&marker.to_svg());
    }
    out.push_str("</defs>\n");

    writeln!(out, r#"<g class="links">"#)?;
    for flow in scene.flows() {
        write_flow(out, flow)?;
    }
    writeln!(out, "</g>")?;

    writeln!(out, r#"<g class="nodes">"#)?;
    for node in scene.nodes() {
        write_node(out, node)?;
    }
    writeln!(out, "</g>")
}

/// Content bounds inflated by `padding`; an empty scene frames the origin
pub fn export_bounds(scene: &SceneHandle, padding: f64) -> Bounds {
    scene
        .content_bounds()
        .unwrap_or_else(|| Bounds::at(Point::default()))
        .inflate(padding)
}

/// Standalone SVG of the scene with the configured export padding
pub fn to_svg(scene: &SceneHandle) -> Result<String, DfdError> {
    to_svg_padded(scene, scene.config().export_padding)
}

/// Standalone SVG of the scene framed with `padding` scene units
pub fn to_svg_padded(scene: &SceneHandle, padding: f64) -> Result<String, DfdError> {
    let bounds = export_bounds(scene, padding);
    let (width, height) = (bounds.width(), bounds.height());

    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="{} {} {width} {height}">"#,
        bounds.min_x, bounds.min_y
    )?;
    writeln!(
        out,
        r#"<rect x="{}" y="{}" width="{width}" height="{height}" fill="{BACKGROUND}"/>"#,
        bounds.min_x, bounds.min_y
    )?;
    write_body(&mut out, scene)?;
    out.push_str("</svg>\n");

    debug!(width, height, bytes = out.len(), "SVG exported");
    Ok(out)
}

/// SVG of the viewport as shown on screen, zoom transform included
pub fn to_live_svg(scene: &SceneHandle, width: f64, height: f64) -> Result<String, DfdError> {
    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
    )?;
    writeln!(out, r#"<g transform="{}">"#, scene.transform().to_svg())?;
    write_body(&mut out, scene)?;
    out.push_str("</g>\n</svg>\n");
    Ok(out)
}

/// Rasterize an SVG document at `scale` pixels per unit
pub fn rasterize(svg: &str, scale: f32) -> Result<Vec<u8>, DfdError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(DfdError::render_error(format!(
            "scale must be a positive number, got {scale}"
        )));
    }

    let mut options = usvg::Options::default();
    #[cfg(not(target_arch = "wasm32"))]
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|err| DfdError::render_error(format!("failed to parse generated SVG: {err}")))?;

    let size = tree.size().to_int_size();
    let scaled_width = (size.width() as f32 * scale).ceil();
    let scaled_height = (size.height() as f32 * scale).ceil();
    if scaled_width < 1.0 || scaled_height < 1.0 {
        return Err(DfdError::render_error(
            "scaled dimensions collapsed below 1px; try a larger scale factor",
        ));
    }
    if scaled_width > u32::MAX as f32 || scaled_height > u32::MAX as f32 {
        return Err(DfdError::render_error(
            "scaled dimensions exceed supported limits; try a smaller scale factor",
        ));
    }

    let (width, height) = (scaled_width as u32, scaled_height as u32);
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        DfdError::render_error(format!("failed to allocate {width}x{height} surface"))
    })?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|err| DfdError::render_error(format!("failed to encode PNG output: {err}")))
}

/// PNG of the scene at `scale` pixel density
pub fn to_png(scene: &SceneHandle, scale: f32) -> Result<Vec<u8>, DfdError> {
    let export_span = span!(Level::INFO, "export_png", scale = scale as f64);
    let _enter = export_span.enter();

    let png = rasterize(&to_svg(scene)?, scale)?;
    info!(bytes = png.len(), "PNG exported");
    Ok(png)
}

/// Renders a graph to a standalone SVG document
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    config: SceneConfig,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self { config }
    }
}

impl Renderer for SvgRenderer {
    type Output = String;

    fn render(&self, graph: &Graph) -> Result<String, DfdError> {
        let mut scene = SceneHandle::mount(self.config.clone());
        scene.render(graph, false);
        let svg = to_svg(&scene);
        scene.unmount();
        svg
    }

    fn name(&self) -> &'static str {
        "svg"
    }

    fn format(&self) -> &'static str {
        "image/svg+xml"
    }
}

/// Renders a graph to PNG bytes
#[derive(Debug, Clone, Default)]
pub struct PngRenderer {
    config: SceneConfig,
}

impl PngRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self { config }
    }
}

impl Renderer for PngRenderer {
    type Output = Vec<u8>;

    fn render(&self, graph: &Graph) -> Result<Vec<u8>, DfdError> {
        let mut scene = SceneHandle::mount(self.config.clone());
        scene.render(graph, false);
        let png = to_png(&scene, self.config.raster_scale);
        scene.unmount();
        png
    }

    fn name(&self) -> &'static str {
        "png"
    }

    fn format(&self) -> &'static str {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataFlow, Entity, Process, Protocol};

    fn scene() -> SceneHandle {
        let graph = Graph {
            external_entities: vec![Entity::new("E", "R&D <team>").at(0.0, 0.0)],
            processes: vec![Process::new("P1", "1", "Build").at(400.0, 0.0)],
            data_flows: vec![DataFlow::new("F1", "E", "P1", "specs")
                .with_protocol(Protocol::Https)
                .two_way()],
            ..Default::default()
        };
        let mut scene = SceneHandle::mount(SceneConfig::default());
        scene.render(&graph, false);
        scene
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }

    #[test]
    fn test_svg_contains_shapes_and_markers() {
        let svg = to_svg(&scene()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("R&amp;D &lt;team&gt;"));
        assert!(svg.contains(r#"marker-end="url(#arrow-end-https)""#));
        assert!(svg.contains(r#"marker-start="url(#arrow-start-https)""#));
        assert!(svg.contains(r#"<marker id="arrow-start-sql""#));
        // links are written before nodes
        assert!(svg.find("class=\"links\"").unwrap() < svg.find("class=\"nodes\"").unwrap());
    }

    #[test]
    fn test_svg_view_box_is_padded() {
        let scene = scene();
        let bounds = export_bounds(&scene, 60.0);
        // entity spans x -80..80, process ends at 490
        assert_eq!(bounds.min_x, -140.0);
        assert_eq!(bounds.max_x, 550.0);
        assert_eq!(bounds.min_y, -100.0);
        let svg = to_svg(&scene).unwrap();
        assert!(svg.contains("viewBox=\"-140 -100 690 200\""));
    }

    #[test]
    fn test_live_svg_applies_transform() {
        let mut scene = scene();
        scene.zoom_by(2.0, Point::default());
        let svg = to_live_svg(&scene, 800.0, 600.0).unwrap();
        assert!(svg.contains("scale(2)"));
    }

    #[test]
    fn test_rasterize_rejects_bad_scale() {
        let svg = to_svg(&scene()).unwrap();
        assert!(rasterize(&svg, 0.0).is_err());
        assert!(rasterize(&svg, f32::NAN).is_err());
    }

    #[test]
    fn test_png_signature_and_size() {
        let png = to_png(&scene(), 2.0).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        // IHDR width: 690 units at 2x
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        assert_eq!(width, 1380);
    }

    #[test]
    fn test_renderers() {
        let graph = Graph::new();
        let svg = SvgRenderer::new().render(&graph).unwrap();
        assert!(svg.contains("viewBox=\"-60 -60 120 120\""));
        let renderer = PngRenderer::new();
        assert_eq!(renderer.name(), "png");
        assert_eq!(renderer.format(), "image/png");
    }
}
