//! Top-level rendering entry points

use dfdraw::prelude::*;
use dfdraw::{render_png, render_svg};

const DOC: &str = r#"{
    "title": "Orders",
    "externalEntities": [{"id": "E", "name": "Customer & Co"}],
    "processes": [{"id": "P1", "number": "1.1", "name": "Checkout", "description": "Takes payment"}],
    "dataStores": [{"id": "S1", "name": "Orders", "prefix": "D1"}],
    "dataFlows": [
        {"id": "F1", "sourceId": "E", "targetId": "P1", "label": "Order <new>", "protocol": "https"},
        {"id": "F2", "sourceId": "P1", "targetId": "S1", "label": "Save", "protocol": "sql", "isBidirectional": true},
        {"id": "F3", "sourceId": "P1", "targetId": "ghost", "label": "Lost"}
    ]
}"#;

#[test]
fn test_svg_escapes_text_and_skips_dangling_flows() {
    let svg = render_svg(DOC).unwrap();
    assert!(svg.contains("Customer &amp; Co"));
    assert!(svg.contains("Order &lt;new&gt;"));
    assert!(svg.contains("D1"));
    assert!(svg.contains("1.1"));
    assert!(svg.contains(r#"marker-start="url(#arrow-start-sql)""#));
    assert!(!svg.contains("Lost"));
}

#[test]
fn test_png_has_signature() {
    let png = render_png(DOC).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_invalid_document_is_an_error() {
    assert!(render_svg("not json").is_err());
}

#[test]
fn test_renderers_report_names_and_formats() {
    let svg = SvgRenderer::new();
    let png = PngRenderer::new();
    assert_eq!((svg.name(), svg.format()), ("svg", "image/svg+xml"));
    assert_eq!((png.name(), png.format()), ("png", "image/png"));
}

#[test]
fn test_describe_is_pure() {
    let graph = Graph::from_json(DOC).unwrap();
    let config = SceneConfig::default();
    let first = describe(&graph, &config, true);
    let second = describe(&graph, &config, true);
    assert_eq!(first, second);
    assert_eq!(first.nodes.len(), 3);
    assert_eq!(first.flows.len(), 2);
    assert!(first.edit_mode);
}
