//! Global subscriber installation
//!
//! Kept in one test: the subscriber is process-wide.

use dfdraw::core::logging::{init_logging, LogFormat};
use dfdraw::prelude::*;

#[test]
fn test_logging_initializes_once_and_rejects_bad_format() {
    assert!(init_logging(Some("debug"), Some("xml")).is_err());

    init_logging(Some("trace"), Some("json")).unwrap();
    // operations log through the installed subscriber
    let mut ids = SequentialIds::new();
    let (graph, _) = Graph::new().add_node(NodeKind::Entity, NodeFields::default(), &mut ids);
    let mut scene = SceneHandle::mount(SceneConfig::default());
    scene.render(&graph, false);
    scene.unmount();

    assert!(init_logging(Some("info"), Some("compact")).is_err());
    assert_eq!(LogFormat::variants(), &["compact", "pretty", "json"]);
}
