//! dfdraw - layout, rendering and editing engine for data flow diagrams
//!
//! A data flow diagram has external entities, processes and data stores,
//! connected by labeled flows. This crate positions those nodes, clips flow
//! endpoints to node borders, keeps a live scene in sync with the graph and
//! turns pointer gestures into selection and position updates.
//!
//! # Quick Start
//!
//! ```rust
//! use dfdraw::render_svg;
//!
//! let json = r#"{
//!     "externalEntities": [{"id": "E", "name": "Customer"}],
//!     "processes": [{"id": "P1", "number": "1", "name": "Place Order"}],
//!     "dataFlows": [{"id": "F1", "sourceId": "E", "targetId": "P1", "label": "Order"}]
//! }"#;
//! let svg = render_svg(json).unwrap();
//! assert!(svg.contains("Place Order"));
//! ```
//!
//! # Editing
//!
//! ```rust
//! use dfdraw::prelude::*;
//!
//! let mut ids = SequentialIds::new();
//! let (graph, bank) = Graph::new().add_node(NodeKind::Entity, NodeFields::named("Bank"), &mut ids);
//! let (graph, ledger) = graph.add_node(NodeKind::Store, NodeFields::named("Ledger"), &mut ids);
//! let (graph, _) = graph.add_flow(&bank, &ledger, "Post", Protocol::Sql, &mut ids).unwrap();
//!
//! let mut scene = SceneHandle::mount(SceneConfig::default());
//! scene.render(&graph, true);
//! assert_eq!(scene.flows().count(), 1);
//! ```

pub mod bridge;
pub mod core;
pub mod proposer;
pub mod scene;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use crate::core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{SceneEvent, SceneListener, SelectedElement};
    pub use crate::core::{
        DataFlow, DataStore, DfdError, ElementPatch, Entity, Graph, IdGenerator, NodeFields,
        NodeKind, Point, Process, Protocol, Renderer, SequentialIds, UuidIds,
    };
    pub use crate::proposer::{ProposerRequest, ProposerResponse, StructureProposer};
    pub use crate::scene::{describe, PngRenderer, SceneConfig, SceneHandle, SvgRenderer};
    pub use crate::session::{ProposalInput, ProposalOutcome, Workspace};
}

/// Render a graph JSON document to a standalone SVG document
///
/// # Example
/// ```rust
/// let svg = dfdraw::render_svg("{}").unwrap();
/// assert!(svg.starts_with("<svg"));
/// ```
pub fn render_svg(json: &str) -> anyhow::Result<String> {
    let graph = Graph::from_json(json)?;
    Ok(scene::SvgRenderer::new().render(&graph)?)
}

/// Render a graph JSON document to PNG bytes at 2x density
pub fn render_png(json: &str) -> anyhow::Result<Vec<u8>> {
    let graph = Graph::from_json(json)?;
    Ok(scene::PngRenderer::new().render(&graph)?)
}
