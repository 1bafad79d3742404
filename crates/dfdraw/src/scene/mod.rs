//! Scene engine: describe, reconcile, interact, export
//!
//! Rendering is split in two phases. [`describe`] computes the desired shapes
//! from a graph snapshot; [`SceneHandle::reconcile`] applies the difference to
//! the live scene. Pointer gestures then operate on the live scene and report
//! back to the host through [`SceneListener`](crate::bridge::SceneListener).
//!
//! ```
//! use dfdraw::core::{Entity, Graph, Process, DataFlow};
//! use dfdraw::scene::{SceneConfig, SceneHandle};
//!
//! let graph = Graph {
//!     external_entities: vec![Entity::new("E", "Customer")],
//!     processes: vec![Process::new("P1", "1", "Checkout")],
//!     data_flows: vec![DataFlow::new("F1", "E", "P1", "Order")],
//!     ..Default::default()
//! };
//!
//! let mut scene = SceneHandle::mount(SceneConfig::default());
//! scene.render(&graph, false);
//! assert_eq!(scene.flows().count(), 1);
//! scene.unmount();
//! ```

mod config;
mod describe;
pub mod export;
mod handle;
mod interaction;
mod markers;
mod transform;

pub use config::SceneConfig;
pub use describe::*;
pub use export::{PngRenderer, SvgRenderer};
pub use handle::{Layer, SceneHandle, SceneOp};
pub use interaction::HitTarget;
pub use markers::{ArrowDirection, Marker, ARROW_PATH, ARROW_VIEW_BOX};
pub use transform::ZoomTransform;
