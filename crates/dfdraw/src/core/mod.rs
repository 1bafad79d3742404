//! Core abstractions for data flow diagrams
//!
//! The graph model, geometry helpers, id generation and the error type shared
//! by every other module.

mod error;
mod geometry;
mod graph;
mod ids;
pub mod logging;
mod renderer;
mod types;

pub use error::*;
pub use geometry::*;
pub use graph::*;
pub use ids::*;
pub use logging::*;
pub use renderer::*;
pub use types::*;
