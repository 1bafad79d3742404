//! Arrowhead markers
//!
//! One marker per protocol and direction, allocated once per scene and shared
//! by every flow.

use std::fmt;

use serde::Serialize;

use crate::core::Protocol;

/// Path of the arrowhead triangle in marker units
pub const ARROW_PATH: &str = "M0,-5L10,0L0,5";

/// Marker viewBox
pub const ARROW_VIEW_BOX: &str = "0 -5 10 10";

/// Which end of a flow an arrowhead decorates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    /// At the target, pointing along the flow
    Forward,
    /// At the source, pointing back against the flow
    Backward,
}

/// A reusable arrowhead definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Marker {
    pub protocol: Protocol,
    pub direction: ArrowDirection,
}

impl Marker {
    pub fn new(protocol: Protocol, direction: ArrowDirection) -> Self {
        Self {
            protocol,
            direction,
        }
    }

    pub fn forward(protocol: Protocol) -> Self {
        Self::new(protocol, ArrowDirection::Forward)
    }

    pub fn backward(protocol: Protocol) -> Self {
        Self::new(protocol, ArrowDirection::Backward)
    }

    /// Every marker a scene needs: three protocols, both directions
    pub fn all() -> Vec<Marker> {
        Protocol::ALL
            .iter()
            .flat_map(|&p| [Marker::forward(p), Marker::backward(p)])
            .collect()
    }

    /// Element id, e.g. `arrow-end-https` or `arrow-start-sql`
    pub fn id(&self) -> String {
        let end = match self.direction {
            ArrowDirection::Forward => "end",
            ArrowDirection::Backward => "start",
        };
        format!("arrow-{}-{}", end, self.protocol)
    }

    /// Reference x in marker units; forward tips touch the path end
    pub fn ref_x(&self) -> f64 {
        match self.direction {
            ArrowDirection::Forward => 9.0,
            ArrowDirection::Backward => 0.0,
        }
    }

    pub fn orient(&self) -> &'static str {
        match self.direction {
            ArrowDirection::Forward => "auto",
            ArrowDirection::Backward => "auto-start-reverse",
        }
    }

    pub fn fill(&self) -> &'static str {
        self.protocol.marker_color()
    }

    /// `<marker>` definition for an SVG `<defs>` block
    pub fn to_svg(&self) -> String {
        format!(
            r#"<marker id="{}" viewBox="{}" refX="{}" refY="0" markerWidth="6" markerHeight="6" orient="{}"><path d="{}" fill="{}"/></marker>"#,
            self.id(),
            ARROW_VIEW_BOX,
            self.ref_x(),
            self.orient(),
            ARROW_PATH,
            self.fill()
        )
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}
