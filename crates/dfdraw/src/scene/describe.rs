//! Scene description: the desired drawing for a graph
//!
//! [`describe`] is a pure function from a graph snapshot and the edit mode to
//! the full set of positioned shapes. It never touches scene state; the
//! [`SceneHandle`](super::SceneHandle) diffs successive descriptions.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, span, trace, warn, Level};

use super::{Marker, SceneConfig};
use crate::bridge::SelectedElement;
use crate::core::{
    boundary_intersection, label_columns, measure_width, Bounds, DataFlow, DfdError, Graph,
    NodeKind, NodeRef, OrientedBox, Point, Size,
};

const ENTITY_FILL: &str = "#0c122b";
const ENTITY_STROKE: &str = "#1e293b";
const PROCESS_FILL: &str = "#8a9fdd";
const PROCESS_RADIUS: f64 = 14.0;
const PROCESS_DIVIDER: &str = "#1e293b";
const PROCESS_TEXT: &str = "#0f172a";
const STORE_FILL: &str = "#f1f5f9";
const STORE_STROKE: &str = "#334155";
const STORE_PREFIX_TEXT: &str = "#475569";
const STORE_COLUMN: f64 = 50.0;
const LABEL_FILL: &str = "#475569";
const LABEL_FONT_SIZE: f64 = 10.0;

/// Approximate advance of one column of flow-label text
const LABEL_CHAR_WIDTH: f64 = 6.0;

/// Horizontal alignment of a text primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Drawing primitive in node-local coordinates (origin at the node center)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: f64,
        fill: &'static str,
        stroke: &'static str,
        stroke_width: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: &'static str,
        stroke_width: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        font_size: f64,
        font_weight: u16,
        fill: &'static str,
        anchor: TextAnchor,
    },
}

/// A positioned node and its shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeVisual {
    pub id: String,
    pub kind: NodeKind,
    pub element: SelectedElement,
    pub frame: OrientedBox,
    pub primitives: Vec<Primitive>,
}

/// Endpoint and label geometry of a flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowRoute {
    /// On the source border, facing the target
    pub start: Point,
    /// On the target border, facing the source
    pub end: Point,
    pub label_anchor: Point,
}

/// A resolved flow and its styling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowVisual {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub element: SelectedElement,
    pub route: FlowRoute,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub marker_end: Marker,
    pub marker_start: Option<Marker>,
    pub label: String,
}

impl FlowVisual {
    /// Approximate box around the rendered label text
    pub fn label_bounds(&self) -> Option<Bounds> {
        if self.label.is_empty() {
            return None;
        }
        let half_width = label_columns(&self.label) as f64 * LABEL_CHAR_WIDTH / 2.0;
        let anchor = self.route.label_anchor;
        Some(Bounds {
            min_x: anchor.x - half_width,
            min_y: anchor.y - LABEL_FONT_SIZE,
            max_x: anchor.x + half_width,
            max_y: anchor.y + LABEL_FONT_SIZE / 4.0,
        })
    }
}

/// Everything the scene should show for one graph snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    pub edit_mode: bool,
    pub nodes: Vec<NodeVisual>,
    pub flows: Vec<FlowVisual>,
}

impl SceneDescription {
    pub fn node(&self, id: &str) -> Option<&NodeVisual> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn flow(&self, id: &str) -> Option<&FlowVisual> {
        self.flows.iter().find(|f| f.id == id)
    }

    /// Bounds of all node frames, flow endpoints and labels
    pub fn bounds(&self) -> Option<Bounds> {
        let nodes = self.nodes.iter().map(|n| n.frame.bounds());
        let flows = self.flows.iter().flat_map(|f| {
            let mut parts = vec![Bounds::at(f.route.start), Bounds::at(f.route.end)];
            parts.extend(f.label_bounds());
            parts
        });
        nodes.chain(flows).reduce(|acc, b| acc.union(&b))
    }
}

/// Deterministic position for the `index`-th node of `kind` with no stored
/// coordinates
pub fn placeholder_position(kind: NodeKind, index: usize, config: &SceneConfig) -> Point {
    let column = config.start_x + config.column_pitch * index as f64;
    match kind {
        NodeKind::Entity => Point::new(
            config.start_x + config.entity_offset_x,
            config.center_y - config.row_offset,
        ),
        NodeKind::Process => Point::new(column, config.center_y),
        NodeKind::Store => Point::new(column, config.center_y + config.row_offset),
    }
}

/// Render position of a node: stored coordinates, with each missing one
/// taken from the placeholder
pub fn resolve_position(node: NodeRef<'_>, index: usize, config: &SceneConfig) -> Point {
    match node.position() {
        (Some(x), Some(y)) => Point::new(x, y),
        (x, y) => {
            let placeholder = placeholder_position(node.kind(), index, config);
            trace!(node_id = %node.id(), ?x, ?y, "Using placeholder position");
            Point::new(x.unwrap_or(placeholder.x), y.unwrap_or(placeholder.y))
        }
    }
}

/// Frame of a node positioned at `center`
pub fn node_frame(node: NodeRef<'_>, center: Point, config: &SceneConfig) -> OrientedBox {
    let kind = node.kind();
    let width = measure_width(node.name(), config.min_width(kind));
    OrientedBox::new(center, Size::new(width, config.node_height(kind)))
}

/// Endpoints and label anchor for a flow between two frames
pub fn route_flow(source: &OrientedBox, target: &OrientedBox, config: &SceneConfig) -> FlowRoute {
    FlowRoute {
        start: boundary_intersection(target.center, source),
        end: boundary_intersection(source.center, target),
        label_anchor: source
            .center
            .midpoint(target.center)
            .offset(0.0, -config.label_offset),
    }
}

/// Shape primitives for a node of the given size
pub fn node_primitives(node: NodeRef<'_>, size: Size) -> Vec<Primitive> {
    let (w, h) = (size.width, size.height);
    let (left, top) = (-w / 2.0, -h / 2.0);

    match node {
        NodeRef::Entity(entity) => vec![
            Primitive::Rect {
                x: left,
                y: top,
                width: w,
                height: h,
                rx: 0.0,
                fill: ENTITY_FILL,
                stroke: ENTITY_STROKE,
                stroke_width: 2.0,
            },
            Primitive::Text {
                x: 0.0,
                y: 0.0,
                content: entity.name.clone(),
                font_size: 13.0,
                font_weight: 700,
                fill: "#ffffff",
                anchor: TextAnchor::Middle,
            },
        ],
        NodeRef::Process(process) => vec![
            Primitive::Rect {
                x: left,
                y: top,
                width: w,
                height: h,
                rx: PROCESS_RADIUS,
                fill: PROCESS_FILL,
                stroke: PROCESS_DIVIDER,
                stroke_width: 2.0,
            },
            Primitive::Line {
                x1: left,
                y1: top + 30.0,
                x2: -left,
                y2: top + 30.0,
                stroke: PROCESS_DIVIDER,
                stroke_width: 1.5,
            },
            Primitive::Text {
                x: 0.0,
                y: top + 20.0,
                content: process.header().to_string(),
                font_size: 11.0,
                font_weight: 900,
                fill: PROCESS_TEXT,
                anchor: TextAnchor::Middle,
            },
            Primitive::Text {
                x: 0.0,
                y: top + 60.0,
                content: process.name.clone(),
                font_size: 13.0,
                font_weight: 700,
                fill: PROCESS_TEXT,
                anchor: TextAnchor::Middle,
            },
        ],
        NodeRef::Store(store) => vec![
            Primitive::Rect {
                x: left,
                y: top,
                width: w,
                height: h,
                rx: 0.0,
                fill: STORE_FILL,
                stroke: STORE_STROKE,
                stroke_width: 1.5,
            },
            Primitive::Line {
                x1: left + STORE_COLUMN,
                y1: top,
                x2: left + STORE_COLUMN,
                y2: -top,
                stroke: STORE_STROKE,
                stroke_width: 1.5,
            },
            Primitive::Text {
                x: left + STORE_COLUMN / 2.0,
                y: 0.0,
                content: store.prefix_label().to_string(),
                font_size: 11.0,
                font_weight: 900,
                fill: STORE_PREFIX_TEXT,
                anchor: TextAnchor::Middle,
            },
            Primitive::Text {
                x: STORE_COLUMN / 2.0,
                y: 0.0,
                content: store.name.clone(),
                font_size: 13.0,
                font_weight: 700,
                fill: PROCESS_TEXT,
                anchor: TextAnchor::Middle,
            },
        ],
    }
}

/// Label primitive for a flow, in scene coordinates
pub fn flow_label_primitive(flow: &FlowVisual) -> Primitive {
    Primitive::Text {
        x: flow.route.label_anchor.x,
        y: flow.route.label_anchor.y,
        content: flow.label.clone(),
        font_size: LABEL_FONT_SIZE,
        font_weight: 700,
        fill: LABEL_FILL,
        anchor: TextAnchor::Middle,
    }
}

fn describe_flow(
    flow: &DataFlow,
    source: &OrientedBox,
    target: &OrientedBox,
    config: &SceneConfig,
) -> FlowVisual {
    let protocol = flow.effective_protocol();
    FlowVisual {
        id: flow.id.clone(),
        source_id: flow.source_id.clone(),
        target_id: flow.target_id.clone(),
        element: SelectedElement::Flow(flow.clone()),
        route: route_flow(source, target, config),
        stroke: protocol.stroke_color(),
        stroke_width: 2.0,
        marker_end: Marker::forward(protocol),
        marker_start: flow.bidirectional().then(|| Marker::backward(protocol)),
        label: flow.label.clone(),
    }
}

/// Compute the desired scene for `graph`
pub fn describe(graph: &Graph, config: &SceneConfig, edit_mode: bool) -> SceneDescription {
    let describe_span = span!(
        Level::DEBUG,
        "describe",
        nodes = graph.node_count(),
        flows = graph.flow_count()
    );
    let _enter = describe_span.enter();

    let indexed = graph
        .external_entities
        .iter()
        .enumerate()
        .map(|(i, e)| (i, NodeRef::Entity(e)))
        .chain(
            graph
                .processes
                .iter()
                .enumerate()
                .map(|(i, p)| (i, NodeRef::Process(p))),
        )
        .chain(
            graph
                .data_stores
                .iter()
                .enumerate()
                .map(|(i, s)| (i, NodeRef::Store(s))),
        );

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(graph.node_count());
    for (index, node) in indexed {
        if !seen.insert(node.id()) {
            warn!(node_id = %node.id(), "Duplicate node id, keeping the first");
            continue;
        }
        let frame = node_frame(node, resolve_position(node, index, config), config);
        nodes.push(NodeVisual {
            id: node.id().to_string(),
            kind: node.kind(),
            element: SelectedElement::from(node),
            frame,
            primitives: node_primitives(node, frame.size),
        });
    }

    let frame_of = |id: &str| nodes.iter().find(|n| n.id == id).map(|n| n.frame);

    let mut flow_ids = HashSet::new();
    let mut flows = Vec::with_capacity(graph.flow_count());
    for flow in &graph.data_flows {
        let endpoints = frame_of(&flow.source_id)
            .ok_or_else(|| DfdError::unresolved_reference(&flow.id, &flow.source_id))
            .and_then(|source| {
                frame_of(&flow.target_id)
                    .map(|target| (source, target))
                    .ok_or_else(|| DfdError::unresolved_reference(&flow.id, &flow.target_id))
            });
        match endpoints {
            Ok((source, target)) => {
                if !flow_ids.insert(flow.id.as_str()) {
                    warn!(flow_id = %flow.id, "Duplicate flow id, keeping the first");
                    continue;
                }
                flows.push(describe_flow(flow, &source, &target, config));
            }
            Err(err) => trace!(error = %err, "Skipping flow"),
        }
    }

    debug!(
        node_count = nodes.len(),
        flow_count = flows.len(),
        edit_mode,
        "Scene described"
    );

    SceneDescription {
        edit_mode,
        nodes,
        flows,
    }
}
