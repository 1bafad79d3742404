//! Persistent scene state and reconciliation
//!
//! A [`SceneHandle`] is mounted once and then synchronized against a fresh
//! [`SceneDescription`] after every graph or edit-mode change. Nodes whose id
//! survives are rebuilt in full, flows are updated in place, and ids that
//! appear or disappear are created or removed.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, span, trace, Level};

use super::{describe, route_flow, FlowVisual, Marker, NodeVisual, SceneConfig, SceneDescription, ZoomTransform};
use crate::core::{Bounds, Graph, Point};

/// One change applied to the drawn scene
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum SceneOp {
    CreateNode { id: String },
    RebuildNode { id: String },
    RemoveNode { id: String },
    RaiseNode { id: String },
    MoveNode { id: String, x: f64, y: f64 },
    CreateFlow { id: String },
    UpdateFlow { id: String },
    RemoveFlow { id: String },
    RouteFlow { id: String },
}

/// Id-keyed shapes kept in draw order (last is topmost)
#[derive(Debug, Clone)]
pub struct Layer<T> {
    items: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Layer<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T> Layer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Insert or replace; new ids go on top. Returns true for a new id
    pub fn insert(&mut self, id: &str, item: T) -> bool {
        let is_new = self.items.insert(id.to_string(), item).is_none();
        if is_new {
            self.order.push(id.to_string());
        }
        is_new
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.items.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    /// Move `id` to the top of the draw order
    pub fn raise(&mut self, id: &str) -> bool {
        match self.order.iter().position(|existing| existing == id) {
            Some(index) => {
                let raised = self.order.remove(index);
                self.order.push(raised);
                true
            }
            None => false,
        }
    }

    /// Ids bottom to top
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Items bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Items top to bottom
    pub fn iter_top_down(&self) -> impl Iterator<Item = &T> {
        self.order.iter().rev().filter_map(|id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Pointer gesture in progress
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Gesture {
    Idle,
    /// Pointer held on an element that is not draggable
    Press,
    Drag {
        node_id: String,
        /// Pointer position minus node center, in scene units
        offset: Point,
        moved: bool,
    },
    Pan {
        last: Point,
        moved: bool,
    },
}

/// The live, interactive scene
#[derive(Debug)]
pub struct SceneHandle {
    pub(crate) config: SceneConfig,
    pub(crate) transform: ZoomTransform,
    markers: Vec<Marker>,
    pub(crate) links: Layer<FlowVisual>,
    pub(crate) nodes: Layer<NodeVisual>,
    pub(crate) edit_mode: bool,
    pub(crate) gesture: Gesture,
    pub(crate) suppress_click: bool,
    reconciles: u64,
}

impl SceneHandle {
    /// Allocate the scene: transform, markers and the two layers
    pub fn mount(config: SceneConfig) -> Self {
        let markers = Marker::all();
        info!(markers = markers.len(), "Scene mounted");
        Self {
            config,
            transform: ZoomTransform::IDENTITY,
            markers,
            links: Layer::new(),
            nodes: Layer::new(),
            edit_mode: false,
            gesture: Gesture::Idle,
            suppress_click: false,
            reconciles: 0,
        }
    }

    /// Release the scene
    pub fn unmount(self) {
        debug!(
            nodes = self.nodes.len(),
            flows = self.links.len(),
            reconciles = self.reconciles,
            "Scene unmounted"
        );
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    /// Current scale for on-screen display, e.g. `Zoom: 140%`
    pub fn zoom_label(&self) -> String {
        format!("Zoom: {}%", self.transform.percent())
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Nodes bottom to top
    pub fn nodes(&self) -> impl Iterator<Item = &NodeVisual> {
        self.nodes.iter()
    }

    pub fn flows(&self) -> impl Iterator<Item = &FlowVisual> {
        self.links.iter()
    }

    pub fn node(&self, id: &str) -> Option<&NodeVisual> {
        self.nodes.get(id)
    }

    pub fn flow(&self, id: &str) -> Option<&FlowVisual> {
        self.links.get(id)
    }

    /// Id of the node being dragged, if any
    pub fn dragged_node(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Drag { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    pub fn reconcile_count(&self) -> u64 {
        self.reconciles
    }

    /// Bounds of everything drawn, in scene units
    pub fn content_bounds(&self) -> Option<Bounds> {
        let nodes = self.nodes.iter().map(|n| n.frame.bounds());
        let flows = self.links.iter().flat_map(|f| {
            let mut parts = vec![Bounds::at(f.route.start), Bounds::at(f.route.end)];
            parts.extend(f.label_bounds());
            parts
        });
        nodes.chain(flows).reduce(|acc, b| acc.union(&b))
    }

    /// Describe `graph` and reconcile against it
    pub fn render(&mut self, graph: &Graph, edit_mode: bool) -> Vec<SceneOp> {
        let description = describe(graph, &self.config, edit_mode);
        self.reconcile(&description)
    }

    /// Bring the drawn scene in line with `desired`
    pub fn reconcile(&mut self, desired: &SceneDescription) -> Vec<SceneOp> {
        let reconcile_span = span!(
            Level::DEBUG,
            "reconcile",
            nodes = desired.nodes.len(),
            flows = desired.flows.len()
        );
        let _enter = reconcile_span.enter();

        self.reconciles += 1;
        self.edit_mode = desired.edit_mode;

        let dragging = self.dragged_node().map(str::to_string);
        if let Some(node_id) = &dragging {
            if !desired.edit_mode || desired.node(node_id).is_none() {
                debug!(node_id = %node_id, "Drag cancelled by reconcile");
                self.gesture = Gesture::Idle;
            }
        }
        let dragging = self.dragged_node().map(str::to_string);

        let mut ops = Vec::new();

        let wanted_nodes: HashSet<&str> = desired.nodes.iter().map(|n| n.id.as_str()).collect();
        let stale_nodes: Vec<String> = self
            .nodes
            .ids()
            .filter(|id| !wanted_nodes.contains(id))
            .map(str::to_string)
            .collect();
        for id in stale_nodes {
            self.nodes.remove(&id);
            trace!(node_id = %id, "Node removed");
            ops.push(SceneOp::RemoveNode { id });
        }

        for visual in &desired.nodes {
            let mut visual = visual.clone();
            if dragging.as_deref() == Some(visual.id.as_str()) {
                if let Some(live) = self.nodes.get(&visual.id) {
                    visual.frame.center = live.frame.center;
                }
            }
            let id = visual.id.clone();
            if self.nodes.insert(&id, visual) {
                ops.push(SceneOp::CreateNode { id });
            } else {
                ops.push(SceneOp::RebuildNode { id });
            }
        }

        let wanted_flows: HashSet<&str> = desired.flows.iter().map(|f| f.id.as_str()).collect();
        let stale_flows: Vec<String> = self
            .links
            .ids()
            .filter(|id| !wanted_flows.contains(id))
            .map(str::to_string)
            .collect();
        for id in stale_flows {
            self.links.remove(&id);
            trace!(flow_id = %id, "Flow removed");
            ops.push(SceneOp::RemoveFlow { id });
        }

        for visual in &desired.flows {
            let id = visual.id.clone();
            if self.links.insert(&id, visual.clone()) {
                ops.push(SceneOp::CreateFlow { id });
            } else {
                ops.push(SceneOp::UpdateFlow { id });
            }
        }

        if let Some(node_id) = &dragging {
            self.reroute_touching(node_id);
        }

        debug!(ops = ops.len(), "Scene reconciled");
        ops
    }

    /// Recompute the geometry of every flow touching `node_id` from the
    /// live node frames
    pub(crate) fn reroute_touching(&mut self, node_id: &str) -> Vec<SceneOp> {
        let touching: Vec<String> = self
            .links
            .iter()
            .filter(|f| f.source_id == node_id || f.target_id == node_id)
            .map(|f| f.id.clone())
            .collect();

        let mut ops = Vec::with_capacity(touching.len());
        for id in touching {
            let frames = self.links.get(&id).and_then(|flow| {
                let source = self.nodes.get(&flow.source_id)?.frame;
                let target = self.nodes.get(&flow.target_id)?.frame;
                Some((source, target))
            });
            if let (Some((source, target)), Some(flow)) = (frames, self.links.get_mut(&id)) {
                flow.route = route_flow(&source, &target, &self.config);
                ops.push(SceneOp::RouteFlow { id });
            }
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataFlow, Entity, Process};

    fn graph() -> Graph {
        Graph {
            external_entities: vec![Entity::new("E", "User").at(0.0, 0.0)],
            processes: vec![
                Process::new("P1", "1", "Auth").at(400.0, 0.0),
                Process::new("P2", "2", "Audit").at(400.0, 300.0),
            ],
            data_flows: vec![DataFlow::new("F1", "E", "P1", "login")],
            ..Default::default()
        }
    }

    #[test]
    fn test_layer_order_and_raise() {
        let mut layer = Layer::new();
        assert!(layer.insert("a", 1));
        assert!(layer.insert("b", 2));
        assert!(!layer.insert("a", 3));
        assert_eq!(layer.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(layer.raise("a"));
        assert_eq!(layer.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(layer.iter_top_down().next(), Some(&3));
        assert_eq!(layer.remove("b"), Some(2));
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_first_render_creates_everything() {
        let mut scene = SceneHandle::mount(SceneConfig::default());
        assert_eq!(scene.markers().len(), 6);
        let ops = scene.render(&graph(), false);
        assert_eq!(
            ops,
            vec![
                SceneOp::CreateNode { id: "E".into() },
                SceneOp::CreateNode { id: "P1".into() },
                SceneOp::CreateNode { id: "P2".into() },
                SceneOp::CreateFlow { id: "F1".into() },
            ]
        );
    }

    #[test]
    fn test_rerender_rebuilds_and_removes() {
        let mut scene = SceneHandle::mount(SceneConfig::default());
        scene.render(&graph(), false);
        let next = graph().delete_element("P2");
        let ops = scene.render(&next, false);
        assert!(ops.contains(&SceneOp::RemoveNode { id: "P2".into() }));
        assert!(ops.contains(&SceneOp::RebuildNode { id: "E".into() }));
        assert!(ops.contains(&SceneOp::UpdateFlow { id: "F1".into() }));
        assert!(scene.node("P2").is_none());
        assert_eq!(scene.reconcile_count(), 2);
    }

    #[test]
    fn test_removed_flow_is_dropped() {
        let mut scene = SceneHandle::mount(SceneConfig::default());
        scene.render(&graph(), false);
        let ops = scene.render(&graph().delete_element("P1"), false);
        assert!(ops.contains(&SceneOp::RemoveFlow { id: "F1".into() }));
        assert_eq!(scene.flows().count(), 0);
    }

    #[test]
    fn test_zoom_label_starts_at_100() {
        let scene = SceneHandle::mount(SceneConfig::default());
        assert_eq!(scene.zoom_label(), "Zoom: 100%");
        assert!(scene.content_bounds().is_none());
        scene.unmount();
    }
}
