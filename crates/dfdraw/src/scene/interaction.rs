//! Pointer interaction on a mounted scene
//!
//! All pointer positions are screen coordinates; hit testing works in scene
//! coordinates through the inverse zoom transform.
//!
//! Gestures:
//! - press on a node in edit mode: drag (the node is raised, flows touching it
//!   follow every move, release commits once)
//! - press on any other element: click target only, the canvas never pans
//! - press on empty canvas: pan
//! - wheel: zoom about the pointer

use serde::Serialize;
use tracing::{debug, trace};

use super::handle::Gesture;
use super::{SceneHandle, SceneOp};
use crate::bridge::{SceneListener, SelectedElement};
use crate::core::Point;

/// Wheel delta to zoom exponent
const WHEEL_SENSITIVITY: f64 = 0.002;

/// What a pointer landed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "target", content = "id", rename_all = "camelCase")]
pub enum HitTarget {
    Node(String),
    FlowLabel(String),
    FlowPath(String),
}

impl HitTarget {
    pub fn id(&self) -> &str {
        match self {
            HitTarget::Node(id) | HitTarget::FlowLabel(id) | HitTarget::FlowPath(id) => id,
        }
    }
}

impl SceneHandle {
    /// Topmost element under `screen`: nodes first, then flow labels, then
    /// flow paths
    pub fn hit_test(&self, screen: Point) -> Option<HitTarget> {
        let p = self.transform.invert(screen);

        if let Some(node) = self.nodes.iter_top_down().find(|n| n.frame.contains(p)) {
            return Some(HitTarget::Node(node.id.clone()));
        }

        if let Some(flow) = self
            .links
            .iter_top_down()
            .find(|f| f.label_bounds().is_some_and(|b| b.contains(p)))
        {
            return Some(HitTarget::FlowLabel(flow.id.clone()));
        }

        let tolerance = self.config.hit_tolerance / self.transform.k;
        self.links
            .iter_top_down()
            .find(|f| {
                p.distance_to_segment(f.route.start, f.route.end)
                    <= tolerance + f.stroke_width / 2.0
            })
            .map(|f| HitTarget::FlowPath(f.id.clone()))
    }

    /// Start a gesture
    pub fn pointer_down(&mut self, screen: Point) -> Vec<SceneOp> {
        let hit = self.hit_test(screen);
        trace!(?hit, x = screen.x, y = screen.y, "Pointer down");

        match hit {
            Some(HitTarget::Node(id)) if self.edit_mode => {
                let p = self.transform.invert(screen);
                let Some(center) = self.nodes.get(&id).map(|n| n.frame.center) else {
                    return Vec::new();
                };
                self.nodes.raise(&id);
                debug!(node_id = %id, "Drag started");
                self.gesture = Gesture::Drag {
                    node_id: id.clone(),
                    offset: Point::new(p.x - center.x, p.y - center.y),
                    moved: false,
                };
                vec![SceneOp::RaiseNode { id }]
            }
            Some(_) => {
                self.gesture = Gesture::Press;
                Vec::new()
            }
            None => {
                self.gesture = Gesture::Pan {
                    last: screen,
                    moved: false,
                };
                Vec::new()
            }
        }
    }

    /// Continue the current gesture
    pub fn pointer_move(&mut self, screen: Point) -> Vec<SceneOp> {
        match &mut self.gesture {
            Gesture::Drag {
                node_id,
                offset,
                moved,
            } => {
                let p = self.transform.invert(screen);
                let center = Point::new(p.x - offset.x, p.y - offset.y);
                let node_id = node_id.clone();
                let Some(node) = self.nodes.get_mut(&node_id) else {
                    return Vec::new();
                };
                if node.frame.center == center {
                    return Vec::new();
                }
                node.frame.center = center;
                *moved = true;

                trace!(node_id = %node_id, x = center.x, y = center.y, "Drag frame");
                let mut ops = vec![SceneOp::MoveNode {
                    id: node_id.clone(),
                    x: center.x,
                    y: center.y,
                }];
                ops.extend(self.reroute_touching(&node_id));
                ops
            }
            Gesture::Pan { last, moved } => {
                let (dx, dy) = (screen.x - last.x, screen.y - last.y);
                *last = screen;
                if dx != 0.0 || dy != 0.0 {
                    *moved = true;
                    self.transform = self.transform.translate(dx, dy);
                }
                Vec::new()
            }
            Gesture::Idle | Gesture::Press => Vec::new(),
        }
    }

    /// Finish the current gesture; a drag that moved commits its final
    /// position through the listener
    pub fn pointer_up(&mut self, screen: Point, listener: &mut dyn SceneListener) -> Vec<SceneOp> {
        let ops = self.pointer_move(screen);

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Drag { node_id, moved, .. } => {
                if moved {
                    if let Some(node) = self.nodes.get(&node_id) {
                        let center = node.frame.center;
                        debug!(node_id = %node_id, x = center.x, y = center.y, "Drag committed");
                        listener.on_update_element_position(&node_id, center.x, center.y);
                    }
                    self.suppress_click = true;
                }
            }
            Gesture::Pan { moved, .. } => {
                self.suppress_click = moved;
            }
            Gesture::Idle | Gesture::Press => {}
        }
        ops
    }

    /// Abandon a gesture without committing anything
    pub fn cancel_gesture(&mut self) {
        if self.gesture != Gesture::Idle {
            debug!("Gesture cancelled");
        }
        self.gesture = Gesture::Idle;
    }

    /// Click at `screen`: selects the element under the pointer
    ///
    /// The click that ends a drag or pan is swallowed.
    pub fn click(
        &mut self,
        screen: Point,
        listener: &mut dyn SceneListener,
    ) -> Option<SelectedElement> {
        if std::mem::take(&mut self.suppress_click) {
            trace!("Click after gesture ignored");
            return None;
        }

        let element = match self.hit_test(screen)? {
            HitTarget::Node(id) => self.nodes.get(&id).map(|n| n.element.clone()),
            HitTarget::FlowLabel(id) | HitTarget::FlowPath(id) => {
                self.links.get(&id).map(|f| f.element.clone())
            }
        }?;

        debug!(element_id = %element.id(), role = element.role(), "Element selected");
        listener.on_select_element(element.clone());
        Some(element)
    }

    /// Zoom by a wheel delta about the pointer; returns the new scale
    pub fn wheel(&mut self, screen: Point, delta_y: f64) -> f64 {
        self.zoom_by(2f64.powf(-delta_y * WHEEL_SENSITIVITY), screen)
    }

    /// Multiply the scale by `factor` keeping `anchor` fixed on screen
    pub fn zoom_by(&mut self, factor: f64, anchor: Point) -> f64 {
        self.transform =
            self.transform
                .zoom_about(anchor, factor, self.config.min_scale, self.config.max_scale);
        trace!(k = self.transform.k, "Zoomed");
        self.transform.k
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.translate(dx, dy);
    }

    pub fn reset_view(&mut self) {
        self.transform = super::ZoomTransform::IDENTITY;
    }
}
