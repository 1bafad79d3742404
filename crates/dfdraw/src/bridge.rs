//! Selection and inspector bridge
//!
//! The scene reports user intent to its host through [`SceneListener`]: a
//! clicked element arrives as a tagged [`SelectedElement`] carrying the full
//! record, and a finished drag arrives as a single position commit.

use serde::{Deserialize, Serialize};

use crate::core::{DataFlow, DataStore, Entity, Graph, NodeKind, NodeRef, Process};

/// The element shown in the inspector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum SelectedElement {
    Entity(Entity),
    Process(Process),
    Store(DataStore),
    Flow(DataFlow),
}

impl SelectedElement {
    pub fn id(&self) -> &str {
        match self {
            SelectedElement::Entity(e) => &e.id,
            SelectedElement::Process(p) => &p.id,
            SelectedElement::Store(s) => &s.id,
            SelectedElement::Flow(f) => &f.id,
        }
    }

    /// Role tag: `entity`, `process`, `store` or `flow`
    pub fn role(&self) -> &'static str {
        match self {
            SelectedElement::Entity(_) => NodeKind::Entity.role(),
            SelectedElement::Process(_) => NodeKind::Process.role(),
            SelectedElement::Store(_) => NodeKind::Store.role(),
            SelectedElement::Flow(_) => "flow",
        }
    }

    /// Node kind, or `None` for a flow
    pub fn node_kind(&self) -> Option<NodeKind> {
        match self {
            SelectedElement::Entity(_) => Some(NodeKind::Entity),
            SelectedElement::Process(_) => Some(NodeKind::Process),
            SelectedElement::Store(_) => Some(NodeKind::Store),
            SelectedElement::Flow(_) => None,
        }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, SelectedElement::Flow(_))
    }

    /// The full record of the node or flow with `id` in `graph`
    pub fn lookup(graph: &Graph, id: &str) -> Option<Self> {
        graph
            .node(id)
            .map(Self::from)
            .or_else(|| graph.flow(id).cloned().map(SelectedElement::Flow))
    }
}

impl From<NodeRef<'_>> for SelectedElement {
    fn from(node: NodeRef<'_>) -> Self {
        match node {
            NodeRef::Entity(e) => SelectedElement::Entity(e.clone()),
            NodeRef::Process(p) => SelectedElement::Process(p.clone()),
            NodeRef::Store(s) => SelectedElement::Store(s.clone()),
        }
    }
}

/// Host callbacks invoked by the scene
pub trait SceneListener {
    /// A node, flow path or flow label was clicked
    fn on_select_element(&mut self, element: SelectedElement);

    /// A drag gesture finished with the node at `(x, y)`
    fn on_update_element_position(&mut self, id: &str, x: f64, y: f64);
}

/// A recorded listener callback
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Selected(SelectedElement),
    PositionCommitted { id: String, x: f64, y: f64 },
}

/// Collects callbacks in order; useful for hosts that process events later
impl SceneListener for Vec<SceneEvent> {
    fn on_select_element(&mut self, element: SelectedElement) {
        self.push(SceneEvent::Selected(element));
    }

    fn on_update_element_position(&mut self, id: &str, x: f64, y: f64) {
        self.push(SceneEvent::PositionCommitted {
            id: id.to_string(),
            x,
            y,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_and_ids() {
        let flow = SelectedElement::Flow(DataFlow::new("f1", "a", "b", "Sync"));
        assert_eq!(flow.role(), "flow");
        assert_eq!(flow.id(), "f1");
        assert!(flow.is_flow());
        assert_eq!(flow.node_kind(), None);

        let store = SelectedElement::Store(DataStore::new("d1", "Orders"));
        assert_eq!(store.role(), "store");
        assert_eq!(store.node_kind(), Some(NodeKind::Store));
    }

    #[test]
    fn test_lookup_by_id() {
        let graph = Graph {
            external_entities: vec![Entity::new("E", "Bank")],
            data_flows: vec![DataFlow::new("F2", "E", "E", "Loop")],
            ..Graph::default()
        };
        assert_eq!(SelectedElement::lookup(&graph, "E").map(|e| e.role()), Some("entity"));
        assert_eq!(SelectedElement::lookup(&graph, "F2").map(|e| e.role()), Some("flow"));
        assert!(SelectedElement::lookup(&graph, "zzz").is_none());
    }

    #[test]
    fn test_serialized_with_role_tag() {
        let entity = SelectedElement::Entity(Entity::new("e1", "Bank"));
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["role"], "entity");
        assert_eq!(json["name"], "Bank");
    }

    #[test]
    fn test_event_recorder() {
        let mut events: Vec<SceneEvent> = Vec::new();
        events.on_update_element_position("p1", 3.0, 4.0);
        assert_eq!(
            events,
            vec![SceneEvent::PositionCommitted {
                id: "p1".to_string(),
                x: 3.0,
                y: 4.0
            }]
        );
    }
}
