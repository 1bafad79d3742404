//! In-memory DFD graph and its pure edit operations
//!
//! A [`Graph`] holds the three node collections plus the flow list. Every edit
//! operation takes `&self` and returns a new graph, so a graph value doubles as
//! an immutable snapshot for undo, export and proposer requests.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};

use super::{DfdError, IdGenerator, NodeKind, Protocol};

pub const DEFAULT_ENTITY_NAME: &str = "New Actor";
pub const DEFAULT_PROCESS_NAME: &str = "New Logic";
pub const DEFAULT_STORE_NAME: &str = "New Store";
pub const DEFAULT_STORE_PREFIX: &str = "DB";

/// External actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x: None,
            y: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }
}

/// Numbered process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: String,
    #[serde(default)]
    pub number: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Process {
    pub fn new(id: impl Into<String>, number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            name: name.into(),
            description: None,
            x: None,
            y: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Text shown in the header band
    pub fn header(&self) -> &str {
        if self.number.is_empty() {
            &self.id
        } else {
            &self.number
        }
    }
}

/// Data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl DataStore {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prefix: None,
            x: None,
            y: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Text shown in the prefix column
    pub fn prefix_label(&self) -> &str {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => DEFAULT_STORE_PREFIX,
        }
    }
}

/// Directed (or bidirectional) labeled edge between two node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlow {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bidirectional: Option<bool>,
}

impl DataFlow {
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: label.into(),
            protocol: None,
            is_bidirectional: None,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn two_way(mut self) -> Self {
        self.is_bidirectional = Some(true);
        self
    }

    /// Effective protocol (unset means standard)
    pub fn effective_protocol(&self) -> Protocol {
        self.protocol.unwrap_or_default()
    }

    pub fn bidirectional(&self) -> bool {
        self.is_bidirectional.unwrap_or(false)
    }

    /// True if the flow touches `node_id` at either end
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

/// Borrowed view over any of the three node records
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Entity(&'a Entity),
    Process(&'a Process),
    Store(&'a DataStore),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Entity(e) => &e.id,
            NodeRef::Process(p) => &p.id,
            NodeRef::Store(s) => &s.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            NodeRef::Entity(e) => &e.name,
            NodeRef::Process(p) => &p.name,
            NodeRef::Store(s) => &s.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Entity(_) => NodeKind::Entity,
            NodeRef::Process(_) => NodeKind::Process,
            NodeRef::Store(_) => NodeKind::Store,
        }
    }

    /// Explicit coordinates, if stored
    pub fn position(&self) -> (Option<f64>, Option<f64>) {
        match self {
            NodeRef::Entity(e) => (e.x, e.y),
            NodeRef::Process(p) => (p.x, p.y),
            NodeRef::Store(s) => (s.x, s.y),
        }
    }
}

/// Caller-supplied fields for a new node; missing fields take kind defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFields {
    pub name: Option<String>,
    pub number: Option<String>,
    pub description: Option<String>,
    pub prefix: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl NodeFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Shallow field update for a node or a flow
///
/// Only the fields that are `Some` are written. Fields that do not exist on
/// the matched element's kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    pub name: Option<String>,
    pub number: Option<String>,
    pub description: Option<String>,
    pub prefix: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub label: Option<String>,
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub protocol: Option<Protocol>,
    pub is_bidirectional: Option<bool>,
}

impl ElementPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn relabel(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn protocol(protocol: Protocol) -> Self {
        Self {
            protocol: Some(protocol),
            ..Default::default()
        }
    }

    pub fn bidirectional(on: bool) -> Self {
        Self {
            is_bidirectional: Some(on),
            ..Default::default()
        }
    }

    pub fn retarget(source_id: Option<String>, target_id: Option<String>) -> Self {
        Self {
            source_id,
            target_id,
            ..Default::default()
        }
    }

    fn apply_position(&self, x: &mut Option<f64>, y: &mut Option<f64>) {
        if self.x.is_some() {
            *x = self.x;
        }
        if self.y.is_some() {
            *y = self.y;
        }
    }

    fn apply_entity(&self, entity: &mut Entity) {
        if let Some(name) = &self.name {
            entity.name = name.clone();
        }
        self.apply_position(&mut entity.x, &mut entity.y);
    }

    fn apply_process(&self, process: &mut Process) {
        if let Some(name) = &self.name {
            process.name = name.clone();
        }
        if let Some(number) = &self.number {
            process.number = number.clone();
        }
        if self.description.is_some() {
            process.description = self.description.clone();
        }
        self.apply_position(&mut process.x, &mut process.y);
    }

    fn apply_store(&self, store: &mut DataStore) {
        if let Some(name) = &self.name {
            store.name = name.clone();
        }
        if self.prefix.is_some() {
            store.prefix = self.prefix.clone();
        }
        self.apply_position(&mut store.x, &mut store.y);
    }

    fn apply_flow(&self, flow: &mut DataFlow) {
        if let Some(label) = &self.label {
            flow.label = label.clone();
        }
        if let Some(source_id) = &self.source_id {
            flow.source_id = source_id.clone();
        }
        if let Some(target_id) = &self.target_id {
            flow.target_id = target_id.clone();
        }
        if self.protocol.is_some() {
            flow.protocol = self.protocol;
        }
        if self.is_bidirectional.is_some() {
            flow.is_bidirectional = self.is_bidirectional;
        }
    }
}

/// Structural problem found by [`Graph::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphIssue {
    DuplicateNodeId { id: String },
    DuplicateFlowId { id: String },
    DanglingFlow { flow_id: String, missing: String },
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphIssue::DuplicateNodeId { id } => write!(f, "node id '{}' is used more than once", id),
            GraphIssue::DuplicateFlowId { id } => write!(f, "flow id '{}' is used more than once", id),
            GraphIssue::DanglingFlow { flow_id, missing } => {
                write!(f, "flow '{}' references missing node '{}'", flow_id, missing)
            }
        }
    }
}

/// Complete DFD structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    #[serde(default)]
    pub external_entities: Vec<Entity>,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub data_stores: Vec<DataStore>,
    #[serde(default)]
    pub data_flows: Vec<DataFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Parse a graph from its JSON document form
    pub fn from_json(json: &str) -> Result<Self, DfdError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the graph as a pretty-printed JSON document
    pub fn to_json_pretty(&self) -> Result<String, DfdError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Iterate all nodes: entities, then processes, then stores
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.external_entities
            .iter()
            .map(NodeRef::Entity)
            .chain(self.processes.iter().map(NodeRef::Process))
            .chain(self.data_stores.iter().map(NodeRef::Store))
    }

    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.nodes().find(|node| node.id() == id)
    }

    pub fn flow(&self, id: &str) -> Option<&DataFlow> {
        self.data_flows.iter().find(|flow| flow.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// True if any node or flow uses `id`
    pub fn contains_id(&self, id: &str) -> bool {
        self.contains_node(id) || self.flow(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.external_entities.len() + self.processes.len() + self.data_stores.len()
    }

    pub fn flow_count(&self) -> usize {
        self.data_flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0 && self.data_flows.is_empty()
    }

    /// Flows touching `node_id` at either end
    pub fn flows_touching<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a DataFlow> {
        self.data_flows.iter().filter(move |flow| flow.touches(node_id))
    }

    fn fresh_id(&self, prefix: &str, ids: &mut dyn IdGenerator) -> String {
        let candidate = ids.next_id(prefix);
        if !self.contains_id(&candidate) {
            return candidate;
        }
        trace!(candidate = %candidate, "Generated id already in use");
        (2..)
            .map(|n| format!("{}.{}", candidate, n))
            .find(|alt| !self.contains_id(alt))
            .unwrap_or(candidate)
    }

    /// Append a node of `kind`, returning the new graph and the node's id
    pub fn add_node(
        &self,
        kind: NodeKind,
        fields: NodeFields,
        ids: &mut dyn IdGenerator,
    ) -> (Graph, String) {
        let id = self.fresh_id(kind.id_prefix(), ids);
        let mut next = self.clone();

        match kind {
            NodeKind::Entity => next.external_entities.push(Entity {
                id: id.clone(),
                name: fields.name.unwrap_or_else(|| DEFAULT_ENTITY_NAME.to_string()),
                x: fields.x,
                y: fields.y,
            }),
            NodeKind::Process => next.processes.push(Process {
                id: id.clone(),
                number: fields
                    .number
                    .unwrap_or_else(|| (self.processes.len() + 1).to_string()),
                name: fields.name.unwrap_or_else(|| DEFAULT_PROCESS_NAME.to_string()),
                description: fields.description,
                x: fields.x,
                y: fields.y,
            }),
            NodeKind::Store => next.data_stores.push(DataStore {
                id: id.clone(),
                name: fields.name.unwrap_or_else(|| DEFAULT_STORE_NAME.to_string()),
                prefix: fields
                    .prefix
                    .or_else(|| Some(DEFAULT_STORE_PREFIX.to_string())),
                x: fields.x,
                y: fields.y,
            }),
        }

        debug!(node_id = %id, kind = %kind, node_count = next.node_count(), "Node added");
        (next, id)
    }

    /// Append a flow, returning the new graph and the flow's id
    ///
    /// Fails with [`DfdError::Precondition`] when the graph has fewer than two
    /// nodes. Endpoints are not checked: flows with missing endpoints are
    /// simply not drawn.
    pub fn add_flow(
        &self,
        source_id: &str,
        target_id: &str,
        label: &str,
        protocol: Protocol,
        ids: &mut dyn IdGenerator,
    ) -> Result<(Graph, String), DfdError> {
        let node_count = self.node_count();
        if node_count < 2 {
            return Err(DfdError::precondition(format!(
                "a flow needs at least two nodes to connect, the diagram has {}",
                node_count
            )));
        }

        let id = self.fresh_id("f", ids);
        let mut next = self.clone();
        next.data_flows.push(
            DataFlow::new(id.clone(), source_id, target_id, label).with_protocol(protocol),
        );

        debug!(flow_id = %id, source = %source_id, target = %target_id, "Flow added");
        Ok((next, id))
    }

    /// Remove the element with `id` and every flow that references it
    ///
    /// Deleting an unknown id returns an equal graph.
    pub fn delete_element(&self, id: &str) -> Graph {
        let mut next = self.clone();
        next.external_entities.retain(|e| e.id != id);
        next.processes.retain(|p| p.id != id);
        next.data_stores.retain(|s| s.id != id);
        next.data_flows
            .retain(|f| f.id != id && f.source_id != id && f.target_id != id);

        debug!(
            element_id = %id,
            removed_nodes = self.node_count() - next.node_count(),
            removed_flows = self.flow_count() - next.flow_count(),
            "Element deleted"
        );
        next
    }

    /// Store explicit coordinates on the node with `id`
    pub fn move_node(&self, id: &str, x: f64, y: f64) -> Graph {
        let patch = ElementPatch {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        };
        let mut next = self.clone();
        next.patch_nodes(id, &patch);
        trace!(node_id = %id, x, y, "Node moved");
        next
    }

    /// Shallow-merge `patch` into the node or flow with `id`
    pub fn patch_element(&self, id: &str, patch: &ElementPatch) -> Graph {
        let mut next = self.clone();
        let mut matched = next.patch_nodes(id, patch);
        for flow in next.data_flows.iter_mut().filter(|f| f.id == id) {
            patch.apply_flow(flow);
            matched = true;
        }
        trace!(element_id = %id, matched, "Element patched");
        next
    }

    fn patch_nodes(&mut self, id: &str, patch: &ElementPatch) -> bool {
        let mut matched = false;
        for entity in self.external_entities.iter_mut().filter(|e| e.id == id) {
            patch.apply_entity(entity);
            matched = true;
        }
        for process in self.processes.iter_mut().filter(|p| p.id == id) {
            patch.apply_process(process);
            matched = true;
        }
        for store in self.data_stores.iter_mut().filter(|s| s.id == id) {
            patch.apply_store(store);
            matched = true;
        }
        matched
    }

    /// Report structural problems without failing
    pub fn validate(&self) -> Vec<GraphIssue> {
        let mut issues = Vec::new();

        let mut node_ids = HashSet::new();
        for node in self.nodes() {
            if !node_ids.insert(node.id()) {
                issues.push(GraphIssue::DuplicateNodeId {
                    id: node.id().to_string(),
                });
            }
        }

        let mut flow_ids = HashSet::new();
        for flow in &self.data_flows {
            if !flow_ids.insert(flow.id.as_str()) {
                issues.push(GraphIssue::DuplicateFlowId {
                    id: flow.id.clone(),
                });
            }
            for endpoint in [&flow.source_id, &flow.target_id] {
                if !node_ids.contains(endpoint.as_str()) {
                    issues.push(GraphIssue::DanglingFlow {
                        flow_id: flow.id.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
        }

        debug!(issue_count = issues.len(), "Graph validated");
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SequentialIds;

    fn sample() -> Graph {
        Graph {
            external_entities: vec![Entity::new("E", "Customer")],
            processes: vec![Process::new("P1", "1.0", "Place Order")],
            data_stores: vec![DataStore::new("D1", "Orders").with_prefix("D1")],
            data_flows: vec![
                DataFlow::new("F1", "E", "P1", "Request"),
                DataFlow::new("F2", "P1", "D1", "Write").with_protocol(Protocol::Sql),
            ],
            title: Some("Ordering".to_string()),
            level: None,
        }
    }

    #[test]
    fn test_node_iteration_order() {
        let graph = sample();
        let ids: Vec<_> = graph.nodes().map(|n| n.id()).collect();
        assert_eq!(ids, vec!["E", "P1", "D1"]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.flow_count(), 2);
    }

    #[test]
    fn test_add_node_uses_defaults() {
        let mut ids = SequentialIds::new();
        let (graph, id) = Graph::new().add_node(NodeKind::Store, NodeFields::default(), &mut ids);
        assert_eq!(id, "s-1");
        let store = &graph.data_stores[0];
        assert_eq!(store.name, DEFAULT_STORE_NAME);
        assert_eq!(store.prefix.as_deref(), Some("DB"));
        assert_eq!(store.x, None);
    }

    #[test]
    fn test_add_node_merges_caller_fields() {
        let mut ids = SequentialIds::new();
        let graph = sample();
        let (next, id) = graph.add_node(
            NodeKind::Process,
            NodeFields::named("Ship").at(10.0, 20.0),
            &mut ids,
        );
        let process = next.processes.iter().find(|p| p.id == id).unwrap();
        assert_eq!(process.name, "Ship");
        assert_eq!(process.number, "2");
        assert_eq!((process.x, process.y), (Some(10.0), Some(20.0)));
        // input untouched
        assert_eq!(graph.processes.len(), 1);
    }

    #[test]
    fn test_add_node_skips_ids_in_use() {
        struct Constant;
        impl IdGenerator for Constant {
            fn next_id(&mut self, _prefix: &str) -> String {
                "P1".to_string()
            }
        }
        let (next, id) = sample().add_node(NodeKind::Entity, NodeFields::default(), &mut Constant);
        assert_eq!(id, "P1.2");
        assert!(next.contains_node("P1.2"));
    }

    #[test]
    fn test_add_flow_requires_two_nodes() {
        let mut ids = SequentialIds::new();
        let (single, _) = Graph::new().add_node(NodeKind::Entity, NodeFields::default(), &mut ids);
        let err = single
            .add_flow("e-1", "e-1", "Loop", Protocol::Standard, &mut ids)
            .unwrap_err();
        assert!(matches!(err, DfdError::Precondition { .. }));
    }

    #[test]
    fn test_add_flow_appends_one() {
        let mut ids = SequentialIds::new();
        let (next, id) = sample()
            .add_flow("D1", "E", "Receipt", Protocol::Https, &mut ids)
            .unwrap();
        assert_eq!(next.flow_count(), 3);
        let flow = next.flow(&id).unwrap();
        assert_eq!(flow.label, "Receipt");
        assert_eq!(flow.effective_protocol(), Protocol::Https);
    }

    #[test]
    fn test_delete_node_cascades() {
        let next = sample().delete_element("P1");
        assert!(!next.contains_node("P1"));
        assert_eq!(next.flow_count(), 0);
    }

    #[test]
    fn test_delete_flow_by_id() {
        let next = sample().delete_element("F1");
        assert_eq!(next.node_count(), 3);
        assert!(next.flow("F1").is_none());
        assert!(next.flow("F2").is_some());
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let graph = sample();
        assert_eq!(graph.delete_element("nope"), graph);
    }

    #[test]
    fn test_move_node() {
        let next = sample().move_node("D1", 5.0, 6.0);
        let store = &next.data_stores[0];
        assert_eq!((store.x, store.y), (Some(5.0), Some(6.0)));
        assert_eq!(next.move_node("missing", 1.0, 1.0), next);
    }

    #[test]
    fn test_patch_node_and_flow() {
        let graph = sample()
            .patch_element("P1", &ElementPatch::rename("Take Order"))
            .patch_element("F1", &ElementPatch::bidirectional(true))
            .patch_element("F1", &ElementPatch::protocol(Protocol::Https));
        assert_eq!(graph.processes[0].name, "Take Order");
        let flow = graph.flow("F1").unwrap();
        assert!(flow.bidirectional());
        assert_eq!(flow.effective_protocol(), Protocol::Https);
    }

    #[test]
    fn test_patch_ignores_foreign_fields() {
        let patch = ElementPatch {
            label: Some("ignored".to_string()),
            prefix: Some("X".to_string()),
            ..Default::default()
        };
        let graph = sample().patch_element("E", &patch);
        assert_eq!(graph, sample());
    }

    #[test]
    fn test_validate_reports_issues() {
        let mut graph = sample();
        graph.data_stores.push(DataStore::new("E", "Clash"));
        graph.data_flows.push(DataFlow::new("F1", "P1", "ghost", "Lost"));
        let issues = graph.validate();
        assert!(issues.contains(&GraphIssue::DuplicateNodeId { id: "E".to_string() }));
        assert!(issues.contains(&GraphIssue::DuplicateFlowId { id: "F1".to_string() }));
        assert!(issues.contains(&GraphIssue::DanglingFlow {
            flow_id: "F1".to_string(),
            missing: "ghost".to_string()
        }));
        assert!(sample().validate().is_empty());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("externalEntities").is_some());
        assert!(json.get("dataFlows").is_some());
        assert_eq!(json["dataFlows"][0]["sourceId"], "E");
        assert!(json["dataFlows"][0].get("protocol").is_none());
        assert!(json.get("level").is_none());
    }

    #[test]
    fn test_header_and_prefix_fallbacks() {
        assert_eq!(Process::new("p-7", "", "x").header(), "p-7");
        assert_eq!(DataStore::new("s", "x").prefix_label(), "DB");
    }
}
