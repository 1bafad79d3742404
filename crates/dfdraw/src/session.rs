//! Editing session
//!
//! [`Workspace`] is the host-side state around a diagram: the current graph,
//! edit mode, the selected element, a chat-style transcript of notices, and
//! sequencing of structure proposer requests. Every graph change goes through
//! the pure operations of [`Graph`], so a failed step leaves the previous
//! graph in place.
//!
//! Proposer requests are tagged with a [`RequestTicket`]. Only the response to
//! the most recent request is applied; earlier ones that arrive late are
//! discarded with a notice.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bridge::{SceneListener, SelectedElement};
use crate::core::{
    DfdError, ElementPatch, Graph, IdGenerator, NodeFields, NodeKind, Protocol, SequentialIds,
};
use crate::proposer::{
    ChatRole, HistoryEntry, ImageAttachment, ProposerRequest, ProposerResponse, StructureProposer,
};
use crate::scene::{SceneHandle, SceneOp};

/// Label of flows added from the toolbar
pub const DEFAULT_FLOW_LABEL: &str = "Data Sync";

/// Transcript line shown when an image is sent without text
pub const ATTACHMENT_ONLY_MESSAGE: &str = "Analyzed attachment.";

/// A transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_prompts: Vec<String>,
    pub has_image: bool,
}

/// Identifies one proposer request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// What the user handed to the proposer
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalInput {
    /// An uploaded diagram image
    Image { name: String, image: ImageAttachment },
    /// An uploaded CSV file
    Csv { name: String, text: String },
    /// A chat message, optionally with an image
    Message {
        text: String,
        image: Option<ImageAttachment>,
    },
}

/// Result of handing a proposer outcome to the workspace
#[derive(Debug, Clone, PartialEq)]
pub enum ProposalOutcome {
    /// The proposed graph replaced the current one
    Updated,
    /// The proposer answered without a structural change
    Answered,
    /// A newer request was issued; nothing was applied
    Stale,
    /// The proposer failed; the graph is unchanged
    Failed(String),
}

/// Host state around one diagram
#[derive(Debug)]
pub struct Workspace<G: IdGenerator = SequentialIds> {
    graph: Option<Graph>,
    edit_mode: bool,
    selected: Option<String>,
    messages: Vec<ChatMessage>,
    ids: G,
    next_message: u64,
    latest_ticket: u64,
    pending: Option<RequestTicket>,
}

impl Default for Workspace<SequentialIds> {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace<SequentialIds> {
    pub fn new() -> Self {
        Self::with_ids(SequentialIds::new())
    }
}

impl<G: IdGenerator> Workspace<G> {
    pub fn with_ids(ids: G) -> Self {
        Self {
            graph: None,
            edit_mode: false,
            selected: None,
            messages: Vec::new(),
            ids,
            next_message: 0,
            latest_ticket: 0,
            pending: None,
        }
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Replace the graph, e.g. after loading a file
    pub fn set_graph(&mut self, graph: Graph) {
        self.graph = Some(graph);
        self.prune_selection();
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.edit_mode = !self.edit_mode;
        debug!(edit_mode = self.edit_mode, "Edit mode toggled");
        self.edit_mode
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Current record of the selected element
    pub fn selected(&self) -> Option<SelectedElement> {
        let id = self.selected.as_deref()?;
        SelectedElement::lookup(self.graph.as_ref()?, id)
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
        self.prune_selection();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while the latest proposer request has not completed
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Draw the current graph into `scene`
    pub fn render(&self, scene: &mut SceneHandle) -> Vec<SceneOp> {
        match &self.graph {
            Some(graph) => scene.render(graph, self.edit_mode),
            None => scene.render(&Graph::default(), self.edit_mode),
        }
    }

    /// The graph as a pretty JSON document
    pub fn export_json(&self) -> Result<String, DfdError> {
        self.graph
            .as_ref()
            .ok_or_else(|| DfdError::precondition("there is no diagram to export"))?
            .to_json_pretty()
    }

    fn prune_selection(&mut self) {
        let still_there = match (&self.selected, &self.graph) {
            (Some(id), Some(graph)) => graph.contains_id(id),
            (Some(_), None) => false,
            (None, _) => true,
        };
        if !still_there {
            self.selected = None;
        }
    }

    fn post(&mut self, role: ChatRole, content: impl Into<String>) -> &mut ChatMessage {
        self.next_message += 1;
        self.messages.push(ChatMessage {
            id: self.next_message,
            role,
            content: content.into(),
            suggested_prompts: Vec::new(),
            has_image: false,
        });
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }

    /// Add a system notice to the transcript
    pub fn notify(&mut self, content: impl Into<String>) {
        self.post(ChatRole::System, content);
    }

    fn add_node(&mut self, kind: NodeKind, fields: NodeFields) -> String {
        let graph = self.graph.take().unwrap_or_default();
        let (next, id) = graph.add_node(kind, fields, &mut self.ids);
        self.graph = Some(next);
        self.selected = Some(id.clone());
        id
    }

    /// Add `New Actor` at (200, 200) and select it
    pub fn add_entity(&mut self) -> String {
        self.add_node(NodeKind::Entity, NodeFields::default().at(200.0, 200.0))
    }

    /// Add `New Logic`, numbered after the existing processes, at (400, 400)
    pub fn add_process(&mut self) -> String {
        self.add_node(NodeKind::Process, NodeFields::default().at(400.0, 400.0))
    }

    /// Add `New Store` with prefix `DB` at (600, 600)
    pub fn add_store(&mut self) -> String {
        self.add_node(NodeKind::Store, NodeFields::default().at(600.0, 600.0))
    }

    /// Connect the first two nodes with a `Data Sync` flow and select it
    ///
    /// With fewer than two nodes nothing changes and a notice is posted.
    pub fn add_flow(&mut self) -> Result<String, DfdError> {
        let graph = self.graph.clone().unwrap_or_default();
        let mut node_ids = graph.nodes().map(|n| n.id().to_string());
        let source = node_ids.next().unwrap_or_default();
        let target = node_ids.next().unwrap_or_default();

        let result = graph.add_flow(
            &source,
            &target,
            DEFAULT_FLOW_LABEL,
            Protocol::Standard,
            &mut self.ids,
        );

        match result {
            Ok((next, id)) => {
                self.graph = Some(next);
                self.selected = Some(id.clone());
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "Flow not added");
                self.notify(err.to_string());
                Err(err)
            }
        }
    }

    /// Delete an element and the flows referencing it
    pub fn delete(&mut self, id: &str) {
        if let Some(graph) = &self.graph {
            self.graph = Some(graph.delete_element(id));
        }
        self.prune_selection();
    }

    /// Delete the selected element; false when nothing is selected
    pub fn delete_selected(&mut self) -> bool {
        match self.selected.clone() {
            Some(id) => {
                self.delete(&id);
                true
            }
            None => false,
        }
    }

    /// Apply an inspector edit to the selected element
    pub fn update_selected(&mut self, patch: &ElementPatch) -> bool {
        let (Some(id), Some(graph)) = (&self.selected, &self.graph) else {
            return false;
        };
        self.graph = Some(graph.patch_element(id, patch));
        true
    }

    fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .map(|m| HistoryEntry::new(m.role, m.content.clone()))
            .collect()
    }

    /// Record the user's input and build the request for it
    ///
    /// The returned ticket becomes the only one whose outcome will be applied.
    pub fn begin_proposal(
        &mut self,
        input: ProposalInput,
    ) -> Result<(RequestTicket, ProposerRequest), DfdError> {
        let request = match input {
            ProposalInput::Image { name, image } => {
                self.post(ChatRole::User, format!("Uploaded diagram: {}", name))
                    .has_image = true;
                ProposerRequest::FromImage { image }
            }
            ProposalInput::Csv { name, text } => {
                self.post(ChatRole::User, format!("Uploaded CSV data: {}", name));
                ProposerRequest::FromCsv { text }
            }
            ProposalInput::Message { text, image } => {
                let text = text.trim().to_string();
                if text.is_empty() && image.is_none() {
                    return Err(DfdError::precondition("nothing to send"));
                }
                if self.graph.is_none() && image.is_none() {
                    let err = DfdError::precondition(
                        "there is no diagram to refine yet, upload an image or CSV first",
                    );
                    warn!(error = %err, "Message not sent");
                    self.notify(err.to_string());
                    return Err(err);
                }
                let history = self.history();
                let shown = if text.is_empty() {
                    ATTACHMENT_ONLY_MESSAGE.to_string()
                } else {
                    text.clone()
                };
                self.post(ChatRole::User, shown).has_image = image.is_some();
                match (&self.graph, image) {
                    // without a diagram an attached image starts one
                    (None, Some(image)) => ProposerRequest::FromImage { image },
                    (current, image) => ProposerRequest::Refine {
                        instruction: text,
                        current: current.clone(),
                        history,
                        image,
                    },
                }
            }
        };

        self.latest_ticket += 1;
        let ticket = RequestTicket(self.latest_ticket);
        self.pending = Some(ticket);
        debug!(ticket = ticket.0, kind = request.kind(), "Proposal started");
        Ok((ticket, request))
    }

    /// Apply the outcome of the request identified by `ticket`
    pub fn complete_proposal(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<ProposerResponse, DfdError>,
    ) -> ProposalOutcome {
        if ticket.0 != self.latest_ticket {
            warn!(
                ticket = ticket.0,
                latest = self.latest_ticket,
                "Discarding response to a superseded request"
            );
            self.notify("Ignored a late response to an earlier request.");
            return ProposalOutcome::Stale;
        }
        self.pending = None;

        match outcome {
            Ok(response) => {
                let updated = response.updated_dfd.is_some();
                if let Some(graph) = response.updated_dfd {
                    info!(
                        nodes = graph.node_count(),
                        flows = graph.flow_count(),
                        "Proposed graph applied"
                    );
                    self.graph = Some(graph);
                    self.prune_selection();
                }
                self.post(ChatRole::Assistant, response.message)
                    .suggested_prompts = response.suggested_prompts;
                if updated {
                    ProposalOutcome::Updated
                } else {
                    ProposalOutcome::Answered
                }
            }
            Err(err) => {
                warn!(error = %err, "Proposal failed");
                let message = err.to_string();
                self.notify(format!("Error: {}", message));
                ProposalOutcome::Failed(message)
            }
        }
    }

    /// Run one proposer round trip
    pub async fn propose<P>(&mut self, proposer: &P, input: ProposalInput) -> Result<ProposalOutcome, DfdError>
    where
        P: StructureProposer + ?Sized,
    {
        let (ticket, request) = self.begin_proposal(input)?;
        debug!(proposer = proposer.name(), "Awaiting proposer");
        let outcome = proposer.propose(request).await;
        Ok(self.complete_proposal(ticket, outcome))
    }
}

impl<G: IdGenerator> SceneListener for Workspace<G> {
    fn on_select_element(&mut self, element: SelectedElement) {
        self.selected = Some(element.id().to_string());
    }

    fn on_update_element_position(&mut self, id: &str, x: f64, y: f64) {
        if let Some(graph) = &self.graph {
            self.graph = Some(graph.move_node(id, x, y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposer::ProposerAction;

    #[test]
    fn test_toolbar_defaults() {
        let mut ws = Workspace::new();
        let entity = ws.add_entity();
        let process = ws.add_process();
        let store = ws.add_store();

        let graph = ws.graph().unwrap();
        let e = &graph.external_entities[0];
        assert_eq!((e.id.as_str(), e.name.as_str()), (entity.as_str(), "New Actor"));
        assert_eq!((e.x, e.y), (Some(200.0), Some(200.0)));
        let p = &graph.processes[0];
        assert_eq!((p.id.as_str(), p.number.as_str()), (process.as_str(), "1"));
        let s = &graph.data_stores[0];
        assert_eq!(s.id, store);
        assert_eq!(s.prefix.as_deref(), Some("DB"));
        assert_eq!(ws.selected_id(), Some(store.as_str()));
    }

    #[test]
    fn test_add_flow_connects_first_two_nodes() {
        let mut ws = Workspace::new();
        let a = ws.add_store();
        let b = ws.add_entity();
        let flow_id = ws.add_flow().unwrap();
        let flow = ws.graph().unwrap().flow(&flow_id).unwrap().clone();
        // entities come before stores
        assert_eq!((flow.source_id, flow.target_id), (b, a));
        assert_eq!(flow.label, DEFAULT_FLOW_LABEL);
        assert_eq!(ws.selected().unwrap().role(), "flow");
    }

    #[test]
    fn test_add_flow_without_nodes_posts_notice() {
        let mut ws = Workspace::new();
        ws.add_entity();
        let before = ws.graph().cloned();
        assert!(ws.add_flow().is_err());
        assert_eq!(ws.graph().cloned(), before);
        assert_eq!(ws.messages().last().unwrap().role, ChatRole::System);
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut ws = Workspace::new();
        ws.add_entity();
        ws.add_process();
        ws.add_flow().unwrap();
        ws.select(Some("p-2".to_string()));
        assert!(ws.delete_selected());
        assert!(ws.selected_id().is_none());
        assert_eq!(ws.graph().unwrap().flow_count(), 0);
        assert!(!ws.delete_selected());
    }

    #[test]
    fn test_update_selected() {
        let mut ws = Workspace::new();
        ws.add_process();
        assert!(ws.update_selected(&ElementPatch::rename("Billing")));
        assert_eq!(ws.graph().unwrap().processes[0].name, "Billing");
    }

    #[test]
    fn test_position_commit_moves_node() {
        let mut ws = Workspace::new();
        let id = ws.add_entity();
        ws.on_update_element_position(&id, 5.0, 7.0);
        let e = &ws.graph().unwrap().external_entities[0];
        assert_eq!((e.x, e.y), (Some(5.0), Some(7.0)));
    }

    #[test]
    fn test_late_response_is_discarded() {
        let mut ws = Workspace::new();
        let (first, _) = ws
            .begin_proposal(ProposalInput::Csv {
                name: "a.csv".into(),
                text: "x".into(),
            })
            .unwrap();
        let (second, _) = ws
            .begin_proposal(ProposalInput::Csv {
                name: "b.csv".into(),
                text: "y".into(),
            })
            .unwrap();

        let mut late = Graph::new();
        late.title = Some("late".into());
        assert_eq!(
            ws.complete_proposal(first, Ok(ProposerResponse::update("old", late))),
            ProposalOutcome::Stale
        );
        assert!(ws.graph().is_none());
        assert!(ws.is_busy());

        assert_eq!(
            ws.complete_proposal(second, Ok(ProposerResponse::question("Which queue?"))),
            ProposalOutcome::Answered
        );
        assert!(!ws.is_busy());
        assert_eq!(ws.messages().last().unwrap().content, "Which queue?");
    }

    #[test]
    fn test_failure_keeps_graph() {
        let mut ws = Workspace::new();
        ws.add_entity();
        let before = ws.graph().cloned();
        let (ticket, _) = ws
            .begin_proposal(ProposalInput::Message {
                text: "hi".into(),
                image: None,
            })
            .unwrap();
        let outcome = ws.complete_proposal(ticket, Err(DfdError::proposer_failure("offline")));
        assert!(matches!(outcome, ProposalOutcome::Failed(ref m) if m.contains("offline")));
        assert_eq!(ws.graph().cloned(), before);
        assert!(ws.messages().last().unwrap().content.starts_with("Error:"));
    }

    #[test]
    fn test_message_requests() {
        let mut ws = Workspace::new();
        assert!(ws
            .begin_proposal(ProposalInput::Message {
                text: "  ".into(),
                image: None
            })
            .is_err());

        // an image without a diagram starts one
        let (_, request) = ws
            .begin_proposal(ProposalInput::Message {
                text: String::new(),
                image: Some(ImageAttachment::png(vec![0])),
            })
            .unwrap();
        assert_eq!(ws.messages()[0].content, ATTACHMENT_ONLY_MESSAGE);
        assert!(ws.messages()[0].has_image);
        assert_eq!(request.kind(), "fromImage");

        ws.set_graph(Graph::with_title("Draft"));
        let (_, request) = ws
            .begin_proposal(ProposalInput::Message {
                text: String::new(),
                image: Some(ImageAttachment::png(vec![0])),
            })
            .unwrap();
        assert!(matches!(
            request,
            ProposerRequest::Refine { ref instruction, ref current, image: Some(_), .. }
                if instruction.is_empty() && current.is_some()
        ));
    }

    #[test]
    fn test_text_message_without_graph_is_rejected() {
        let mut ws = Workspace::new();
        let err = ws
            .begin_proposal(ProposalInput::Message {
                text: "add a db".into(),
                image: None,
            })
            .unwrap_err();
        assert!(matches!(err, DfdError::Precondition { .. }));
        assert!(!ws.is_busy());
        let notices: Vec<_> = ws.messages().iter().map(|m| m.role).collect();
        assert_eq!(notices, vec![ChatRole::System]);
    }

    #[test]
    fn test_history_includes_system_notices() {
        let mut ws = Workspace::new();
        ws.set_graph(Graph::with_title("Draft"));
        ws.notify("Flow not added");
        let (_, request) = ws
            .begin_proposal(ProposalInput::Message {
                text: "add a db".into(),
                image: None,
            })
            .unwrap();
        let ProposerRequest::Refine { history, .. } = request else {
            panic!("expected a refine request");
        };
        assert_eq!(history, vec![HistoryEntry::new(ChatRole::System, "Flow not added")]);
    }

    #[test]
    fn test_upload_messages() {
        let mut ws = Workspace::new();
        let (_, request) = ws
            .begin_proposal(ProposalInput::Image {
                name: "whiteboard.png".into(),
                image: ImageAttachment::png(vec![1]),
            })
            .unwrap();
        assert_eq!(ws.messages()[0].content, "Uploaded diagram: whiteboard.png");
        assert_eq!(request.kind(), "fromImage");

        let response = ProposerResponse {
            action: ProposerAction::Update,
            message: "Drafted".into(),
            updated_dfd: Some(Graph::with_title("Draft")),
            suggested_prompts: vec!["Add a cache".into()],
        };
        let ticket = RequestTicket(1);
        assert_eq!(ws.complete_proposal(ticket, Ok(response)), ProposalOutcome::Updated);
        assert_eq!(ws.graph().unwrap().title.as_deref(), Some("Draft"));
        assert_eq!(ws.messages()[1].suggested_prompts, vec!["Add a cache".to_string()]);
    }
}
