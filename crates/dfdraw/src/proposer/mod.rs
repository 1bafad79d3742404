//! Structure proposer contract
//!
//! A structure proposer turns an image, CSV text or a free-form instruction
//! into a candidate graph. The engine only consumes proposers: it builds a
//! [`ProposerRequest`], awaits a [`ProposerResponse`] and decides what to do
//! with it. Failures never touch the current graph.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

use crate::core::{DfdError, Graph};

#[cfg(not(target_arch = "wasm32"))]
mod command;

#[cfg(not(target_arch = "wasm32"))]
pub use command::CommandProposer;

/// What the proposer wants the host to do with its answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposerAction {
    /// `updated_dfd` replaces the current graph
    Update,
    /// The proposer needs more input before changing anything
    Question,
    /// Nothing left to do
    Complete,
}

/// Author of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        })
    }
}

/// Prior conversation passed along with refinement requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Binary image with its media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    /// PNG image
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    fn to_wire(&self) -> WireImage {
        WireImage {
            media_type: self.media_type.clone(),
            data: BASE64.encode(&self.bytes),
        }
    }
}

/// Input to a structure proposer
#[derive(Debug, Clone, PartialEq)]
pub enum ProposerRequest {
    FromImage {
        image: ImageAttachment,
    },
    FromCsv {
        text: String,
    },
    Refine {
        instruction: String,
        current: Option<Graph>,
        history: Vec<HistoryEntry>,
        image: Option<ImageAttachment>,
    },
}

impl ProposerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ProposerRequest::FromImage { .. } => "fromImage",
            ProposerRequest::FromCsv { .. } => "fromCsv",
            ProposerRequest::Refine { .. } => "refine",
        }
    }

    /// JSON-ready form; images are base64 encoded
    pub fn to_wire(&self) -> WireRequest {
        match self {
            ProposerRequest::FromImage { image } => WireRequest::FromImage {
                image: image.to_wire(),
            },
            ProposerRequest::FromCsv { text } => WireRequest::FromCsv { text: text.clone() },
            ProposerRequest::Refine {
                instruction,
                current,
                history,
                image,
            } => WireRequest::Refine {
                instruction: instruction.clone(),
                current: current.clone(),
                history: history.clone(),
                image: image.as_ref().map(ImageAttachment::to_wire),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage {
    pub media_type: String,
    pub data: String,
}

/// Serialized proposer request, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WireRequest {
    FromImage {
        image: WireImage,
    },
    FromCsv {
        text: String,
    },
    Refine {
        instruction: String,
        current: Option<Graph>,
        history: Vec<HistoryEntry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<WireImage>,
    },
}

/// Answer from a structure proposer
///
/// A missing `updated_dfd` means no structural change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposerResponse {
    pub action: ProposerAction,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_dfd: Option<Graph>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_prompts: Vec<String>,
}

impl ProposerResponse {
    pub fn question(message: impl Into<String>) -> Self {
        Self {
            action: ProposerAction::Question,
            message: message.into(),
            updated_dfd: None,
            suggested_prompts: Vec::new(),
        }
    }

    pub fn update(message: impl Into<String>, graph: Graph) -> Self {
        Self {
            action: ProposerAction::Update,
            message: message.into(),
            updated_dfd: Some(graph),
            suggested_prompts: Vec::new(),
        }
    }

    pub fn with_prompts(mut self, prompts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggested_prompts = prompts.into_iter().map(Into::into).collect();
        self
    }
}

/// Strip a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (e.g. `json`) on the opening line
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse proposer output into a response
///
/// Anything that is not a response document is a
/// [`DfdError::MalformedProposer`].
pub fn parse_response(text: &str) -> Result<ProposerResponse, DfdError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(DfdError::malformed_proposer("empty response"));
    }
    trace!(bytes = body.len(), "Parsing proposer response");
    let response: ProposerResponse =
        serde_json::from_str(body).map_err(|err| DfdError::malformed_proposer(err.to_string()))?;
    debug!(
        action = ?response.action,
        has_graph = response.updated_dfd.is_some(),
        prompts = response.suggested_prompts.len(),
        "Proposer response parsed"
    );
    Ok(response)
}

/// An external service that proposes graph structure
#[async_trait]
pub trait StructureProposer: Send + Sync {
    async fn propose(&self, request: ProposerRequest) -> Result<ProposerResponse, DfdError>;

    /// Short name for logs
    fn name(&self) -> &str;

    async fn propose_from_image(
        &self,
        image: ImageAttachment,
    ) -> Result<ProposerResponse, DfdError> {
        self.propose(ProposerRequest::FromImage { image }).await
    }

    async fn propose_from_csv(&self, text: String) -> Result<ProposerResponse, DfdError> {
        self.propose(ProposerRequest::FromCsv { text }).await
    }

    async fn refine(
        &self,
        instruction: String,
        current: Option<Graph>,
        history: Vec<HistoryEntry>,
        image: Option<ImageAttachment>,
    ) -> Result<ProposerResponse, DfdError> {
        self.propose(ProposerRequest::Refine {
            instruction,
            current,
            history,
            image,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Entity;

    #[test]
    fn test_parse_plain_response() {
        let response = parse_response(
            r#"{"action":"question","message":"Which database?","suggested_prompts":["Postgres","MySQL"]}"#,
        )
        .unwrap();
        assert_eq!(response.action, ProposerAction::Question);
        assert!(response.updated_dfd.is_none());
        assert_eq!(response.suggested_prompts.len(), 2);
    }

    #[test]
    fn test_parse_fenced_response() {
        let text = "```json\n{\"action\":\"update\",\"message\":\"ok\",\"updated_dfd\":{\"externalEntities\":[{\"id\":\"e1\",\"name\":\"User\"}]}}\n```";
        let response = parse_response(text).unwrap();
        let graph = response.updated_dfd.unwrap();
        assert_eq!(graph.external_entities, vec![Entity::new("e1", "User")]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "   ", "I could not read the image", "{\"action\":\"dance\"}"] {
            let err = parse_response(text).unwrap_err();
            assert!(matches!(err, DfdError::MalformedProposer { .. }), "{text}");
        }
    }

    #[test]
    fn test_wire_request_encodes_images() {
        let request = ProposerRequest::Refine {
            instruction: "add a cache".to_string(),
            current: None,
            history: vec![HistoryEntry::new(ChatRole::User, "hi")],
            image: Some(ImageAttachment::png(vec![1, 2, 3])),
        };
        let json = serde_json::to_value(request.to_wire()).unwrap();
        assert_eq!(json["kind"], "refine");
        assert_eq!(json["image"]["data"], "AQID");
        assert_eq!(json["image"]["mediaType"], "image/png");
        assert_eq!(json["history"][0]["role"], "user");
        assert!(json["current"].is_null());
    }

    #[test]
    fn test_request_kind() {
        let request = ProposerRequest::FromCsv {
            text: "a,b".to_string(),
        };
        assert_eq!(request.kind(), "fromCsv");
        assert_eq!(serde_json::to_value(request.to_wire()).unwrap()["text"], "a,b");
    }
}
