//! Core type definitions for data flow diagrams
//!
//! This module contains the small vocabulary shared by the graph model and the
//! scene engine: node kinds and flow protocols.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three positioned node kinds of a DFD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// External actor: sharp-cornered rectangle
    Entity,
    /// Process: rounded rectangle with a numbered header band
    Process,
    /// Data store: open rectangle with a prefix column
    Store,
}

impl NodeKind {
    /// All node kinds in draw/collection order
    pub const ALL: [NodeKind; 3] = [NodeKind::Entity, NodeKind::Process, NodeKind::Store];

    /// Prefix used when generating ids for nodes of this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::Entity => "e",
            NodeKind::Process => "p",
            NodeKind::Store => "s",
        }
    }

    /// Role tag reported alongside a selected node
    pub fn role(&self) -> &'static str {
        match self {
            NodeKind::Entity => "entity",
            NodeKind::Process => "process",
            NodeKind::Store => "store",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entity" | "external_entity" => Ok(NodeKind::Entity),
            "process" => Ok(NodeKind::Process),
            "store" | "data_store" => Ok(NodeKind::Store),
            _ => Err(format!("Unknown node kind: {}", s)),
        }
    }
}

/// Transport protocol of a data flow
///
/// Drives the color coding of flow strokes and arrowheads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Web/API traffic
    Https,
    /// Database queries
    Sql,
    /// Anything else
    #[default]
    Standard,
}

impl Protocol {
    /// All protocols, in marker allocation order
    pub const ALL: [Protocol; 3] = [Protocol::Https, Protocol::Sql, Protocol::Standard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Sql => "sql",
            Protocol::Standard => "standard",
        }
    }

    /// Stroke color of flow paths using this protocol
    pub fn stroke_color(&self) -> &'static str {
        match self {
            Protocol::Https => "#3b82f6",
            Protocol::Sql => "#fbbf24",
            Protocol::Standard => "#94a3b8",
        }
    }

    /// Fill color of arrowheads using this protocol
    pub fn marker_color(&self) -> &'static str {
        match self {
            Protocol::Https => "#3b82f6",
            Protocol::Sql => "#f59e0b",
            Protocol::Standard => "#64748b",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "https" => Ok(Protocol::Https),
            "sql" => Ok(Protocol::Sql),
            "standard" => Ok(Protocol::Standard),
            _ => Err(format!("Unknown protocol: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_display() {
        assert_eq!(NodeKind::Entity.to_string(), "entity");
        assert_eq!(NodeKind::Process.to_string(), "process");
        assert_eq!(NodeKind::Store.to_string(), "store");
    }

    #[test]
    fn test_node_kind_parsing() {
        assert_eq!("entity".parse::<NodeKind>().unwrap(), NodeKind::Entity);
        assert_eq!("Data_Store".parse::<NodeKind>().unwrap(), NodeKind::Store);
        assert!("cloud".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_id_prefixes_are_distinct() {
        let prefixes: Vec<_> = NodeKind::ALL.iter().map(|k| k.id_prefix()).collect();
        assert_eq!(prefixes, vec!["e", "p", "s"]);
    }

    #[test]
    fn test_protocol_default_and_display() {
        assert_eq!(Protocol::default(), Protocol::Standard);
        assert_eq!(Protocol::Https.to_string(), "https");
        assert_eq!(Protocol::Sql.to_string(), "sql");
        assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
        assert!("ftp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_protocol_colors() {
        assert_eq!(Protocol::Https.stroke_color(), "#3b82f6");
        assert_eq!(Protocol::Sql.stroke_color(), "#fbbf24");
        assert_eq!(Protocol::Standard.stroke_color(), "#94a3b8");
        assert_eq!(Protocol::Sql.marker_color(), "#f59e0b");
    }

    #[test]
    fn test_protocol_serde() {
        let json = serde_json::to_string(&Protocol::Sql).unwrap();
        assert_eq!(json, "\"sql\"");
        let parsed: Protocol = serde_json::from_str("\"https\"").unwrap();
        assert_eq!(parsed, Protocol::Https);
        assert!(serde_json::from_str::<Protocol>("\"grpc\"").is_err());
    }
}
