//! Core types for content nodes and result URIs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known classification root for addressable page nodes.
pub const DOCUMENT_TYPE: &str = "Neos.Neos:Document";

/// Well-known classification root for in-page content nodes.
pub const CONTENT_TYPE: &str = "Neos.Neos:Content";

/// Property holding a node's URI path segment.
pub const URI_PATH_SEGMENT: &str = "uriPathSegment";

/// Glyph prefixed to URIs of fully visible documents.
pub const VISIBLE_GLYPH: &str = "🟢";

/// Glyph prefixed to URIs of documents hidden themselves or via an ancestor.
pub const HIDDEN_GLYPH: &str = "🔴";

/// Absolute path of a node in the content tree, e.g. `/sites/acme/about`.
///
/// Depth is the number of segments: `/` has depth 0, `/sites` depth 1,
/// a site node `/sites/acme` depth 2. Nodes at depth <= 2 never contribute
/// a URI path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The tree root `/`.
    pub fn root() -> Self {
        NodePath::default()
    }

    /// Parse an absolute path string. Empty segments (doubled or trailing
    /// slashes) are dropped, so `/sites/` and `/sites` are the same path.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('/') {
            return None;
        }
        let segments = trimmed
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        Some(NodePath { segments })
    }

    /// Child path with one more segment.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        NodePath { segments }
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Scalar property value as stored in a tree snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Text form used for filter comparison and URI segment lookup.
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::String(s) => s.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let path = NodePath::parse("/").unwrap();
        assert_eq!(path.depth(), 0);
        assert_eq!(path.to_string(), "/");
    }

    #[test]
    fn test_parse_rejects_relative() {
        assert!(NodePath::parse("sites/acme").is_none());
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let path = NodePath::parse("/sites/acme/").unwrap();
        assert_eq!(path.depth(), 2);
        assert_eq!(path.to_string(), "/sites/acme");
    }

    #[test]
    fn test_join_increments_depth() {
        let path = NodePath::parse("/sites").unwrap().join("acme");
        assert_eq!(path.depth(), 2);
        assert_eq!(path.segments(), &["sites".to_string(), "acme".to_string()]);
    }

    #[test]
    fn test_property_value_as_text() {
        assert_eq!(PropertyValue::Int(1).as_text(), "1");
        assert_eq!(PropertyValue::Bool(true).as_text(), "true");
        assert_eq!(PropertyValue::String("about".into()).as_text(), "about");
    }
}
