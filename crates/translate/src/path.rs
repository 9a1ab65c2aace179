//! Addressing of configuration tree nodes.
//!
//! A [`ConfigPath`] names exactly one node: an ordered list of segments, each a
//! node name with an optional list key. A [`PathPattern`] is the same sequence
//! without keys and is what handlers are registered against.
//!
//! Paths render as `/network-instance[default]/protocol[ospf 1]/config` and parse
//! back from that form. Keys may contain `/` (interface names do), so parsing
//! tracks brackets instead of splitting on separators.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Segment {
    /// Node (subtree type) name, e.g. `interface`
    pub node: String,
    /// List key when the node is a list member, e.g. `Loopback45`
    pub key: Option<String>,
}

impl Segment {
    fn unkeyed(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            key: None,
        }
    }

    fn keyed(node: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            key: Some(key.into()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}[{}]", self.node, key),
            None => write!(f, "{}", self.node),
        }
    }
}

// ============================================================================
// ConfigPath
// ============================================================================

/// Immutable address of one node in the configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigPath {
    segments: Vec<Segment>,
}

impl ConfigPath {
    /// The empty path (tree root).
    pub fn root() -> Self {
        Self::default()
    }

    /// Append an unkeyed node.
    pub fn child(&self, node: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::unkeyed(node));
        Self { segments }
    }

    /// Append a keyed list member.
    pub fn keyed(&self, node: impl Into<String>, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::keyed(node, key));
        Self { segments }
    }

    /// Replace the key of the last segment.
    ///
    /// Used to turn a list path (`/network-instance`) into a member path
    /// (`/network-instance[default]`).
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.key = Some(key.into());
        }
        Self { segments }
    }

    /// The same path with the last segment's key dropped (member → list).
    pub fn with_key_removed(&self) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.key = None;
        }
        Self { segments }
    }

    /// Key of the first segment named `node`, if that segment is keyed.
    pub fn first_key_of(&self, node: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.node == node)
            .and_then(|s| s.key.as_deref())
    }

    /// Key of the last segment named `node`.
    pub fn last_key_of(&self, node: &str) -> Option<&str> {
        self.segments
            .iter()
            .rev()
            .find(|s| s.node == node)
            .and_then(|s| s.key.as_deref())
    }

    /// Like [`first_key_of`](Self::first_key_of) but a missing key is a wiring error.
    pub fn require_key(&self, node: &str) -> Result<&str> {
        self.first_key_of(node).ok_or_else(|| {
            Error::contract(self, format!("path has no key for node '{node}'"))
        })
    }

    /// Key of the last segment, if any.
    pub fn last_key(&self) -> Option<&str> {
        self.segments.last().and_then(|s| s.key.as_deref())
    }

    /// Name of the last node.
    pub fn last_node(&self) -> Option<&str> {
        self.segments.last().map(|s| s.node.as_str())
    }

    /// The path without its last segment, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self { segments })
    }

    /// Prefix of this path ending at the last segment named `node`.
    pub fn cut_at(&self, node: &str) -> Option<Self> {
        let pos = self.segments.iter().rposition(|s| s.node == node)?;
        Some(Self {
            segments: self.segments[..=pos].to_vec(),
        })
    }

    /// The first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Keyless pattern of this path.
    pub fn pattern(&self) -> PathPattern {
        PathPattern {
            nodes: self.segments.iter().map(|s| s.node.clone()).collect(),
        }
    }

    /// All segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ConfigPath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut chars = s.trim().chars().peekable();

        while let Some(c) = chars.next() {
            if c != '/' {
                return Err(ParsePathError::new(s, "expected '/' before node name"));
            }
            let mut node = String::new();
            while let Some(&c) = chars.peek() {
                if c == '/' || c == '[' {
                    break;
                }
                node.push(c);
                chars.next();
            }
            if node.is_empty() {
                // A lone "/" is the root path
                if segments.is_empty() && chars.peek().is_none() {
                    break;
                }
                return Err(ParsePathError::new(s, "empty node name"));
            }

            let key = if chars.peek() == Some(&'[') {
                chars.next();
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(c) => key.push(c),
                        None => return Err(ParsePathError::new(s, "unterminated key")),
                    }
                }
                Some(key)
            } else {
                None
            };

            segments.push(Segment { node, key });
        }

        Ok(Self { segments })
    }
}

impl TryFrom<String> for ConfigPath {
    type Error = ParsePathError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConfigPath> for String {
    fn from(path: ConfigPath) -> Self {
        path.to_string()
    }
}

/// A path string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path '{input}': {reason}")]
pub struct ParsePathError {
    input: String,
    reason: &'static str,
}

impl ParsePathError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

// ============================================================================
// PathPattern
// ============================================================================

/// Keyless node sequence used for handler registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathPattern {
    nodes: Vec<String>,
}

impl PathPattern {
    /// Build a pattern from node names.
    pub fn new<S: AsRef<str>>(nodes: &[S]) -> Self {
        Self {
            nodes: nodes.iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }

    /// Append a node.
    pub fn child(&self, node: &str) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node.to_string());
        Self { nodes }
    }

    /// Exact match against a concrete path, ignoring keys.
    pub fn matches(&self, path: &ConfigPath) -> bool {
        self.nodes.len() == path.len()
            && self
                .nodes
                .iter()
                .zip(path.segments())
                .all(|(n, s)| *n == s.node)
    }

    /// Whether `path` is this pattern or nested below it.
    pub fn covers(&self, path: &ConfigPath) -> bool {
        self.nodes.len() <= path.len()
            && self
                .nodes
                .iter()
                .zip(path.segments())
                .all(|(n, s)| *n == s.node)
    }

    /// Whether `other` sits exactly one node below this pattern.
    pub fn is_parent_of(&self, other: &Self) -> bool {
        other.nodes.len() == self.nodes.len() + 1 && other.nodes.starts_with(&self.nodes)
    }

    /// Last node name.
    pub fn last(&self) -> Option<&str> {
        self.nodes.last().map(String::as_str)
    }

    /// Node names in order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pattern has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return write!(f, "/");
        }
        for node in &self.nodes {
            write!(f, "/{node}")?;
        }
        Ok(())
    }
}

impl FromStr for PathPattern {
    type Err = ParsePathError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let path: ConfigPath = s.parse()?;
        if path.segments().iter().any(|seg| seg.key.is_some()) {
            return Err(ParsePathError::new(s, "patterns cannot carry keys"));
        }
        Ok(path.pattern())
    }
}
