//! Topic names under a node prefix `<base><n>/`.

use std::fmt;

use crate::config::ConfigError;
use crate::types::NodeId;

pub const DEFAULT_BASE: &str = "/odroid/fish/";

pub const LAKE: &str = "lake";
pub const HATCHERY: &str = "hatchery";
pub const VIEW: &str = "view";
pub const DISPLAY: &str = "display";
pub const DISPLAY_MERGE: &str = "display/merge";

/// Prefix of one node: a shared base path plus the node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    base: String,
    node: NodeId,
}

impl NodeAddress {
    /// `base` is normalised to end with `/`.
    pub fn new(base: &str, node: NodeId) -> Self {
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base, node }
    }

    /// Parse a node prefix such as `/odroid/fish/2/`.
    pub fn parse(prefix: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedPrefix(prefix.to_string());

        let trimmed = prefix.strip_suffix('/').ok_or_else(malformed)?;
        if !trimmed.starts_with('/') {
            return Err(malformed());
        }
        let (base, id) = trimmed.rsplit_once('/').ok_or_else(malformed)?;
        if base.is_empty() || id.is_empty() {
            return Err(malformed());
        }

        // Exactly one decimal digit: no signs, no leading zeros.
        let node = match id.as_bytes() {
            [digit @ b'0'..=b'9'] => NodeId::new(digit - b'0'),
            _ => None,
        }
            .ok_or_else(|| ConfigError::UnknownNode {
                prefix: prefix.to_string(),
                id: id.to_string(),
            })?;

        Ok(Self::new(base, node))
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The same base, another node.
    pub fn peer(&self, node: NodeId) -> NodeAddress {
        Self {
            base: self.base.clone(),
            node,
        }
    }

    pub fn prefix(&self) -> String {
        format!("{}{}/", self.base, self.node)
    }

    pub fn topic(&self, suffix: &str) -> String {
        format!("{}{}/{}", self.base, self.node, suffix)
    }

    pub fn lake(&self) -> String {
        self.topic(LAKE)
    }

    pub fn hatchery(&self) -> String {
        self.topic(HATCHERY)
    }

    pub fn view(&self) -> String {
        self.topic(VIEW)
    }

    pub fn display(&self) -> String {
        self.topic(DISPLAY)
    }

    pub fn merge(&self) -> String {
        self.topic(DISPLAY_MERGE)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/", self.base, self.node)
    }
}
