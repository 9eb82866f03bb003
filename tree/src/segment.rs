use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use super::error::TreeError;

pub type NCName = String;

/// Local name of the document element; its segment terminates every upward walk.
pub const SCHEMA_SENTINEL: &str = "schema";

/// One step of an XPath: `prefix:localName[index]`.
///
/// The index is the 1-based position among siblings with the same prefix and local name. It is
/// absent when the node is the only one of its name, in which case the position is implicitly 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    pub namespace_prefix: Option<String>,
    pub local_name: NCName,
    pub position_index: Option<NonZeroU32>,
}

impl Segment {
    pub fn new(namespace_prefix: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace_prefix: namespace_prefix.map(Into::into),
            local_name: local_name.into(),
            position_index: None,
        }
    }

    pub fn prefixed(namespace_prefix: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace_prefix), local_name)
    }

    /// Returns the segment with the given position index; `0` removes the index.
    pub fn with_index(mut self, index: u32) -> Self {
        self.position_index = NonZeroU32::new(index);
        self
    }

    pub fn position(&self) -> u32 {
        self.position_index.map(NonZeroU32::get).unwrap_or(1)
    }

    pub fn is_sentinel(&self) -> bool {
        self.local_name == SCHEMA_SENTINEL
    }

    pub fn has_same_name(&self, other: &Segment) -> bool {
        self.namespace_prefix == other.namespace_prefix && self.local_name == other.local_name
    }

    /// Whether this segment addresses the same node as `other` (an absent index counts as 1).
    pub fn matches(&self, other: &Segment) -> bool {
        self.has_same_name(other) && self.position() == other.position()
    }

    fn valid_name(name: &str) -> bool {
        !name.is_empty()
            && !name.contains(|c: char| matches!(c, '/' | '[' | ']' | ':') || c.is_whitespace())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.namespace_prefix.as_ref() {
            write!(f, "{prefix}:")?;
        }
        write!(f, "{}", self.local_name)?;
        if let Some(index) = self.position_index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

impl FromStr for Segment {
    type Err = TreeError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let invalid = || TreeError::InvalidSegment(source.to_string());

        let (name, position_index) = match source.split_once('[') {
            Some((name, index)) => {
                let index = index.strip_suffix(']').ok_or_else(invalid)?;
                let index = index.parse::<NonZeroU32>().map_err(|_| invalid())?;
                (name, Some(index))
            }
            None => (source, None),
        };

        let (namespace_prefix, local_name) = match name.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, name),
        };
        if !Self::valid_name(local_name) || !namespace_prefix.map_or(true, Self::valid_name) {
            return Err(invalid());
        }

        Ok(Self {
            namespace_prefix: namespace_prefix.map(str::to_string),
            local_name: local_name.to_string(),
            position_index,
        })
    }
}
