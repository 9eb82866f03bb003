use std::fmt;
use std::str::FromStr;

use super::{error::TreeError, segment::Segment};

/// Absolute location of a node below the schema root, in root-to-leaf order.
///
/// The root sentinel itself is never part of an `XPath`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XPath(Vec<Segment>);

impl XPath {
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn last(&self) -> &Segment {
        // non-empty by construction
        &self.0[self.0.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// True for nodes that sit directly below the schema root.
    pub fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }

    /// Builds a path from root-to-leaf segments. Returns `None` for an empty list.
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for XPath {
    type Err = TreeError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let segments = source
            .split('/')
            .map(str::parse)
            .collect::<Result<Vec<Segment>, _>>()?;
        Self::from_segments(segments).ok_or_else(|| TreeError::InvalidSegment(source.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments_with_slashes() {
        let xpath = XPath::from_segments(vec![
            Segment::prefixed("xs", "complexType"),
            Segment::prefixed("xs", "sequence"),
            Segment::prefixed("xs", "element").with_index(2),
        ])
        .unwrap();
        assert_eq!(
            xpath.to_string(),
            "xs:complexType/xs:sequence/xs:element[2]"
        );
        assert_eq!(xpath.depth(), 3);
        assert_eq!(xpath.last().position(), 2);
    }

    #[test]
    fn parse_and_display_agree() {
        let source = "xs:element/xs:complexType/xs:sequence/xs:element[3]";
        let xpath: XPath = source.parse().unwrap();
        assert_eq!(xpath.to_string(), source);
    }

    #[test]
    fn empty_steps_are_rejected() {
        assert!("".parse::<XPath>().is_err());
        assert!("/xs:element".parse::<XPath>().is_err());
        assert!("xs:element//xs:sequence".parse::<XPath>().is_err());
    }

    #[test]
    fn empty_segment_list_is_not_a_path() {
        assert_eq!(XPath::from_segments(Vec::new()), None);
    }
}
