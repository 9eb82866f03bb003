use thiserror::Error;

use crate::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0:?} is not part of the tree")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has no path to a schema root")]
    UnresolvedPath(NodeId),
    #[error("the schema root has no XPath of its own")]
    SentinelNotAddressable,
    #[error("the document element is <{0}>, expected <schema>")]
    NotASchema(String),
    #[error("invalid path segment {0:?}")]
    InvalidSegment(String),
    #[error("invalid occurrence value {0:?}")]
    InvalidOccurs(String),
}
