use super::{error::TreeError, segment::Segment, tree::SchemaTree, xpath::XPath, NodeId};

/// Builds the absolute XPath of `node` by walking its ancestors up to the schema root.
///
/// The walk stops at the first ancestor whose segment is the root sentinel; that segment is not
/// part of the result. Two nodes at the same logical position resolve to the same path, no matter
/// which arena slot they occupy.
///
/// # Errors
/// [`TreeError::SentinelNotAddressable`] when `node` is the sentinel itself and
/// [`TreeError::UnresolvedPath`] when the parent chain ends (or breaks) before a sentinel.
pub fn resolve(tree: &SchemaTree, node: NodeId) -> Result<XPath, TreeError> {
    let start = tree.get(node)?;
    if start.segment.is_sentinel() {
        return Err(TreeError::SentinelNotAddressable);
    }

    let mut segments: Vec<Segment> = vec![start.segment.clone()];
    let mut current = start.parent();
    let limit = tree.len();
    loop {
        let ancestor = current
            .and_then(|id| tree.node(id))
            .ok_or(TreeError::UnresolvedPath(node))?;
        if ancestor.segment.is_sentinel() {
            break;
        }
        // a chain longer than the arena can only be a cycle
        if segments.len() >= limit {
            return Err(TreeError::UnresolvedPath(node));
        }
        segments.push(ancestor.segment.clone());
        current = ancestor.parent();
    }

    segments.reverse();
    XPath::from_segments(segments).ok_or(TreeError::UnresolvedPath(node))
}
