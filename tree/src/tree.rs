use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};

use super::{error::TreeError, occurs::Occurrences, segment::Segment, xpath::XPath};

/// A reference to a [`SchemaNode`] stored in a [`SchemaTree`].
///
/// Ids are one-based slot numbers and are never reused, so an id that outlives its node keeps
/// failing lookups instead of silently pointing at a newer node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn index(self) -> usize {
        let size: NonZeroUsize = self
            .0
            .try_into()
            .expect("Could not convert node id to usize index");
        usize::from(size) - 1
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<node #{}>", self.0)
    }
}

/// One node of the composed schema (element, sequence, complexType, ...).
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaNode {
    pub segment: Segment,
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub occurs: Option<Occurrences>,
    /// Rendered fragment handed back by the schema service when this node was inserted.
    pub markup: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SchemaNode {
    pub fn new(segment: Segment) -> Self {
        Self {
            segment,
            name: None,
            type_name: None,
            occurs: None,
            markup: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena holding the node tree of one schema document. The root is the schema sentinel.
#[derive(Clone, Debug)]
pub struct SchemaTree {
    nodes: Vec<Option<SchemaNode>>,
    /// Occupied slots in `nodes`.
    live: usize,
    root: NodeId,
}

impl SchemaTree {
    pub fn new(root: Segment) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            live: 0,
            root: NodeId(NonZeroU32::MIN),
        };
        tree.root = tree.create(SchemaNode::new(root));
        tree
    }

    fn create(&mut self, node: SchemaNode) -> NodeId {
        self.nodes.push(Some(node));
        self.live += 1;

        // We use the size for the id, which is non-zero after the push
        let size = NonZeroUsize::new(self.nodes.len()).expect("arena is non-empty after push");
        let id: NonZeroU32 = size
            .try_into()
            .expect("Node id did not fit into 32-bit integer");
        NodeId(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get(&self, id: NodeId) -> Result<&SchemaNode, TreeError> {
        self.node(id).ok_or(TreeError::NodeNotFound(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut SchemaNode, TreeError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::NodeNotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(SchemaNode::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(SchemaNode::children).unwrap_or(&[])
    }

    /// Appends `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, mut node: SchemaNode) -> Result<NodeId, TreeError> {
        self.get(parent)?;
        node.parent = Some(parent);
        node.children.clear();
        let id = self.create(node);
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Removes `id` and its whole subtree from the tree and returns the detached node.
    pub fn detach(&mut self, id: NodeId) -> Result<SchemaNode, TreeError> {
        if id == self.root {
            return Err(TreeError::SentinelNotAddressable);
        }
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            if let Ok(parent) = self.get_mut(parent) {
                parent.children.retain(|&child| child != id);
            }
        }

        let mut pending = self.children(id).to_vec();
        while let Some(descendant) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(descendant.index()).and_then(Option::take) {
                self.live -= 1;
                pending.extend(node.children);
            }
        }

        let node = self
            .nodes
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(TreeError::NodeNotFound(id))?;
        self.live -= 1;
        Ok(node)
    }

    /// Siblings of `id` (itself included) that share its prefix and local name, in document
    /// order.
    pub fn same_name_siblings(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let node = self.get(id)?;
        let Some(parent) = node.parent else {
            return Ok(vec![id]);
        };
        Ok(self.children_named(parent, &node.segment, None))
    }

    /// Children of `parent` named like `like`, in document order, leaving out `skip`.
    pub fn children_named(
        &self,
        parent: NodeId,
        like: &Segment,
        skip: Option<NodeId>,
    ) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&child| Some(child) != skip)
            .filter(|&child| {
                self.node(child)
                    .is_some_and(|node| node.segment.has_same_name(like))
            })
            .collect()
    }

    /// Renumbers the children of `parent` named like `like` (except `skip`) to `1..k` in
    /// document order. A group of one carries no explicit index.
    pub fn renumber_group(&mut self, parent: NodeId, like: &Segment, skip: Option<NodeId>) {
        let group = self.children_named(parent, like, skip);
        let indexed = group.len() > 1;
        for (position, id) in (1..).zip(group) {
            if let Ok(node) = self.get_mut(id) {
                node.segment.position_index = if indexed {
                    NonZeroU32::new(position)
                } else {
                    None
                };
            }
        }
    }

    /// Looks up the node addressed by `xpath`, starting below the root.
    pub fn find(&self, xpath: &XPath) -> Option<NodeId> {
        let mut current = self.root;
        for step in xpath.segments() {
            current = self.children(current).iter().copied().find(|&child| {
                self.node(child)
                    .is_some_and(|node| node.segment.matches(step))
            })?;
        }
        Some(current)
    }

    /// Depth-first, document-order walk yielding each live node with its depth (root = 0).
    pub fn walk(&self) -> Vec<(NodeId, usize)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            order.push((id, depth));
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(index: u32) -> SchemaNode {
        SchemaNode::new(Segment::prefixed("xs", "element").with_index(index))
    }

    fn sequence_with_elements(count: u32) -> (SchemaTree, NodeId, Vec<NodeId>) {
        let mut tree = SchemaTree::new(Segment::prefixed("xs", "schema"));
        let sequence = tree
            .append(tree.root(), SchemaNode::new(Segment::prefixed("xs", "sequence")))
            .unwrap();
        let elements = (1..=count)
            .map(|i| tree.append(sequence, element(i)).unwrap())
            .collect();
        (tree, sequence, elements)
    }

    #[test]
    fn append_links_parent_and_child() {
        let (tree, sequence, elements) = sequence_with_elements(2);
        assert_eq!(tree.children(sequence), elements.as_slice());
        assert_eq!(tree.parent(elements[0]), Some(sequence));
        assert_eq!(tree.parent(sequence), Some(tree.root()));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn append_to_missing_parent_fails() {
        let (mut tree, sequence, _) = sequence_with_elements(0);
        tree.detach(sequence).unwrap();
        assert_eq!(
            tree.append(sequence, element(1)),
            Err(TreeError::NodeNotFound(sequence))
        );
    }

    #[test]
    fn detach_removes_the_subtree() {
        let (mut tree, sequence, elements) = sequence_with_elements(3);
        let nested = tree
            .append(elements[1], SchemaNode::new(Segment::prefixed("xs", "complexType")))
            .unwrap();

        let removed = tree.detach(elements[1]).unwrap();
        assert_eq!(removed.segment.position(), 2);
        assert!(!tree.contains(elements[1]));
        assert!(!tree.contains(nested));
        assert_eq!(tree.children(sequence), &[elements[0], elements[2]]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.walk().len(), tree.len());
    }

    #[test]
    fn root_cannot_be_detached() {
        let (mut tree, _, _) = sequence_with_elements(1);
        let root = tree.root();
        assert_eq!(tree.detach(root), Err(TreeError::SentinelNotAddressable));
    }

    #[test]
    fn ids_are_not_reused() {
        let (mut tree, sequence, elements) = sequence_with_elements(1);
        tree.detach(elements[0]).unwrap();
        let replacement = tree.append(sequence, element(1)).unwrap();
        assert_ne!(replacement, elements[0]);
        assert_eq!(
            tree.get(elements[0]).unwrap_err(),
            TreeError::NodeNotFound(elements[0])
        );
    }

    #[test]
    fn find_matches_implicit_first_position() {
        let (mut tree, sequence, elements) = sequence_with_elements(1);
        tree.get_mut(elements[0]).unwrap().segment.position_index = None;

        let xpath: XPath = "xs:sequence/xs:element[1]".parse().unwrap();
        assert_eq!(tree.find(&xpath), Some(elements[0]));
        let xpath: XPath = "xs:sequence".parse().unwrap();
        assert_eq!(tree.find(&xpath), Some(sequence));
        let xpath: XPath = "xs:sequence/xs:element[2]".parse().unwrap();
        assert_eq!(tree.find(&xpath), None);
    }

    #[test]
    fn renumber_group_leaves_other_names_alone() {
        let (mut tree, sequence, elements) = sequence_with_elements(2);
        let choice = tree
            .append(sequence, SchemaNode::new(Segment::prefixed("xs", "choice")))
            .unwrap();
        tree.renumber_group(sequence, &Segment::prefixed("xs", "element"), Some(elements[0]));

        assert_eq!(tree.get(elements[1]).unwrap().segment.position_index, None);
        assert_eq!(tree.get(elements[0]).unwrap().segment.position(), 1);
        assert_eq!(tree.get(choice).unwrap().segment.position_index, None);
    }

    #[test]
    fn same_name_siblings_include_the_node_itself() {
        let (mut tree, sequence, elements) = sequence_with_elements(2);
        tree.append(sequence, SchemaNode::new(Segment::prefixed("xs", "choice")))
            .unwrap();
        assert_eq!(tree.same_name_siblings(elements[1]).unwrap(), elements);
        let root = tree.root();
        assert_eq!(tree.same_name_siblings(root).unwrap(), vec![root]);
    }

    #[test]
    fn walk_is_in_document_order() {
        let (tree, sequence, elements) = sequence_with_elements(2);
        let order: Vec<_> = tree.walk();
        assert_eq!(
            order,
            vec![
                (tree.root(), 0),
                (sequence, 1),
                (elements[0], 2),
                (elements[1], 2)
            ]
        );
    }
}
