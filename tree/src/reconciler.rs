use super::{error::TreeError, segment::Segment, tree::SchemaTree, NodeId};

/// Renumbers the siblings of `removed` before it leaves the tree.
///
/// Every remaining sibling with the same prefix and local name gets a contiguous position index
/// `1..k` in document order; siblings with other names are not subject to indexing and keep their
/// segments. `removed` itself is left untouched, so callers must run this while the node is still
/// attached and detach it afterwards.
pub fn reconcile(tree: &mut SchemaTree, removed: NodeId) -> Result<(), TreeError> {
    let node = tree.get(removed)?;
    let Some(parent) = node.parent() else {
        return Ok(());
    };
    let like = node.segment.clone();
    let group = tree.same_name_siblings(removed)?;
    tree.renumber_group(parent, &like, Some(removed));
    tracing::debug!(
        "renumbered siblings of {like} under {parent:?} ({} remain)",
        group.len() - 1
    );
    Ok(())
}

/// The segment a node named like `like` gets when appended under `parent`: unindexed when it
/// will be the only one of its name, `[count + 1]` otherwise.
pub fn next_child_segment(
    tree: &SchemaTree,
    parent: NodeId,
    like: &Segment,
) -> Result<Segment, TreeError> {
    tree.get(parent)?;
    let count = tree.children_named(parent, like, None).len();
    let segment = Segment {
        position_index: None,
        ..like.clone()
    };
    Ok(if count == 0 {
        segment
    } else {
        segment.with_index(u32::try_from(count + 1).unwrap_or(u32::MAX))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve, SchemaNode};
    use proptest::prelude::*;

    fn schema_with_sequence(count: u32) -> (SchemaTree, NodeId, Vec<NodeId>) {
        let mut tree = SchemaTree::new(Segment::prefixed("xs", "schema"));
        let root = tree.root();
        let sequence = tree
            .append(root, SchemaNode::new(Segment::prefixed("xs", "sequence")))
            .unwrap();
        let elements = (1..=count)
            .map(|i| {
                let segment = Segment::prefixed("xs", "element");
                let segment = if count > 1 { segment.with_index(i) } else { segment };
                tree.append(sequence, SchemaNode::new(segment)).unwrap()
            })
            .collect();
        (tree, sequence, elements)
    }

    fn positions(tree: &SchemaTree, ids: &[NodeId]) -> Vec<u32> {
        ids.iter()
            .map(|&id| tree.get(id).unwrap().segment.position())
            .collect()
    }

    #[test]
    fn deleting_the_middle_element_shifts_the_last_one() {
        let (mut tree, _, elements) = schema_with_sequence(3);
        let xpath = |tree: &SchemaTree, id| resolve(tree, id).unwrap().to_string();
        assert_eq!(xpath(&tree, elements[2]), "xs:sequence/xs:element[3]");

        reconcile(&mut tree, elements[1]).unwrap();
        tree.detach(elements[1]).unwrap();

        assert_eq!(xpath(&tree, elements[0]), "xs:sequence/xs:element[1]");
        assert_eq!(xpath(&tree, elements[2]), "xs:sequence/xs:element[2]");
    }

    #[test]
    fn removed_node_keeps_its_index() {
        let (mut tree, _, elements) = schema_with_sequence(3);
        reconcile(&mut tree, elements[0]).unwrap();
        assert_eq!(tree.get(elements[0]).unwrap().segment.position(), 1);
        assert_eq!(positions(&tree, &elements[1..]), vec![1, 2]);
    }

    #[test]
    fn last_survivor_drops_its_index() {
        let (mut tree, _, elements) = schema_with_sequence(2);
        reconcile(&mut tree, elements[0]).unwrap();
        let survivor = &tree.get(elements[1]).unwrap().segment;
        assert_eq!(survivor.position_index, None);
        assert_eq!(survivor.to_string(), "xs:element");
    }

    #[test]
    fn other_names_are_not_renumbered() {
        let (mut tree, sequence, elements) = schema_with_sequence(2);
        let choice = tree
            .append(
                sequence,
                SchemaNode::new(Segment::prefixed("xs", "choice").with_index(7)),
            )
            .unwrap();
        reconcile(&mut tree, elements[0]).unwrap();
        assert_eq!(tree.get(choice).unwrap().segment.position(), 7);
    }

    #[test]
    fn reconciling_the_root_is_a_no_op() {
        let (mut tree, _, elements) = schema_with_sequence(2);
        let root = tree.root();
        reconcile(&mut tree, root).unwrap();
        assert_eq!(positions(&tree, &elements), vec![1, 2]);
    }

    #[test]
    fn next_segment_for_empty_and_filled_groups() {
        let (tree, sequence, _) = schema_with_sequence(0);
        let like = Segment::prefixed("xs", "element");
        assert_eq!(
            next_child_segment(&tree, sequence, &like).unwrap().to_string(),
            "xs:element"
        );

        let (tree, sequence, _) = schema_with_sequence(2);
        assert_eq!(
            next_child_segment(&tree, sequence, &like).unwrap().to_string(),
            "xs:element[3]"
        );
    }

    proptest! {
        #[test]
        fn remaining_indices_are_contiguous(count in 1u32..12, pick in 0u32..12) {
            let removed = pick % count;
            let (mut tree, _, elements) = schema_with_sequence(count);
            let target = elements[removed as usize];

            reconcile(&mut tree, target).unwrap();
            tree.detach(target).unwrap();

            let remaining: Vec<NodeId> = elements
                .iter()
                .copied()
                .filter(|&id| id != target)
                .collect();
            let expected: Vec<u32> = (1..count).collect();
            prop_assert_eq!(positions(&tree, &remaining), expected);
            for (id, position) in remaining.iter().zip(1..) {
                let xpath = resolve(&tree, *id).unwrap();
                prop_assert_eq!(xpath.last().position(), position);
                prop_assert_eq!(tree.find(&xpath), Some(*id));
            }
        }
    }
}
