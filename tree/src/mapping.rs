use roxmltree::Node;
use tracing::{debug, instrument};

use super::{
    error::TreeError,
    occurs::Occurrences,
    segment::{Segment, SCHEMA_SENTINEL},
    tree::{SchemaNode, SchemaTree},
    NodeId,
};

/// Elements the composer hides from the tree.
const SKIPPED: &[&str] = &["annotation"];

/// Elements carrying `minOccurs`/`maxOccurs`.
const PARTICLES: &[&str] = &["element", "sequence", "choice", "all", "any", "group"];

/// Maps a schema document onto a [`SchemaTree`]; the `<schema>` element becomes the root.
#[instrument(skip_all)]
pub fn read_tree(document: &roxmltree::Document) -> Result<SchemaTree, TreeError> {
    let schema = document.root_element();
    if schema.tag_name().name() != SCHEMA_SENTINEL {
        return Err(TreeError::NotASchema(schema.tag_name().name().into()));
    }

    let mut tree = SchemaTree::new(segment_of(schema));
    let root = tree.root();
    map_children(&mut tree, root, schema)?;
    debug!("mapped {} schema nodes", tree.len());
    Ok(tree)
}

fn segment_of(element: Node) -> Segment {
    let tag = element.tag_name();
    let prefix = tag.namespace().and_then(|uri| element.lookup_prefix(uri));
    Segment::new(prefix, tag.name())
}

fn is_mapped(node: &Node) -> bool {
    node.is_element() && !SKIPPED.contains(&node.tag_name().name())
}

fn map_children(tree: &mut SchemaTree, parent: NodeId, element: Node) -> Result<(), TreeError> {
    let children: Vec<Node> = element.children().filter(is_mapped).collect();

    for child in &children {
        let segment = segment_of(*child);
        let same_name = children
            .iter()
            .filter(|other| other.tag_name() == child.tag_name())
            .count();
        let segment = if same_name > 1 {
            let position = children
                .iter()
                .take_while(|other| other.id() != child.id())
                .filter(|other| other.tag_name() == child.tag_name())
                .count()
                + 1;
            segment.with_index(u32::try_from(position).unwrap_or(u32::MAX))
        } else {
            segment
        };

        let mut node = SchemaNode::new(segment);
        node.name = child.attribute("name").map(str::to_string);
        node.type_name = child.attribute("type").map(str::to_string);
        if PARTICLES.contains(&child.tag_name().name()) {
            node.occurs = Some(Occurrences::from_attributes(
                child.attribute("minOccurs"),
                child.attribute("maxOccurs"),
            )?);
        }

        let id = tree.append(parent, node)?;
        map_children(tree, id, *child)?;
    }
    Ok(())
}
