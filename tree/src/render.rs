use std::fmt::Write;

use super::{resolver::resolve, tree::SchemaTree};

/// Plain-text projection of the tree, one line per node in document order.
///
/// Lines are indented by depth and show the path label, the `name`/`type` attributes, the
/// occurrence label and the node's XPath (the root has none).
pub fn render(tree: &SchemaTree) -> String {
    let mut out = String::new();
    for (id, depth) in tree.walk() {
        let Some(node) = tree.node(id) else {
            continue;
        };
        let _ = write!(out, "{:indent$}{}", "", node.segment, indent = depth * 2);
        if let Some(name) = &node.name {
            let _ = write!(out, " name=\"{name}\"");
        }
        if let Some(type_name) = &node.type_name {
            let _ = write!(out, " type=\"{type_name}\"");
        }
        if let Some(occurs) = node.occurs {
            let _ = write!(out, " {occurs}");
        }
        if let Ok(xpath) = resolve(tree, id) {
            let _ = write!(out, "  [{xpath}]");
        }
        out.push('\n');
    }
    out
}
