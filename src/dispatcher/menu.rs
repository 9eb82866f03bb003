use dt_xsd_tree::{NodeId, SchemaTree};

/// What a user can do with a node, depending on where it sits in the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Menu {
    Sequence,
    /// An element declared directly below the schema root.
    RootElement,
    Element,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Insert,
    Delete,
    Rename,
    Retype,
    SetOccurrences,
}

impl Menu {
    /// The menu of `node`, or `None` for nodes that cannot be edited.
    pub fn of(tree: &SchemaTree, node: NodeId) -> Option<Self> {
        let segment = &tree.node(node)?.segment;
        match segment.local_name.as_str() {
            "sequence" => Some(Self::Sequence),
            "element" => {
                let parent_is_root = tree
                    .parent(node)
                    .and_then(|parent| tree.node(parent))
                    .is_some_and(|parent| parent.segment.is_sentinel());
                Some(if parent_is_root {
                    Self::RootElement
                } else {
                    Self::Element
                })
            }
            _ => None,
        }
    }

    pub fn actions(self) -> &'static [Action] {
        match self {
            Self::Sequence => &[Action::Insert],
            Self::RootElement => &[Action::Rename, Action::Retype],
            Self::Element => &[
                Action::Rename,
                Action::Retype,
                Action::SetOccurrences,
                Action::Delete,
            ],
        }
    }

    pub fn offers(self, action: Action) -> bool {
        self.actions().contains(&action)
    }
}
