// TODO keep namespace URIs next to prefixes so paths survive prefix rebinding

pub mod error;
pub mod occurs;
pub mod segment;
pub mod xpath;

mod mapping;
mod reconciler;
mod render;
mod resolver;
mod tree;

pub use error::TreeError;
pub use mapping::read_tree;
pub use occurs::{MaxOccurs, Occurrences};
pub use reconciler::{next_child_segment, reconcile};
pub use render::render;
pub use resolver::resolve;
pub use segment::Segment;
pub use tree::{NodeId, SchemaNode, SchemaTree};
pub use xpath::XPath;
