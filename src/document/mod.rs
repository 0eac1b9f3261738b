mod bbox;
mod kind;
mod node;
mod tree;


pub use bbox::BoundingBox;
pub use kind::NodeType;
pub use node::{DocumentNode, NodeId, TOKEN_COUNT_KEY};
pub use tree::{Descendants, Document, ROOT_ID};
