mod node;

pub use node::Element;

use crate::document::NodeKind;

/// Find an element by ID in a declarative tree.
pub fn find_element<'a>(root: &'a Element, id: &str) -> Option<&'a Element> {
    if root.kind == NodeKind::Element && root.id == id {
        return Some(root);
    }

    for child in &root.children {
        if let Some(found) = find_element(child, id) {
            return Some(found);
        }
    }

    None
}
