use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::NodeKind;

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn generate_id(prefix: &str) -> String {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id}")
}

/// Declarative description of a subtree.
///
/// Elements are built with chained setters and turned into live nodes by
/// [`Document::create`](crate::Document::create).
#[derive(Debug, Clone)]
pub struct Element {
    // Identity
    pub id: String,
    pub kind: NodeKind,
    pub tag: String,

    // Content
    /// Character data for text and comment nodes.
    pub text: Option<String>,
    pub children: Vec<Element>,

    // Custom data storage (data attributes, keyed in camelCase)
    pub data: HashMap<String, String>,
}

impl Default for Element {
    fn default() -> Self {
        Self {
            id: generate_id("el"),
            kind: NodeKind::Element,
            tag: "div".to_string(),
            text: None,
            children: Vec::new(),
            data: HashMap::new(),
        }
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            id: generate_id(&tag),
            tag,
            ..Default::default()
        }
    }

    pub fn div() -> Self {
        Self::new("div")
    }

    pub fn list() -> Self {
        Self::new("ul")
    }

    pub fn item() -> Self {
        Self::new("li")
    }

    /// A text node. Text nodes never carry data or children.
    pub fn text_node(content: impl Into<String>) -> Self {
        Self {
            id: generate_id("text"),
            kind: NodeKind::Text,
            tag: "#text".to_string(),
            text: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self {
            id: generate_id("comment"),
            kind: NodeKind::Comment,
            tag: "#comment".to_string(),
            text: Some(content.into()),
            ..Default::default()
        }
    }

    // Identity
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    // Custom data
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get_data(&self, key: &str) -> Option<&String> {
        self.data.get(key)
    }

    // Children
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, new_children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(new_children);
        self
    }

    /// Append a text node child.
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(Element::text_node(content))
    }
}
