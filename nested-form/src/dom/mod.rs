//! Minimal element model for the component's mount point
//!
//! An [`Anchor`] is the element a nested form renders into. The component
//! owns it and hands it to the embedded form; destroying the component
//! clears it.

use parking_lot::Mutex;
use std::fmt::Write as _;
use std::sync::Arc;

/// A rendered node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with optional class and children
    Element {
        /// Tag name
        tag: String,
        /// Class attribute
        class: Option<String>,
        /// Child nodes
        children: Vec<Node>,
    },
    /// Text content
    Text(String),
}

impl Node {
    /// Create an element node
    #[must_use]
    pub fn element(tag: impl Into<String>, class: Option<&str>, children: Vec<Self>) -> Self {
        Self::Element {
            tag: tag.into(),
            class: class.map(str::to_string),
            children,
        }
    }

    /// Create a text node
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Placeholder shown in builder mode instead of the embedded form
    #[must_use]
    pub fn placeholder(title: &str) -> Self {
        Self::element(
            "div",
            Some("text-muted text-center p-2"),
            vec![Self::text(title)],
        )
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(content) => out.push_str(&escape_html(content)),
            Self::Element {
                tag,
                class,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                if let Some(class) = class {
                    let _ = write!(out, r#" class="{}""#, escape_attr(class));
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

/// Mount point exclusively owned by one component
#[derive(Debug, Clone, Default)]
pub struct Anchor {
    nodes: Arc<Mutex<Vec<Node>>>,
}

impl Anchor {
    /// Create an empty anchor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node
    pub fn append(&self, node: Node) {
        self.nodes.lock().push(node);
    }

    /// Remove every node
    pub fn clear(&self) {
        self.nodes.lock().clear();
    }

    /// Number of top-level nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Whether nothing is mounted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// Snapshot of the mounted nodes
    #[must_use]
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.lock().clone()
    }

    /// Render the mounted nodes as HTML
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in self.nodes.lock().iter() {
            node.write_html(&mut out);
        }
        out
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
