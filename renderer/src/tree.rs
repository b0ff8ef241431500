use std::fmt;

/// A primitive property value a target node can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    String(String),
    Number(f64),
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::String(s) => write!(f, "{}", s),
            Property::Number(n) => write!(f, "{}", crate::value::format_number(*n)),
        }
    }
}

/// A target tree primitive failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct TreeError {
    pub message: String,
}

impl TreeError {
    pub fn new(message: impl Into<String>) -> Self {
        TreeError {
            message: message.into(),
        }
    }
}

/// The mutable tree documents are rendered into.
///
/// Nodes are handles: cloning one must not copy the underlying node.
pub trait TargetTree {
    type Node: Clone;

    fn create_element(&mut self, tag: &str) -> Result<Self::Node, TreeError>;

    fn set_property(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: Property,
    ) -> Result<(), TreeError>;

    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), TreeError>;

    fn first_child(&self, node: &Self::Node) -> Result<Option<Self::Node>, TreeError>;

    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), TreeError>;
}

/// Detach every child of `node`, first to last.
pub fn clear_children<T: TargetTree>(tree: &mut T, node: &T::Node) -> Result<usize, TreeError> {
    let mut removed = 0;
    while let Some(child) = tree.first_child(node)? {
        tree.remove_child(node, &child)?;
        removed += 1;
    }
    Ok(removed)
}
