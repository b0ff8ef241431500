use std::fmt::Write;

use crate::tree::{Property, TargetTree, TreeError};

/// Elements HTML writes without a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

/// Handle to a node in a [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
    tag: String,
    properties: Vec<(String, Property)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// An arena-backed target tree, used by the CLI and tests.
///
/// Detached nodes stay in the arena, unreachable from the root, because a
/// caller may still hold their ids and re-attach them. Re-rendering into the
/// same tree therefore grows it; long-lived hosts should start from a fresh
/// `MemoryTree` instead.
#[derive(Debug)]
pub struct MemoryTree {
    nodes: Vec<NodeData>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    /// A tree containing only the root container.
    pub fn new() -> Self {
        MemoryTree {
            nodes: vec![NodeData {
                tag: "#root".to_string(),
                properties: Vec::new(),
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    /// Properties in the order they were first set.
    pub fn properties(&self, node: NodeId) -> &[(String, Property)] {
        &self.nodes[node.0].properties
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<&Property> {
        self.nodes[node.0]
            .properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Number of nodes below `node`, not counting `node` itself.
    pub fn descendant_count(&self, node: NodeId) -> usize {
        self.children(node)
            .iter()
            .map(|&child| 1 + self.descendant_count(child))
            .sum()
    }

    /// Every descendant of `node` with the given tag, in document order.
    pub fn elements_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_tag(node, tag, &mut found);
        found
    }

    fn collect_by_tag(&self, node: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        for &child in self.children(node) {
            if self.tag(child) == tag {
                found.push(child);
            }
            self.collect_by_tag(child, tag, found);
        }
    }

    /// Serialize the children of `node` as HTML.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node.0];
        out.push('<');
        out.push_str(&data.tag);
        for (name, value) in &data.properties {
            // Writing to a String cannot fail
            let _ = write!(out, " {}=\"{}\"", name, escape_attribute(&value.to_string()));
        }
        out.push('>');
        if data.children.is_empty() && VOID_TAGS.contains(&data.tag.as_str()) {
            return;
        }
        for &child in &data.children {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(&data.tag);
        out.push('>');
    }

    fn check(&self, node: NodeId) -> Result<(), TreeError> {
        if node.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::new(format!("unknown node {}", node.0)))
        }
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }
}

impl TargetTree for MemoryTree {
    type Node = NodeId;

    fn create_element(&mut self, tag: &str) -> Result<NodeId, TreeError> {
        if tag.is_empty() {
            return Err(TreeError::new("element tag cannot be empty"));
        }
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            properties: Vec::new(),
            children: Vec::new(),
            parent: None,
        });
        Ok(NodeId(self.nodes.len() - 1))
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: Property) -> Result<(), TreeError> {
        self.check(*node)?;
        let properties = &mut self.nodes[node.0].properties;
        match properties.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => properties.push((name.to_string(), value)),
        }
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TreeError> {
        self.check(*parent)?;
        self.check(*child)?;
        if self.is_ancestor(*child, *parent) {
            return Err(TreeError::new(
                "cannot append a node to itself or one of its descendants",
            ));
        }
        if let Some(old_parent) = self.nodes[child.0].parent {
            self.nodes[old_parent.0].children.retain(|c| c != child);
        }
        self.nodes[parent.0].children.push(*child);
        self.nodes[child.0].parent = Some(*parent);
        Ok(())
    }

    fn first_child(&self, node: &NodeId) -> Result<Option<NodeId>, TreeError> {
        self.check(*node)?;
        Ok(self.nodes[node.0].children.first().copied())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TreeError> {
        self.check(*parent)?;
        self.check(*child)?;
        let children = &mut self.nodes[parent.0].children;
        let Some(position) = children.iter().position(|c| c == child) else {
            return Err(TreeError::new(format!(
                "node {} is not a child of node {}",
                child.0, parent.0
            )));
        };
        children.remove(position);
        self.nodes[child.0].parent = None;
        Ok(())
    }
}

fn escape_attribute(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
