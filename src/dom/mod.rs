pub mod parser;
pub mod selector;
pub mod serialize;

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
}

/// Internal DOM node representation.
/// Behaviors mutate these trees in place; there is no live browser DOM.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attributes: HashMap<String, String>,
    pub text: String,
    pub children: Vec<DomNode>,
    pub node_type: NodeType,
}

impl DomNode {
    pub fn document(children: Vec<DomNode>) -> Self {
        Self {
            tag: "#document".into(),
            attributes: HashMap::new(),
            text: String::new(),
            children,
            node_type: NodeType::Document,
        }
    }

    pub fn element(
        tag: impl Into<String>,
        attrs: HashMap<String, String>,
        children: Vec<DomNode>,
    ) -> Self {
        Self {
            tag: tag.into(),
            attributes: attrs,
            text: String::new(),
            children,
            node_type: NodeType::Element,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            tag: String::new(),
            attributes: HashMap::new(),
            text: content.into(),
            children: Vec::new(),
            node_type: NodeType::Text,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Whether the space-separated `class` attribute contains `class_name`.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|t| t == class_name))
            .unwrap_or(false)
    }

    /// Append a class token; no-op if already present.
    pub fn add_class(&mut self, class_name: &str) {
        if self.has_class(class_name) {
            return;
        }
        match self.attributes.get_mut("class") {
            Some(existing) if !existing.is_empty() => {
                existing.push(' ');
                existing.push_str(class_name);
            }
            _ => {
                self.attributes
                    .insert("class".into(), class_name.to_string());
            }
        }
    }

    /// Remove a class token; drops the attribute when it becomes empty.
    pub fn remove_class(&mut self, class_name: &str) {
        if let Some(existing) = self.attributes.get("class") {
            let kept: Vec<&str> = existing
                .split_whitespace()
                .filter(|t| *t != class_name)
                .collect();
            if kept.is_empty() {
                self.attributes.remove("class");
            } else {
                self.attributes.insert("class".into(), kept.join(" "));
            }
        }
    }

    /// Recursively count all nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Collect all text content recursively
    pub fn collect_text(&self) -> String {
        let mut buf = String::new();
        self.collect_text_inner(&mut buf);
        buf
    }

    fn collect_text_inner(&self, buf: &mut String) {
        if !self.text.is_empty() {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(self.text.trim());
        }
        for child in &self.children {
            child.collect_text_inner(buf);
        }
    }

    /// Whether any descendant element has the given tag.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.children
            .iter()
            .any(|c| c.tag == tag || c.contains_tag(tag))
    }

    /// Child-index path from this node to the first descendant matching
    /// `pred` (depth-first). An empty path means this node itself matches.
    pub fn path_to<F>(&self, pred: &F) -> Option<Vec<usize>>
    where
        F: Fn(&DomNode) -> bool,
    {
        if pred(self) {
            return Some(Vec::new());
        }
        for (i, child) in self.children.iter().enumerate() {
            if let Some(mut path) = child.path_to(pred) {
                path.insert(0, i);
                return Some(path);
            }
        }
        None
    }

    /// Child-index paths to every matching node, in document order.
    /// Matching nodes nested inside other matches are still reported.
    pub fn paths_to<F>(&self, pred: &F) -> Vec<Vec<usize>>
    where
        F: Fn(&DomNode) -> bool,
    {
        let mut out = Vec::new();
        self.paths_to_inner(pred, &mut Vec::new(), &mut out);
        out
    }

    fn paths_to_inner<F>(&self, pred: &F, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>)
    where
        F: Fn(&DomNode) -> bool,
    {
        if pred(self) {
            out.push(prefix.clone());
        }
        for (i, child) in self.children.iter().enumerate() {
            prefix.push(i);
            child.paths_to_inner(pred, prefix, out);
            prefix.pop();
        }
    }

    /// Resolve a child-index path produced by `path_to`.
    pub fn node_at(&self, path: &[usize]) -> Option<&DomNode> {
        let mut node = self;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Mutable variant of `node_at`.
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut DomNode> {
        let mut node = self;
        for &i in path {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }
}

/// Parsed document with the page URL the behaviors run against.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: DomNode,
    pub url: String,
}

impl Document {
    /// Locate an element by its `id` attribute.
    pub fn path_to_id(&self, id: &str) -> Option<Vec<usize>> {
        self.root.path_to(&|n| n.id() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str) -> DomNode {
        DomNode::element(tag, HashMap::new(), Vec::new())
    }

    #[test]
    fn class_helpers() {
        let mut node = el("div");
        assert!(!node.has_class("ext"));
        node.add_class("ext");
        node.add_class("ext");
        assert_eq!(node.attr("class"), Some("ext"));
        node.add_class("active");
        assert!(node.has_class("active"));
        node.remove_class("ext");
        assert_eq!(node.attr("class"), Some("active"));
        node.remove_class("active");
        assert_eq!(node.attr("class"), None);
    }

    #[test]
    fn path_addressing() {
        let mut inner = el("a");
        inner.set_attr("id", "target");
        let middle = DomNode::element("p", HashMap::new(), vec![inner]);
        let root = DomNode::element("body", HashMap::new(), vec![el("div"), middle]);

        let path = root.path_to(&|n| n.id() == Some("target")).unwrap();
        assert_eq!(path, vec![1, 0]);
        assert_eq!(root.node_at(&path).unwrap().tag, "a");

        let mut root = root;
        root.node_at_mut(&path).unwrap().add_class("found");
        assert!(root.node_at(&path).unwrap().has_class("found"));
    }

    #[test]
    fn contains_tag_descends() {
        let img = el("img");
        let span = DomNode::element("span", HashMap::new(), vec![img]);
        let link = DomNode::element("a", HashMap::new(), vec![span]);
        assert!(link.contains_tag("img"));
        assert!(!link.contains_tag("table"));
    }
}
