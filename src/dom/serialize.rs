//! DOM tree to HTML text.
//!
//! Used by the demo binary to emit the transformed page and by tests to
//! assert on decorated markup. Attributes are written in sorted order so
//! output is deterministic.

use crate::dom::{DomNode, NodeType};

/// Elements with no closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Serialize a DOM subtree back to HTML.
pub fn to_html(node: &DomNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &DomNode, out: &mut String) {
    match node.node_type {
        NodeType::Text => out.push_str(&escape_text(&node.text)),
        NodeType::Document => {
            for child in &node.children {
                write_node(child, out);
            }
        }
        NodeType::Element => {
            out.push('<');
            out.push_str(&node.tag);

            let mut attrs: Vec<(&String, &String)> = node.attributes.iter().collect();
            attrs.sort_by_key(|(k, _)| k.as_str());
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&node.tag.as_str()) {
                return;
            }

            for child in &node.children {
                write_node(child, out);
            }

            out.push_str("</");
            out.push_str(&node.tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_html;

    #[test]
    fn round_trips_simple_markup() {
        let doc = parse_html(
            r#"<html><body><p class="lead">Hi</p></body></html>"#,
            "https://example.com",
        );
        let html = to_html(&doc.root);
        assert!(html.contains(r#"<p class="lead">Hi</p>"#));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let doc = parse_html(
            r#"<html><body><a href="/?a=1&amp;b=2" title="say &quot;hi&quot;">1 &lt; 2</a></body></html>"#,
            "https://example.com",
        );
        let html = to_html(&doc.root);
        assert!(html.contains("1 &lt; 2"));
        assert!(html.contains("a=1&amp;b=2"));
        assert!(html.contains("&quot;hi&quot;"));
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let doc = parse_html(
            r#"<html><body><img src="x.png"><br></body></html>"#,
            "https://example.com",
        );
        let html = to_html(&doc.root);
        assert!(html.contains(r#"<img src="x.png">"#));
        assert!(!html.contains("</img>"));
        assert!(!html.contains("</br>"));
    }
}
