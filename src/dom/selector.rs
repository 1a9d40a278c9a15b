//! Lightweight CSS selector matching.
//!
//! Supports the subset the link annotator needs for its exclude/explicit
//! scoping rules: tag names, `.class`, `#id`, compounds (`div.sidebar`),
//! the descendant combinator (whitespace) and comma-separated lists.

use crate::dom::DomNode;

/// Error parsing a configured selector
#[derive(Debug)]
pub struct SelectorError {
    pub message: String,
}

impl std::fmt::Display for SelectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// One `tag.class#id` compound
#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, node: &DomNode) -> bool {
        if let Some(ref tag) = self.tag {
            if node.tag != *tag {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if node.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| node.has_class(c))
    }
}

/// Parsed selector list, e.g. `nav a, .toolbar, #footer .legal`
#[derive(Debug, Clone)]
pub struct Selector {
    // Each alternative is a descendant chain, outermost first.
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for alt in input.split(',') {
            let alt = alt.trim();
            if alt.is_empty() {
                continue;
            }
            let chain: Result<Vec<Compound>, SelectorError> =
                alt.split_whitespace().map(parse_compound).collect();
            alternatives.push(chain?);
        }
        if alternatives.is_empty() {
            return Err(SelectorError {
                message: format!("empty selector: {:?}", input),
            });
        }
        Ok(Self { alternatives })
    }

    /// Whether `node` matches, given its ancestor chain (outermost first).
    pub fn matches(&self, node: &DomNode, ancestors: &[&DomNode]) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, node, ancestors))
    }

    /// Whether `node` or any of its ancestors matches. This is the
    /// "matching or nested under" rule used for exclusion scoping.
    pub fn matches_or_within(&self, node: &DomNode, ancestors: &[&DomNode]) -> bool {
        if self.matches(node, ancestors) {
            return true;
        }
        (0..ancestors.len()).any(|i| self.matches(ancestors[i], &ancestors[..i]))
    }
}

fn chain_matches(chain: &[Compound], node: &DomNode, ancestors: &[&DomNode]) -> bool {
    let (last, outer) = match chain.split_last() {
        Some(split) => split,
        None => return false,
    };
    if !last.matches(node) {
        return false;
    }
    // Each outer compound must match some ancestor, innermost-first greedy.
    let mut remaining = outer.iter().rev();
    let mut want = remaining.next();
    for anc in ancestors.iter().rev() {
        match want {
            Some(compound) if compound.matches(anc) => want = remaining.next(),
            Some(_) => {}
            None => break,
        }
    }
    want.is_none()
}

fn parse_compound(part: &str) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut rest = part;

    // Leading tag name
    let split = rest.find(['.', '#']).unwrap_or(rest.len());
    if split > 0 {
        let tag = &rest[..split];
        if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(SelectorError {
                message: format!("unsupported selector syntax: {:?}", part),
            });
        }
        compound.tag = Some(tag.to_ascii_lowercase());
        rest = &rest[split..];
    }

    while !rest.is_empty() {
        let marker = rest.chars().next().unwrap();
        let body = &rest[1..];
        let end = body.find(['.', '#']).unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() {
            return Err(SelectorError {
                message: format!("empty class or id in selector: {:?}", part),
            });
        }
        match marker {
            '.' => compound.classes.push(name.to_string()),
            '#' => compound.id = Some(name.to_string()),
            _ => {
                return Err(SelectorError {
                    message: format!("unsupported selector syntax: {:?}", part),
                })
            }
        }
        rest = &body[end..];
    }

    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn el(tag: &str, class: &str, id: &str) -> DomNode {
        let mut attrs = HashMap::new();
        if !class.is_empty() {
            attrs.insert("class".to_string(), class.to_string());
        }
        if !id.is_empty() {
            attrs.insert("id".to_string(), id.to_string());
        }
        DomNode::element(tag, attrs, Vec::new())
    }

    #[test]
    fn simple_selectors() {
        let link = el("a", "menu-item external", "home");
        let sel = Selector::parse("a").unwrap();
        assert!(sel.matches(&link, &[]));
        assert!(Selector::parse(".menu-item").unwrap().matches(&link, &[]));
        assert!(Selector::parse("#home").unwrap().matches(&link, &[]));
        assert!(Selector::parse("a.external#home").unwrap().matches(&link, &[]));
        assert!(!Selector::parse("div").unwrap().matches(&link, &[]));
        assert!(!Selector::parse(".missing").unwrap().matches(&link, &[]));
    }

    #[test]
    fn descendant_chains() {
        let nav = el("nav", "", "");
        let list = el("ul", "menu", "");
        let link = el("a", "", "");
        let ancestors: Vec<&DomNode> = vec![&nav, &list];

        let sel = Selector::parse("nav a").unwrap();
        assert!(sel.matches(&link, &ancestors));
        assert!(Selector::parse("nav .menu a").unwrap().matches(&link, &ancestors));
        assert!(!Selector::parse("footer a").unwrap().matches(&link, &ancestors));
        // Chain order matters
        assert!(!Selector::parse(".menu nav a").unwrap().matches(&link, &ancestors));
    }

    #[test]
    fn comma_lists() {
        let sel = Selector::parse("nav a, .skip").unwrap();
        let skip = el("span", "skip", "");
        assert!(sel.matches(&skip, &[]));
        let plain = el("span", "", "");
        assert!(!sel.matches(&plain, &[]));
    }

    #[test]
    fn matches_or_within_checks_ancestors() {
        let sidebar = el("div", "sidebar", "");
        let link = el("a", "", "");
        let ancestors: Vec<&DomNode> = vec![&sidebar];
        let sel = Selector::parse(".sidebar").unwrap();
        assert!(!sel.matches(&link, &ancestors));
        assert!(sel.matches_or_within(&link, &ancestors));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(Selector::parse("a > b").is_err());
        assert!(Selector::parse("a[href]").is_err());
        assert!(Selector::parse("  ").is_err());
    }
}
