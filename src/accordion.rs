//! Collapsible accordion widget.
//!
//! Converts `<dl class="accordion">` definition lists into accessible
//! accordions: each `dt` label is wrapped in a focusable toggle anchor,
//! each `dd` panel gets a unique generated id, and at most one pair per
//! group is expanded at a time. State lives entirely in classes and ARIA
//! attributes; the slide animations are returned as fire-and-forget
//! transition records for the host renderer to play.

use std::collections::HashMap;

use crate::behavior::{Behavior, ClickOutcome, Notification};
use crate::dom::{Document, DomNode};
use crate::settings::Settings;

/// Class marking a definition list as accordion markup
pub const GROUP_CLASS: &str = "accordion";
/// Marker added once a group has been processed
pub const STYLED_CLASS: &str = "accordion-styled";
/// Class on the generated toggle anchors
pub const TOGGLE_CLASS: &str = "accordion-toggle";
/// Class on the label of the expanded pair
pub const ACTIVE_CLASS: &str = "accordion-item-active";
/// Class on every panel
pub const PANEL_CLASS: &str = "accordion-panel";
/// Class on collapsed panels
pub const COLLAPSED_CLASS: &str = "accordion-panel-collapsed";

/// Slide animation length
pub const SLIDE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    SlideUp,
    SlideDown,
}

/// A fire-and-forget panel animation. No code path waits on these.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub panel_id: String,
    pub kind: TransitionKind,
    pub duration_ms: u64,
}

impl Transition {
    fn slide_up(panel_id: &str) -> Self {
        Self {
            panel_id: panel_id.to_string(),
            kind: TransitionKind::SlideUp,
            duration_ms: SLIDE_MS,
        }
    }

    fn slide_down(panel_id: &str) -> Self {
        Self {
            panel_id: panel_id.to_string(),
            kind: TransitionKind::SlideDown,
            duration_ms: SLIDE_MS,
        }
    }
}

/// One (label, panel) pair inside a group, located by child index.
struct Pair {
    label_idx: usize,
    panel_idx: usize,
    toggle_id: String,
    panel_id: String,
    active: bool,
}

pub struct AccordionBehavior {
    /// Monotonic id counter; survives across attach calls so panel ids
    /// stay unique document-wide.
    next_id: usize,
    /// Body-level delegated click listener guard: installed by the
    /// first attach, never again.
    delegate_installed: bool,
}

impl AccordionBehavior {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            delegate_installed: false,
        }
    }

    /// Process a single unstyled group. Returns the generated panel ids.
    fn process_group(&mut self, group: &mut DomNode, collapse_all: bool) -> Vec<String> {
        let mut panel_ids = Vec::new();
        let mut pair_index = 0usize;
        let mut i = 0;

        while i < group.children.len() {
            if group.children[i].tag != "dt" {
                i += 1;
                continue;
            }
            // Pair the label with its following dd; a dt without a
            // panel is left untouched.
            let panel_idx = match group.children[i + 1..]
                .iter()
                .position(|c| c.tag == "dd")
            {
                Some(offset) => i + 1 + offset,
                None => {
                    i += 1;
                    continue;
                }
            };

            let n = self.next_id;
            self.next_id += 1;
            let toggle_id = format!("accordion-toggle-{}", n);
            let panel_id = format!("accordion-panel-{}", n);
            let expanded = pair_index == 0 && !collapse_all;

            // Wrap the label content in a focusable toggle anchor.
            let label = &mut group.children[i];
            let content = std::mem::take(&mut label.children);
            let mut attrs = HashMap::new();
            attrs.insert("href".to_string(), "#".to_string());
            attrs.insert("id".to_string(), toggle_id.clone());
            attrs.insert("aria-controls".to_string(), panel_id.clone());
            attrs.insert("aria-expanded".to_string(), expanded.to_string());
            let mut toggle = DomNode::element("a", attrs, content);
            toggle.add_class(TOGGLE_CLASS);
            label.children.push(toggle);
            if expanded {
                label.add_class(ACTIVE_CLASS);
            }

            let panel = &mut group.children[panel_idx];
            panel.set_attr("id", panel_id.clone());
            panel.set_attr("aria-labelledby", toggle_id);
            panel.set_attr("aria-hidden", (!expanded).to_string());
            panel.add_class(PANEL_CLASS);
            if !expanded {
                panel.add_class(COLLAPSED_CLASS);
            }

            panel_ids.push(panel_id);
            pair_index += 1;
            i = panel_idx + 1;
        }

        group.add_class(STYLED_CLASS);
        panel_ids
    }

    /// Toggle the pair owned by `toggle_id` within its group.
    fn toggle(&mut self, doc: &mut Document, toggle_id: &str) -> Vec<Transition> {
        let toggle_path = match doc.path_to_id(toggle_id) {
            Some(path) => path,
            None => return Vec::new(),
        };
        // Enclosing group: nearest ancestor carrying the group class.
        let group_path = match (0..toggle_path.len()).rev().find(|&len| {
            doc.root
                .node_at(&toggle_path[..len])
                .map(|n| n.has_class(GROUP_CLASS))
                .unwrap_or(false)
        }) {
            Some(len) => &toggle_path[..len],
            None => return Vec::new(),
        };

        let group = match doc.root.node_at_mut(group_path) {
            Some(group) => group,
            None => return Vec::new(),
        };

        let pairs = scan_pairs(group);
        let clicked = match pairs.iter().position(|p| p.toggle_id == toggle_id) {
            Some(idx) => idx,
            None => return Vec::new(),
        };

        let mut transitions = Vec::new();

        if pairs[clicked].active {
            // Active toggle clicked: collapse it, leave the group
            // fully collapsed.
            set_pair_state(group, &pairs[clicked], false);
            transitions.push(Transition::slide_up(&pairs[clicked].panel_id));
        } else {
            // Collapse whichever sibling is active first, then expand.
            if let Some(active) = pairs.iter().find(|p| p.active) {
                set_pair_state(group, active, false);
                transitions.push(Transition::slide_up(&active.panel_id));
            }
            set_pair_state(group, &pairs[clicked], true);
            transitions.push(Transition::slide_down(&pairs[clicked].panel_id));
        }

        transitions
    }
}

impl Default for AccordionBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for AccordionBehavior {
    fn name(&self) -> &'static str {
        "accordion"
    }

    fn attach(
        &mut self,
        doc: &mut Document,
        settings: &Settings,
        events: &mut Vec<Notification>,
    ) {
        let group_paths = doc
            .root
            .paths_to(&|n| n.has_class(GROUP_CLASS) && !n.has_class(STYLED_CLASS));

        for path in &group_paths {
            let group = match doc.root.node_at_mut(path) {
                Some(group) => group,
                None => continue,
            };
            let panel_ids = self.process_group(group, settings.accordion.collapse_all);
            log::debug!("accordion group processed ({} panels)", panel_ids.len());
            events.push(Notification::AccordionAttached { panel_ids });
        }

        if !group_paths.is_empty() {
            log::info!("accordion: {} new group(s) attached", group_paths.len());
        }
        self.delegate_installed = true;
    }

    fn handle_click(
        &mut self,
        doc: &mut Document,
        target_id: &str,
        _settings: &Settings,
    ) -> ClickOutcome {
        if !self.delegate_installed {
            return ClickOutcome::Unhandled;
        }
        // Delegated dispatch: bubble from the target to the nearest
        // toggle ancestor.
        let target_path = match doc.path_to_id(target_id) {
            Some(path) => path,
            None => return ClickOutcome::Unhandled,
        };
        let toggle_id = (0..=target_path.len()).rev().find_map(|len| {
            let node = doc.root.node_at(&target_path[..len])?;
            if node.has_class(TOGGLE_CLASS) {
                node.id().map(|s| s.to_string())
            } else {
                None
            }
        });

        match toggle_id {
            Some(id) => ClickOutcome::Accordion(self.toggle(doc, &id)),
            None => ClickOutcome::Unhandled,
        }
    }
}

/// Collect the processed pairs of a group in document order.
fn scan_pairs(group: &DomNode) -> Vec<Pair> {
    let mut pairs = Vec::new();
    for (i, child) in group.children.iter().enumerate() {
        if child.tag != "dt" {
            continue;
        }
        let toggle = match child
            .children
            .iter()
            .find(|c| c.has_class(TOGGLE_CLASS))
        {
            Some(toggle) => toggle,
            None => continue,
        };
        let toggle_id = match toggle.id() {
            Some(id) => id.to_string(),
            None => continue,
        };
        let panel_id = match toggle.attr("aria-controls") {
            Some(id) => id.to_string(),
            None => continue,
        };
        let panel_idx = match group.children[i + 1..]
            .iter()
            .position(|c| c.id() == Some(panel_id.as_str()))
        {
            Some(offset) => i + 1 + offset,
            None => continue,
        };
        pairs.push(Pair {
            label_idx: i,
            panel_idx,
            toggle_id,
            panel_id,
            active: toggle.attr("aria-expanded") == Some("true"),
        });
    }
    pairs
}

/// Flip one pair's expanded/collapsed state in classes and ARIA.
fn set_pair_state(group: &mut DomNode, pair: &Pair, expanded: bool) {
    let label = &mut group.children[pair.label_idx];
    if expanded {
        label.add_class(ACTIVE_CLASS);
    } else {
        label.remove_class(ACTIVE_CLASS);
    }
    if let Some(toggle) = label
        .children
        .iter_mut()
        .find(|c| c.has_class(TOGGLE_CLASS))
    {
        toggle.set_attr("aria-expanded", expanded.to_string());
    }

    let panel = &mut group.children[pair.panel_idx];
    panel.set_attr("aria-hidden", (!expanded).to_string());
    if expanded {
        panel.remove_class(COLLAPSED_CLASS);
    } else {
        panel.add_class(COLLAPSED_CLASS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parser::parse_html;

    const TWO_PAIR: &str = r#"
    <html><body>
        <dl class="accordion">
            <dt>First</dt>
            <dd><p>First body</p></dd>
            <dt>Second</dt>
            <dd><p>Second body</p></dd>
        </dl>
    </body></html>
    "#;

    fn attach(doc: &mut Document, settings: &Settings) -> (AccordionBehavior, Vec<Notification>) {
        let mut behavior = AccordionBehavior::new();
        let mut events = Vec::new();
        behavior.attach(doc, settings, &mut events);
        (behavior, events)
    }

    fn expanded_panels(doc: &Document) -> Vec<String> {
        doc.root
            .paths_to(&|n| n.has_class(PANEL_CLASS) && !n.has_class(COLLAPSED_CLASS))
            .iter()
            .map(|p| doc.root.node_at(p).unwrap().id().unwrap().to_string())
            .collect()
    }

    #[test]
    fn first_pair_expanded_by_default() {
        let mut doc = parse_html(TWO_PAIR, "https://example.com");
        let (_, events) = attach(&mut doc, &Settings::default());

        assert_eq!(events.len(), 1);
        let panel_ids = match &events[0] {
            Notification::AccordionAttached { panel_ids } => panel_ids.clone(),
        };
        assert_eq!(panel_ids.len(), 2);
        assert_ne!(panel_ids[0], panel_ids[1]);
        assert_eq!(expanded_panels(&doc), vec![panel_ids[0].clone()]);

        // Toggles are focusable anchors linked to their panels
        let toggle_path = doc.path_to_id("accordion-toggle-0").unwrap();
        let toggle = doc.root.node_at(&toggle_path).unwrap();
        assert_eq!(toggle.tag, "a");
        assert_eq!(toggle.attr("href"), Some("#"));
        assert_eq!(toggle.attr("aria-controls"), Some("accordion-panel-0"));
        assert_eq!(toggle.attr("aria-expanded"), Some("true"));
    }

    #[test]
    fn collapse_all_leaves_nothing_expanded() {
        let mut doc = parse_html(TWO_PAIR, "https://example.com");
        let mut settings = Settings::default();
        settings.accordion.collapse_all = true;
        attach(&mut doc, &settings);
        assert!(expanded_panels(&doc).is_empty());
    }

    #[test]
    fn collapse_all_applies_to_single_pair_group() {
        let html = r#"
        <html><body>
            <dl class="accordion"><dt>Only</dt><dd>Body</dd></dl>
        </body></html>
        "#;
        let mut doc = parse_html(html, "https://example.com");
        let mut settings = Settings::default();
        settings.accordion.collapse_all = true;
        attach(&mut doc, &settings);
        assert!(expanded_panels(&doc).is_empty());
    }

    #[test]
    fn clicking_inactive_toggle_switches_active_pair() {
        let mut doc = parse_html(TWO_PAIR, "https://example.com");
        let (mut behavior, _) = attach(&mut doc, &Settings::default());

        let outcome =
            behavior.handle_click(&mut doc, "accordion-toggle-1", &Settings::default());
        let transitions = match outcome {
            ClickOutcome::Accordion(t) => t,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(
            transitions,
            vec![
                Transition::slide_up("accordion-panel-0"),
                Transition::slide_down("accordion-panel-1"),
            ]
        );
        assert_eq!(expanded_panels(&doc), vec!["accordion-panel-1".to_string()]);
    }

    #[test]
    fn clicking_active_toggle_collapses_group() {
        let mut doc = parse_html(TWO_PAIR, "https://example.com");
        let (mut behavior, _) = attach(&mut doc, &Settings::default());

        let outcome =
            behavior.handle_click(&mut doc, "accordion-toggle-0", &Settings::default());
        let transitions = match outcome {
            ClickOutcome::Accordion(t) => t,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(transitions, vec![Transition::slide_up("accordion-panel-0")]);
        assert!(expanded_panels(&doc).is_empty());
    }

    #[test]
    fn click_bubbles_from_nested_element() {
        let html = r#"
        <html><body>
            <dl class="accordion">
                <dt><strong id="bold-label">First</strong></dt>
                <dd>Body one</dd>
                <dt>Second</dt>
                <dd>Body two</dd>
            </dl>
        </body></html>
        "#;
        let mut doc = parse_html(html, "https://example.com");
        let (mut behavior, _) = attach(&mut doc, &Settings::default());

        // The strong element ends up inside the generated toggle anchor;
        // delegation walks up to the toggle.
        let outcome = behavior.handle_click(&mut doc, "bold-label", &Settings::default());
        assert!(matches!(outcome, ClickOutcome::Accordion(_)));
        assert!(expanded_panels(&doc).is_empty());
    }

    #[test]
    fn reattach_is_idempotent() {
        let mut doc = parse_html(TWO_PAIR, "https://example.com");
        let mut behavior = AccordionBehavior::new();
        let mut events = Vec::new();
        behavior.attach(&mut doc, &Settings::default(), &mut events);
        assert_eq!(events.len(), 1);

        let anchors_before = doc.root.paths_to(&|n| n.has_class(TOGGLE_CLASS)).len();
        behavior.attach(&mut doc, &Settings::default(), &mut events);

        // No new notifications, no duplicate toggles
        assert_eq!(events.len(), 1);
        let anchors_after = doc.root.paths_to(&|n| n.has_class(TOGGLE_CLASS)).len();
        assert_eq!(anchors_before, anchors_after);
    }

    #[test]
    fn ids_stay_unique_across_groups_and_attaches() {
        let html = r#"
        <html><body>
            <dl class="accordion"><dt>A</dt><dd>a</dd></dl>
            <dl class="accordion"><dt>B</dt><dd>b</dd></dl>
        </body></html>
        "#;
        let mut doc = parse_html(html, "https://example.com");
        let mut behavior = AccordionBehavior::new();
        let mut events = Vec::new();
        behavior.attach(&mut doc, &Settings::default(), &mut events);

        // A later partial update adds a third group
        let late = parse_html(
            r#"<html><body><dl class="accordion"><dt>C</dt><dd>c</dd></dl></body></html>"#,
            "https://example.com",
        );
        let group_path = late.root.path_to(&|n| n.has_class(GROUP_CLASS)).unwrap();
        let group = late.root.node_at(&group_path).unwrap().clone();
        let body_path = doc.root.path_to(&|n| n.tag == "body").unwrap();
        doc.root.node_at_mut(&body_path).unwrap().children.push(group);

        behavior.attach(&mut doc, &Settings::default(), &mut events);

        let mut panel_ids: Vec<String> = events
            .iter()
            .flat_map(|e| match e {
                Notification::AccordionAttached { panel_ids } => panel_ids.clone(),
            })
            .collect();
        assert_eq!(panel_ids.len(), 3);
        panel_ids.sort();
        panel_ids.dedup();
        assert_eq!(panel_ids.len(), 3);
    }

    #[test]
    fn label_without_panel_is_skipped() {
        let html = r#"
        <html><body>
            <dl class="accordion"><dt>Orphan</dt></dl>
        </body></html>
        "#;
        let mut doc = parse_html(html, "https://example.com");
        let (_, events) = attach(&mut doc, &Settings::default());
        let panel_ids = match &events[0] {
            Notification::AccordionAttached { panel_ids } => panel_ids,
        };
        assert!(panel_ids.is_empty());
    }
}
