//! External and mailto link annotation.
//!
//! Scans every anchor/area element, classifies it against the current
//! page host, and decorates external/mailto links with classes, icon
//! spans and safe-navigation attributes. Classification is recomputed
//! on every attach; nothing is persisted beyond the decoration itself.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use url::Url;

use crate::behavior::{Behavior, ClickOutcome, Notification};
use crate::dom::selector::Selector;
use crate::dom::{Document, DomNode};
use crate::settings::{ExtlinkSettings, IconPlacement, Settings};

/// Per-element classification, derived fresh on every attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
    Mailto,
    Excluded,
}

/// Decision returned by the external-link click handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Proceed,
    Cancel,
}

/// Statistics from one annotation pass
#[derive(Debug, Clone, Default)]
pub struct AnnotateStats {
    pub total_links: usize,
    pub external: usize,
    pub mailto: usize,
    pub excluded: usize,
    /// Links whose href could not be read or resolved
    pub skipped: usize,
}

/// Tags that make a link block-level; block-level links get the class
/// but no icon span.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "fieldset", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "ul",
];

type ClickHandler = Box<dyn FnMut(&str, &ExtlinkSettings) -> ClickAction>;
type ConfirmFn = Box<dyn Fn(&str) -> bool>;

/// Matching rules compiled once per attach from settings + page URL.
struct Rules {
    internal: Option<Regex>,
    include: Option<Regex>,
    exclude: Option<Regex>,
    css_exclude: Option<Selector>,
    css_explicit: Option<Selector>,
}

impl Rules {
    fn compile(settings: &ExtlinkSettings, page_url: &str) -> Self {
        Self {
            internal: internal_pattern(page_url, settings.ext_subdomains),
            include: compile_pattern("ext_include", settings.ext_include.as_deref()),
            exclude: compile_pattern("ext_exclude", settings.ext_exclude.as_deref()),
            css_exclude: compile_selector("ext_css_exclude", settings.ext_css_exclude.as_deref()),
            css_explicit: compile_selector("ext_css_explicit", settings.ext_css_explicit.as_deref()),
        }
    }
}

fn compile_pattern(name: &str, pattern: Option<&str>) -> Option<Regex> {
    let pattern = pattern?;
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("ignoring invalid {} pattern: {}", name, e);
            None
        }
    }
}

fn compile_selector(name: &str, selector: Option<&str>) -> Option<Selector> {
    let selector = selector?;
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            log::warn!("ignoring invalid {} selector: {}", name, e);
            None
        }
    }
}

/// Split a host into (subdomain prefix, base domain). The base is the
/// last two labels; there is no public-suffix handling.
fn split_host(host: &str) -> (&str, &str) {
    let dots: Vec<usize> = host.match_indices('.').map(|(i, _)| i).collect();
    if dots.len() < 2 {
        return ("", host);
    }
    let cut = dots[dots.len() - 2];
    (&host[..cut], &host[cut + 1..])
}

/// Case-insensitive pattern matching internal URLs:
/// `http(s)://[userinfo@][subdomain]<base-host>` followed by a host
/// boundary (port, path, query, fragment or end of string).
fn internal_pattern(page_url: &str, ext_subdomains: bool) -> Option<Regex> {
    let url = Url::parse(page_url).ok()?;
    let host = url.host_str()?;
    let (subdomain, base) = split_host(host);

    let sub_pattern = if ext_subdomains {
        r"(?:[^./@]+\.)*".to_string()
    } else if subdomain.is_empty() || subdomain.eq_ignore_ascii_case("www") {
        r"(?:www\.)?".to_string()
    } else {
        format!(r"{}\.", regex::escape(subdomain))
    };

    let pattern = format!(
        r"^https?://(?:[^/@]+@)?{}{}(?::\d+)?(?:[/?#]|$)",
        sub_pattern,
        regex::escape(base)
    );
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("could not build internal-link pattern: {}", e);
            None
        }
    }
}

/// Merge noopener/noreferrer into an existing rel value without
/// duplicating tokens.
fn merge_rel(existing: Option<&str>) -> String {
    let mut tokens: Vec<String> = existing
        .unwrap_or("")
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();
    for required in ["noopener", "noreferrer"] {
        if !tokens.iter().any(|t| t.eq_ignore_ascii_case(required)) {
            tokens.push(required.to_string());
        }
    }
    tokens.join(" ")
}

/// A link selected for decoration during the scan phase.
struct Candidate {
    path: Vec<usize>,
    kind: LinkKind,
}

pub struct ExtlinkBehavior {
    click_handler: Option<ClickHandler>,
    confirm: ConfirmFn,
}

impl ExtlinkBehavior {
    pub fn new() -> Self {
        Self {
            click_handler: None,
            // Default prompt accepts; hosts with a real dialog inject
            // their own via set_confirm.
            confirm: Box::new(|_| true),
        }
    }

    /// Replace the external-link click handler wholesale. Must be done
    /// before the first click is dispatched.
    pub fn set_click_handler(
        &mut self,
        handler: impl FnMut(&str, &ExtlinkSettings) -> ClickAction + 'static,
    ) {
        self.click_handler = Some(Box::new(handler));
    }

    /// Inject the confirmation prompt used by the default click
    /// handler when `ext_alert` is on.
    pub fn set_confirm(&mut self, confirm: impl Fn(&str) -> bool + 'static) {
        self.confirm = Box::new(confirm);
    }

    /// Classify and decorate every eligible link. Safe to call
    /// repeatedly; already-decorated links are skipped.
    pub fn annotate(&mut self, doc: &mut Document, settings: &ExtlinkSettings) -> AnnotateStats {
        let rules = Rules::compile(settings, &doc.url);
        let base = Url::parse(&doc.url).ok();

        let mut stats = AnnotateStats::default();
        let mut candidates = Vec::new();
        let mut ancestors = Vec::new();
        scan(
            &doc.root,
            &mut ancestors,
            &rules,
            settings,
            base.as_ref(),
            &mut Vec::new(),
            &mut candidates,
            &mut stats,
        );

        for candidate in candidates {
            if let Some(link) = doc.root.node_at_mut(&candidate.path) {
                decorate(link, candidate.kind, settings);
            }
        }

        log::info!(
            "extlink: {} links scanned, {} external, {} mailto, {} excluded, {} skipped",
            stats.total_links,
            stats.external,
            stats.mailto,
            stats.excluded,
            stats.skipped
        );
        stats
    }
}

impl Default for ExtlinkBehavior {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for ExtlinkBehavior {
    fn name(&self) -> &'static str {
        "extlink"
    }

    fn attach(
        &mut self,
        doc: &mut Document,
        settings: &Settings,
        _events: &mut Vec<Notification>,
    ) {
        self.annotate(doc, &settings.extlink);
    }

    fn handle_click(
        &mut self,
        doc: &mut Document,
        target_id: &str,
        settings: &Settings,
    ) -> ClickOutcome {
        let target_path = match doc.path_to_id(target_id) {
            Some(path) => path,
            None => return ClickOutcome::Unhandled,
        };
        // Bubble to the nearest decorated external link.
        let href = (0..=target_path.len()).rev().find_map(|len| {
            let node = doc.root.node_at(&target_path[..len])?;
            if (node.tag == "a" || node.tag == "area")
                && node.has_class(&settings.extlink.ext_class)
            {
                node.attr("href").map(|s| s.to_string())
            } else {
                None
            }
        });
        let href = match href {
            Some(href) => href,
            None => return ClickOutcome::Unhandled,
        };

        let ext = &settings.extlink;
        let action = match self.click_handler.as_mut() {
            Some(handler) => handler(&href, ext),
            None => {
                if ext.ext_alert && !(self.confirm)(&ext.ext_alert_text) {
                    ClickAction::Cancel
                } else {
                    ClickAction::Proceed
                }
            }
        };
        ClickOutcome::ExternalLink(action)
    }
}

#[allow(clippy::too_many_arguments)]
fn scan<'a>(
    node: &'a DomNode,
    ancestors: &mut Vec<&'a DomNode>,
    rules: &Rules,
    settings: &ExtlinkSettings,
    base: Option<&Url>,
    prefix: &mut Vec<usize>,
    out: &mut Vec<Candidate>,
    stats: &mut AnnotateStats,
) {
    if node.tag == "a" || node.tag == "area" {
        consider(node, ancestors, rules, settings, base, prefix, out, stats);
    }
    ancestors.push(node);
    for (i, child) in node.children.iter().enumerate() {
        prefix.push(i);
        scan(child, ancestors, rules, settings, base, prefix, out, stats);
        prefix.pop();
    }
    ancestors.pop();
}

#[allow(clippy::too_many_arguments)]
fn consider(
    node: &DomNode,
    ancestors: &[&DomNode],
    rules: &Rules,
    settings: &ExtlinkSettings,
    base: Option<&Url>,
    path: &[usize],
    out: &mut Vec<Candidate>,
    stats: &mut AnnotateStats,
) {
    let href = match node.attr("href") {
        Some(href) => href,
        None => return,
    };
    stats.total_links += 1;

    // Re-attach idempotence: already decorated
    if node.has_class(&settings.ext_class) || node.has_class(&settings.mailto_class) {
        return;
    }

    // With an explicit scope configured, only links nested under it
    // are eligible at all.
    if let Some(ref explicit) = rules.css_explicit {
        let under = (0..ancestors.len())
            .any(|i| explicit.matches(ancestors[i], &ancestors[..i]));
        if !under {
            return;
        }
    }

    if let Some(ref excluded) = rules.css_exclude {
        if excluded.matches_or_within(node, ancestors) {
            stats.excluded += 1;
            return;
        }
    }

    // Irregular hrefs (bad ports, malformed userinfo) fail to resolve;
    // classification failure is non-fatal and skips just this element.
    let resolved = match resolve_href(base, href) {
        Some(url) => url,
        None => {
            log::debug!("skipping unreadable href: {:?}", href);
            stats.skipped += 1;
            return;
        }
    };

    match classify(&resolved, node.tag == "area", rules) {
        LinkKind::External => {
            stats.external += 1;
            out.push(Candidate {
                path: path.to_vec(),
                kind: LinkKind::External,
            });
        }
        LinkKind::Mailto => {
            stats.mailto += 1;
            out.push(Candidate {
                path: path.to_vec(),
                kind: LinkKind::Mailto,
            });
        }
        LinkKind::Excluded => stats.excluded += 1,
        LinkKind::Internal => {}
    }
}

fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

fn classify(resolved: &str, is_area: bool, rules: &Rules) -> LinkKind {
    let lower = resolved.to_ascii_lowercase();

    if let Some(ref exclude) = rules.exclude {
        if exclude.is_match(resolved) {
            return LinkKind::Excluded;
        }
    }
    // Area elements never take the mailto path (image maps keep their
    // plain geometry).
    if !is_area && lower.starts_with("mailto:") {
        return LinkKind::Mailto;
    }
    if let Some(ref include) = rules.include {
        if include.is_match(resolved) {
            return LinkKind::External;
        }
    }
    if let Some(ref internal) = rules.internal {
        if internal.is_match(resolved) {
            return LinkKind::Internal;
        }
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        LinkKind::External
    } else {
        LinkKind::Excluded
    }
}

fn decorate(link: &mut DomNode, kind: LinkKind, settings: &ExtlinkSettings) {
    let (class, label) = match kind {
        LinkKind::External => (&settings.ext_class, &settings.ext_label),
        LinkKind::Mailto => (&settings.mailto_class, &settings.mailto_label),
        _ => return,
    };
    link.add_class(class);

    let is_area = link.tag == "area";

    // Icon span: inline links only, and not around images unless
    // configured otherwise.
    let block_level = BLOCK_TAGS.iter().any(|t| link.contains_tag(t));
    let with_icon = !is_area
        && !block_level
        && (settings.ext_img_class || !link.contains_tag("img"));
    if with_icon {
        let mut icon = DomNode::element("span", HashMap::new(), Vec::new());
        icon.add_class(&format!("{}-icon", class));
        icon.set_attr("role", "img");
        icon.set_attr("aria-label", label.clone());
        match settings.ext_icon_placement {
            IconPlacement::Prepend => link.children.insert(0, icon),
            IconPlacement::Append => link.children.push(icon),
        }
    }

    if kind == LinkKind::External {
        if let Some(ref target) = settings.ext_target {
            link.set_attr("target", target.clone());
            let rel = merge_rel(link.attr("rel"));
            link.set_attr("rel", rel);
        }
    }
}
