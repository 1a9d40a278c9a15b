//! Host-supplied behavior settings.
//!
//! The host passes one `Settings` value to every attach call. Fields are
//! deserializable so a host (or the demo binary) can inject them from
//! JSON; defaults match the stock decoration classes and labels.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub accordion: AccordionSettings,
    pub extlink: ExtlinkSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccordionSettings {
    /// Start every pair collapsed instead of expanding the first one.
    pub collapse_all: bool,
}

/// Where the decorative icon span is inserted relative to link content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconPlacement {
    Append,
    Prepend,
}

impl Default for IconPlacement {
    fn default() -> Self {
        IconPlacement::Append
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtlinkSettings {
    /// Class applied to external links
    pub ext_class: String,
    /// Class applied to mailto links
    pub mailto_class: String,
    /// Treat every subdomain of the current host as internal.
    pub ext_subdomains: bool,
    /// Regex forcing matching links to be treated as external.
    pub ext_include: Option<String>,
    /// Regex excluding matching links from decoration entirely.
    pub ext_exclude: Option<String>,
    /// Links matching or nested under this selector are skipped.
    pub ext_css_exclude: Option<String>,
    /// When set, only links nested under this selector are eligible.
    pub ext_css_explicit: Option<String>,
    /// Add the icon span even when the link contains an image.
    pub ext_img_class: bool,
    pub ext_icon_placement: IconPlacement,
    /// Target applied to external links (e.g. "_blank"). Also forces a
    /// rel containing noopener and noreferrer.
    pub ext_target: Option<String>,
    /// Ask for confirmation before following an external link.
    pub ext_alert: bool,
    pub ext_alert_text: String,
    /// Accessibility label for the external-link icon
    pub ext_label: String,
    /// Accessibility label for the mailto icon
    pub mailto_label: String,
}

impl Default for ExtlinkSettings {
    fn default() -> Self {
        Self {
            ext_class: "ext".into(),
            mailto_class: "mailto".into(),
            ext_subdomains: false,
            ext_include: None,
            ext_exclude: None,
            ext_css_exclude: None,
            ext_css_explicit: None,
            ext_img_class: false,
            ext_icon_placement: IconPlacement::default(),
            ext_target: None,
            ext_alert: false,
            ext_alert_text: "This link will take you to an external site.".into(),
            ext_label: "(link is external)".into(),
            mailto_label: "(link sends email)".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stock_classes() {
        let settings = Settings::default();
        assert_eq!(settings.extlink.ext_class, "ext");
        assert_eq!(settings.extlink.mailto_class, "mailto");
        assert!(!settings.accordion.collapse_all);
        assert_eq!(settings.extlink.ext_icon_placement, IconPlacement::Append);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"accordion":{"collapse_all":true},
                "extlink":{"ext_target":"_blank","ext_icon_placement":"prepend"}}"#,
        )
        .unwrap();
        assert!(settings.accordion.collapse_all);
        assert_eq!(settings.extlink.ext_target.as_deref(), Some("_blank"));
        assert_eq!(settings.extlink.ext_icon_placement, IconPlacement::Prepend);
        assert_eq!(settings.extlink.ext_class, "ext");
    }
}
