pub mod accordion;
pub mod behavior;
pub mod dom;
pub mod extlink;
pub mod settings;

pub use behavior::{Behavior, BehaviorRegistry, ClickOutcome, Notification};
pub use dom::{parser::parse_html, serialize::to_html, Document};
pub use settings::Settings;
