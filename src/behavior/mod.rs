//! Behavior attach lifecycle.
//!
//! The host calls `BehaviorRegistry::attach` once on page load and again
//! after every partial content update. Behaviors are idempotent per
//! container: already-processed markup is skipped, so overlapping and
//! repeated attach calls are safe. Document-level clicks are routed
//! through `BehaviorRegistry::click`, which bubbles from the target
//! element up through its ancestors and lets the first behavior that
//! recognizes the target handle it.

use crate::accordion::Transition;
use crate::dom::Document;
use crate::extlink::ClickAction;
use crate::settings::Settings;

/// Event emitted by a behavior during attach, consumable by other
/// page components through `BehaviorRegistry::subscribe`.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An accordion group finished processing.
    AccordionAttached { panel_ids: Vec<String> },
}

/// Result of routing a document-level click
#[derive(Debug)]
pub enum ClickOutcome {
    /// An accordion toggle was clicked; transitions to play.
    Accordion(Vec<Transition>),
    /// A decorated external link was clicked.
    ExternalLink(ClickAction),
    /// No behavior claimed the target.
    Unhandled,
}

pub trait Behavior {
    fn name(&self) -> &'static str;

    /// Scan the document and wire up any unprocessed markup.
    /// Must be safe to call repeatedly.
    fn attach(
        &mut self,
        doc: &mut Document,
        settings: &Settings,
        events: &mut Vec<Notification>,
    );

    /// Delegated click dispatch. Returns `Unhandled` when the target
    /// does not belong to this behavior.
    fn handle_click(
        &mut self,
        _doc: &mut Document,
        _target_id: &str,
        _settings: &Settings,
    ) -> ClickOutcome {
        ClickOutcome::Unhandled
    }
}

type Subscriber = Box<dyn FnMut(&Notification)>;

/// Ordered set of behaviors, deduplicated by name.
///
/// Name deduplication is the "register once per page lifetime" guard:
/// wiring the registry up twice cannot accumulate duplicate click
/// delegates.
#[derive(Default)]
pub struct BehaviorRegistry {
    behaviors: Vec<Box<dyn Behavior>>,
    subscribers: Vec<Subscriber>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the two stock behaviors wired in.
    pub fn with_default_behaviors() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::accordion::AccordionBehavior::new()));
        registry.register(Box::new(crate::extlink::ExtlinkBehavior::new()));
        registry
    }

    /// Add a behavior. A behavior with an already-registered name is
    /// dropped.
    pub fn register(&mut self, behavior: Box<dyn Behavior>) {
        if self.behaviors.iter().any(|b| b.name() == behavior.name()) {
            log::debug!("behavior {} already registered, skipping", behavior.name());
            return;
        }
        self.behaviors.push(behavior);
    }

    /// Listen for notifications emitted during attach.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Notification) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Run every behavior over the document. Returns the notifications
    /// emitted by this pass (they are also forwarded to subscribers).
    pub fn attach(&mut self, doc: &mut Document, settings: &Settings) -> Vec<Notification> {
        let mut events = Vec::new();
        for behavior in &mut self.behaviors {
            let before = events.len();
            behavior.attach(doc, settings, &mut events);
            log::debug!(
                "attached behavior {} ({} notifications)",
                behavior.name(),
                events.len() - before
            );
        }
        for event in &events {
            for subscriber in &mut self.subscribers {
                subscriber(event);
            }
        }
        events
    }

    /// Route a click on the element with id `target_id`.
    pub fn click(
        &mut self,
        doc: &mut Document,
        target_id: &str,
        settings: &Settings,
    ) -> ClickOutcome {
        for behavior in &mut self.behaviors {
            let outcome = behavior.handle_click(doc, target_id, settings);
            if !matches!(outcome, ClickOutcome::Unhandled) {
                return outcome;
            }
        }
        ClickOutcome::Unhandled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Counting {
        name: &'static str,
        attaches: Rc<RefCell<usize>>,
    }

    impl Behavior for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn attach(
            &mut self,
            _doc: &mut Document,
            _settings: &Settings,
            events: &mut Vec<Notification>,
        ) {
            *self.attaches.borrow_mut() += 1;
            events.push(Notification::AccordionAttached {
                panel_ids: Vec::new(),
            });
        }
    }

    fn empty_doc() -> Document {
        crate::dom::parser::parse_html("<html><body></body></html>", "https://example.com")
    }

    #[test]
    fn duplicate_registration_is_dropped() {
        let attaches = Rc::new(RefCell::new(0));
        let mut registry = BehaviorRegistry::new();
        registry.register(Box::new(Counting {
            name: "counting",
            attaches: Rc::clone(&attaches),
        }));
        registry.register(Box::new(Counting {
            name: "counting",
            attaches: Rc::clone(&attaches),
        }));

        let mut doc = empty_doc();
        registry.attach(&mut doc, &Settings::default());
        assert_eq!(*attaches.borrow(), 1);
    }

    #[test]
    fn subscribers_see_every_notification() {
        let seen = Rc::new(RefCell::new(0));
        let seen_inner = Rc::clone(&seen);

        let mut registry = BehaviorRegistry::new();
        registry.register(Box::new(Counting {
            name: "counting",
            attaches: Rc::new(RefCell::new(0)),
        }));
        registry.subscribe(move |_| *seen_inner.borrow_mut() += 1);

        let mut doc = empty_doc();
        registry.attach(&mut doc, &Settings::default());
        registry.attach(&mut doc, &Settings::default());
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn unclaimed_clicks_are_unhandled() {
        let mut registry = BehaviorRegistry::with_default_behaviors();
        let mut doc = empty_doc();
        let outcome = registry.click(&mut doc, "nope", &Settings::default());
        assert!(matches!(outcome, ClickOutcome::Unhandled));
    }
}
