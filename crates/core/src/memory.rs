//! Short-term conversation memory for one active session.
//!
//! The classifier reads this state but never mutates it; mutations flow
//! through the documented operations below or through a [`MemoryEffect`]
//! returned alongside a routing decision. Memory is created empty when a
//! session starts and discarded when the user returns home. Nothing here is
//! persisted; multi-day suggestion memory is explicitly out of scope.

use serde::{Deserialize, Serialize};

use crate::domain::screen::Screen;
use crate::keywords;

/// Deferred memory mutation produced by the classifier. The classifier stays
/// pure; the caller applies the effect via [`ConversationMemory::apply`].
/// Clears run before the set so a single effect can replace the volunteer
/// context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryEffect {
    pub clear_suggestions: bool,
    pub clear_volunteer_context: bool,
    pub set_volunteer_context: Option<String>,
}

impl MemoryEffect {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    last_suggested_routes: Vec<Screen>,
    volunteer_context_query: Option<String>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigation targets an AI response most recently proposed. Non-empty
    /// only until the next navigation away from `info` or the next fresh
    /// query.
    pub fn last_suggested_routes(&self) -> &[Screen] {
        &self.last_suggested_routes
    }

    /// The utterance that triggered a pending volunteer suggestion. A later
    /// affirmative resolves against this original need description, not the
    /// affirmation text.
    pub fn volunteer_context_query(&self) -> Option<&str> {
        self.volunteer_context_query.as_deref()
    }

    /// Replaces the suggested routes with the suggestible subset of `routes`.
    ///
    /// If `volunteer` is among them and the triggering query is not itself an
    /// affirmative, the query becomes the volunteer context; if `volunteer`
    /// is absent any stale context is dropped.
    pub fn set_suggested_routes(&mut self, routes: Vec<Screen>, triggering_query: &str) {
        let routes: Vec<Screen> = routes.into_iter().filter(Screen::is_suggestible).collect();

        if routes.contains(&Screen::Volunteer) {
            let query = triggering_query.trim();
            if !query.is_empty() && !keywords::is_affirmative(&query.to_lowercase()) {
                self.volunteer_context_query = Some(query.to_string());
            }
        } else {
            self.volunteer_context_query = None;
        }

        self.last_suggested_routes = routes;
    }

    /// Called after a suggestion is consumed or superseded.
    pub fn clear_suggestions(&mut self) {
        self.last_suggested_routes.clear();
    }

    /// Full reset on returning to the home screen. Idempotent.
    pub fn clear_on_navigate_home(&mut self) {
        self.last_suggested_routes.clear();
        self.volunteer_context_query = None;
    }

    pub fn apply(&mut self, effect: &MemoryEffect) {
        if effect.clear_suggestions {
            self.last_suggested_routes.clear();
        }
        if effect.clear_volunteer_context {
            self.volunteer_context_query = None;
        }
        if let Some(query) = &effect.set_volunteer_context {
            self.volunteer_context_query = Some(query.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationMemory, MemoryEffect};
    use crate::domain::screen::Screen;

    #[test]
    fn suggested_routes_are_filtered_to_suggestible_screens() {
        let mut memory = ConversationMemory::new();
        memory.set_suggested_routes(
            vec![Screen::Home, Screen::Volunteer, Screen::Medication, Screen::Health],
            "my sink is leaking",
        );
        assert_eq!(memory.last_suggested_routes(), &[Screen::Volunteer, Screen::Health]);
    }

    #[test]
    fn volunteer_suggestion_captures_triggering_query() {
        let mut memory = ConversationMemory::new();
        memory.set_suggested_routes(vec![Screen::Volunteer], "my chair is broken");
        assert_eq!(memory.volunteer_context_query(), Some("my chair is broken"));
    }

    #[test]
    fn affirmative_trigger_does_not_overwrite_context() {
        let mut memory = ConversationMemory::new();
        memory.set_suggested_routes(vec![Screen::Volunteer], "my chair is broken");
        memory.set_suggested_routes(vec![Screen::Volunteer], "yes");
        assert_eq!(memory.volunteer_context_query(), Some("my chair is broken"));
    }

    #[test]
    fn routes_without_volunteer_clear_context() {
        let mut memory = ConversationMemory::new();
        memory.set_suggested_routes(vec![Screen::Volunteer], "my chair is broken");
        memory.set_suggested_routes(vec![Screen::Health, Screen::Events], "i have a headache");
        assert_eq!(memory.volunteer_context_query(), None);
    }

    #[test]
    fn clear_on_navigate_home_is_idempotent() {
        let mut memory = ConversationMemory::new();
        memory.set_suggested_routes(vec![Screen::Volunteer, Screen::Health], "my tv is broken");

        memory.clear_on_navigate_home();
        let once = memory.clone();
        memory.clear_on_navigate_home();

        assert_eq!(memory, once);
        assert!(memory.last_suggested_routes().is_empty());
        assert_eq!(memory.volunteer_context_query(), None);
    }

    #[test]
    fn apply_clears_before_setting() {
        let mut memory = ConversationMemory::new();
        memory.set_suggested_routes(vec![Screen::Volunteer], "old query");

        let effect = MemoryEffect {
            clear_suggestions: true,
            clear_volunteer_context: true,
            set_volunteer_context: Some("new query".to_string()),
        };
        memory.apply(&effect);

        assert!(memory.last_suggested_routes().is_empty());
        assert_eq!(memory.volunteer_context_query(), Some("new query"));
    }
}
