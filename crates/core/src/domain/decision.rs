use serde::{Deserialize, Serialize};

use crate::domain::medication::ReminderTime;
use crate::domain::screen::Screen;

/// One classified routing decision for a single turn. Transient: produced by
/// the classifier, consumed by the turn runtime, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingDecision {
    Navigate {
        screen: Screen,
        carry_context: bool,
        auto_start_matching: bool,
    },
    CreateMedicationReminder {
        name: String,
        dosage: String,
        frequency: String,
        times: Vec<ReminderTime>,
    },
    /// The parser recognized a medication name but no usable times; the
    /// medication screen pre-fills its creation form and waits for the user.
    PromptMedicationCompletion {
        name: String,
        dosage: Option<String>,
        frequency: Option<String>,
    },
    AskClarifyingQuestion {
        prompt: String,
    },
    ShowEmergencyPrompt {
        prompt: String,
    },
    NoChange,
}

impl RoutingDecision {
    pub fn navigate(screen: Screen) -> Self {
        Self::Navigate { screen, carry_context: false, auto_start_matching: false }
    }

    pub fn target_screen(&self) -> Option<Screen> {
        match self {
            Self::Navigate { screen, .. } => Some(*screen),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RoutingDecision;
    use crate::domain::screen::Screen;

    #[test]
    fn serializes_with_snake_case_tag() {
        let decision = RoutingDecision::navigate(Screen::Events);
        let json = serde_json::to_value(&decision).expect("serializable");
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["screen"], "events");
        assert_eq!(json["carry_context"], false);
    }

    #[test]
    fn target_screen_is_none_for_non_navigation() {
        assert_eq!(RoutingDecision::NoChange.target_screen(), None);
        assert_eq!(
            RoutingDecision::navigate(Screen::Health).target_screen(),
            Some(Screen::Health)
        );
    }
}
