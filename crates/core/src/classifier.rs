//! Layered keyword classifier for voice-command routing.
//!
//! `classify` is pure with respect to its inputs: it reads conversation
//! memory but never mutates it, and it never panics on malformed input.
//! Unmatched utterances always resolve to the general-info screen so the
//! user is never stranded. Rules apply in a fixed order, first match wins:
//!
//! 1. in-page suppression while the volunteer screen is active
//! 2. pending-suggestion resolution on the info screen
//! 3. medication-reminder detection (deferred to the reminder parser)
//! 4. pharmacy pickup routing
//! 5. fall detection
//! 6. medical-condition keywords
//! 7. vague discomfort
//! 8. explicit volunteer-need categories
//! 9. generic keyword routing with an info fallback
//!
//! Rule 3 needs an asynchronous collaborator, so detection is two-phase: the
//! classifier emits a [`Classification::ReminderCandidate`] carrying the
//! decision rules 4-9 would have produced, and the turn runtime downgrades
//! to that fallback whenever the parse yields nothing usable.

use crate::domain::decision::RoutingDecision;
use crate::domain::screen::Screen;
use crate::keywords;
use crate::memory::{ConversationMemory, MemoryEffect};

pub const EMERGENCY_PROMPT: &str =
    "It sounds like you may have fallen. Do you want me to call 911?";
pub const DISCOMFORT_PROMPT: &str =
    "Can you tell me more about what feels uncomfortable? I want to point you the right way.";

/// A decision plus the memory mutation the caller must apply for this turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingOutcome {
    pub decision: RoutingDecision,
    pub memory_effect: MemoryEffect,
}

impl RoutingOutcome {
    fn new(decision: RoutingDecision, memory_effect: MemoryEffect) -> Self {
        Self { decision, memory_effect }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Decided(RoutingOutcome),
    /// The utterance reads like a reminder request. The runtime hands it to
    /// the reminder parser; `fallback` is applied if parsing yields neither
    /// a name nor times.
    ReminderCandidate { utterance: String, fallback: RoutingOutcome },
}

pub fn classify(
    utterance: &str,
    current_screen: Screen,
    memory: &ConversationMemory,
) -> Classification {
    let raw = utterance.trim();
    let text = raw.to_lowercase();

    // Rule 1: the volunteer screen owns its own sub-router while active.
    if current_screen == Screen::Volunteer {
        return Classification::Decided(RoutingOutcome::new(
            RoutingDecision::NoChange,
            MemoryEffect::none(),
        ));
    }

    // Rule 2: a pending AI suggestion on the info screen.
    let mut effect = MemoryEffect::none();
    if current_screen == Screen::Info && !memory.last_suggested_routes().is_empty() {
        if keywords::is_affirmative(&text) {
            let target = memory.last_suggested_routes()[0];
            let mut consume = MemoryEffect { clear_suggestions: true, ..MemoryEffect::none() };
            if target != Screen::Volunteer {
                consume.clear_volunteer_context = true;
            }
            let auto_start =
                target == Screen::Volunteer && memory.volunteer_context_query().is_some();
            return Classification::Decided(RoutingOutcome::new(
                RoutingDecision::Navigate {
                    screen: target,
                    carry_context: true,
                    auto_start_matching: auto_start,
                },
                consume,
            ));
        }
        // A fresh query supersedes the pending suggestion.
        effect.clear_suggestions = true;
        effect.clear_volunteer_context = true;
    }

    // Rule 3: reminder detection, advisory only. Pharmacy pickups are never
    // reminders no matter how medication-flavored the wording is.
    let pharmacy_pickup = keywords::is_pharmacy_pickup(&text);
    let reminder_like =
        keywords::looks_like_reminder(&text) || keywords::has_medication_context(&text);
    if current_screen != Screen::Medication && reminder_like && !pharmacy_pickup {
        let fallback = resolve_general(raw, &text, pharmacy_pickup, effect.clone());
        return Classification::ReminderCandidate { utterance: raw.to_string(), fallback };
    }

    Classification::Decided(resolve_general(raw, &text, pharmacy_pickup, effect))
}

/// Rules 4-9 over an already-normalized utterance.
fn resolve_general(
    raw: &str,
    text: &str,
    pharmacy_pickup: bool,
    mut effect: MemoryEffect,
) -> RoutingOutcome {
    // Rule 4: ambiguous pickup requests go to the info screen, which offers
    // both health-services and volunteer follow-ups.
    if pharmacy_pickup {
        return RoutingOutcome::new(RoutingDecision::navigate(Screen::Info), effect);
    }

    // Rule 5
    if keywords::mentions_fall(text) {
        return RoutingOutcome::new(
            RoutingDecision::ShowEmergencyPrompt { prompt: EMERGENCY_PROMPT.to_string() },
            effect,
        );
    }

    // Rule 6
    if keywords::mentions_symptom(text) {
        return RoutingOutcome::new(RoutingDecision::navigate(Screen::Info), effect);
    }

    // Rule 7
    if keywords::mentions_discomfort(text) {
        return RoutingOutcome::new(
            RoutingDecision::AskClarifyingQuestion { prompt: DISCOMFORT_PROMPT.to_string() },
            effect,
        );
    }

    // Rule 8: a concrete need plus a help-seeking signal skips the volunteer
    // screen's need-selection step entirely.
    if keywords::match_need_category(text).is_some() && keywords::has_help_signal(text) {
        effect.set_volunteer_context = Some(raw.to_string());
        return RoutingOutcome::new(
            RoutingDecision::Navigate {
                screen: Screen::Volunteer,
                carry_context: true,
                auto_start_matching: true,
            },
            effect,
        );
    }

    // Rule 9: generic keyword routing, checked in priority order.
    if keywords::contains_any(text, keywords::HEALTH_KEYWORDS) {
        return RoutingOutcome::new(RoutingDecision::navigate(Screen::Health), effect);
    }
    if keywords::contains_any(text, keywords::VOLUNTEER_KEYWORDS) {
        // Generic volunteer interest starts from a clean slate.
        effect.clear_volunteer_context = true;
        return RoutingOutcome::new(RoutingDecision::navigate(Screen::Volunteer), effect);
    }
    if keywords::contains_any(text, keywords::EVENT_KEYWORDS) {
        return RoutingOutcome::new(RoutingDecision::navigate(Screen::Events), effect);
    }
    if keywords::contains_any(text, keywords::MEDICATION_KEYWORDS) {
        return RoutingOutcome::new(RoutingDecision::navigate(Screen::Medication), effect);
    }

    RoutingOutcome::new(RoutingDecision::navigate(Screen::Info), effect)
}
