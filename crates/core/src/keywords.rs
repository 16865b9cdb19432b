//! Constant keyword tables for the intent classifier.
//!
//! Every heuristic the classifier applies is backed by a fixed list in this
//! module so the rule table can be audited and tested in isolation. All
//! matching is case-insensitive and word-boundary checked: a phrase only
//! matches where it is not embedded inside a longer word, so "ok" never
//! matches inside "broken".

use serde::{Deserialize, Serialize};

/// Fixed-list utterances treated as "yes" to a pending suggestion.
pub const AFFIRMATIVE_PHRASES: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "sure",
    "ok",
    "okay",
    "alright",
    "of course",
    "definitely",
    "absolutely",
    "please do",
    "go ahead",
    "sounds good",
    "sounds great",
    "open it",
    "show me",
    "take me there",
    "let's do it",
    "lets do it",
    "do it",
    "match me",
    "find me someone",
    "connect me",
    "that works",
    "why not",
];

/// Physically retrieving medicine from a vendor, as opposed to a reminder.
pub const PHARMACY_PICKUP_PHRASES: &[&str] = &[
    "from cvs",
    "from walgreens",
    "from the pharmacy",
    "from a pharmacy",
    "pick up",
    "pickup",
    "picking up",
    "buy medicine",
    "buy my medicine",
    "buy some medicine",
    "get medicine from",
    "prescription pickup",
    "prescription ready",
    "prescription is ready",
];

/// Explicit reminder language. Deliberately narrower than bare mentions of
/// "medicine" or "pill" so shopping requests do not trip reminder creation.
pub const REMINDER_PHRASES: &[&str] = &[
    "remind me to take",
    "remind me about my",
    "remind me when",
    "set reminder",
    "set a reminder",
    "pill reminder",
    "medication reminder",
    "medicine reminder",
    "reminder for my",
];

const POSSESSIVE_MEDICATION_ACTIONS: &[&str] = &["take my", "taking my", "took my"];

const MEDICATION_NOUNS: &[&str] =
    &["medicine", "medication", "medications", "pill", "pills", "tablet", "tablets"];

pub const FALL_PHRASES: &[&str] =
    &["fell down", "i fell", "just fell", "fallen down", "had a fall", "took a fall"];

pub const SYMPTOM_KEYWORDS: &[&str] = &[
    "headache",
    "migraine",
    "nausea",
    "nauseous",
    "chest pain",
    "dizzy",
    "dizziness",
    "fever",
    "cough",
    "coughing",
    "sore throat",
    "rash",
    "injury",
    "injured",
    "swelling",
    "bleeding",
    "short of breath",
    "shortness of breath",
    "stomach ache",
    "stomachache",
    "back pain",
];

pub const DISCOMFORT_PHRASES: &[&str] = &[
    "feeling uncomfortable",
    "feel uncomfortable",
    "i am uncomfortable",
    "i'm uncomfortable",
    "im uncomfortable",
    "not comfortable",
];

/// A help-seeking signal must accompany a need-category match before the
/// classifier routes to volunteer matching.
pub const HELP_SIGNALS: &[&str] = &[
    "volunteer",
    "help",
    "need",
    "want",
    "find",
    "someone",
    "looking for",
    "someone to",
    "i",
    "my",
];

pub const HEALTH_KEYWORDS: &[&str] =
    &["doctor", "hospital", "clinic", "nurse", "health", "appointment", "checkup", "check-up"];

pub const VOLUNTEER_KEYWORDS: &[&str] = &["volunteer", "help"];

pub const EVENT_KEYWORDS: &[&str] = &[
    "event",
    "events",
    "activity",
    "activities",
    "bingo",
    "class",
    "classes",
    "meetup",
    "gathering",
    "social",
];

pub const MEDICATION_KEYWORDS: &[&str] = &[
    "medication",
    "medications",
    "medicine",
    "pill",
    "pills",
    "prescription",
    "symptom",
    "symptoms",
    "remind",
    "reminder",
    "refill",
];

/// The six volunteer-need categories, in explicit match priority order.
///
/// Priority is part of the contract: when an utterance spans two categories
/// the earlier variant wins. Transport phrases come first because they are
/// the most specific; companionship last because its keywords are the most
/// generic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeedCategory {
    MedicalTransport,
    HomeRepair,
    Mobility,
    Grocery,
    Tech,
    Companionship,
}

impl NeedCategory {
    pub const PRIORITY: &'static [NeedCategory] = &[
        Self::MedicalTransport,
        Self::HomeRepair,
        Self::Mobility,
        Self::Grocery,
        Self::Tech,
        Self::Companionship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MedicalTransport => "medical-transport",
            Self::HomeRepair => "home-repair",
            Self::Mobility => "mobility",
            Self::Grocery => "grocery",
            Self::Tech => "tech",
            Self::Companionship => "companionship",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::MedicalTransport => &[
                "ride to the doctor",
                "ride to my appointment",
                "drive me to the doctor",
                "take me to the doctor",
                "take me to my appointment",
                "get to the hospital",
                "get to my appointment",
                "transportation to",
            ],
            Self::HomeRepair => &[
                "broken",
                "broke",
                "fix",
                "repair",
                "leaking",
                "leak",
                "install",
                "assemble",
                "mount",
                "squeaky",
                "doorknob",
                "faucet",
                "light bulb",
                "lightbulb",
            ],
            Self::Mobility => &[
                "walker",
                "wheelchair",
                "cane",
                "trouble walking",
                "hard to walk",
                "help walking",
                "getting around",
                "mobility",
            ],
            Self::Grocery => &[
                "groceries",
                "grocery",
                "supermarket",
                "food shopping",
                "go shopping",
                "carry bags",
                "errand",
                "errands",
            ],
            Self::Tech => &[
                "computer",
                "laptop",
                "tablet",
                "phone",
                "tv",
                "television",
                "remote",
                "wifi",
                "wi-fi",
                "internet",
                "printer",
                "email",
                "password",
            ],
            Self::Companionship => &[
                "lonely",
                "alone",
                "company",
                "companionship",
                "someone to talk",
                "talk to someone",
                "chat with",
                "visit me",
                "keep me company",
                "play cards",
            ],
        }
    }
}

/// Word-boundary-checked containment over already-lowercased text.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }

    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(phrase) {
        let begin = search_from + offset;
        let end = begin + phrase.len();
        let boundary_before =
            !text[..begin].chars().next_back().is_some_and(|ch| ch.is_alphanumeric());
        let boundary_after = !text[end..].chars().next().is_some_and(|ch| ch.is_alphanumeric());
        if boundary_before && boundary_after {
            return true;
        }
        search_from = end;
    }
    false
}

pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| contains_phrase(text, phrase))
}

pub fn is_affirmative(text: &str) -> bool {
    contains_any(text, AFFIRMATIVE_PHRASES)
}

pub fn is_pharmacy_pickup(text: &str) -> bool {
    contains_any(text, PHARMACY_PICKUP_PHRASES)
}

pub fn looks_like_reminder(text: &str) -> bool {
    contains_any(text, REMINDER_PHRASES)
}

/// Possessive medication-action pattern ("take my" + a medication noun),
/// excluding pharmacy pickups.
pub fn has_medication_context(text: &str) -> bool {
    contains_any(text, POSSESSIVE_MEDICATION_ACTIONS)
        && contains_any(text, MEDICATION_NOUNS)
        && !is_pharmacy_pickup(text)
}

pub fn mentions_fall(text: &str) -> bool {
    contains_any(text, FALL_PHRASES)
}

pub fn mentions_symptom(text: &str) -> bool {
    contains_any(text, SYMPTOM_KEYWORDS)
}

pub fn mentions_discomfort(text: &str) -> bool {
    contains_any(text, DISCOMFORT_PHRASES)
}

pub fn has_help_signal(text: &str) -> bool {
    contains_any(text, HELP_SIGNALS)
}

/// First need category (in priority order) whose keyword list matches.
pub fn match_need_category(text: &str) -> Option<NeedCategory> {
    NeedCategory::PRIORITY
        .iter()
        .copied()
        .find(|category| contains_any(text, category.keywords()))
}
