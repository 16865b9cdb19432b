use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Top-level views of the hosting application. Navigation decisions always
/// resolve to exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    Info,
    Volunteer,
    Events,
    Health,
    Medication,
}

impl Screen {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Info => "info",
            Self::Volunteer => "volunteer",
            Self::Events => "events",
            Self::Health => "health",
            Self::Medication => "medication",
        }
    }

    /// Only these screens may appear in `ConversationMemory::last_suggested_routes`.
    pub fn is_suggestible(&self) -> bool {
        matches!(self, Self::Events | Self::Volunteer | Self::Health)
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Screen {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Self::Home),
            "info" => Ok(Self::Info),
            "volunteer" => Ok(Self::Volunteer),
            "events" => Ok(Self::Events),
            "health" => Ok(Self::Health),
            "medication" => Ok(Self::Medication),
            other => Err(DomainError::UnknownScreen { value: other.to_string() }),
        }
    }
}
