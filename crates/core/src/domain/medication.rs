use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Daily reminders per medication are capped; extra parser output is dropped.
pub const MAX_REMINDER_TIMES: usize = 3;

pub const DEFAULT_DOSAGE: &str = "As prescribed";
pub const DEFAULT_FREQUENCY: &str = "Daily";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MedicationId(pub String);

/// A validated wall-clock reminder time, serialized as `HH:MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReminderTime(NaiveTime);

impl ReminderTime {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| DomainError::InvalidReminderTime { value: value.to_string() })
    }
}

impl std::fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl std::str::FromStr for ReminderTime {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ReminderTime {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReminderTime> for String {
    fn from(value: ReminderTime) -> Self {
        value.to_string()
    }
}

/// A reminder request as assembled from parser output, before persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationDraft {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub reminder_times: Vec<ReminderTime>,
}

impl MedicationDraft {
    /// Builds a draft from raw parser fields. Malformed or duplicate time
    /// strings are discarded rather than failing the draft; an empty name is
    /// the only fatal condition.
    pub fn from_parsed(
        name: &str,
        dosage: Option<&str>,
        frequency: Option<&str>,
        raw_times: &[String],
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyMedicationName);
        }

        let mut reminder_times = Vec::new();
        for raw in raw_times {
            if let Ok(time) = ReminderTime::parse(raw) {
                if !reminder_times.contains(&time) {
                    reminder_times.push(time);
                }
            }
        }
        reminder_times.truncate(MAX_REMINDER_TIMES);

        Ok(Self {
            name: name.to_string(),
            dosage: non_empty_or(dosage, DEFAULT_DOSAGE),
            frequency: non_empty_or(frequency, DEFAULT_FREQUENCY),
            reminder_times,
        })
    }

    pub fn has_times(&self) -> bool {
        !self.reminder_times.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub reminder_times: Vec<ReminderTime>,
    pub created_at: DateTime<Utc>,
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        _ => default.to_string(),
    }
}
