//! Collaborator traits and in-process implementations.
//!
//! The router consumes its external services through these seams so hosts
//! can plug in real cloud-backed clients (see `http`), and tests can use
//! deterministic stubs.

use std::sync::Mutex;

use amica_core::{Medication, MedicationDraft, MedicationId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire shape of the reminder-parser service response. Field names follow
/// the service's camelCase JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedReminder {
    pub success: bool,
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub reminder_times: Vec<String>,
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiQueryResponse {
    pub response: String,
    /// Screen identifiers the upstream AI proposed as relevant destinations.
    /// Unknown identifiers are ignored by the runtime.
    pub suggested_routes: Vec<String>,
}

/// Extracts a structured medication reminder from a free-form utterance.
#[async_trait]
pub trait ReminderParser: Send + Sync {
    async fn parse(&self, utterance: &str) -> Result<ParsedReminder>;
}

/// General-information fallback: answers a query and may suggest routes.
#[async_trait]
pub trait AiQueryClient: Send + Sync {
    async fn query(&self, text: &str) -> Result<AiQueryResponse>;
}

#[async_trait]
pub trait MedicationStore: Send + Sync {
    async fn save(&self, draft: MedicationDraft) -> Result<Medication>;
    async fn list(&self) -> Result<Vec<Medication>>;
    async fn delete(&self, id: &MedicationId) -> Result<()>;
}

#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Schedules one daily local reminder per reminder time, returning the
    /// scheduled notification ids.
    async fn schedule_all(&self, medication: &Medication) -> Result<Vec<String>>;
}

/// Mutex-backed store for tests, the CLI, and hosts that bring their own
/// persistence. Persistence technology is deliberately not this crate's
/// concern.
#[derive(Debug, Default)]
pub struct InMemoryMedicationStore {
    medications: Mutex<Vec<Medication>>,
}

impl InMemoryMedicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MedicationStore for InMemoryMedicationStore {
    async fn save(&self, draft: MedicationDraft) -> Result<Medication> {
        let medication = Medication {
            id: MedicationId(Uuid::new_v4().to_string()),
            name: draft.name,
            dosage: draft.dosage,
            frequency: draft.frequency,
            reminder_times: draft.reminder_times,
            created_at: Utc::now(),
        };

        let mut medications = self
            .medications
            .lock()
            .map_err(|_| anyhow::anyhow!("medication store lock is poisoned"))?;
        medications.push(medication.clone());
        Ok(medication)
    }

    async fn list(&self) -> Result<Vec<Medication>> {
        let medications = self
            .medications
            .lock()
            .map_err(|_| anyhow::anyhow!("medication store lock is poisoned"))?;
        Ok(medications.clone())
    }

    async fn delete(&self, id: &MedicationId) -> Result<()> {
        let mut medications = self
            .medications
            .lock()
            .map_err(|_| anyhow::anyhow!("medication store lock is poisoned"))?;
        medications.retain(|medication| &medication.id != id);
        Ok(())
    }
}

/// Scheduler that only records the schedule via tracing. Real delivery is a
/// host concern.
#[derive(Debug, Default)]
pub struct LoggingNotificationScheduler;

#[async_trait]
impl NotificationScheduler for LoggingNotificationScheduler {
    async fn schedule_all(&self, medication: &Medication) -> Result<Vec<String>> {
        let notification_ids: Vec<String> = medication
            .reminder_times
            .iter()
            .map(|time| format!("{}-{time}", medication.id.0))
            .collect();

        tracing::info!(
            event_name = "router.notifications.scheduled",
            medication_id = %medication.id.0,
            count = notification_ids.len(),
            "daily reminders scheduled"
        );

        Ok(notification_ids)
    }
}
