use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use amica_core::{
    classify, ApplicationError, Classification, ConversationMemory, Medication, MedicationDraft,
    MemoryEffect, RoutingDecision, RoutingOutcome, Screen,
};

use serde::Serialize;

use crate::collaborators::{AiQueryClient, MedicationStore, NotificationScheduler, ReminderParser};

/// Result of one conversation turn, after all side effects were applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnOutcome {
    Navigated { screen: Screen, response: Option<String> },
    ReminderCreated { medication: Medication, notification_ids: Vec<String> },
    ReminderFormPrefilled { name: String, dosage: Option<String>, frequency: Option<String> },
    ClarificationRequested { prompt: String },
    EmergencyPrompted { prompt: String },
    /// The turn completed degraded: a collaborator failed and the user gets
    /// a spoken-friendly acknowledgment instead.
    Acknowledged { message: String },
    /// A newer utterance arrived while this turn awaited a collaborator; no
    /// side effects were applied.
    Superseded,
    Unchanged,
}

#[derive(Debug)]
struct SessionState {
    screen: Screen,
    memory: ConversationMemory,
}

/// Orchestrates one utterance per turn: classify, await at most one
/// collaborator call, re-check the turn counter, apply side effects.
///
/// Session state lives behind a plain mutex that is never held across an
/// await. Each turn snapshots state for classification and re-locks briefly
/// to apply its effects. The atomic turn counter is the sequence guard: a
/// turn that finds a newer sequence after an await applies nothing.
pub struct TurnEngine {
    parser: Arc<dyn ReminderParser>,
    ai: Arc<dyn AiQueryClient>,
    store: Arc<dyn MedicationStore>,
    scheduler: Arc<dyn NotificationScheduler>,
    state: Mutex<SessionState>,
    turn_counter: AtomicU64,
}

impl TurnEngine {
    pub fn new(
        parser: Arc<dyn ReminderParser>,
        ai: Arc<dyn AiQueryClient>,
        store: Arc<dyn MedicationStore>,
        scheduler: Arc<dyn NotificationScheduler>,
    ) -> Self {
        Self {
            parser,
            ai,
            store,
            scheduler,
            state: Mutex::new(SessionState {
                screen: Screen::Home,
                memory: ConversationMemory::new(),
            }),
            turn_counter: AtomicU64::new(0),
        }
    }

    pub fn current_screen(&self) -> Screen {
        self.state().screen
    }

    /// Snapshot of the session's conversation memory.
    pub fn memory(&self) -> ConversationMemory {
        self.state().memory.clone()
    }

    /// Direct UI navigation, outside of any utterance. Returning home resets
    /// conversation memory; jumping straight to volunteer matching without a
    /// pending suggestion drops stale volunteer context.
    pub fn navigate(&self, target: Screen) {
        let mut state = self.state();
        let had_pending_suggestion = !state.memory.last_suggested_routes().is_empty();

        if state.screen == Screen::Info && target != Screen::Info {
            state.memory.clear_suggestions();
        }
        if target == Screen::Volunteer && !had_pending_suggestion {
            state.memory.apply(&MemoryEffect {
                clear_volunteer_context: true,
                ..MemoryEffect::none()
            });
        }

        state.screen = target;
        if target == Screen::Home {
            state.memory.clear_on_navigate_home();
        }

        tracing::debug!(event_name = "router.navigated", screen = %target, "screen changed");
    }

    /// Handles one turn. Infallible by design: total collaborator failure
    /// still produces an outcome the host can render.
    pub async fn handle_utterance(&self, utterance: &str) -> TurnOutcome {
        let turn = self.turn_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let (screen, memory) = {
            let state = self.state();
            (state.screen, state.memory.clone())
        };

        tracing::debug!(
            event_name = "router.turn.started",
            turn,
            screen = %screen,
            "classifying utterance"
        );

        match classify(utterance, screen, &memory) {
            Classification::Decided(outcome) => self.apply(turn, utterance, outcome).await,
            Classification::ReminderCandidate { utterance: candidate, fallback } => {
                self.resolve_reminder_candidate(turn, utterance, &candidate, fallback).await
            }
        }
    }

    async fn resolve_reminder_candidate(
        &self,
        turn: u64,
        raw: &str,
        candidate: &str,
        fallback: RoutingOutcome,
    ) -> TurnOutcome {
        let parsed = match self.parser.parse(candidate).await {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(
                    event_name = "router.reminder_parse.failed",
                    turn,
                    error = %error,
                    "reminder parse failed, degrading to keyword routing"
                );
                if self.is_superseded(turn) {
                    return TurnOutcome::Superseded;
                }
                return self.apply(turn, raw, fallback).await;
            }
        };
        if self.is_superseded(turn) {
            return TurnOutcome::Superseded;
        }

        let name = if parsed.success {
            parsed.name.as_deref().map(str::trim).filter(|name| !name.is_empty())
        } else {
            None
        };
        let Some(name) = name else {
            // Detection is advisory; an empty parse falls through to the
            // decision the keyword rules already produced.
            return self.apply(turn, raw, fallback).await;
        };

        let draft = match MedicationDraft::from_parsed(
            name,
            parsed.dosage.as_deref(),
            parsed.frequency.as_deref(),
            &parsed.reminder_times,
        ) {
            Ok(draft) => draft,
            Err(_) => return self.apply(turn, raw, fallback).await,
        };

        // A successful parse still honors the clears the classifier queued
        // for this turn, but never its volunteer-context capture.
        let mut memory_effect = fallback.memory_effect;
        memory_effect.set_volunteer_context = None;

        let decision = if draft.has_times() {
            RoutingDecision::CreateMedicationReminder {
                name: draft.name,
                dosage: draft.dosage,
                frequency: draft.frequency,
                times: draft.reminder_times,
            }
        } else {
            // Name but no usable times: pre-fill the creation form and let
            // the medication screen collect the rest.
            RoutingDecision::PromptMedicationCompletion {
                name: draft.name,
                dosage: parsed.dosage,
                frequency: parsed.frequency,
            }
        };

        self.apply(turn, raw, RoutingOutcome { decision, memory_effect }).await
    }

    async fn create_reminder(&self, turn: u64, draft: MedicationDraft) -> TurnOutcome {
        let medication = match self.store.save(draft).await {
            Ok(medication) => medication,
            Err(error) => {
                tracing::warn!(
                    event_name = "router.medication_save.failed",
                    turn,
                    error = %error,
                    "medication save failed"
                );
                let interface = ApplicationError::Persistence(error.to_string())
                    .into_interface(format!("turn-{turn}"));
                return TurnOutcome::Acknowledged {
                    message: interface.user_message().to_string(),
                };
            }
        };
        if self.is_superseded(turn) {
            // The medication is already saved; only this turn's navigation
            // is stale.
            return TurnOutcome::Superseded;
        }

        let notification_ids = match self.scheduler.schedule_all(&medication).await {
            Ok(ids) => ids,
            Err(error) => {
                tracing::warn!(
                    event_name = "router.notification_schedule.failed",
                    turn,
                    error = %error,
                    "notification scheduling failed, reminder kept"
                );
                Vec::new()
            }
        };

        self.apply_navigation(Screen::Medication);
        tracing::info!(
            event_name = "router.reminder.created",
            turn,
            medication_id = %medication.id.0,
            times = medication.reminder_times.len(),
            "medication reminder created"
        );
        TurnOutcome::ReminderCreated { medication, notification_ids }
    }

    async fn apply(&self, turn: u64, raw: &str, outcome: RoutingOutcome) -> TurnOutcome {
        let RoutingOutcome { decision, memory_effect } = outcome;
        if !memory_effect.is_none() {
            self.state().memory.apply(&memory_effect);
        }

        match decision {
            RoutingDecision::Navigate { screen, carry_context, .. } => {
                self.apply_navigation(screen);
                if screen == Screen::Info && !carry_context {
                    return self.answer_on_info(turn, raw).await;
                }
                TurnOutcome::Navigated { screen, response: None }
            }
            RoutingDecision::CreateMedicationReminder { name, dosage, frequency, times } => {
                let draft = MedicationDraft { name, dosage, frequency, reminder_times: times };
                self.create_reminder(turn, draft).await
            }
            RoutingDecision::PromptMedicationCompletion { name, dosage, frequency } => {
                self.apply_navigation(Screen::Medication);
                TurnOutcome::ReminderFormPrefilled { name, dosage, frequency }
            }
            RoutingDecision::AskClarifyingQuestion { prompt } => {
                TurnOutcome::ClarificationRequested { prompt }
            }
            RoutingDecision::ShowEmergencyPrompt { prompt } => {
                // Emergency prompts render on the info screen.
                self.apply_navigation(Screen::Info);
                TurnOutcome::EmergencyPrompted { prompt }
            }
            RoutingDecision::NoChange => TurnOutcome::Unchanged,
        }
    }

    /// The general-info fallback: answer the query, remember any suggested
    /// routes for the next turn's affirmative.
    async fn answer_on_info(&self, turn: u64, raw: &str) -> TurnOutcome {
        match self.ai.query(raw).await {
            Ok(answer) => {
                if self.is_superseded(turn) {
                    return TurnOutcome::Superseded;
                }
                let routes: Vec<Screen> = answer
                    .suggested_routes
                    .iter()
                    .filter_map(|route| route.parse().ok())
                    .collect();
                self.state().memory.set_suggested_routes(routes, raw);
                TurnOutcome::Navigated { screen: Screen::Info, response: Some(answer.response) }
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "router.ai_query.failed",
                    turn,
                    error = %error,
                    "ai query failed, acknowledging"
                );
                if self.is_superseded(turn) {
                    return TurnOutcome::Superseded;
                }
                TurnOutcome::Navigated {
                    screen: Screen::Info,
                    response: Some(format!(
                        "I heard you say: \"{}\". I couldn't look that up right now, \
                         but let's try again in a moment.",
                        raw.trim()
                    )),
                }
            }
        }
    }

    fn apply_navigation(&self, target: Screen) {
        let mut state = self.state();
        if state.screen == Screen::Info && target != Screen::Info {
            state.memory.clear_suggestions();
        }
        state.screen = target;
        if target == Screen::Home {
            state.memory.clear_on_navigate_home();
        }
    }

    fn is_superseded(&self, turn: u64) -> bool {
        self.turn_counter.load(Ordering::SeqCst) != turn
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use amica_core::Screen;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::{TurnEngine, TurnOutcome};
    use crate::collaborators::{
        AiQueryClient, AiQueryResponse, InMemoryMedicationStore, LoggingNotificationScheduler,
        MedicationStore, ParsedReminder, ReminderParser,
    };

    struct StubParser(ParsedReminder);

    #[async_trait]
    impl ReminderParser for StubParser {
        async fn parse(&self, _utterance: &str) -> Result<ParsedReminder> {
            Ok(self.0.clone())
        }
    }

    struct FailingParser;

    #[async_trait]
    impl ReminderParser for FailingParser {
        async fn parse(&self, _utterance: &str) -> Result<ParsedReminder> {
            Err(anyhow!("parser unavailable"))
        }
    }

    /// Parser that signals when a parse starts and waits to be released, so
    /// tests can interleave turns deterministically.
    struct GatedParser {
        started: Arc<Notify>,
        release: Arc<Notify>,
        result: ParsedReminder,
    }

    #[async_trait]
    impl ReminderParser for GatedParser {
        async fn parse(&self, _utterance: &str) -> Result<ParsedReminder> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(self.result.clone())
        }
    }

    struct StubAi(AiQueryResponse);

    #[async_trait]
    impl AiQueryClient for StubAi {
        async fn query(&self, _text: &str) -> Result<AiQueryResponse> {
            Ok(self.0.clone())
        }
    }

    struct FailingAi;

    #[async_trait]
    impl AiQueryClient for FailingAi {
        async fn query(&self, _text: &str) -> Result<AiQueryResponse> {
            Err(anyhow!("ai service unavailable"))
        }
    }

    fn parsed_aspirin() -> ParsedReminder {
        ParsedReminder {
            success: true,
            name: Some("Aspirin".to_string()),
            reminder_times: vec!["08:00".to_string()],
            ..ParsedReminder::default()
        }
    }

    fn engine(
        parser: Arc<dyn ReminderParser>,
        ai: Arc<dyn AiQueryClient>,
        store: Arc<InMemoryMedicationStore>,
    ) -> TurnEngine {
        TurnEngine::new(parser, ai, store, Arc::new(LoggingNotificationScheduler))
    }

    fn quiet_ai() -> Arc<dyn AiQueryClient> {
        Arc::new(StubAi(AiQueryResponse {
            response: "Here is what I found.".to_string(),
            suggested_routes: Vec::new(),
        }))
    }

    #[tokio::test]
    async fn full_parse_creates_reminder_with_defaults() {
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(StubParser(parsed_aspirin())), quiet_ai(), store.clone());

        let outcome = engine.handle_utterance("remind me to take aspirin at 8am").await;

        let TurnOutcome::ReminderCreated { medication, notification_ids } = outcome else {
            panic!("expected a created reminder, got {outcome:?}");
        };
        assert_eq!(medication.name, "Aspirin");
        assert_eq!(medication.dosage, "As prescribed");
        assert_eq!(medication.frequency, "Daily");
        assert_eq!(medication.reminder_times[0].to_string(), "08:00");
        assert_eq!(notification_ids.len(), 1);
        assert_eq!(engine.current_screen(), Screen::Medication);
        assert_eq!(store.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn name_without_times_prefills_the_form() {
        let parsed = ParsedReminder {
            success: true,
            name: Some("Metformin".to_string()),
            dosage: Some("500mg".to_string()),
            ..ParsedReminder::default()
        };
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(StubParser(parsed)), quiet_ai(), store.clone());

        let outcome = engine.handle_utterance("remind me to take my metformin").await;

        assert_eq!(
            outcome,
            TurnOutcome::ReminderFormPrefilled {
                name: "Metformin".to_string(),
                dosage: Some("500mg".to_string()),
                frequency: None,
            }
        );
        assert_eq!(engine.current_screen(), Screen::Medication);
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn parser_failure_degrades_to_keyword_routing() {
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(FailingParser), quiet_ai(), store.clone());

        let outcome = engine.handle_utterance("remind me to take aspirin at 8am").await;

        assert_eq!(outcome, TurnOutcome::Navigated { screen: Screen::Medication, response: None });
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn info_fallback_stores_suggestions_for_the_next_affirmative() {
        let ai = Arc::new(StubAi(AiQueryResponse {
            response: "You could pick it up yourself or ask a volunteer.".to_string(),
            suggested_routes: vec!["volunteer".to_string(), "health".to_string()],
        }));
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(FailingParser), ai, store);

        let first = engine.handle_utterance("I want some medicine from CVS").await;
        assert!(matches!(
            first,
            TurnOutcome::Navigated { screen: Screen::Info, response: Some(_) }
        ));
        assert_eq!(
            engine.memory().last_suggested_routes(),
            &[Screen::Volunteer, Screen::Health]
        );

        let second = engine.handle_utterance("yes").await;
        assert_eq!(second, TurnOutcome::Navigated { screen: Screen::Volunteer, response: None });
        let memory = engine.memory();
        assert!(memory.last_suggested_routes().is_empty());
        assert_eq!(memory.volunteer_context_query(), Some("I want some medicine from CVS"));
    }

    #[tokio::test]
    async fn reminder_creation_clears_pending_suggestions() {
        let ai = Arc::new(StubAi(AiQueryResponse {
            response: "You could pick it up yourself or ask a volunteer.".to_string(),
            suggested_routes: vec!["volunteer".to_string(), "health".to_string()],
        }));
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(StubParser(parsed_aspirin())), ai, store);

        engine.handle_utterance("I want some medicine from CVS").await;
        assert!(!engine.memory().last_suggested_routes().is_empty());

        let outcome = engine.handle_utterance("remind me to take aspirin at 8am").await;
        assert!(matches!(outcome, TurnOutcome::ReminderCreated { .. }));

        assert_eq!(engine.current_screen(), Screen::Medication);
        let memory = engine.memory();
        assert!(memory.last_suggested_routes().is_empty());
        assert_eq!(memory.volunteer_context_query(), None);
    }

    #[tokio::test]
    async fn form_prefill_clears_pending_suggestions() {
        let ai = Arc::new(StubAi(AiQueryResponse {
            response: "You could pick it up yourself or ask a volunteer.".to_string(),
            suggested_routes: vec!["volunteer".to_string()],
        }));
        let parsed = ParsedReminder {
            success: true,
            name: Some("Metformin".to_string()),
            ..ParsedReminder::default()
        };
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(StubParser(parsed)), ai, store);

        engine.handle_utterance("I want some medicine from CVS").await;
        assert!(!engine.memory().last_suggested_routes().is_empty());

        let outcome = engine.handle_utterance("remind me to take my metformin").await;
        assert!(matches!(outcome, TurnOutcome::ReminderFormPrefilled { .. }));

        assert_eq!(engine.current_screen(), Screen::Medication);
        assert!(engine.memory().last_suggested_routes().is_empty());
    }

    #[tokio::test]
    async fn ai_failure_still_acknowledges_the_user() {
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(FailingParser), Arc::new(FailingAi), store);

        let outcome = engine.handle_utterance("what is the weather like").await;

        let TurnOutcome::Navigated { screen: Screen::Info, response: Some(message) } = outcome
        else {
            panic!("expected a degraded info response, got {outcome:?}");
        };
        assert!(message.contains("I heard you say"));
        assert!(message.contains("what is the weather like"));
    }

    #[tokio::test]
    async fn volunteer_screen_owns_its_own_followups() {
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(FailingParser), quiet_ai(), store);

        engine.navigate(Screen::Volunteer);
        let outcome = engine.handle_utterance("I fell down").await;

        assert_eq!(outcome, TurnOutcome::Unchanged);
        assert_eq!(engine.current_screen(), Screen::Volunteer);
    }

    #[tokio::test]
    async fn fall_detection_prompts_emergency_via_info() {
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(FailingParser), quiet_ai(), store);

        let outcome = engine.handle_utterance("I fell down").await;

        assert!(matches!(outcome, TurnOutcome::EmergencyPrompted { ref prompt }
            if prompt.contains("911")));
        assert_eq!(engine.current_screen(), Screen::Info);
    }

    #[tokio::test]
    async fn navigating_home_resets_conversation_memory() {
        let ai = Arc::new(StubAi(AiQueryResponse {
            response: "Volunteers can help with that.".to_string(),
            suggested_routes: vec!["volunteer".to_string()],
        }));
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = engine(Arc::new(FailingParser), ai, store);

        engine.handle_utterance("something unclassifiable").await;
        assert!(!engine.memory().last_suggested_routes().is_empty());

        engine.navigate(Screen::Home);
        let memory = engine.memory();
        assert!(memory.last_suggested_routes().is_empty());
        assert_eq!(memory.volunteer_context_query(), None);
    }

    #[tokio::test]
    async fn superseded_turn_applies_no_side_effects() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let parser = Arc::new(GatedParser {
            started: started.clone(),
            release: release.clone(),
            result: parsed_aspirin(),
        });
        let store = Arc::new(InMemoryMedicationStore::new());
        let engine = Arc::new(engine(parser, quiet_ai(), store.clone()));

        let first = {
            let engine = engine.clone();
            tokio::spawn(
                async move { engine.handle_utterance("remind me to take aspirin at 8am").await },
            )
        };
        started.notified().await;

        // A newer utterance lands while the first turn's parse is in flight.
        let second = engine.handle_utterance("what events are happening").await;
        assert_eq!(second, TurnOutcome::Navigated { screen: Screen::Events, response: None });

        release.notify_one();
        let first = first.await.expect("turn task completes");
        assert_eq!(first, TurnOutcome::Superseded);
        assert!(store.list().await.expect("list").is_empty());
        assert_eq!(engine.current_screen(), Screen::Events);
    }
}
