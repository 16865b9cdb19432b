use std::sync::Arc;

use amica_agent::{
    HttpAiQueryClient, HttpReminderParser, InMemoryMedicationStore, LoggingNotificationScheduler,
    TurnEngine, TurnOutcome,
};
use amica_core::config::{AppConfig, LoadOptions};
use amica_core::{classify, Classification, ConversationMemory, RoutingDecision, Screen};
use serde::Serialize;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct RouteReport {
    command: &'static str,
    status: &'static str,
    screen: String,
    decision: RoutingDecision,
    /// True when the utterance reads like a reminder request. The runtime
    /// would hand it to the reminder parser; offline, `decision` shows where
    /// a failed parse would land.
    deferred_to_parser: bool,
}

pub fn run(utterance: &str, screen: &str) -> CommandResult {
    let screen: Screen = match screen.parse() {
        Ok(screen) => screen,
        Err(error) => {
            return CommandResult::failure("route", "invalid_screen", error.to_string(), 2)
        }
    };

    let memory = ConversationMemory::new();
    let (decision, deferred_to_parser) = match classify(utterance, screen, &memory) {
        Classification::Decided(outcome) => (outcome.decision, false),
        Classification::ReminderCandidate { fallback, .. } => (fallback.decision, true),
    };

    let report = RouteReport {
        command: "route",
        status: "ok",
        screen: screen.to_string(),
        decision,
        deferred_to_parser,
    };

    match serde_json::to_string(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("route", "serialization", error.to_string(), 1),
    }
}

#[derive(Debug, Serialize)]
struct LiveReport {
    command: &'static str,
    status: &'static str,
    screen: String,
    outcome: TurnOutcome,
}

/// Runs one full turn against the configured collaborator services, with a
/// throwaway in-memory medication store.
pub fn run_live(utterance: &str, screen: &str) -> CommandResult {
    let screen: Screen = match screen.parse() {
        Ok(screen) => screen,
        Err(error) => {
            return CommandResult::failure("route", "invalid_screen", error.to_string(), 2)
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("route", "config_validation", error.to_string(), 2)
        }
    };

    let parser = match HttpReminderParser::from_config(&config.services) {
        Ok(parser) => parser,
        Err(error) => return CommandResult::failure("route", "client_init", error.to_string(), 3),
    };
    let ai = match HttpAiQueryClient::from_config(&config.services, &config.llm) {
        Ok(ai) => ai,
        Err(error) => return CommandResult::failure("route", "client_init", error.to_string(), 3),
    };

    let engine = TurnEngine::new(
        Arc::new(parser),
        Arc::new(ai),
        Arc::new(InMemoryMedicationStore::new()),
        Arc::new(LoggingNotificationScheduler),
    );
    engine.navigate(screen);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("route", "runtime_init", error.to_string(), 3),
    };
    let outcome = runtime.block_on(engine.handle_utterance(utterance));

    let report =
        LiveReport { command: "route", status: "ok", screen: screen.to_string(), outcome };
    match serde_json::to_string(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("route", "serialization", error.to_string(), 1),
    }
}
