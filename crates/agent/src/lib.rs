//! Turn runtime - collaborator orchestration around the intent classifier
//!
//! This crate is the side-effecting half of the router. The classifier in
//! `amica-core` only decides; this crate:
//! - Owns the per-session state (current screen + conversation memory)
//! - Calls the asynchronous collaborators (reminder parser, AI query,
//!   medication store, notification scheduler)
//! - Applies the memory mutations a decision implies
//! - Guards against superseded turns with a sequence-number check
//!
//! # Architecture
//!
//! Each utterance is one discrete turn: classify, await at most one
//! collaborator call, re-check the turn counter, then apply side effects.
//! A turn that was superseded mid-await applies nothing and reports
//! `TurnOutcome::Superseded`.
//!
//! # Key Types
//!
//! - `TurnEngine` - Main orchestrator (see `runtime` module)
//! - `ReminderParser` / `AiQueryClient` - Pluggable collaborator traits
//! - `HttpReminderParser` / `HttpAiQueryClient` - reqwest-backed clients
//!
//! # Safety Principle
//!
//! Collaborator failure is never fatal. A turn always ends with the user on
//! some screen with some acknowledgment, even under total service outage.

pub mod collaborators;
pub mod http;
pub mod runtime;
pub mod telemetry;

pub use collaborators::{
    AiQueryClient, AiQueryResponse, InMemoryMedicationStore, LoggingNotificationScheduler,
    MedicationStore, NotificationScheduler, ParsedReminder, ReminderParser,
};
pub use http::{HttpAiQueryClient, HttpReminderParser};
pub use runtime::{TurnEngine, TurnOutcome};
