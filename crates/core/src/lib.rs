//! Intent-routing core for the Amica voice assistant.
//!
//! This crate holds everything that is pure and deterministic about routing
//! a transcribed utterance:
//!
//! - `domain` - screens, routing decisions, medication types
//! - `keywords` - the constant keyword tables behind every heuristic
//! - `classifier` - the ordered, first-match-wins rule engine
//! - `memory` - short-term conversation memory for one session
//! - `errors` - the layered error taxonomy
//! - `config` - file/env configuration loading and validation
//!
//! # Safety principle
//!
//! The classifier only decides; it performs no I/O and applies no side
//! effects. Collaborator calls (reminder parsing, AI queries, persistence,
//! notifications) and the memory mutations a decision implies live in the
//! agent crate, which applies them through the documented operations here.

pub mod classifier;
pub mod config;
pub mod domain;
pub mod errors;
pub mod keywords;
pub mod memory;

pub use classifier::{classify, Classification, RoutingOutcome};
pub use domain::decision::RoutingDecision;
pub use domain::medication::{
    Medication, MedicationDraft, MedicationId, ReminderTime, MAX_REMINDER_TIMES,
};
pub use domain::screen::Screen;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use keywords::NeedCategory;
pub use memory::{ConversationMemory, MemoryEffect};
