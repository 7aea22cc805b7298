//! User-defined automation rules and the engine that applies them.

pub mod engine;
pub mod models;

pub use engine::{fire, TriggerContext};
pub use models::{AutomationRule, RuleAction, RuleTrigger};
