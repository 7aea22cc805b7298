pub mod rule;

pub use rule::{AutomationRule, CreateRule, RuleAction, RuleTrigger, UpdateRule};
