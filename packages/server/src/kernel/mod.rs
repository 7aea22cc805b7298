//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod expo;
pub mod notifier;
pub mod scheduler;
pub mod webhooks;

pub use ai::{Ai, OpenAIClient};
pub use expo::ExpoClient;
pub use notifier::Notifier;
pub use scheduler::Scheduler;
pub use webhooks::{WebhookDelivery, WebhookDispatcher};
