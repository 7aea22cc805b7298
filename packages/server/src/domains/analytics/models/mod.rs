pub mod email_event;

pub use email_event::{EmailEvent, EmailEventType, EventCount};
