//! Campaigns: a template plus an audience, sent now or on a schedule.

pub mod models;
pub mod send;

pub use models::{Campaign, CampaignStatus};
pub use send::{send_campaign, SendOutcome};
