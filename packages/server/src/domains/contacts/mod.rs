//! Promo contacts: the people campaigns go out to.

pub mod import;
pub mod models;

pub use models::{
    AudienceFilter, Contact, ContactFilters, ContactKind, ContactStatus, CreateContact,
    UpdateContact,
};
