pub mod contact;

pub use contact::{
    AudienceFilter, Contact, ContactFilters, ContactKind, ContactStatus, CreateContact,
    UpdateContact,
};
