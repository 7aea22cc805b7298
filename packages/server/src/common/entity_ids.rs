//! Typed ID definitions for all domain entities.
//!
//! One marker type + alias per entity keeps ID usage compile-time safe
//! across the application.

pub use super::id::Id;

// Entity marker types

/// Marker type for User entities.
pub struct User;

/// Marker type for Contact entities (promo targets: curators, press, radio).
pub struct Contact;

/// Marker type for Campaign entities.
pub struct Campaign;

/// Marker type for EmailTemplate entities.
pub struct EmailTemplate;

/// Marker type for EmailEvent entities (delivery/engagement events).
pub struct EmailEvent;

/// Marker type for Notification entities.
pub struct Notification;

/// Marker type for DeviceToken entities.
pub struct DeviceToken;

/// Marker type for Integration entities (outbound webhooks).
pub struct Integration;

/// Marker type for AutomationRule entities.
pub struct AutomationRule;

/// Marker type for SecurityEvent entities.
pub struct SecurityEvent;

// Type aliases - the primary API

pub type UserId = Id<User>;
pub type ContactId = Id<Contact>;
pub type CampaignId = Id<Campaign>;
pub type TemplateId = Id<EmailTemplate>;
pub type EmailEventId = Id<EmailEvent>;
pub type NotificationId = Id<Notification>;
pub type DeviceTokenId = Id<DeviceToken>;
pub type IntegrationId = Id<Integration>;
pub type RuleId = Id<AutomationRule>;
pub type SecurityEventId = Id<SecurityEvent>;
