//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use encore_core::common::UserId;
use encore_core::domains::auth::password::hash_password;
use encore_core::domains::auth::{CreateUser, User};
use encore_core::domains::campaigns::models::CreateCampaign;
use encore_core::domains::campaigns::Campaign;
use encore_core::domains::contacts::{Contact, ContactKind, CreateContact};
use encore_core::domains::templates::{CreateTemplate, EmailTemplate};
use sqlx::PgPool;
use uuid::Uuid;

/// Create a test user with a unique email and a known password ("hunter2!A")
pub async fn create_test_user(pool: &PgPool) -> Result<User> {
    let user = User::create(
        CreateUser {
            email: format!("artist-{}@example.com", Uuid::new_v4()),
            password_hash: hash_password("hunter2!A")?,
            name: "Test Artist".to_string(),
        },
        pool,
    )
    .await?;
    Ok(user)
}

/// Create a test contact with a unique email
pub async fn create_test_contact(
    user_id: UserId,
    name: &str,
    kind: ContactKind,
    tags: Vec<String>,
    pool: &PgPool,
) -> Result<Contact> {
    let contact = Contact::create(
        user_id,
        CreateContact {
            name: name.to_string(),
            email: format!("{}-{}@example.com", name.replace(' ', "."), Uuid::new_v4()),
            outlet: Some("Test Outlet".to_string()),
            contact_kind: kind,
            tags,
            notes: None,
        },
        pool,
    )
    .await?;
    Ok(contact)
}

/// Create a simple pitch template with two placeholders
pub async fn create_test_template(user_id: UserId, pool: &PgPool) -> Result<EmailTemplate> {
    let template = EmailTemplate::create(
        user_id,
        CreateTemplate {
            name: "Pitch".to_string(),
            subject: "New single for {{contact_name}}".to_string(),
            body: "Hi {{contact_name}}, here is {{track_name}}.".to_string(),
        },
        pool,
    )
    .await?;
    Ok(template)
}

/// Create a draft campaign pointing at the given template
pub async fn create_test_campaign(
    user_id: UserId,
    template: &EmailTemplate,
    pool: &PgPool,
) -> Result<Campaign> {
    let mut variables = serde_json::Map::new();
    variables.insert(
        "track_name".to_string(),
        serde_json::Value::String("Night Drive".to_string()),
    );

    let campaign = Campaign::create(
        user_id,
        CreateCampaign {
            template_id: template.id,
            name: "Single launch".to_string(),
            audience: Default::default(),
            variables,
        },
        pool,
    )
    .await?;
    Ok(campaign)
}
