//! Integration tests for email event recording, funnel stats, and
//! provider webhook ingest.
//!
//! These need Docker for the Postgres container; run them with
//! `cargo test -- --ignored`.

mod common;

use common::{fixtures, TestHarness};
use encore_core::domains::analytics::dashboard::{CampaignFunnel, DashboardStats};
use encore_core::domains::analytics::ingest::{ingest_events, ProviderEvent};
use encore_core::domains::analytics::{EmailEvent, EmailEventType};
use encore_core::domains::contacts::{Contact, ContactKind};
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_funnel_counts_distinct_contacts(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    let a = fixtures::create_test_contact(user.id, "A", ContactKind::Blogger, vec![], &ctx.db_pool)
        .await
        .unwrap();
    let b = fixtures::create_test_contact(user.id, "B", ContactKind::Blogger, vec![], &ctx.db_pool)
        .await
        .unwrap();

    for contact in [&a, &b] {
        EmailEvent::record(campaign.id, contact.id, EmailEventType::Sent, None, &ctx.db_pool)
            .await
            .unwrap();
    }
    // Contact A opens three times; rates still count one opener
    for _ in 0..3 {
        EmailEvent::record(campaign.id, a.id, EmailEventType::Opened, None, &ctx.db_pool)
            .await
            .unwrap();
    }
    EmailEvent::record(campaign.id, a.id, EmailEventType::Clicked, None, &ctx.db_pool)
        .await
        .unwrap();

    let funnel = CampaignFunnel::load(campaign.id, &ctx.db_pool).await.unwrap();
    assert_eq!(funnel.recipients, 2);
    assert!((funnel.open_rate - 0.5).abs() < f64::EPSILON);
    assert!((funnel.click_rate - 0.5).abs() < f64::EPSILON);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_ingest_matches_provider_message_ids(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();
    let contact = fixtures::create_test_contact(
        user.id,
        "Opener",
        ContactKind::PlaylistCurator,
        vec![],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    // Recorded at send time with the provider's message id
    EmailEvent::record(
        campaign.id,
        contact.id,
        EmailEventType::Sent,
        Some("msg-abc".to_string()),
        &ctx.db_pool,
    )
    .await
    .unwrap();

    let ingested = ingest_events(
        vec![
            // Suffixed ids resolve to the base id recorded at send time
            ProviderEvent {
                event: "open".to_string(),
                sg_message_id: Some("msg-abc.filter001.recv".to_string()),
            },
            // Unknown event names are skipped
            ProviderEvent {
                event: "processed".to_string(),
                sg_message_id: Some("msg-abc".to_string()),
            },
            // Unknown message ids are skipped
            ProviderEvent {
                event: "click".to_string(),
                sg_message_id: Some("msg-nope".to_string()),
            },
        ],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    assert_eq!(ingested.len(), 1);
    assert_eq!(ingested[0].campaign_id, campaign.id);
    assert_eq!(ingested[0].contact_id, contact.id);
    assert_eq!(ingested[0].event_type, EmailEventType::Opened);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_unsubscribe_event_flips_contact_status(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();
    let contact = fixtures::create_test_contact(
        user.id,
        "Leaver",
        ContactKind::Press,
        vec![],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    EmailEvent::record(
        campaign.id,
        contact.id,
        EmailEventType::Sent,
        Some("msg-unsub".to_string()),
        &ctx.db_pool,
    )
    .await
    .unwrap();

    ingest_events(
        vec![ProviderEvent {
            event: "unsubscribe".to_string(),
            sg_message_id: Some("msg-unsub".to_string()),
        }],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    let contact = Contact::find_by_id(contact.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(contact.status, "unsubscribed");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_dashboard_counts_are_user_scoped(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let other = fixtures::create_test_user(&ctx.db_pool).await.unwrap();

    fixtures::create_test_contact(user.id, "Mine", ContactKind::Radio, vec![], &ctx.db_pool)
        .await
        .unwrap();
    fixtures::create_test_contact(other.id, "Theirs", ContactKind::Radio, vec![], &ctx.db_pool)
        .await
        .unwrap();

    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    let stats = DashboardStats::load(user.id, &ctx.db_pool).await.unwrap();
    let total_contacts: i64 = stats.contacts_by_status.iter().map(|s| s.count).sum();
    assert_eq!(total_contacts, 1);
    let total_campaigns: i64 = stats.campaigns_by_status.iter().map(|s| s.count).sum();
    assert_eq!(total_campaigns, 1);
}
