//! Integration tests for the campaign lifecycle: scheduling, cancelling,
//! claiming due campaigns, and the status guards around mutation.
//!
//! These need Docker for the Postgres container; run them with
//! `cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{Duration, Utc};
use common::{fixtures, TestHarness};
use encore_core::common::ApiError;
use encore_core::domains::automation::models::{AutomationRule, CreateRule};
use encore_core::domains::automation::{RuleAction, RuleTrigger};
use encore_core::domains::campaigns::models::UpdateCampaign;
use encore_core::domains::campaigns::{Campaign, CampaignStatus, SendOutcome};
use encore_core::domains::notifications::Notification;
use encore_core::domains::templates::EmailTemplate;
use encore_core::kernel::scheduler::run_post_send_effects;
use encore_core::kernel::{ExpoClient, Notifier, WebhookDispatcher};
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_campaign_starts_as_draft(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(campaign.status, "draft");
    assert_eq!(campaign.sent_count, 0);
    assert!(campaign.scheduled_at.is_none());
    assert_eq!(
        campaign.variable_map().get("track_name"),
        Some(&"Night Drive".to_string())
    );
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_schedule_and_cancel(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    // Past times are rejected
    let past = Utc::now() - Duration::hours(1);
    assert!(Campaign::schedule(campaign.id, user.id, past, &ctx.db_pool)
        .await
        .is_err());

    let when = Utc::now() + Duration::hours(2);
    let campaign = Campaign::schedule(campaign.id, user.id, when, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(campaign.status, "scheduled");
    assert!(campaign.scheduled_at.is_some());

    // Re-scheduling a scheduled campaign is allowed
    let later = Utc::now() + Duration::hours(4);
    let campaign = Campaign::schedule(campaign.id, user.id, later, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(campaign.status, "scheduled");

    let campaign = Campaign::cancel(campaign.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(campaign.status, "cancelled");

    // Cancelled campaigns cannot be cancelled or scheduled again
    assert!(Campaign::cancel(campaign.id, user.id, &ctx.db_pool)
        .await
        .is_err());
    assert!(
        Campaign::schedule(campaign.id, user.id, Utc::now() + Duration::hours(1), &ctx.db_pool)
            .await
            .is_err()
    );
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_begin_sending_claims_once(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    let claimed = Campaign::begin_sending(campaign.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(claimed.is_some());
    assert_eq!(claimed.unwrap().status, "sending");

    // A second claim loses the race
    let again = Campaign::begin_sending(campaign.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(again.is_none());

    Campaign::finish(campaign.id, CampaignStatus::Sent, 3, 1, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = Campaign::find_by_id(campaign.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(campaign.status, "sent");
    assert_eq!(campaign.sent_count, 3);
    assert_eq!(campaign.failed_count, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_claim_due_picks_up_overdue_campaigns(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    Campaign::schedule(campaign.id, user.id, Utc::now() + Duration::hours(1), &ctx.db_pool)
        .await
        .unwrap();

    // Not due yet
    let due = Campaign::claim_due(10, &ctx.db_pool).await.unwrap();
    assert!(!due.iter().any(|c| c.id == campaign.id));

    // Backdate the schedule so the claim picks it up
    sqlx::query("UPDATE campaigns SET scheduled_at = NOW() - interval '1 minute' WHERE id = $1")
        .bind(campaign.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let due = Campaign::claim_due(10, &ctx.db_pool).await.unwrap();
    let claimed = due
        .iter()
        .find(|c| c.id == campaign.id)
        .expect("overdue campaign should be claimed");
    assert_eq!(claimed.status, "sending");

    // Claimed campaigns are not handed out twice
    let due = Campaign::claim_due(10, &ctx.db_pool).await.unwrap();
    assert!(!due.iter().any(|c| c.id == campaign.id));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_template_in_use_cannot_be_deleted(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    // The campaign still references the template: a 409, not a 500
    let err = EmailTemplate::delete(template.id, user.id, &ctx.db_pool)
        .await
        .unwrap_err();
    let response = ApiError::from(err).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    Campaign::delete(campaign.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    EmailTemplate::delete(template.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_failed_run_skips_sent_effects(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    // A campaign_sent rule that notifies; it must stay silent on failure
    AutomationRule::create(
        user.id,
        CreateRule {
            name: "celebrate".to_string(),
            trigger: RuleTrigger::CampaignSent,
            action: RuleAction::Notify,
            action_params: serde_json::json!({"message": "it went out"}),
        },
        &ctx.db_pool,
    )
    .await
    .unwrap();

    let notifier = Notifier::new(Arc::new(ExpoClient::new(None)));
    let webhooks = WebhookDispatcher::spawn();

    // Every recipient errored: the owner hears about the failure, nothing else
    let failed = SendOutcome {
        recipients: 2,
        sent: 0,
        failed: 2,
        status: CampaignStatus::Failed,
    };
    run_post_send_effects(&campaign, &failed, &notifier, &webhooks, &ctx.db_pool).await;

    let notifications = Notification::list(user.id, false, None, 50, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Campaign failed");

    // A successful run fires the full set: sent notice plus the rule's
    let sent = SendOutcome {
        recipients: 2,
        sent: 2,
        failed: 0,
        status: CampaignStatus::Sent,
    };
    run_post_send_effects(&campaign, &sent, &notifier, &webhooks, &ctx.db_pool).await;

    let notifications = Notification::list(user.id, false, None, 50, &ctx.db_pool)
        .await
        .unwrap();
    let titles: Vec<&str> = notifications.iter().map(|n| n.title.as_str()).collect();
    assert!(titles.contains(&"Campaign sent"));
    assert!(titles.contains(&"celebrate"));
    assert_eq!(titles.iter().filter(|t| **t == "Campaign failed").count(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_mutation_guards_by_status(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let template = fixtures::create_test_template(user.id, &ctx.db_pool)
        .await
        .unwrap();
    let campaign = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();

    // Drafts can be renamed
    let campaign = Campaign::update(
        campaign.id,
        user.id,
        UpdateCampaign {
            name: Some("Renamed launch".to_string()),
            ..Default::default()
        },
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(campaign.name, "Renamed launch");

    Campaign::begin_sending(campaign.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    Campaign::finish(campaign.id, CampaignStatus::Sent, 1, 0, &ctx.db_pool)
        .await
        .unwrap();

    // Sent campaigns are immutable and cannot be deleted
    let update = Campaign::update(
        campaign.id,
        user.id,
        UpdateCampaign {
            name: Some("Too late".to_string()),
            ..Default::default()
        },
        &ctx.db_pool,
    )
    .await;
    assert!(update.is_err());
    assert!(Campaign::delete(campaign.id, user.id, &ctx.db_pool)
        .await
        .is_err());

    // Drafts delete fine
    let other = fixtures::create_test_campaign(user.id, &template, &ctx.db_pool)
        .await
        .unwrap();
    Campaign::delete(other.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert!(Campaign::find_by_id(other.id, user.id, &ctx.db_pool)
        .await
        .is_err());
}
