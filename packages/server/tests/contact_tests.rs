//! Integration tests for contacts: CRUD, tags, filters, audience
//! resolution, and CSV import.
//!
//! These need Docker for the Postgres container; run them with
//! `cargo test -- --ignored`.

mod common;

use common::{fixtures, TestHarness};
use encore_core::domains::contacts::import::import_contacts;
use encore_core::domains::contacts::{
    AudienceFilter, Contact, ContactFilters, ContactKind, ContactStatus, UpdateContact,
};
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_contact_create_and_find(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();

    let contact = fixtures::create_test_contact(
        user.id,
        "Jo Curator",
        ContactKind::PlaylistCurator,
        vec!["indie".to_string()],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    assert_eq!(contact.status, "new");
    assert_eq!(contact.tags, vec!["indie".to_string()]);

    let found = Contact::find_by_id(contact.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(found.name, "Jo Curator");

    // Another user cannot see it
    let other = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    assert!(Contact::find_by_id(contact.id, other.id, &ctx.db_pool)
        .await
        .is_err());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_rejected(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let contact = fixtures::create_test_contact(
        user.id,
        "Sam Writer",
        ContactKind::Blogger,
        vec![],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    // Same email, same user: unique violation
    let dup = Contact::create(
        user.id,
        encore_core::domains::contacts::CreateContact {
            name: "Sam Again".to_string(),
            email: contact.email.clone(),
            outlet: None,
            contact_kind: ContactKind::Blogger,
            tags: vec![],
            notes: None,
        },
        &ctx.db_pool,
    )
    .await;
    assert!(dup.is_err());

    // Same email under a different user is fine
    let other = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let ok = Contact::create(
        other.id,
        encore_core::domains::contacts::CreateContact {
            name: "Sam Elsewhere".to_string(),
            email: contact.email.clone(),
            outlet: None,
            contact_kind: ContactKind::Blogger,
            tags: vec![],
            notes: None,
        },
        &ctx.db_pool,
    )
    .await;
    assert!(ok.is_ok());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_list_filters_and_pagination(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();

    for i in 0..5 {
        fixtures::create_test_contact(
            user.id,
            &format!("Curator {i}"),
            ContactKind::PlaylistCurator,
            vec!["electronic".to_string()],
            &ctx.db_pool,
        )
        .await
        .unwrap();
    }
    fixtures::create_test_contact(user.id, "Radio Host", ContactKind::Radio, vec![], &ctx.db_pool)
        .await
        .unwrap();

    // Kind filter
    let curators = Contact::list(
        user.id,
        &ContactFilters {
            kind: Some(ContactKind::PlaylistCurator),
            ..Default::default()
        },
        None,
        50,
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(curators.len(), 5);

    // Tag filter
    let tagged = Contact::list(
        user.id,
        &ContactFilters {
            tag: Some("electronic".to_string()),
            ..Default::default()
        },
        None,
        50,
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(tagged.len(), 5);

    // Cursor pagination: limit 3 fetches 4 rows (one extra page probe),
    // newest first (v7 IDs are time-ordered)
    let page = Contact::list(user.id, &ContactFilters::default(), None, 3, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(page.len(), 4);
    assert_eq!(page[0].name, "Radio Host");

    let after = *page[2].id.as_uuid();
    let rest = Contact::list(
        user.id,
        &ContactFilters::default(),
        Some(after),
        3,
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(rest.len(), 3);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_tags_add_remove_idempotent(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let contact = fixtures::create_test_contact(
        user.id,
        "Taggy",
        ContactKind::Press,
        vec![],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    let contact = Contact::add_tag(contact.id, user.id, "warm", &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(contact.tags, vec!["warm".to_string()]);

    // Adding the same tag again does not duplicate it
    let contact = Contact::add_tag(contact.id, user.id, "warm", &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(contact.tags, vec!["warm".to_string()]);

    let contact = Contact::remove_tag(contact.id, user.id, "warm", &ctx.db_pool)
        .await
        .unwrap();
    assert!(contact.tags.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_audience_excludes_unsubscribed(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();

    let a = fixtures::create_test_contact(
        user.id,
        "Stays",
        ContactKind::Blogger,
        vec!["indie".to_string()],
        &ctx.db_pool,
    )
    .await
    .unwrap();
    let b = fixtures::create_test_contact(
        user.id,
        "Gone",
        ContactKind::Blogger,
        vec!["indie".to_string()],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    Contact::set_status(b.id, ContactStatus::Unsubscribed, &ctx.db_pool)
        .await
        .unwrap();

    let audience = Contact::find_audience(
        user.id,
        &AudienceFilter {
            tags: vec!["indie".to_string()],
            ..Default::default()
        },
        &ctx.db_pool,
    )
    .await
    .unwrap();

    assert_eq!(audience.len(), 1);
    assert_eq!(audience[0].id, a.id);

    // Empty filter matches every non-unsubscribed contact
    let all = Contact::find_audience(user.id, &AudienceFilter::default(), &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_mark_contacted_promotes_new(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();
    let contact = fixtures::create_test_contact(
        user.id,
        "Fresh",
        ContactKind::Radio,
        vec![],
        &ctx.db_pool,
    )
    .await
    .unwrap();

    // Engaged contacts keep their status when contacted again
    let engaged = fixtures::create_test_contact(
        user.id,
        "Fan",
        ContactKind::Radio,
        vec![],
        &ctx.db_pool,
    )
    .await
    .unwrap();
    Contact::update(
        engaged.id,
        user.id,
        UpdateContact {
            status: Some(ContactStatus::Engaged),
            ..Default::default()
        },
        &ctx.db_pool,
    )
    .await
    .unwrap();

    Contact::mark_contacted(&[contact.id, engaged.id], &ctx.db_pool)
        .await
        .unwrap();

    let contact = Contact::find_by_id(contact.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(contact.status, "contacted");
    assert!(contact.last_contacted_at.is_some());

    let engaged = Contact::find_by_id(engaged.id, user.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(engaged.status, "engaged");
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn test_csv_import_skips_bad_rows(ctx: &TestHarness) {
    let user = fixtures::create_test_user(&ctx.db_pool).await.unwrap();

    let data = "name,email,outlet,kind\n\
                Jo Curator,jo@lists.example,Fresh Finds,playlist_curator\n\
                Bad Row,not-an-email-kind,Somewhere,astronaut\n\
                Sam Writer,sam@blog.example,The Drop,blogger\n";

    let report = import_contacts(user.id, data, &ctx.db_pool).await.unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);

    // Re-importing the same file: everything is a duplicate now
    let report = import_contacts(user.id, data, &ctx.db_pool).await.unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(report.skipped, 3);
}
