//! Integration tests for the campaign stores.
//!
//! `#[sqlx::test]` cases run against a fresh database from `DATABASE_URL`.
//! - Shared contract run against both backends
//! - Create and fetch round trip through JSONB columns
//! - Partial updates keep unset columns
//! - `error_message` follows the failed status
//! - Owner listing order and stale-run listing

use adflow_core::campaign::{
    BrandResearch, CampaignStatus, GeneratedContent, GeneratedImage, Goal, Platform,
    TwitterContent,
};
use adflow_db::models::campaign::{CampaignUpdate, CreateCampaign};
use adflow_db::{CampaignStore, InMemoryCampaignStore, PgCampaignStore, StoreBackend};
use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_campaign(owner_id: i64) -> CreateCampaign {
    CreateCampaign {
        owner_id,
        website_url: "https://acme.test".to_string(),
        platforms: vec![Platform::Twitter, Platform::Linkedin],
        tone: "confident".to_string(),
        goal: Goal::Clicks,
    }
}

fn research() -> BrandResearch {
    BrandResearch {
        brand_name: "Acme".to_string(),
        tagline: Some("Everything, delivered".to_string()),
        description: "Mail-order everything".to_string(),
        features: vec!["anvils".to_string()],
        positioning: "premium".to_string(),
        target_audience: "coyotes".to_string(),
        tone_of_voice: "deadpan".to_string(),
        value_propositions: vec!["reliable".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Shared contract
// ---------------------------------------------------------------------------

/// Behavior every [`CampaignStore`] backend must agree on.
async fn assert_store_contract(store: &dyn CampaignStore) {
    // create
    let first = store.create(&new_campaign(1)).await.unwrap();
    assert_eq!(first.status, CampaignStatus::Pending);
    assert_eq!(first.owner_id, 1);
    assert_eq!(first.tone, "confident");
    assert!(first.error_message.is_none());
    assert!(first.brand_research.is_none());

    // get is idempotent
    let fetched = store.get(first.id).await.unwrap();
    assert_eq!(fetched, Some(first.clone()));
    assert_eq!(store.get(first.id).await.unwrap(), fetched);
    assert!(store.get(first.id + 1000).await.unwrap().is_none());

    // update merges and keeps unset fields
    let researched = store
        .update(
            first.id,
            &CampaignUpdate::status(CampaignStatus::Researching).with_brand_research(research()),
        )
        .await
        .unwrap()
        .unwrap();
    let generating = store
        .update(
            first.id,
            &CampaignUpdate::status(CampaignStatus::GeneratingContent),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(generating.brand_research, Some(research()));
    assert_eq!(generating.tone, "confident");
    assert!(generating.updated_at >= researched.updated_at);
    assert!(store
        .update(first.id + 1000, &CampaignUpdate::status(CampaignStatus::Researching))
        .await
        .unwrap()
        .is_none());

    // error_message present exactly while failed
    let rejected = store
        .update(first.id, &CampaignUpdate::status(CampaignStatus::Failed))
        .await;
    assert!(rejected.is_err());
    assert_eq!(store.get(first.id).await.unwrap(), Some(generating));

    let failed = store
        .update(first.id, &CampaignUpdate::failed("rate limited"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, CampaignStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("rate limited"));

    let restarted = store
        .update(first.id, &CampaignUpdate::status(CampaignStatus::GeneratingContent))
        .await
        .unwrap()
        .unwrap();
    assert!(restarted.error_message.is_none());

    // list order and owner filter
    store.create(&new_campaign(2)).await.unwrap();
    let third = store.create(&new_campaign(1)).await.unwrap();
    let ids: Vec<i64> = store
        .list_by_owner(1)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![third.id, first.id]);

    // delete
    assert!(store.delete(first.id).await.unwrap());
    assert!(!store.delete(first.id).await.unwrap());
    assert!(store.get(first.id).await.unwrap().is_none());
    assert_eq!(store.list_by_owner(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn in_memory_store_meets_contract() {
    assert_store_contract(&InMemoryCampaignStore::new()).await;
}

#[sqlx::test(migrations = "./migrations")]
async fn postgres_store_meets_contract(pool: PgPool) {
    assert_store_contract(&PgCampaignStore::new(pool)).await;
}

// ---------------------------------------------------------------------------
// Postgres specifics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_and_get_round_trip(pool: PgPool) {
    let store = PgCampaignStore::new(pool);
    assert_eq!(store.backend(), StoreBackend::Postgres);

    let created = store.create(&new_campaign(1)).await.unwrap();
    assert_eq!(created.status, CampaignStatus::Pending);
    assert_eq!(created.platforms, vec![Platform::Twitter, Platform::Linkedin]);
    assert_eq!(created.goal, Goal::Clicks);

    let fetched = store.get(created.id).await.unwrap();
    assert_eq!(fetched, Some(created));
}

#[sqlx::test(migrations = "./migrations")]
async fn update_merges_json_payloads(pool: PgPool) {
    let store = PgCampaignStore::new(pool);
    let created = store.create(&new_campaign(1)).await.unwrap();

    store
        .update(
            created.id,
            &CampaignUpdate::status(CampaignStatus::GeneratingContent)
                .with_brand_research(research()),
        )
        .await
        .unwrap();

    let content = GeneratedContent {
        instagram: None,
        linkedin: None,
        twitter: Some(TwitterContent {
            ad_lines: vec!["Drop everything".to_string()],
        }),
    };
    let images = vec![GeneratedImage {
        platform: Platform::Twitter,
        url: "/placeholders/twitter-placeholder.png".to_string(),
        width: 1024,
        height: 512,
    }];
    let completed = store
        .update(
            created.id,
            &CampaignUpdate::status(CampaignStatus::Completed)
                .with_generated_content(content.clone())
                .with_generated_images(images.clone()),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(completed.status, CampaignStatus::Completed);
    assert_eq!(completed.brand_research, Some(research()));
    assert_eq!(completed.generated_content, Some(content));
    assert_eq!(completed.generated_images, Some(images));
    assert_eq!(completed.tone, "confident");
    assert!(completed.updated_at >= created.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_status_carries_message_until_next_status(pool: PgPool) {
    let store = PgCampaignStore::new(pool);
    let created = store.create(&new_campaign(1)).await.unwrap();

    let failed = store
        .update(created.id, &CampaignUpdate::failed("rate limited"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status, CampaignStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("rate limited"));

    let restarted = store
        .update(
            created.id,
            &CampaignUpdate::status(CampaignStatus::GeneratingContent),
        )
        .await
        .unwrap()
        .unwrap();
    assert!(restarted.error_message.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_without_message_violates_constraint(pool: PgPool) {
    let store = PgCampaignStore::new(pool);
    let created = store.create(&new_campaign(1)).await.unwrap();

    let result = store
        .update(created.id, &CampaignUpdate::status(CampaignStatus::Failed))
        .await;
    assert_matches!(result, Err(adflow_db::StoreError::Database(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn update_and_delete_missing_rows(pool: PgPool) {
    let store = PgCampaignStore::new(pool);

    let updated = store
        .update(999, &CampaignUpdate::status(CampaignStatus::Researching))
        .await
        .unwrap();
    assert!(updated.is_none());
    assert!(!store.delete(999).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn list_by_owner_newest_first(pool: PgPool) {
    let store = PgCampaignStore::new(pool);
    let first = store.create(&new_campaign(1)).await.unwrap();
    store.create(&new_campaign(2)).await.unwrap();
    let third = store.create(&new_campaign(1)).await.unwrap();

    let ids: Vec<i64> = store
        .list_by_owner(1)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![third.id, first.id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_stale_returns_only_non_terminal(pool: PgPool) {
    let store = PgCampaignStore::new(pool);
    let running = store.create(&new_campaign(1)).await.unwrap();
    let done = store.create(&new_campaign(1)).await.unwrap();
    store
        .update(done.id, &CampaignUpdate::status(CampaignStatus::Completed))
        .await
        .unwrap();

    let stale = store
        .list_stale(Utc::now() + Duration::minutes(1))
        .await
        .unwrap();
    let ids: Vec<i64> = stale.into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![running.id]);

    store.health_check().await.unwrap();
}
