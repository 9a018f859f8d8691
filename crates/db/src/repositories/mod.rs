//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Store backends wrap them
//! behind the [`crate::store::CampaignStore`] trait.

pub mod campaign_repo;

pub use campaign_repo::{CampaignRepo, PgCampaignStore};
