//! Campaign generation pipeline.
//!
//! - [`stages`] -- the collaborator traits each pipeline stage calls.
//! - [`orchestrator::CampaignOrchestrator`] -- drives one campaign run
//!   through research, generation, critique, refinement and images,
//!   persisting status before every stage.
//! - [`dispatch::CampaignDispatcher`] -- starts detached, supervised runs.
//! - [`clients`] -- concrete HTTP-backed collaborators.

pub mod clients;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod stages;

pub use config::{ClientsConfig, PipelineConfig};
pub use dispatch::CampaignDispatcher;
pub use error::StageError;
pub use orchestrator::CampaignOrchestrator;
pub use stages::Collaborators;
