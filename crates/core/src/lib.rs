//! Domain types and pure logic for the AdFlow campaign service.
//!
//! - [`campaign`] -- platforms, goals, the campaign status state machine and
//!   the result payload value types.
//! - [`critique`] -- final critique summary, quality scoring and the
//!   degraded-critique fallback.
//! - [`error`] -- the shared [`CoreError`](error::CoreError) enum.

pub mod campaign;
pub mod critique;
pub mod error;
pub mod types;
