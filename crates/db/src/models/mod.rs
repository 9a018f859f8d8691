//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - The stored entity struct plus its `FromRow` row mapping
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches

pub mod campaign;
