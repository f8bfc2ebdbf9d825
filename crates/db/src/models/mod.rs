//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod affiliate;
pub mod carbon_registration;
pub mod certificate;
pub mod consultation;
pub mod donation;
pub mod news;
pub mod order;
pub mod product;
pub mod project;
pub mod role;
pub mod session;
pub mod user;
