//! Domain logic for the Verdex carbon-credit marketplace.
//!
//! Pure logic only -- no database or network access. Repositories and HTTP
//! handlers live in `verdex-db` and `verdex-api` respectively.

pub mod certificates;
pub mod email;
pub mod error;
pub mod referral;
pub mod roles;
pub mod types;
pub mod validation;
