//! HTTP handlers, one module per resource.

pub mod affiliates;
pub mod auth;
pub mod carbon;
pub mod certificates;
pub mod consultations;
pub mod donations;
pub mod news;
pub mod orders;
pub mod products;
pub mod projects;
