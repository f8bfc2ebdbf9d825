//! Request middleware: authentication extractor and RBAC wrappers.

pub mod auth;
pub mod rbac;
