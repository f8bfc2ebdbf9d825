//! Rule-based form validation engine.
//!
//! Each form shape declares a [`FormRules`] value: an ordered mapping from
//! field name to an ordered list of [`FieldRule`]s. [`validate_flow`] walks
//! the rules against a submitted payload and reports the first failing rule
//! per field as a [`FieldError`]. Conditions may be synchronous closures or
//! async futures (e.g. a database existence check) -- the engine awaits each
//! one sequentially and performs no I/O of its own.

pub mod flow;
pub mod rules;

pub use flow::validate_flow;
pub use rules::{Condition, FieldError, FieldRule, FormRules};
