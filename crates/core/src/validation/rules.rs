//! Form rule and field error types.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoreError;

/// Future returned by a rule condition, borrowing the candidate payload.
pub type ConditionFuture<'a> = BoxFuture<'a, Result<bool, CoreError>>;

/// A rule condition: a predicate over the whole candidate payload.
///
/// Returns `true` when the rule FAILS (the error should be reported).
/// Conditions may perform I/O (a database lookup, say); any `Err` they
/// return aborts the whole validation run.
pub type Condition<T> = Arc<dyn for<'a> Fn(&'a T) -> ConditionFuture<'a> + Send + Sync>;

/// One validation check for one field: an optional condition plus the error
/// message to report when it fails.
///
/// A rule built without a condition ([`FieldRule::always`]) unconditionally
/// reports its error. Callers must be aware of this when assembling rules.
pub struct FieldRule<T> {
    condition: Option<Condition<T>>,
    error: String,
}

impl<T> FieldRule<T> {
    /// Rule with a synchronous condition. The closure returns `true` when
    /// the rule fails.
    pub fn when<F>(condition: F, error: impl Into<String>) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let condition: Condition<T> = Arc::new(move |data| {
            let failed = condition(data);
            async move { Ok(failed) }.boxed()
        });
        Self {
            condition: Some(condition),
            error: error.into(),
        }
    }

    /// Rule with an asynchronous condition (e.g. a repository lookup).
    ///
    /// The closure is handed a reference to the payload and returns an owned
    /// future; clone whatever the future needs out of the payload before the
    /// `async move` block.
    pub fn when_async<F, Fut>(condition: F, error: impl Into<String>) -> Self
    where
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, CoreError>> + Send + 'static,
    {
        let condition: Condition<T> = Arc::new(move |data| condition(data).boxed());
        Self {
            condition: Some(condition),
            error: error.into(),
        }
    }

    /// Rule with no condition: always fails, always reports `error`.
    pub fn always(error: impl Into<String>) -> Self {
        Self {
            condition: None,
            error: error.into(),
        }
    }

    pub(crate) fn condition(&self) -> Option<&Condition<T>> {
        self.condition.as_ref()
    }

    pub(crate) fn error(&self) -> &str {
        &self.error
    }
}

impl<T> fmt::Debug for FieldRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("has_condition", &self.condition.is_some())
            .field("error", &self.error)
            .finish()
    }
}

/// The complete rule set for one form shape, keyed by field name.
///
/// Field order is insertion order (IndexMap) and determines the order of
/// reported errors.
pub struct FormRules<T> {
    fields: IndexMap<String, Vec<FieldRule<T>>>,
}

impl<T> FormRules<T> {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    /// Append a field with its ordered rule list. Re-declaring a field
    /// replaces its rules but keeps its original position.
    pub fn field(mut self, name: impl Into<String>, rules: Vec<FieldRule<T>>) -> Self {
        self.fields.insert(name.into(), rules);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldRule<T>])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl<T> Default for FormRules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FormRules<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

/// A reported validation failure: which field, what message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
