//! The error accumulator.
//!
//! A [`MultiError`] is a view over a shared, append-only buffer of
//! [`FieldError`]s. Views carry their own field prefix and current priority;
//! [`MultiError::with_prefix`] and [`MultiError::with_index`] hand out child
//! views that write into the same buffer without copying it.

use crate::error::{ErrorCode, FieldError, Problem, ALL_FIELDS};
use crate::stage::Priority;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only, field-scoped collection of validation errors.
///
/// Cloning a `MultiError` yields another view of the same buffer.
///
/// ## Example
///
/// ```rust
/// use rulegate_core::{ErrorCode, MultiError};
///
/// let errors = MultiError::new();
/// let mut sku = errors
///     .with_prefix("order")
///     .with_index("items", 2)
///     .with_prefix("product");
/// sku.add("sku", ErrorCode::Required, "SKU is required");
///
/// assert_eq!(errors.fields(), vec!["order.items[2].product.sku"]);
/// ```
#[derive(Clone, Default)]
pub struct MultiError {
    errors: Arc<Mutex<Vec<FieldError>>>,
    prefix: String,
    priority: Priority,
}

impl MultiError {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator holding the given errors, fields taken verbatim.
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            errors: Arc::new(Mutex::new(errors)),
            ..Self::default()
        }
    }

    /// Record a new error under this view's prefix and current priority.
    pub fn add(&mut self, field: &str, code: ErrorCode, message: impl Into<String>) {
        let error = FieldError::new(self.qualify(field), code, message).with_priority(self.priority);
        self.lock().push(error);
    }

    /// Adopt an already-formed error, applying this view's prefix to its field.
    ///
    /// The error keeps its own priority.
    pub fn add_error(&mut self, mut error: FieldError) {
        error.field = self.qualify(&error.field);
        self.lock().push(error);
    }

    /// Child view whose prefix has `name` appended as a dotted segment.
    pub fn with_prefix(&self, name: &str) -> MultiError {
        MultiError {
            errors: Arc::clone(&self.errors),
            prefix: join(&self.prefix, name),
            priority: self.priority,
        }
    }

    /// Child view whose prefix has `name[index]` appended.
    pub fn with_index(&self, name: &str, index: usize) -> MultiError {
        let segment = format!("{name}[{index}]");
        MultiError {
            errors: Arc::clone(&self.errors),
            prefix: join(&self.prefix, &segment),
            priority: self.priority,
        }
    }

    /// Stamp subsequent [`add`](Self::add) calls on this view with `priority`.
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Priority that the next [`add`](Self::add) will use.
    pub fn current_priority(&self) -> Priority {
        self.priority
    }

    /// Prefix applied to fields added through this view.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether the shared buffer holds any error.
    pub fn has_errors(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Number of errors in the shared buffer.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    /// Snapshot of all errors in insertion order.
    pub fn errors(&self) -> Vec<FieldError> {
        self.lock().clone()
    }

    /// Snapshot of all errors sorted stably by priority, `High` first.
    pub fn sorted_by_priority(&self) -> Vec<FieldError> {
        let mut errors = self.errors();
        errors.sort_by_key(|e| e.priority);
        errors
    }

    /// Field paths of all errors in insertion order.
    pub fn fields(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.field.clone()).collect()
    }

    /// Whether some error was recorded on exactly `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.lock().iter().any(|e| e.field == field)
    }

    /// Adopt every error of `other` through this view's prefix.
    ///
    /// Merging a view into another view of the same buffer is a no-op.
    pub fn merge(&mut self, other: &MultiError) {
        self.merge_up_to(other, usize::MAX);
    }

    /// Adopt errors of `other` while the shared buffer holds fewer than `cap`
    /// errors. Returns the number of errors adopted.
    pub fn merge_up_to(&mut self, other: &MultiError, cap: usize) -> usize {
        if Arc::ptr_eq(&self.errors, &other.errors) {
            return 0;
        }
        let incoming = other.errors();
        let mut errors = self.lock();
        let room = cap.saturating_sub(errors.len());
        let adopted = incoming.len().min(room);
        errors.extend(incoming.into_iter().take(adopted).map(|mut e| {
            e.field = join_field(&self.prefix, &e.field);
            e
        }));
        adopted
    }

    /// `Ok(())` when empty, the accumulator otherwise.
    pub fn into_result(self) -> Result<(), MultiError> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }

    /// `None` when empty, the accumulator otherwise.
    pub fn into_option(self) -> Option<MultiError> {
        self.into_result().err()
    }

    /// Convert to the API problem object.
    pub fn to_problem(&self) -> Problem {
        Problem::validation(self.errors())
    }

    fn qualify(&self, field: &str) -> String {
        join_field(&self.prefix, field)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FieldError>> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Append a prefix segment; empty segments collapse.
fn join(prefix: &str, segment: &str) -> String {
    if segment.is_empty() {
        prefix.to_string()
    } else if prefix.is_empty() {
        segment.to_string()
    } else if segment.starts_with('[') {
        format!("{prefix}{segment}")
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Final field of an error recorded under `prefix`.
fn join_field(prefix: &str, field: &str) -> String {
    if field.is_empty() || field == ALL_FIELDS {
        if prefix.is_empty() {
            ALL_FIELDS.to_string()
        } else {
            prefix.to_string()
        }
    } else {
        join(prefix, field)
    }
}

impl FromIterator<FieldError> for MultiError {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self::from_errors(iter.into_iter().collect())
    }
}

impl PartialEq for MultiError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.errors, &other.errors) || self.errors() == other.errors()
    }
}

impl Serialize for MultiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.errors().serialize(serializer)
    }
}

impl fmt::Debug for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiError")
            .field("prefix", &self.prefix)
            .field("priority", &self.priority)
            .field("errors", &*self.lock())
            .finish()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.lock();
        write!(f, "Validation failed: {} error(s)", errors.len())?;
        for error in errors.iter() {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}
