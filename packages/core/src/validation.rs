//! Field-level validation for typed attribute structs.
//!
//! A type opts in by implementing [`Validate`], usually by chaining checks
//! on a [`Checks`] builder:
//!
//! ```rust,ignore
//! impl Validate for User {
//!     fn validate(&self) -> Result<(), Vec<FieldError>> {
//!         Checks::new()
//!             .required("name", &self.name)
//!             .max_len("name", &self.name, 64)
//!             .one_of("role", &self.role, &["admin", "member"])
//!             .finish()
//!     }
//! }
//! ```
//!
//! [`ResourceObject::unmarshal`](crate::ResourceObject::unmarshal) turns each
//! reported [`FieldError`] into a 422 error object pointing at the field.

use crate::error::{Error, ErrorList, ErrorObject};

/// One failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<FieldError> for ErrorObject {
    fn from(e: FieldError) -> Self {
        ErrorObject::input(&e.field, e.message)
    }
}

/// Implemented by attribute types that carry field constraints.
pub trait Validate {
    /// Return every failed check, or `Ok(())` when all pass.
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Collects field failures. Checks never short-circuit, so a client sees
/// every violation at once.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, field: &str, value: &str) -> Self {
        self.custom(field, !value.trim().is_empty(), "must not be empty")
    }

    pub fn min_len(self, field: &str, value: &str, min: usize) -> Self {
        let ok = value.chars().count() >= min;
        self.custom(field, ok, format!("must be at least {min} characters"))
    }

    pub fn max_len(self, field: &str, value: &str, max: usize) -> Self {
        let ok = value.chars().count() <= max;
        self.custom(field, ok, format!("must be at most {max} characters"))
    }

    pub fn one_of(self, field: &str, value: &str, allowed: &[&str]) -> Self {
        let ok = allowed.contains(&value);
        self.custom(field, ok, format!("must be one of: {}", allowed.join(", ")))
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn custom(mut self, field: &str, ok: bool, message: impl Into<String>) -> Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Convert reported field failures into the crate error type: a lone
/// failure stays standalone, several become an [`ErrorList`].
pub(crate) fn into_error(mut failures: Vec<FieldError>) -> Error {
    if failures.len() == 1 {
        if let Some(only) = failures.pop() {
            return Error::Single(only.into());
        }
    }
    Error::Multiple(failures.into_iter().map(ErrorObject::from).collect::<ErrorList>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failure() {
        let result = Checks::new()
            .required("name", "  ")
            .max_len("bio", "abcdef", 3)
            .one_of("role", "root", &["admin", "member"])
            .min_len("handle", "ab", 2)
            .finish();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "bio");
        assert_eq!(errors[2].field, "role");
    }

    #[test]
    fn single_failure_stays_standalone() {
        let err = into_error(vec![FieldError::new("Name", "must not be empty")]);
        match err {
            Error::Single(e) => {
                assert_eq!(e.status, 422);
                assert_eq!(e.source_pointer.as_deref(), Some("/data/attributes/name"));
            }
            other => panic!("expected a single error, got {other:?}"),
        }
    }

    #[test]
    fn several_failures_become_a_list() {
        let err = into_error(vec![
            FieldError::new("a", "bad"),
            FieldError::new("b", "bad"),
        ]);
        assert!(matches!(err, Error::Multiple(ref l) if l.len() == 2));
        assert!(err.validate().is_ok());
    }
}
