//! Field-level validation shared by record and filter checks.

use crate::error::AppError;
use std::collections::BTreeMap;

/// Field name -> message. Ordered so error bodies are stable.
pub type ValidationErrors = BTreeMap<String, String>;

/// Accumulates named failures. Only the first message per field is kept.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Records `message` under `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// `Ok(())` when no failures were recorded, otherwise the full map as [`AppError::Validation`].
    pub fn into_result(self) -> Result<(), AppError> {
        if self.valid() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

pub fn permitted_value<T: PartialEq + ?Sized>(value: &T, list: &[&T]) -> bool {
    list.iter().any(|v| *v == value)
}
