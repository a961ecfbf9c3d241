//! Field-level validation for user input.
//!
//! Validation problems are collected per field in a [`ValidationErrors`] map, so that callers can report every
//! problem with a request in one response rather than failing on the first one.
use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// The largest quantity of a single product that a cart line, order line or listing may hold.
pub const MAX_QUANTITY: i64 = 1_000_000;
pub const MAX_QUANTITY_MESSAGE: &str = "Ensure this value is less than or equal to 1000000.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a set of errors with a single problem on a single field.
    pub fn single<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Adds a "This field may not be blank." error if `value` is empty or only whitespace.
    pub fn require_non_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field may not be blank.");
        }
    }

    /// Converts the collection into a `Result`, which is `Ok` if no errors were recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<String>>()
            .join("; ");
        write!(f, "{msg}")
    }
}

impl std::error::Error for ValidationErrors {}

/// A deliberately loose check: a non-empty local part, an `@`, and a domain containing a dot with non-empty labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels = domain.split('.').collect::<Vec<&str>>();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

/// Usernames are 3 to 150 characters of letters, digits and `@.+-_`.
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len)
        && username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
}

/// Returns the list of reasons the password is unacceptable. An empty list means the password is fine.
pub fn password_problems(password: &str) -> Vec<String> {
    let mut problems = vec![];
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    problems
}
