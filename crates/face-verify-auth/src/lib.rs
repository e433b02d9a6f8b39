#![warn(missing_docs)]
//! # face-verify-auth
//!
//! ## Purpose
//! Implements the signup/login form gate that precedes the verification page.
//!
//! ## Responsibilities
//! - Identify which form was submitted from its class name.
//! - Read field values in fixed positional order and apply the presence check.
//! - Dispatch the outcome (navigation or blocking notice) through an
//!   injectable [`PageNavigator`].
//!
//! ## Data flow
//! Form submission -> [`FormGate::submit`] -> [`evaluate_form`] ->
//! [`GateOutcome`] -> [`PageNavigator`].
//!
//! ## Error model
//! The gate itself has no failure modes beyond the presence check, which is a
//! normal [`GateOutcome::Alert`]. Unknown form classes return [`GateError`].
//!
//! ## Security and privacy notes
//! This is client-side gating only, not authentication. Field values are never
//! logged; only their lengths are recorded.

use thiserror::Error;
use tracing::{info, warn};

/// Default page reached after a successful gate.
pub const DEFAULT_NEXT_PAGE: &str = "upload.html";

/// Blocking notice shown when any field is empty.
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields.";

/// Forms guarded by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// Signup form: username, email, password.
    Signup,
    /// Login form: email, password.
    Login,
}

impl FormKind {
    /// Resolves a form from its markup class name.
    ///
    /// # Errors
    /// Returns [`GateError::UnknownForm`] for classes other than
    /// `signup-form` and `login-form`.
    pub fn from_class(class_name: &str) -> Result<Self, GateError> {
        match class_name {
            "signup-form" => Ok(Self::Signup),
            "login-form" => Ok(Self::Login),
            other => Err(GateError::UnknownForm(other.to_string())),
        }
    }

    /// Markup class name of the form.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Signup => "signup-form",
            Self::Login => "login-form",
        }
    }

    /// Field names in positional order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Signup => &["username", "email", "password"],
            Self::Login => &["email", "password"],
        }
    }
}

/// Result of evaluating one form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// All fields present; navigate to the given location.
    Navigate(String),
    /// At least one field empty; show the given blocking notice.
    Alert(String),
}

/// Evaluates the presence predicate for a submitted form.
///
/// Values are read positionally; positions beyond `values.len()` count as
/// empty. Whitespace-only values count as present.
pub fn evaluate_form(kind: FormKind, values: &[&str], next_page: &str) -> GateOutcome {
    let all_present = (0..kind.field_names().len())
        .all(|index| values.get(index).is_some_and(|value| !value.is_empty()));

    if all_present {
        GateOutcome::Navigate(next_page.to_string())
    } else {
        GateOutcome::Alert(MISSING_FIELDS_MESSAGE.to_string())
    }
}

/// Page-side effects the gate can trigger.
pub trait PageNavigator {
    /// Navigates to `location`.
    fn navigate(&self, location: &str);

    /// Shows a blocking notice.
    fn alert(&self, message: &str);
}

/// Form gate bound to a fixed next-page location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormGate {
    next_page: String,
}

impl FormGate {
    /// Creates a gate that navigates to `next_page` on success.
    pub fn new(next_page: impl Into<String>) -> Self {
        Self {
            next_page: next_page.into(),
        }
    }

    /// Returns the configured next-page location.
    pub fn next_page(&self) -> &str {
        &self.next_page
    }

    /// Handles one form submission and dispatches its outcome.
    pub fn submit(
        &self,
        kind: FormKind,
        values: &[&str],
        navigator: &dyn PageNavigator,
    ) -> GateOutcome {
        let field_lengths: Vec<usize> = values.iter().map(|value| value.len()).collect();
        let outcome = evaluate_form(kind, values, &self.next_page);

        match &outcome {
            GateOutcome::Navigate(location) => {
                info!(
                    form = kind.class_name(),
                    ?field_lengths,
                    location = location.as_str(),
                    "form gate passed"
                );
                navigator.navigate(location);
            }
            GateOutcome::Alert(message) => {
                warn!(form = kind.class_name(), ?field_lengths, "form gate blocked");
                navigator.alert(message);
            }
        }

        outcome
    }
}

impl Default for FormGate {
    fn default() -> Self {
        Self::new(DEFAULT_NEXT_PAGE)
    }
}

/// Errors produced by form gate lookups.
#[derive(Debug, Error)]
pub enum GateError {
    /// Submitted form class is not guarded.
    #[error("unknown form class: {0}")]
    UnknownForm(String),
}
