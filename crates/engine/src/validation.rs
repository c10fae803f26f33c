//! Schemas for user-submitted forms.
//!
//! A schema turns a raw form into a typed value or a list of per-field
//! errors. Messages are the French strings shown by the front-end.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const EMAIL_REQUIRED: &str = "Adresse email requise";
pub const EMAIL_INVALID: &str = "Adresse email invalide";

const EMAIL_MAX_LEN: usize = 254;
const LOCAL_MAX_LEN: usize = 64;
const LABEL_MAX_LEN: usize = 63;
const LOCAL_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";

/// One failed constraint on one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All the constraints a form failed, in field order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub(crate) fn single(field: &str, message: &str) -> Self {
        Self {
            errors: vec![FieldError {
                field: field.to_string(),
                message: message.to_string(),
            }],
        }
    }

    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }

    /// Message for `field`, if that field failed.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(&error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// A syntactically valid email address, kept exactly as submitted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validates `value` as the content of form field `field`.
    pub fn parse_field(field: &str, value: &str) -> Result<Self, ValidationErrors> {
        if value.is_empty() {
            return Err(ValidationErrors::single(field, EMAIL_REQUIRED));
        }
        if !is_valid_email(value) {
            return Err(ValidationErrors::single(field, EMAIL_INVALID));
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used as the lookup key for accounts.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of a login submission.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
}

/// A login form that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Login {
    pub email: Email,
}

impl LoginForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Applies the login schema: `email` is required and must be an address.
    pub fn parse(&self) -> Result<Login, ValidationErrors> {
        let email = Email::parse_field("email", &self.email)?;
        Ok(Login { email })
    }
}

fn is_valid_email(value: &str) -> bool {
    if value.len() > EMAIL_MAX_LEN || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }
    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= LOCAL_MAX_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_SPECIALS.contains(c))
}

fn is_valid_domain(domain: &str) -> bool {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= LABEL_MAX_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    labels_ok
        && labels
            .last()
            .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_email_is_required() {
        let err = LoginForm::new("").parse().unwrap_err();
        assert_eq!(err.first_message(), Some("Adresse email requise"));
        assert_eq!(err.field("email"), Some(EMAIL_REQUIRED));
    }

    #[test]
    fn malformed_email_is_invalid() {
        let err = LoginForm::new("not-an-email").parse().unwrap_err();
        assert_eq!(err.first_message(), Some("Adresse email invalide"));
    }

    #[test]
    fn valid_email_is_returned_unchanged() {
        let login = LoginForm::new("Marie.Curie+test@Example.fr").parse().unwrap();
        assert_eq!(login.email.as_str(), "Marie.Curie+test@Example.fr");
        assert_eq!(login.email.normalized(), "marie.curie+test@example.fr");
    }

    #[test]
    fn rejects_common_mistakes() {
        for candidate in [
            "a@b",
            "@example.com",
            "user@",
            "user@@example.com",
            "us er@example.com",
            " user@example.com",
            "user.@example.com",
            "us..er@example.com",
            "user@-example.com",
            "user@example.c",
            "user@example..com",
            "user@exa_mple.com",
        ] {
            let err = LoginForm::new(candidate).parse().unwrap_err();
            assert_eq!(err.first_message(), Some(EMAIL_INVALID), "{candidate}");
        }
    }

    #[test]
    fn accepts_subdomains_and_specials() {
        for candidate in ["user@mail.example.com", "o'neil@example.ie", "x_y-z@a-b.io"] {
            assert!(LoginForm::new(candidate).parse().is_ok(), "{candidate}");
        }
    }

    #[test]
    fn display_joins_messages() {
        let errors = ValidationErrors {
            errors: vec![
                FieldError {
                    field: "email".to_string(),
                    message: EMAIL_REQUIRED.to_string(),
                },
                FieldError {
                    field: "name".to_string(),
                    message: "Nom requis".to_string(),
                },
            ],
        };
        assert_eq!(errors.to_string(), "Adresse email requise; Nom requis");
    }
}
