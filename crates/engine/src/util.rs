//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, ValidationErrors};

pub(crate) const NAME_MAX_CHARS: usize = 80;
pub(crate) const DESCRIPTION_MAX_CHARS: usize = 200;

/// Parse a UUID from storage or a request and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidCurrency(format!("invalid currency: {value}")))
}

/// Ensure an amount is expressed in the group currency.
pub(crate) fn ensure_group_currency(group_currency: Currency, actual: Currency) -> ResultEngine<()> {
    if group_currency != actual {
        return Err(EngineError::CurrencyMismatch(format!(
            "group currency is {}, got {}",
            group_currency.code(),
            actual.code()
        )));
    }
    Ok(())
}

fn invalid_field(field: &str, message: String) -> EngineError {
    EngineError::Validation(ValidationErrors::single(field, &message))
}

/// Trim, NFC-normalize and bound a required name.
///
/// Failures are reported on the `name` field.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(invalid_field("name", format!("{label} name must not be empty")));
    }
    if normalized.chars().count() > NAME_MAX_CHARS {
        return Err(invalid_field(
            "name",
            format!("{label} name must be at most {NAME_MAX_CHARS} characters"),
        ));
    }
    Ok(normalized)
}

/// Trim and NFC-normalize optional free text; blank becomes `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.nfc().collect())
}

/// Trim, NFC-normalize and bound an expense description.
pub(crate) fn normalize_description(value: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(invalid_field(
            "description",
            "description must not be empty".to_string(),
        ));
    }
    if normalized.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(invalid_field(
            "description",
            format!("description must be at most {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_composed() {
        // "e" + combining acute accent composes to a single "é".
        let name = normalize_required_name("  Vacances d'e\u{301}te\u{301} ", "group").unwrap();
        assert_eq!(name, "Vacances d'été");
    }

    #[test]
    fn blank_name_is_rejected() {
        let EngineError::Validation(errors) = normalize_required_name("   ", "group").unwrap_err()
        else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.field("name"), Some("group name must not be empty"));
    }

    #[test]
    fn blank_or_overlong_description_is_a_field_error() {
        let EngineError::Validation(errors) = normalize_description(" ").unwrap_err() else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.field("description"), Some("description must not be empty"));

        let long = "x".repeat(DESCRIPTION_MAX_CHARS + 1);
        assert!(matches!(
            normalize_description(&long),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(normalize_description(" Pizza ").unwrap(), "Pizza");
    }

    #[test]
    fn overlong_name_is_rejected() {
        let long = "x".repeat(NAME_MAX_CHARS + 1);
        assert!(normalize_required_name(&long, "group").is_err());
    }

    #[test]
    fn optional_text_drops_blanks() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(Some(" Marie ")), Some("Marie".to_string()));
        assert_eq!(normalize_optional_text(None), None);
    }

    #[test]
    fn currency_mismatch_is_reported() {
        assert!(ensure_group_currency(Currency::Eur, Currency::Eur).is_ok());
        assert_eq!(
            ensure_group_currency(Currency::Eur, Currency::Usd).unwrap_err(),
            EngineError::CurrencyMismatch("group currency is EUR, got USD".to_string())
        );
    }
}
