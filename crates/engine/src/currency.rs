use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code used by a group and its money values.
///
/// ## Minor units
///
/// The engine stores monetary values as an `i64` number of **minor units** (see `Money`).
/// `minor_units()` returns how many decimal digits are used when converting between:
/// - major units (human input/output, e.g. `10.50 EUR`)
/// - minor units (stored integers, e.g. `1050`)
///
/// Every supported currency uses cents, so the conversion is always a
/// division by 100.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Eur,
        Currency::Usd,
        Currency::Gbp,
        Currency::Chf,
        Currency::Cad,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Cad => "CAD",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        2
    }

    /// Display symbol for the currency in the given locale.
    #[must_use]
    pub const fn symbol(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (_, Currency::Eur) => "€",
            (_, Currency::Chf) => "CHF",
            (Locale::FrFr, Currency::Usd) => "$US",
            (Locale::FrFr, Currency::Gbp) => "£GB",
            (Locale::FrFr, Currency::Cad) => "$CA",
            (Locale::EnUs, Currency::Usd) => "$",
            (Locale::EnUs, Currency::Gbp) => "£",
            (Locale::EnUs, Currency::Cad) => "CA$",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "CHF" => Ok(Currency::Chf),
            "CAD" => Ok(Currency::Cad),
            other => Err(EngineError::InvalidCurrency(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// Locale used to render amounts for humans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Locale::FrFr => "fr-FR",
            Locale::EnUs => "en-US",
        }
    }

    pub(crate) const fn decimal_separator(self) -> char {
        match self {
            Locale::FrFr => ',',
            Locale::EnUs => '.',
        }
    }

    pub(crate) const fn group_separator(self) -> char {
        match self {
            Locale::FrFr => '\u{202F}',
            Locale::EnUs => ',',
        }
    }
}

impl core::fmt::Display for Locale {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

impl TryFrom<&str> for Locale {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "fr" | "fr-fr" => Ok(Locale::FrFr),
            "en" | "en-us" => Ok(Locale::EnUs),
            other => Err(EngineError::InvalidCurrency(format!(
                "unsupported locale: {other}"
            ))),
        }
    }
}
