use std::{fmt, str::FromStr};

use crate::{Currency, EngineError, Locale, ResultEngine};

/// Signed money amount represented as **integer minor units** (cents).
///
/// Use this type for monetary values shown to users (balances, expense
/// amounts, shares) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = the group owes this member / amount paid
/// - negative = this member owes the group
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Locale, Money};
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(amount.format(Currency::Usd, Locale::EnUs), "$12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount a single expense may carry (10 billion major units).
    pub const MAX_AMOUNT: Money = Money(1_000_000_000_000);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Renders the amount for humans.
    ///
    /// The major part is `minor / 100`; the fraction always has two digits.
    ///
    /// - `fr-FR`: `1 234,50 €` (narrow no-break space for grouping, no-break
    ///   space before the symbol)
    /// - `en-US`: `$1,234.50`, or `CHF 1,234.50` for alphabetic symbols
    #[must_use]
    pub fn format(self, currency: Currency, locale: Locale) -> String {
        let abs = self.0.unsigned_abs();
        let divisor = 10u64.pow(u32::from(currency.minor_units()));
        let major = group_digits(abs / divisor, locale.group_separator());
        let fraction = abs % divisor;
        let number = format!("{major}{}{fraction:02}", locale.decimal_separator());
        let sign = if self.0 < 0 { "-" } else { "" };
        let symbol = currency.symbol(locale);

        match locale {
            Locale::FrFr => format!("{sign}{number}\u{a0}{symbol}"),
            Locale::EnUs if symbol.chars().all(|c| c.is_ascii_alphabetic()) => {
                format!("{sign}{symbol}\u{a0}{number}")
            }
            Locale::EnUs => format!("{sign}{symbol}{number}"),
        }
    }
}

/// Rejects expense amounts that are not positive or exceed [`Money::MAX_AMOUNT`].
pub(crate) fn ensure_expense_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be > 0".to_string(),
        ));
    }
    if amount_minor > Money::MAX_AMOUNT.0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount_minor must be at most {}",
            Money::MAX_AMOUNT.0
        )));
    }
    Ok(())
}

/// Formats an amount of minor units for the given ISO currency code.
///
/// Fails with [`EngineError::InvalidCurrency`] when the code is not supported.
pub fn format_currency(amount_minor: i64, currency_code: &str, locale: Locale) -> ResultEngine<String> {
    let currency = Currency::try_from(currency_code)?;
    Ok(Money::new(amount_minor).format(currency, locale))
}

fn group_digits(value: u64, separator: char) -> String {
    let digits = value.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len_utf8());
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let fraction_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let major: i64 = major_str.parse().map_err(|_| overflow())?;

        let fraction: i64 = match fraction_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
                }
            }
        };

        let total = major
            .checked_mul(100)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn normalize_spaces(value: &str) -> String {
        value.replace(['\u{a0}', '\u{202f}'], " ")
    }

    #[test]
    fn display_is_plain_decimal() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(10).to_string(), "0.10");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn formats_euros_in_french() {
        let formatted = format_currency(1050, "EUR", Locale::FrFr).unwrap();
        assert_eq!(formatted, "10,50\u{a0}€");
        assert_eq!(normalize_spaces(&formatted), "10,50 €");
    }

    #[test]
    fn french_groups_thousands_with_narrow_space() {
        assert_eq!(
            Money::new(123_456_789).format(Currency::Eur, Locale::FrFr),
            "1\u{202f}234\u{202f}567,89\u{a0}€"
        );
        assert_eq!(
            Money::new(-1050).format(Currency::Usd, Locale::FrFr),
            "-10,50\u{a0}$US"
        );
        assert_eq!(Money::new(5).format(Currency::Gbp, Locale::FrFr), "0,05\u{a0}£GB");
    }

    #[test]
    fn formats_us_english() {
        assert_eq!(Money::new(123_450).format(Currency::Usd, Locale::EnUs), "$1,234.50");
        assert_eq!(Money::new(-1050).format(Currency::Eur, Locale::EnUs), "-€10.50");
        assert_eq!(Money::new(1050).format(Currency::Chf, Locale::EnUs), "CHF\u{a0}10.50");
        assert_eq!(Money::new(1050).format(Currency::Cad, Locale::EnUs), "CA$10.50");
    }

    #[test]
    fn unknown_currency_code_fails() {
        let err = format_currency(1050, "ZZZ", Locale::FrFr).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCurrency(_)));
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().minor(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("0.001".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn expense_amounts_are_bounded() {
        assert!(ensure_expense_amount(1).is_ok());
        assert!(ensure_expense_amount(Money::MAX_AMOUNT.minor()).is_ok());
        assert_eq!(
            ensure_expense_amount(0).unwrap_err(),
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
        assert!(matches!(
            ensure_expense_amount(Money::MAX_AMOUNT.minor() + 1),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        assert_eq!(Money::new(2).checked_add(Money::new(3)), Some(Money::new(5)));
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
    }

    proptest! {
        #[test]
        fn formatted_string_contains_divided_major_units(
            cents in 0i64..1_000_000_000_000,
            currency in prop::sample::select(Currency::ALL.to_vec()),
        ) {
            for locale in [Locale::FrFr, Locale::EnUs] {
                let formatted = format_currency(cents, currency.code(), locale).unwrap();
                let ungrouped = formatted.replace(locale.group_separator(), "");
                let expected = format!(
                    "{}{}{:02}",
                    cents / 100,
                    locale.decimal_separator(),
                    cents % 100
                );
                prop_assert!(ungrouped.contains(&expected), "{formatted} lacks {expected}");
                prop_assert!(formatted.contains(currency.symbol(locale)));
            }
        }
    }
}
