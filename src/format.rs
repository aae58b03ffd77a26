//! Locale formatting for amounts and dates.
//!
//! The model builder is the only caller. Header, item table and signature
//! block all print the strings it produces, so the three never drift apart.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatLocale {
    /// Glyph printed before every amount.
    pub currency_symbol: String,
    pub thousands_separator: String,
    pub decimal_separator: String,
    /// chrono pattern for long-form dates.
    pub date_format: String,
}

impl Default for FormatLocale {
    /// Philippine English: `₱1,234.50`, `March 15, 2025`.
    fn default() -> Self {
        Self {
            currency_symbol: "\u{20B1}".to_string(),
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
            date_format: "%B %-d, %Y".to_string(),
        }
    }
}

impl FormatLocale {
    /// Symbol, grouped integer part, exactly two fraction digits.
    pub fn format_currency(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let formatted = format!("{:.2}", rounded.abs());
        let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

        let grouped = self.group_thousands(integer);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!(
            "{}{}{}{}{}",
            sign, self.currency_symbol, grouped, self.decimal_separator, fraction
        )
    }

    /// Long-form date. A pattern chrono cannot render falls back to ISO 8601.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.date_format)).is_err() {
            log::warn!("date pattern {:?} failed to render; using ISO 8601", self.date_format);
            return date.format("%Y-%m-%d").to_string();
        }
        out
    }

    /// Whether chrono can parse every specifier in the date pattern.
    pub fn date_format_is_valid(&self) -> bool {
        !StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error))
    }

    fn group_thousands(&self, digits: &str) -> String {
        let mut result = String::new();
        let chars: Vec<char> = digits.chars().collect();
        for (i, c) in chars.iter().enumerate() {
            if i > 0 && (chars.len() - i) % 3 == 0 {
                result.push_str(&self.thousands_separator);
            }
            result.push(*c);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_currency_always_two_fraction_digits() {
        let locale = FormatLocale::default();
        assert_eq!(locale.format_currency(dec("1234.5")), "\u{20B1}1,234.50");
        assert_eq!(locale.format_currency(dec("1234")), "\u{20B1}1,234.00");
        assert_eq!(locale.format_currency(dec("1234.505")), "\u{20B1}1,234.51");
    }

    #[test]
    fn test_currency_grouping() {
        let locale = FormatLocale::default();
        assert_eq!(locale.format_currency(dec("0")), "\u{20B1}0.00");
        assert_eq!(locale.format_currency(dec("999")), "\u{20B1}999.00");
        assert_eq!(locale.format_currency(dec("1000")), "\u{20B1}1,000.00");
        assert_eq!(locale.format_currency(dec("1234567.8")), "\u{20B1}1,234,567.80");
    }

    #[test]
    fn test_custom_separators() {
        let locale = FormatLocale {
            currency_symbol: "EUR ".to_string(),
            thousands_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
            date_format: "%-d %B %Y".to_string(),
        };
        assert_eq!(locale.format_currency(dec("1234.5")), "EUR 1.234,50");
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(locale.format_date(date), "15 March 2025");
    }

    #[test]
    fn test_unknown_date_specifier_falls_back_to_iso() {
        let locale = FormatLocale {
            date_format: "%Q".to_string(),
            ..Default::default()
        };
        assert!(!locale.date_format_is_valid());
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(locale.format_date(date), "2025-03-15");
        assert!(FormatLocale::default().date_format_is_valid());
    }

    #[test]
    fn test_long_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        assert_eq!(FormatLocale::default().format_date(date), "March 5, 2025");
    }
}
