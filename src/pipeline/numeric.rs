//! Locale-aware parsing of OCR-extracted numeric and date text.
//!
//! Two parsing profiles exist and are selected per field, never
//! auto-detected:
//!
//! * **es-ES amounts** ([`parse_amount`]) — comma decimal separator, dot
//!   group separator. Used for every monetary field on the invoice.
//! * **Invariant** ([`parse_invariant`]) — dot decimal separator, no
//!   grouping. Used only for tax-rate text, which the recognition model
//!   emits in invariant form inside decorator characters.
//!
//! The asymmetry comes from the upstream document format and must be
//! preserved exactly; collapsing the two profiles silently changes parsed
//! values (`21.00` is twenty-one as a rate but could be grouped digits as an
//! amount).
//!
//! Every result is a [`Decimal`] — monetary figures are never binary floats,
//! so repeated additions cannot drift.

use crate::error::FacturaeError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Dot-grouped integer part: `1.234` or `12.345.678`. Anything else with a
/// dot is read as a decimal point, not a group separator.
static ES_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(\.\d{3})+(,\d+)?$").expect("static regex"));

/// Plain number with an optional single decimal separator.
static PLAIN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+([.,]\d+)?$").expect("static regex"));

fn invalid(field: &str, raw: &str, detail: impl Into<String>) -> FacturaeError {
    FacturaeError::InvalidFieldValue {
        field: field.to_string(),
        raw: raw.to_string(),
        detail: detail.into(),
    }
}

/// Parse an es-ES formatted amount (`1.234,56`, `100,00`).
///
/// OCR output is not always faithful to the locale: cells such as `100.00`
/// appear where a Spanish document would print `100,00`. A dot is therefore
/// read as a group separator only when it delimits exact 3-digit groups;
/// otherwise it is accepted as a decimal point, so `100.00` parses as one
/// hundred rather than ten thousand.
pub fn parse_amount(text: &str, field: &str) -> Result<Decimal, FacturaeError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if cleaned.is_empty() {
        return Err(invalid(field, text, "empty amount"));
    }

    let normalized = if ES_GROUPED.is_match(&cleaned) {
        // `1.234.567,89` — strip grouping, comma becomes the decimal point.
        cleaned.replace('.', "").replace(',', ".")
    } else if PLAIN_NUMBER.is_match(&cleaned) {
        cleaned.replace(',', ".")
    } else {
        return Err(invalid(field, text, "not an es-ES formatted number"));
    };

    normalized
        .parse::<Decimal>()
        .map_err(|e| invalid(field, text, format!("decimal parse failed: {e}")))
}

/// Parse an es-ES amount, defaulting blank/absent text to zero.
///
/// Optional numeric cells (quantities, surcharge amounts) default rather
/// than fail; mandatory fields go through [`parse_amount`] directly.
pub fn parse_amount_or_zero(text: Option<&str>, field: &str) -> Result<Decimal, FacturaeError> {
    match text {
        Some(t) if !t.trim().is_empty() => parse_amount(t, field),
        _ => Ok(Decimal::ZERO),
    }
}

/// Parse an invariant-form number (`21.00`): dot decimal point, no grouping.
pub fn parse_invariant(text: &str, field: &str) -> Result<Decimal, FacturaeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid(field, text, "empty number"));
    }
    trimmed
        .parse::<Decimal>()
        .map_err(|e| invalid(field, text, format!("decimal parse failed: {e}")))
}

/// Parse a decorated tax rate such as `(21.00%)`.
///
/// The recognition model always emits the rate as one decorator character,
/// five characters of invariant-form number, then trailing decoration. The
/// five characters at offsets 1..=5 are extracted positionally — this is a
/// fixed contract with the upstream document format, brittle by design and
/// isolated here so a format change is a one-place fix.
///
/// # Precondition
/// The raw text must be at least 6 characters long; shorter text fails with
/// [`FacturaeError::InvalidFieldValue`]. The single-decorator-prefix
/// assumption is unverified against all possible OCR outputs; do not relax
/// it without confirming the real field format.
pub fn parse_decorated_rate(raw: &str, field: &str) -> Result<Decimal, FacturaeError> {
    if raw.chars().count() < 6 {
        return Err(invalid(
            field,
            raw,
            "decorated rate shorter than 6 characters",
        ));
    }
    let inner: String = raw.chars().skip(1).take(5).collect();
    parse_invariant(&inner, field)
}

/// Two-digit day and month, four-digit year. chrono alone would also accept
/// unpadded `4/5/21`, which the upstream exact-format contract rejects.
static EXACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("static regex"));

/// Parse a `dd/MM/yyyy` date (`04/05/2021`). The format is exact; no other
/// layout is accepted.
pub fn parse_date(text: &str, field: &str) -> Result<NaiveDate, FacturaeError> {
    let trimmed = text.trim();
    if !EXACT_DATE.is_match(trimmed) {
        return Err(invalid(field, text, "expected dd/MM/yyyy date"));
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .map_err(|e| invalid(field, text, format!("expected dd/MM/yyyy date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> Decimal {
        parse_amount(text, "test").unwrap()
    }

    #[test]
    fn comma_is_the_decimal_separator() {
        assert_eq!(amount("100,00"), Decimal::new(10000, 2));
        assert_eq!(amount("0,5"), Decimal::new(5, 1));
        assert_eq!(amount("-12,34"), Decimal::new(-1234, 2));
    }

    #[test]
    fn dot_groups_are_stripped() {
        assert_eq!(amount("1.234,56"), Decimal::new(123456, 2));
        assert_eq!(amount("12.345.678,90"), Decimal::new(1234567890, 2));
    }

    #[test]
    fn lone_dot_reads_as_decimal_point() {
        // OCR frequently renders `100,00` as `100.00`.
        assert_eq!(amount("100.00"), Decimal::new(10000, 2));
        assert_eq!(amount("82.64"), Decimal::new(8264, 2));
    }

    #[test]
    fn three_digit_dot_group_without_comma_is_grouping() {
        assert_eq!(amount("1.234"), Decimal::from(1234));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(amount(" 1.234,56\u{a0}"), Decimal::new(123456, 2));
    }

    #[test]
    fn garbage_amounts_fail_with_the_field_path() {
        let err = parse_amount("12,34,56", "Invoices.Invoice.InvoiceTotals.InvoiceTotal")
            .unwrap_err();
        assert!(err.to_string().contains("InvoiceTotal"), "got: {err}");
        assert!(parse_amount("abc", "f").is_err());
        assert!(parse_amount("", "f").is_err());
    }

    #[test]
    fn blank_optional_amounts_default_to_zero() {
        assert_eq!(parse_amount_or_zero(None, "f").unwrap(), Decimal::ZERO);
        assert_eq!(parse_amount_or_zero(Some("   "), "f").unwrap(), Decimal::ZERO);
        assert_eq!(
            parse_amount_or_zero(Some("2"), "f").unwrap(),
            Decimal::from(2)
        );
    }

    #[test]
    fn invariant_profile_keeps_the_dot() {
        assert_eq!(parse_invariant("21.00", "f").unwrap(), Decimal::new(2100, 2));
        assert_eq!(parse_invariant("4.00", "f").unwrap(), Decimal::new(400, 2));
    }

    #[test]
    fn decorated_rate_extracts_offsets_one_through_five() {
        assert_eq!(
            parse_decorated_rate("(21.00%)", "f").unwrap(),
            Decimal::new(2100, 2)
        );
        assert_eq!(
            parse_decorated_rate("[10.50]", "f").unwrap(),
            Decimal::new(1050, 2)
        );
    }

    #[test]
    fn decorated_rate_shorter_than_six_chars_fails() {
        let err = parse_decorated_rate("(21.0", "Invoices.Invoice.TaxesOutputs.Tax.TaxRate")
            .unwrap_err();
        assert!(matches!(err, FacturaeError::InvalidFieldValue { .. }));
        assert!(err.to_string().contains("6 characters"));
    }

    #[test]
    fn dates_use_exact_day_month_year() {
        assert_eq!(
            parse_date("04/05/2021", "f").unwrap(),
            NaiveDate::from_ymd_opt(2021, 5, 4).unwrap()
        );
        assert!(parse_date("2021-05-04", "f").is_err());
        assert!(parse_date("4/5/21", "f").is_err());
    }
}
