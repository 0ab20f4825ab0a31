// Helpers shared by the engine and every consumer of the data model:
// Brazilian number/currency handling and lenient date parsing.

pub mod brazilian_format {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use std::num::ParseFloatError;
    use std::str::FromStr;

    pub const CURRENCY_SYMBOL: &str = "R$";

    // Intl's pt-BR currency output puts a non-breaking space after the symbol.
    const SYMBOL_SEPARATOR: char = '\u{a0}';

    /// Rounds to the nearest cent, half away from zero. Values too large to
    /// count in cents come back as zero, matching [`format_currency`].
    pub fn round_to_cents(value: f64) -> f64 {
        match whole_cents(value) {
            Some(cents) => cents / 100.0,
            None => 0.0,
        }
    }

    // Signed cent count, or None when `value` or its cent count is not finite.
    fn whole_cents(value: f64) -> Option<f64> {
        let cents = (value * 100.0).round();
        cents.is_finite().then_some(cents)
    }

    /// Renders `value` as "R$ 1.234,56". Non-finite input, or input too large
    /// to count in cents, is shown as zero.
    pub fn format_currency(value: f64) -> String {
        let signed = whole_cents(value).unwrap_or(0.0);
        let cents = signed.abs();

        // `{:.0}` on an integral f64 prints every digit, so this never overflows.
        let digits = format!("{:.0}", cents);
        let digits = format!("{:0>3}", digits);
        let (units, fraction) = digits.split_at(digits.len() - 2);

        let sign = if signed < 0.0 { "-" } else { "" };
        format!(
            "{}{}{}{},{}",
            sign,
            CURRENCY_SYMBOL,
            SYMBOL_SEPARATOR,
            group_thousands(units),
            fraction
        )
    }

    /// Inverse of [`format_currency`]. Accepts anything a user could type in a
    /// price field and falls back to 0 for input with no leading number.
    pub fn parse_currency(input: &str) -> f64 {
        let without_symbol = input.replace(CURRENCY_SYMBOL, "");
        let compact: String = without_symbol
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();
        let normalized = compact.replacen(',', ".", 1);

        match leading_number(&normalized) {
            Some(number) if number.is_finite() => number,
            _ => 0.0,
        }
    }

    // Parses decimals like "1.234,56" or "123,45" into f64
    pub fn parse_decimal(s: &str) -> Result<f64, ParseFloatError> {
        let normalized = s.trim()
            .replace('.', "")  // Remove thousand separators
            .replace(',', "."); // Replace decimal separator

        f64::from_str(&normalized)
    }

    pub fn format_decimal(value: f64, decimals: usize) -> String {
        let formatted = format!("{:.decimals$}", value, decimals = decimals);
        formatted.replace('.', ",")
    }

    /// Accepts a bare ISO date ("2024-05-01", read as UTC midnight), an RFC 3339
    /// timestamp, a zone-less ISO timestamp (read as UTC) or a Brazilian
    /// "dd/mm/yyyy" date.
    pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }
        ["%Y-%m-%d", "%d/%m/%Y"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
    }

    /// Serde helper for amounts stored either as numbers or as currency text.
    pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Number(f64),
            Text(String),
        }

        Ok(match Option::<RawAmount>::deserialize(deserializer)? {
            Some(RawAmount::Number(n)) if n.is_finite() => n,
            Some(RawAmount::Text(text)) => parse_currency(&text),
            _ => 0.0,
        })
    }

    pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawAmount {
            Number(f64),
            Text(String),
        }

        Ok(match Option::<RawAmount>::deserialize(deserializer)? {
            Some(RawAmount::Number(n)) if n.is_finite() => Some(n),
            Some(RawAmount::Text(text)) if !text.trim().is_empty() => Some(parse_currency(&text)),
            _ => None,
        })
    }

    fn group_thousands(units: &str) -> String {
        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, digit) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(digit);
        }
        grouped
    }

    // Longest prefix of the form [+-]digits[.digits], the same prefix rule
    // browsers apply when reading a number out of free text.
    fn leading_number(s: &str) -> Option<f64> {
        let bytes = s.as_bytes();
        let mut end = 0;
        if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
            end = 1;
        }
        let int_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        let mut has_digits = end > int_start;
        if end < bytes.len() && bytes[end] == b'.' {
            let frac_start = end + 1;
            let mut frac_end = frac_start;
            while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
                frac_end += 1;
            }
            if frac_end > frac_start {
                has_digits = true;
                end = frac_end;
            } else if has_digits {
                end = frac_start;
            }
        }
        if !has_digits {
            return None;
        }
        f64::from_str(s[..end].trim_end_matches('.')).ok()
    }

}

pub mod serde_dates {
    //! Serde adapters for date fields that may arrive as a bare date or a full
    //! timestamp.

    use super::brazilian_format::parse_date;
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
    }

    /// Missing, empty or unreadable values become `None`.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse_date))
    }
}
