//! Number, percent and phrase formatting used by the renderer.

use std::collections::BTreeMap;

use crate::model::I18nText;

/// Formats an integer with thousands separators: `1234567` -> `"1,234,567"`.
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    let first_group = match digits.len() % 3 {
        0 => 3,
        n => n,
    };
    out.push_str(&digits[..first_group]);
    for chunk in digits[first_group..].as_bytes().chunks(3) {
        out.push(',');
        // Chunks of an ASCII digit string.
        out.push_str(std::str::from_utf8(chunk).unwrap_or(""));
    }
    out
}

/// Formats a transfer delta with an explicit sign on non-negative values.
pub fn format_signed(value: i64) -> String {
    if value >= 0 {
        format!("+{}", format_number(value))
    } else {
        format_number(value)
    }
}

/// Formats a percentage with two decimals: `43.157` -> `"43.16%"`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Percent-of-total variant: the share of `value` within `total`, or the
/// empty string when there is no total to divide by.
pub fn percent_of(value: i64, total: i64) -> String {
    if total == 0 {
        return String::new();
    }
    format_percent(100.0 * (value as f64) / (total as f64))
}

// Built-in fallbacks for the phrases the renderer needs. The election input
// may override any of them through its translations table.
const DEFAULT_PHRASES: &[(&str, &str)] = &[
    ("candidate", "Candidate"),
    ("votes", "Votes"),
    ("transfer", "Transfer"),
    ("percent", "%"),
    ("round", "Round"),
    ("final_round", "Final round"),
    ("precincts_reporting", "precincts reporting"),
    ("detailed_results", "Detailed results"),
    ("round_by_round", "Round-by-round results"),
];

/// Phrase translation for a fixed output language.
///
/// Looks up a phrase key in the election's translations table and falls back
/// to the built-in English defaults.
#[derive(Debug, Clone, Default)]
pub struct Phrases {
    lang: String,
    translations: BTreeMap<String, I18nText>,
}

impl Phrases {
    pub fn new(lang: &str, translations: BTreeMap<String, I18nText>) -> Phrases {
        Phrases {
            lang: lang.to_string(),
            translations,
        }
    }

    /// Translates a phrase key.
    pub fn tr(&self, key: &str) -> String {
        if let Some(text) = self.translations.get(key) {
            let s = text.get(&self.lang);
            if !s.is_empty() {
                return s.to_string();
            }
        }
        DEFAULT_PHRASES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    /// Picks the right translation out of a model text field.
    pub fn text<'a>(&self, text: &'a I18nText) -> &'a str {
        text.get(&self.lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_grouping() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-650), "-650");
        assert_eq!(format_number(-1234), "-1,234");
    }

    #[test]
    fn signed_transfers() {
        assert_eq!(format_signed(800), "+800");
        assert_eq!(format_signed(0), "+0");
        assert_eq!(format_signed(-650), "-650");
        assert_eq!(format_signed(12500), "+12,500");
    }

    #[test]
    fn percents() {
        assert_eq!(format_percent(80.0), "80.00%");
        assert_eq!(format_percent(43.157894), "43.16%");
        assert_eq!(percent_of(200, 250), "80.00%");
        assert_eq!(percent_of(1, 0), "");
    }

    #[test]
    fn phrase_lookup() {
        let mut translations = BTreeMap::new();
        let mut votes = BTreeMap::new();
        votes.insert("en".to_string(), "Votes".to_string());
        votes.insert("es".to_string(), "Votos".to_string());
        translations.insert("votes".to_string(), I18nText(votes));

        let es = Phrases::new("es", translations.clone());
        assert_eq!(es.tr("votes"), "Votos");
        // Not in the table: built-in default.
        assert_eq!(es.tr("transfer"), "Transfer");
        // Unknown key: echoed back rather than dropped.
        assert_eq!(es.tr("no_such_phrase"), "no_such_phrase");

        let en = Phrases::new("en", translations);
        assert_eq!(en.tr("votes"), "Votes");
    }
}
