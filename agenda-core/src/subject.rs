//! Meeting title extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::meeting::DEFAULT_TITLE;
use crate::text::{capitalize_first, squash_spaces};

/// "sobre X", "assunto: X", "tema: X", "a respeito de X", with X running
/// until the next connective, date or time phrase.
static MARKED_SUBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\bsobre|\bassunto[:\s]+|\btema[:\s]+|\ba\s+respeito\s+de)\s+(.+?)(?:\s+com\s|\s+para\s|\s+dia\s|\s+(?:depois\s+de\s+)?amanh[ãa]\b|\s+hoje\b|\s+(?:na\s+|no\s+)?(?:pr[óo]xim[ao]\s+)?(?:segunda|ter[çc]a|quarta|quinta|sexta|s[áa]bado|domingo)\b|\s+[àa]s?\s+\d|\s+\d{1,2}[h:]|\s+\d{1,2}[/-]\d|\s+\S+@|\s*$)",
    )
    .unwrap()
});

static EMAILS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static TIMES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}[h:]\d{0,2}").unwrap());
static DATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:depois\s+de\s+)?amanh[ãa]\b|\bhoje\b|\b(?:segunda|ter[çc]a|quarta|quinta|sexta|s[áa]bado|domingo)(?:-feira)?\b|\b\d{1,4}[/-]\d{1,2}(?:[/-]\d{2,4})?\b",
    )
    .unwrap()
});
static FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:pr[óo]xim[ao]|dia|[àa]s|com|para|quero|preciso|agendar|marcar|reuni[ãa]o|call|meeting|uma|um)\b",
    )
    .unwrap()
});

const MIN_RESIDUE_CHARS: usize = 4;
const MAX_RESIDUE_CHARS: usize = 79;

/// Extract a non-empty meeting title from free text.
pub fn extract_title(text: &str) -> String {
    if let Some(title) = marked_subject(text) {
        return title;
    }
    if let Some(title) = residual_subject(text) {
        return title;
    }
    DEFAULT_TITLE.to_string()
}

fn marked_subject(text: &str) -> Option<String> {
    let caps = MARKED_SUBJECT.captures(text)?;
    let raw = caps.get(1)?.as_str();
    let title = raw
        .trim()
        .trim_end_matches(['.', ',', ';', ':', '!', '?'])
        .trim();
    if title.is_empty() {
        return None;
    }
    Some(capitalize_first(title))
}

/// Whatever is left after removing emails, dates, times and filler words.
fn residual_subject(text: &str) -> Option<String> {
    let without_emails = EMAILS.replace_all(text, " ");
    let without_times = TIMES.replace_all(&without_emails, " ");
    let without_dates = DATES.replace_all(&without_times, " ");
    let without_filler = FILLER.replace_all(&without_dates, " ");
    let residue = squash_spaces(&without_filler);
    let residue = residue.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());

    let len = residue.chars().count();
    if (MIN_RESIDUE_CHARS..=MAX_RESIDUE_CHARS).contains(&len) {
        Some(capitalize_first(residue))
    } else {
        None
    }
}
