//! Participant extraction: email addresses and the names written next to them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::{capitalize_first, fold, squash_spaces, title_case};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());
static EMAIL_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// One to four words of letters.
const NAME: &str = r"(\p{L}{2,}(?:\s+\p{L}{2,}){0,3})";
/// Same, but the first word must start upper-case (used after the email).
const NAME_CAPITALIZED: &str = r"(\p{Lu}\p{L}+(?:\s+\p{L}{2,}){0,3})";

/// Folded words that are never part of a person's name.
const STOP_WORDS: &[&str] = &[
    "a", "o", "as", "os", "e", "com", "para", "pra", "do", "da", "de", "no", "na", "em", "um",
    "uma", "por", "favor", "reuniao", "call", "meeting", "agendar", "marcar", "agenda", "quero",
    "preciso", "sobre", "assunto", "tema", "email", "grupo", "mentoria", "convidar", "convite",
    "participante", "hoje", "amanha", "depois", "dia", "ate", "proxima", "proximo", "segunda",
    "terca", "quarta", "quinta", "sexta", "sabado", "domingo", "feira",
];

/// A participant found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub email: String,
    pub name: String,
}

/// Lower-cased, de-duplicated email addresses in first-occurrence order.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for m in EMAIL.find_iter(text) {
        let email = m.as_str().to_lowercase();
        if !emails.contains(&email) {
            emails.push(email);
        }
    }
    emails
}

/// The text with every email address replaced by a space, so words inside
/// addresses ("ana.hoje@x.com") are not read as scheduling phrases.
pub fn blank_emails(text: &str) -> String {
    EMAIL.replace_all(text, " ").into_owned()
}

/// Whether `s` is a single syntactically valid email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_EXACT.is_match(s)
}

/// Emails in the text, each paired with its best-effort display name.
pub fn extract_participants(text: &str) -> Vec<Participant> {
    extract_emails(text)
        .into_iter()
        .map(|email| Participant {
            name: name_for(text, &email),
            email,
        })
        .collect()
}

/// Find the display name the text gives for `email`.
///
/// Tries, in order: a connective followed by the name right before the
/// email ("com Thais Santos thais@..."), a name followed by the email in
/// parentheses or angle brackets, a name separated from the email by a comma
/// or dash, any name right before the email, and a capitalized name right
/// after it. Falls back to the email's local part.
pub fn name_for(text: &str, email: &str) -> String {
    let escaped = regex::escape(email);

    let before_patterns = [
        format!(r"(?i)\b(?:com|para|do|da|de|e)\s+(?:[oa]\s+)?{NAME}\s+\(?{escaped}\)?"),
        format!(r"(?i)\b{NAME}\s*[(<]\s*{escaped}"),
        format!(r"(?i)\b(?:com|para)\s+(?:[oa]\s+)?{NAME}\s*[,\-–]\s*{escaped}"),
        format!(r"(?i)\b{NAME}\s+{escaped}"),
    ];
    for pattern in &before_patterns {
        if let Some(name) = capture(pattern, text).and_then(|c| trailing_name(&c)) {
            return title_case(&name);
        }
    }

    let after = format!(r"(?i:{escaped})\s*\(?\s*{NAME_CAPITALIZED}");
    if let Some(name) = capture(&after, text).and_then(|c| leading_name(&c)) {
        return title_case(&name);
    }

    humanize_local_part(email)
}

/// Turn an email's local part into a display name ("gui.devwork@x" -> "Gui Devwork").
///
/// Separators become spaces and digits are dropped. Multi-word results are
/// title-cased; a single word only gets its first letter capitalized.
pub fn humanize_local_part(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let spaced: String = local
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .map(|c| if matches!(c, '.' | '_' | '-') { ' ' } else { c })
        .collect();
    let humanized = squash_spaces(&spaced);

    if humanized.is_empty() {
        capitalize_first(local)
    } else if humanized.contains(' ') {
        title_case(&humanized)
    } else {
        capitalize_first(&humanized)
    }
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    // Patterns embed an escaped email, so they are always valid.
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&fold(word).as_str())
}

/// The run of non-stop words closest to the end ("Call com Ana" -> "Ana").
fn trailing_name(candidate: &str) -> Option<String> {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    let start = words
        .iter()
        .rposition(|w| is_stop_word(w))
        .map_or(0, |i| i + 1);
    let name = &words[start..];
    (!name.is_empty()).then(|| name.join(" "))
}

/// The run of non-stop words closest to the start ("Ana Souza amanhã" -> "Ana Souza").
fn leading_name(candidate: &str) -> Option<String> {
    let name: Vec<&str> = candidate
        .split_whitespace()
        .take_while(|w| !is_stop_word(w))
        .collect();
    (!name.is_empty()).then(|| name.join(" "))
}
