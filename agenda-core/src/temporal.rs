//! Date and time resolution for Portuguese scheduling phrases.
//!
//! Everything here is a pure function of the input text and an explicit
//! reference date. Matching runs on folded text (lower-case, no diacritics),
//! so "Amanhã", "amanha" and "AMANHÃ" are the same phrase.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::entities::blank_emails;
use crate::meeting::{default_end, short_date};
use crate::text::fold;

/// How far forward a past literal date may be rolled before giving up.
const MAX_ROLL_YEARS: i32 = 200;

static TODAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhoje\b").unwrap());
static DAY_AFTER_TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdepois\s+de\s+amanha\b").unwrap());
static TOMORROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bamanha\b").unwrap());
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:proxim[oa]\s+)?(domingo|segunda|terca|quarta|quinta|sexta|sabado)(?:-feira)?\b")
        .unwrap()
});
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static NUMERIC_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:dia\s+)?(\d{1,2})[/-](\d{1,2})(?:[/-](\d{2}|\d{4}))?\b").unwrap()
});

static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\d{1,2})(?:h(\d{2})?|:(\d{2}))\s*(?:as|ate|-|–)\s*(\d{1,2})(?:h(\d{2})?|:(\d{2}))",
    )
    .unwrap()
});
static TIME_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?:h(\d{2})?|:(\d{2}))(?:[\s,.!?;)]|$)").unwrap());

/// A calendar date resolved from text, with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub label: String,
}

/// A start/end pair resolved from a time phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Everything the resolver recognized in one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub date: Option<ResolvedDate>,
    pub time: Option<TimeSlot>,
}

/// Resolve both date and time. Returns `None` when neither phrase is present.
pub fn resolve(text: &str, today: NaiveDate) -> Option<Resolution> {
    let date = resolve_date(text, today);
    let time = resolve_time(text);
    if date.is_none() && time.is_none() {
        return None;
    }
    Some(Resolution { date, time })
}

/// Resolve a date phrase relative to `today`.
///
/// Precedence: "hoje", "depois de amanhã", "amanhã", weekday names, then
/// literal dates (ISO, then DD/MM[/YY[YY]]).
pub fn resolve_date(text: &str, today: NaiveDate) -> Option<ResolvedDate> {
    let folded = fold(&blank_emails(text));

    if TODAY.is_match(&folded) {
        return Some(labeled("Hoje", today));
    }
    // Checked before "amanhã", which it contains.
    if DAY_AFTER_TOMORROW.is_match(&folded) {
        return Some(labeled("Depois de amanhã", today + Duration::days(2)));
    }
    if TOMORROW.is_match(&folded) {
        return Some(labeled("Amanhã", today + Duration::days(1)));
    }
    if let Some(caps) = WEEKDAY.captures(&folded) {
        let (weekday, name) = weekday_from_folded(&caps[1])?;
        return Some(labeled(name, next_weekday(today, weekday)));
    }
    if let Some(caps) = ISO_DATE.captures(&folded) {
        let year: i32 = caps[1].parse().ok()?;
        if let Some(date) = literal_date(number(&caps, 3)?, number(&caps, 2)?, year, today) {
            return Some(ResolvedDate { label: short_date(date), date });
        }
    }
    NUMERIC_DATE
        .captures_iter(&folded)
        .filter(|caps| !inside_clock(&folded, caps))
        .find_map(|caps| {
            let year = match caps.get(3) {
                Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
                Some(y) => y.as_str().parse().ok()?,
                None => today.year(),
            };
            let date = literal_date(number(&caps, 1)?, number(&caps, 2)?, year, today)?;
            Some(ResolvedDate { label: short_date(date), date })
        })
}

/// True when a DD/MM candidate is really the minutes of a clock time, as the
/// "15-10" in "9:15-10:30".
fn inside_clock(folded: &str, caps: &Captures<'_>) -> bool {
    let (Some(day), Some(month)) = (caps.get(1), caps.get(2)) else {
        return false;
    };
    let before = folded[..day.start()].chars().next_back();
    let after = folded[month.end()..].chars().next();
    before == Some(':') || before.is_some_and(|c| c.is_ascii_digit()) || after == Some(':')
}

/// Resolve a time phrase: "14h às 16h", "14:00-15:30", "às 10h", "14h30".
///
/// A single time gets a one-hour slot. A range whose end is not after its
/// start is treated as a single time.
pub fn resolve_time(text: &str) -> Option<TimeSlot> {
    let folded = fold(&blank_emails(text));

    for caps in TIME_RANGE.captures_iter(&folded) {
        let start = clock_time(&caps, 1, 2, 3);
        let end = clock_time(&caps, 4, 5, 6);
        if let (Some(start), Some(end)) = (start, end) {
            let end = if end > start { end } else { default_end(start) };
            return Some(TimeSlot { start, end });
        }
    }

    TIME_SINGLE
        .captures_iter(&folded)
        .find_map(|caps| clock_time(&caps, 1, 2, 3))
        .map(|start| TimeSlot { start, end: default_end(start) })
}

/// Next occurrence of `weekday` strictly after `from` (a match on `from`
/// itself resolves a week later).
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = from.weekday().num_days_from_sunday() as i64;
    let target = weekday.num_days_from_sunday() as i64;
    let diff = (target - current + 7) % 7;
    from + Duration::days(if diff == 0 { 7 } else { diff })
}

fn labeled(name: &str, date: NaiveDate) -> ResolvedDate {
    ResolvedDate {
        label: format!("{} ({})", name, short_date(date)),
        date,
    }
}

fn weekday_from_folded(name: &str) -> Option<(Weekday, &'static str)> {
    let found = match name {
        "domingo" => (Weekday::Sun, "Domingo"),
        "segunda" => (Weekday::Mon, "Segunda"),
        "terca" => (Weekday::Tue, "Terça"),
        "quarta" => (Weekday::Wed, "Quarta"),
        "quinta" => (Weekday::Thu, "Quinta"),
        "sexta" => (Weekday::Fri, "Sexta"),
        "sabado" => (Weekday::Sat, "Sábado"),
        _ => return None,
    };
    Some(found)
}

/// Build a literal date and roll it forward while it lies before `today`.
///
/// Day/month combinations that never exist (31/02) are rejected; 29/02 rolls
/// to the next leap year.
fn literal_date(day: u32, month: u32, year: i32, today: NaiveDate) -> Option<NaiveDate> {
    // 2000 is a leap year, so this accepts every day that exists in some year.
    NaiveDate::from_ymd_opt(2000, month, day)?;

    (year..year + MAX_ROLL_YEARS)
        .filter_map(|y| NaiveDate::from_ymd_opt(y, month, day))
        .find(|date| *date >= today)
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn clock_time(caps: &Captures<'_>, hour: usize, h_minute: usize, c_minute: usize) -> Option<NaiveTime> {
    let h = number(caps, hour)?;
    let m = number(caps, h_minute).or_else(|| number(caps, c_minute)).unwrap_or(0);
    NaiveTime::from_hms_opt(h, m, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // 2025-01-10 is a Friday.
    fn friday() -> NaiveDate {
        ymd(2025, 1, 10)
    }

    // --- relative days ---

    #[test]
    fn today_resolves_to_reference() {
        let r = resolve_date("reunião hoje às 15h", friday()).unwrap();
        assert_eq!(r.date, friday());
        assert_eq!(r.label, "Hoje (10/01)");
    }

    #[test]
    fn tomorrow_with_and_without_accent() {
        assert_eq!(resolve_date("amanhã", friday()).unwrap().date, ymd(2025, 1, 11));
        assert_eq!(resolve_date("AMANHA cedo", friday()).unwrap().date, ymd(2025, 1, 11));
        assert_eq!(resolve_date("amanhã", friday()).unwrap().label, "Amanhã (11/01)");
    }

    #[test]
    fn day_after_tomorrow_is_two_days() {
        let r = resolve_date("depois de amanhã às 9h", friday()).unwrap();
        assert_eq!(r.date, ymd(2025, 1, 12));
        assert_eq!(r.label, "Depois de amanhã (12/01)");
    }

    // --- weekdays ---

    #[test]
    fn weekday_resolves_to_next_occurrence() {
        assert_eq!(resolve_date("segunda", friday()).unwrap().date, ymd(2025, 1, 13));
        assert_eq!(resolve_date("próxima terça-feira", friday()).unwrap().date, ymd(2025, 1, 14));
        assert_eq!(resolve_date("no sábado", friday()).unwrap().date, ymd(2025, 1, 11));
    }

    #[test]
    fn weekday_matching_today_is_a_week_later() {
        let monday = ymd(2025, 1, 13);
        assert_eq!(resolve_date("segunda", monday).unwrap().date, ymd(2025, 1, 20));
        assert_eq!(resolve_date("sexta", friday()).unwrap().date, ymd(2025, 1, 17));
    }

    #[test]
    fn weekday_label_uses_display_name() {
        assert_eq!(resolve_date("terca", friday()).unwrap().label, "Terça (14/01)");
    }

    #[test]
    fn weekday_inside_other_word_is_ignored() {
        assert!(resolve_date("segundas intenções", friday()).is_none());
    }

    // --- literal dates ---

    #[test]
    fn numeric_date_without_year() {
        let r = resolve_date("dia 15/02", friday()).unwrap();
        assert_eq!(r.date, ymd(2025, 2, 15));
        assert_eq!(r.label, "15/02");
    }

    #[test]
    fn numeric_date_accepts_dash_and_years() {
        assert_eq!(resolve_date("15-02", friday()).unwrap().date, ymd(2025, 2, 15));
        assert_eq!(resolve_date("15/02/26", friday()).unwrap().date, ymd(2026, 2, 15));
        assert_eq!(resolve_date("15/02/2026", friday()).unwrap().date, ymd(2026, 2, 15));
    }

    #[test]
    fn past_date_rolls_forward_a_year() {
        assert_eq!(resolve_date("05/01", friday()).unwrap().date, ymd(2026, 1, 5));
        // The reference day itself is not in the past.
        assert_eq!(resolve_date("10/01", friday()).unwrap().date, friday());
    }

    #[test]
    fn leap_day_rolls_to_next_leap_year() {
        assert_eq!(resolve_date("29/02", friday()).unwrap().date, ymd(2028, 2, 29));
    }

    #[test]
    fn impossible_date_is_not_recognized() {
        assert!(resolve_date("31/02", friday()).is_none());
        assert!(resolve_date("40/13", friday()).is_none());
    }

    #[test]
    fn iso_date_is_literal() {
        assert_eq!(resolve_date("2025-03-20", friday()).unwrap().date, ymd(2025, 3, 20));
    }

    #[test]
    fn relative_phrase_wins_over_literal() {
        assert_eq!(resolve_date("amanhã, não dia 20/01", friday()).unwrap().date, ymd(2025, 1, 11));
    }

    #[test]
    fn no_date_phrase() {
        assert!(resolve_date("call com ana@x.com às 14h", friday()).is_none());
    }

    // --- times ---

    #[test]
    fn range_with_as() {
        let slot = resolve_time("das 14h às 16h").unwrap();
        assert_eq!(slot, TimeSlot { start: hm(14, 0), end: hm(16, 0) });
    }

    #[test]
    fn range_with_dash_and_minutes() {
        let slot = resolve_time("14:30-15:45").unwrap();
        assert_eq!(slot, TimeSlot { start: hm(14, 30), end: hm(15, 45) });
        let slot = resolve_time("10h30 - 11h").unwrap();
        assert_eq!(slot, TimeSlot { start: hm(10, 30), end: hm(11, 0) });
    }

    #[test]
    fn inverted_range_falls_back_to_one_hour() {
        let slot = resolve_time("16h às 14h").unwrap();
        assert_eq!(slot, TimeSlot { start: hm(16, 0), end: hm(17, 0) });
    }

    #[test]
    fn single_time_gets_one_hour() {
        assert_eq!(resolve_time("às 14h").unwrap(), TimeSlot { start: hm(14, 0), end: hm(15, 0) });
        assert_eq!(resolve_time("14h30, ok?").unwrap(), TimeSlot { start: hm(14, 30), end: hm(15, 30) });
        assert_eq!(resolve_time("at 9:15").unwrap(), TimeSlot { start: hm(9, 15), end: hm(10, 15) });
    }

    #[test]
    fn late_single_time_wraps() {
        assert_eq!(resolve_time("23h").unwrap(), TimeSlot { start: hm(23, 0), end: hm(0, 0) });
    }

    #[test]
    fn out_of_range_time_is_ignored() {
        assert!(resolve_time("99h").is_none());
        assert_eq!(resolve_time("25h ou 10h").unwrap().start, hm(10, 0));
    }

    #[test]
    fn dates_are_not_times() {
        assert!(resolve_time("dia 15/02").is_none());
        assert!(resolve_time("joao14h@email.com").is_none());
    }

    #[test]
    fn email_addresses_are_not_dates() {
        assert!(resolve_date("com ana.hoje@x.com às 10h", friday()).is_none());
        assert!(resolve_date("com bia.amanha@x.com", friday()).is_none());
        assert!(resolve_date("com sexta@empresa.com.br", friday()).is_none());
        assert_eq!(
            resolve_date("com ana.hoje@x.com amanhã", friday()).unwrap().date,
            ymd(2025, 1, 11)
        );
    }

    #[test]
    fn clock_ranges_are_not_dates() {
        assert!(resolve_date("reunião com ana@x.com 9:15-10:30", friday()).is_none());
        assert!(resolve_date("das 10:05-11:05", friday()).is_none());
        assert_eq!(resolve_time("9:15-10:30").unwrap(), TimeSlot { start: hm(9, 15), end: hm(10, 30) });
    }

    #[test]
    fn later_literal_date_after_invalid_candidate() {
        let r = resolve_date("call com ana@x.com 14:00-15:00 dia 20/01", friday()).unwrap();
        assert_eq!(r.date, ymd(2025, 1, 20));
        assert_eq!(resolve_date("40/13 ou 21/01", friday()).unwrap().date, ymd(2025, 1, 21));
    }

    // --- combined ---

    #[test]
    fn resolve_returns_none_without_phrases() {
        assert!(resolve("quero falar com a ana", friday()).is_none());
    }

    #[test]
    fn resolve_reports_partial_results() {
        let r = resolve("às 10h", friday()).unwrap();
        assert!(r.date.is_none());
        assert_eq!(r.time.unwrap().start, hm(10, 0));
    }
}
