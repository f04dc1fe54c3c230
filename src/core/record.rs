// canonical records + representation normalization
use serde::Serialize;

use crate::core::types::Category;

/// Duration class in minutes. A submission either resolves to exactly one
/// class or lists several; ambiguity is never settled by arbitrary pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DurationField {
    /// No duration given; the explicit empty marker, rendered as `""`.
    Empty,
    Resolved(u32),
    /// Distinct candidate classes, carried in inert form until someone
    /// resolves the submission manually. Always classified as a change.
    Ambiguous(Vec<u32>),
}

impl DurationField {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, DurationField::Ambiguous(_))
    }
}

/// Comparable content of one record, with representation-only differences
/// already normalized away. Missing non-identity fields hold the explicit
/// empty marker `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalContent {
    pub title: String,
    //YYYY-MM-DDTHH:MM:00 or the empty marker
    pub schedule: String,
    pub room: String,
    pub duration: DurationField,
    //upstream declared order, preserved; a reorder is a content change
    pub participants: Vec<String>,
    pub body: String,
}

/// One normalized submission: stable upstream key, category, comparable
/// content. Fresh and immutable each run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub source_key: String,
    pub category: Category,
    pub content: CanonicalContent,
}

/// Canonicalize a room label so numeric and textual spellings compare equal:
/// `"Room 101"`, `" 101 "` and `"0101"` all become `"101"`.
pub fn canonical_room(raw: &str) -> String {
    let trimmed = raw.trim();

    // strip a leading "Room" word when it is a prefix, not part of a name
    let lower = trimmed.to_ascii_lowercase();
    let rest = match lower.strip_prefix("room") {
        Some(rest)
            if rest.is_empty()
                || rest.starts_with(|c: char| !c.is_ascii_alphanumeric())
                || rest.starts_with(|c: char| c.is_ascii_digit()) =>
        {
            trimmed[4..].trim_start_matches([' ', '-', ':', '#'])
        }
        _ => trimmed,
    };

    let rest = rest.trim();
    if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        let stripped = rest.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_string();
        }
        return stripped.to_string();
    }

    rest.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a free-text duration into standard classes.
///
/// Each comma-separated option is decided by the highest number it mentions
/// (<= 30 minutes -> class 30, otherwise class 60). Options that collapse to
/// the same class are not ambiguous. An absent duration stays the empty
/// marker, not a guessed class.
pub fn classify_duration(raw: &str) -> DurationField {
    let raw = raw.trim();
    if raw.is_empty() {
        return DurationField::Empty;
    }

    let mut classes: Vec<u32> = Vec::new();
    for option in raw.split(',') {
        let class = duration_class(option);
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    if classes.len() == 1 {
        DurationField::Resolved(classes[0])
    } else {
        DurationField::Ambiguous(classes)
    }
}

fn duration_class(option: &str) -> u32 {
    let max = option
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok())
        .max();

    match max {
        Some(m) if m > 30 => 60,
        _ => 30,
    }
}

/// Render an `HHMM` agenda time on the event date as `YYYY-MM-DDTHH:MM:00`.
/// Anything non-numeric or out of range yields the empty marker.
pub fn canonical_schedule(agenda: &str, event_date: &str) -> String {
    let agenda = agenda.trim();
    if agenda.is_empty() || !agenda.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }

    let (h, m) = if agenda.len() >= 2 {
        (&agenda[..2], &agenda[2..])
    } else {
        (agenda, "")
    };

    let hours: u32 = match h.parse() {
        Ok(v) => v,
        Err(_) => return String::new(),
    };
    let minutes: u32 = if m.is_empty() {
        0
    } else {
        match m.parse() {
            Ok(v) => v,
            Err(_) => return String::new(),
        }
    };

    if hours > 23 || minutes > 59 {
        return String::new();
    }

    format!("{event_date}T{hours:02}:{minutes:02}:00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_numeric_and_textual_spellings_collapse() {
        assert_eq!(canonical_room("101"), "101");
        assert_eq!(canonical_room(" 101 "), "101");
        assert_eq!(canonical_room("Room 101"), "101");
        assert_eq!(canonical_room("room101"), "101");
        assert_eq!(canonical_room("0101"), "101");
        assert_eq!(canonical_room("000"), "0");
    }

    #[test]
    fn room_names_keep_words_but_collapse_whitespace() {
        assert_eq!(canonical_room("Main   Hall"), "Main Hall");
        assert_eq!(canonical_room("  Main Hall "), "Main Hall");
        // "Room" only strips as a prefix word, not inside a name
        assert_eq!(canonical_room("Roomba 3"), "Roomba 3");
    }

    #[test]
    fn duration_single_option_resolves() {
        assert_eq!(classify_duration("20-30 minutes"), DurationField::Resolved(30));
        assert_eq!(classify_duration("40-50 minutes"), DurationField::Resolved(60));
        assert_eq!(classify_duration("60 minutes"), DurationField::Resolved(60));
    }

    #[test]
    fn absent_duration_is_the_empty_marker_not_a_guess() {
        assert_eq!(classify_duration(""), DurationField::Empty);
        assert_eq!(classify_duration("   "), DurationField::Empty);
        // non-empty text without numbers still classifies to the default class
        assert_eq!(classify_duration("short"), DurationField::Resolved(30));
    }

    #[test]
    fn duration_distinct_classes_are_ambiguous() {
        assert_eq!(
            classify_duration("20-30 minutes, 40-50 minutes"),
            DurationField::Ambiguous(vec![30, 60])
        );
    }

    #[test]
    fn duration_same_class_options_are_not_ambiguous() {
        assert_eq!(
            classify_duration("30 minutes, 20 minutes"),
            DurationField::Resolved(30)
        );
    }

    #[test]
    fn schedule_renders_event_datetime() {
        assert_eq!(
            canonical_schedule("1100", "2025-09-25"),
            "2025-09-25T11:00:00"
        );
        assert_eq!(
            canonical_schedule("0935", "2025-09-25"),
            "2025-09-25T09:35:00"
        );
        // bare hour
        assert_eq!(canonical_schedule("9", "2025-09-25"), "2025-09-25T09:00:00");
    }

    #[test]
    fn schedule_invalid_times_become_empty_marker() {
        assert_eq!(canonical_schedule("", "2025-09-25"), "");
        assert_eq!(canonical_schedule("noon", "2025-09-25"), "");
        assert_eq!(canonical_schedule("2460", "2025-09-25"), "");
        assert_eq!(canonical_schedule("930", "2025-09-25"), ""); // "93" is not an hour
    }
}
