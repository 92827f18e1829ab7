//! Metadata validation
//!
//! Frontmatter blocks are deserialized into permissive raw records (unknown
//! fields ignored, everything optional) and then checked into the typed
//! metadata. Validation collects every violated field into a single
//! [`ValidationError`] instead of stopping at the first.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{FieldIssue, ValidationError};

/// One dated revision note in a journal entry's changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    pub date: NaiveDate,
    pub description: String,
}

/// Validated metadata of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntryMetadata {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    /// Last-updated date. When a changelog is present this is always the
    /// maximum changelog date; an authored value is overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<NaiveDate>,
    pub pinned: bool,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Vec<ChangelogEntry>>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_note: Option<String>,
}

/// Validated metadata of a static page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawJournalMetadata {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    updated: Option<String>,
    pinned: Option<bool>,
    archived: Option<bool>,
    changelog: Option<Vec<RawChangelogEntry>>,
    deprecated: Option<bool>,
    deprecation_note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawChangelogEntry {
    date: Option<String>,
    description: Option<String>,
}

impl JournalEntryMetadata {
    /// Validate a raw frontmatter block into typed journal metadata.
    pub fn parse(matter: &str) -> Result<Self, ValidationError> {
        let raw = deserialize_raw::<RawJournalMetadata>(matter)?;
        raw.validate()
    }
}

impl PageMetadata {
    /// Validate a raw frontmatter block into typed page metadata.
    pub fn parse(matter: &str) -> Result<Self, ValidationError> {
        #[derive(Debug, Default, Deserialize)]
        #[serde(default)]
        struct RawPageMetadata {
            title: Option<String>,
        }

        let raw = deserialize_raw::<RawPageMetadata>(matter)?;
        let mut issues = Vec::new();
        let title = required_string("title", raw.title, &mut issues);
        if issues.is_empty() {
            Ok(Self { title })
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

impl RawJournalMetadata {
    fn validate(self) -> Result<JournalEntryMetadata, ValidationError> {
        let mut issues = Vec::new();

        let title = required_string("title", self.title, &mut issues);
        let description = required_string("description", self.description, &mut issues);
        let date = required_date("date", self.date, &mut issues);
        let mut updated = optional_date("updated", self.updated, &mut issues);

        let changelog: Option<Vec<ChangelogEntry>> = self.changelog.map(|raw_entries| {
            raw_entries
                .into_iter()
                .enumerate()
                .filter_map(|(index, raw)| raw.validate(index, &mut issues))
                .collect()
        });

        let deprecation_note = self
            .deprecation_note
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        // The changelog is the source of truth for "last updated": a
        // non-empty changelog overrides any authored `updated` value.
        if let Some(entries) = changelog.as_deref() {
            if let Some(latest) = entries.iter().map(|e| e.date).max() {
                updated = Some(latest);
            }
        }

        Ok(JournalEntryMetadata {
            title,
            description,
            date: date.unwrap_or_default(),
            updated,
            pinned: self.pinned.unwrap_or(false),
            archived: self.archived.unwrap_or(false),
            changelog,
            deprecated: self.deprecated.unwrap_or(false),
            deprecation_note,
        })
    }
}

impl RawChangelogEntry {
    fn validate(self, index: usize, issues: &mut Vec<FieldIssue>) -> Option<ChangelogEntry> {
        let date = match self.date {
            Some(s) => {
                let parsed = parse_date(&s);
                if parsed.is_none() {
                    issues.push(FieldIssue::new(
                        format!("changelog[{index}].date"),
                        "not a recognizable date",
                    ));
                }
                parsed
            }
            None => {
                issues.push(FieldIssue::new(format!("changelog[{index}].date"), "required"));
                None
            }
        };

        let description = match self.description {
            Some(s) => {
                let s = s.trim().to_string();
                if s.is_empty() {
                    issues.push(FieldIssue::new(
                        format!("changelog[{index}].description"),
                        "must be a non-empty string",
                    ));
                    None
                } else {
                    Some(s)
                }
            }
            None => {
                issues.push(FieldIssue::new(
                    format!("changelog[{index}].description"),
                    "required",
                ));
                None
            }
        };

        Some(ChangelogEntry {
            date: date?,
            description: description?,
        })
    }
}

fn deserialize_raw<T: Default + for<'de> Deserialize<'de>>(
    matter: &str,
) -> Result<T, ValidationError> {
    if matter.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(matter)
        .map_err(|e| ValidationError::single("frontmatter", e.to_string()))
}

fn required_string(field: &str, value: Option<String>, issues: &mut Vec<FieldIssue>) -> String {
    match value {
        Some(s) => {
            let s = s.trim().to_string();
            if s.is_empty() {
                issues.push(FieldIssue::new(field, "must be a non-empty string"));
            }
            s
        }
        None => {
            issues.push(FieldIssue::new(field, "required"));
            String::new()
        }
    }
}

fn required_date(
    field: &str,
    value: Option<String>,
    issues: &mut Vec<FieldIssue>,
) -> Option<NaiveDate> {
    match value {
        Some(s) => {
            let parsed = parse_date(&s);
            if parsed.is_none() {
                issues.push(FieldIssue::new(field, "not a recognizable date"));
            }
            parsed
        }
        None => {
            issues.push(FieldIssue::new(field, "required"));
            None
        }
    }
}

fn optional_date(
    field: &str,
    value: Option<String>,
    issues: &mut Vec<FieldIssue>,
) -> Option<NaiveDate> {
    let s = value?;
    let parsed = parse_date(&s);
    if parsed.is_none() {
        issues.push(FieldIssue::new(field, "not a recognizable date"));
    }
    parsed
}

/// Parse a date string in various formats.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Datetime forms; the time is discarded
    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    None
}
