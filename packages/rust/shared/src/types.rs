//! Core domain types: page requests, score records, row layout, and the
//! upstream response envelope.

use std::fmt;

use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

/// Records per upstream page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Rows reserved at the top of the output table (the column titles).
pub const HEADER_ROWS: usize = 1;

/// Fixed column titles, in output order.
pub const COLUMN_TITLES: [&str; 6] = [
    "School Code",
    "School Name",
    "Major Code",
    "Major Name",
    "Subject Group",
    "Score",
];

// ---------------------------------------------------------------------------
// PageRequest
// ---------------------------------------------------------------------------

/// One page to fetch. Built by the coordinator for each dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page_index: u32,
    /// Exam year the listing is filtered on.
    pub year: i32,
    /// Records per page.
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page_index: u32, year: i32, page_size: u32) -> Self {
        Self {
            page_index,
            year,
            page_size,
        }
    }

    /// Destination row of this page's first record.
    pub fn row_offset(&self) -> usize {
        row_offset(self.page_index, self.page_size)
    }
}

/// Destination row (0-based, header at row 0) of the first record on a page.
///
/// Pages own the fixed stride `[offset, offset + page_size)`, so the offset
/// never depends on the order in which pages complete.
pub fn row_offset(page_index: u32, page_size: u32) -> usize {
    HEADER_ROWS + page_index as usize * page_size as usize
}

// ---------------------------------------------------------------------------
// ScoreRecord
// ---------------------------------------------------------------------------

/// One row of the output table.
///
/// Every field is kept as the source sent it; `score` may hold non-numeric
/// sentinels and is never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreRecord {
    pub school_code: String,
    pub school_name: String,
    pub major_code: String,
    pub major_name: String,
    pub subject_group: String,
    pub score: String,
}

impl ScoreRecord {
    /// Cells in column order (see [`COLUMN_TITLES`]).
    pub fn cells(&self) -> [&str; 6] {
        [
            self.school_code.as_str(),
            self.school_name.as_str(),
            self.major_code.as_str(),
            self.major_name.as_str(),
            self.subject_group.as_str(),
            self.score.as_str(),
        ]
    }
}

impl From<ScoreEntry> for ScoreRecord {
    fn from(entry: ScoreEntry) -> Self {
        Self {
            school_code: entry.school_code,
            school_name: entry.school_name,
            major_code: entry.majors_code,
            major_name: entry.majors_name,
            subject_group: entry.subject_group,
            score: entry.score,
        }
    }
}

/// What a successfully fetched page contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// At least one record, in source order.
    Records(Vec<ScoreRecord>),
    /// No records: the page is past the end of the data, or the source had
    /// nothing for it. Not an error.
    Empty,
}

impl PageContent {
    /// Normalize an optional list from the wire into a page result.
    pub fn from_entries(entries: Option<Vec<ScoreEntry>>) -> Self {
        match entries {
            Some(entries) if !entries.is_empty() => {
                Self::Records(entries.into_iter().map(ScoreRecord::from).collect())
            }
            _ => Self::Empty,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Upstream envelope
// ---------------------------------------------------------------------------

/// Top-level JSON envelope returned by the score listing endpoint.
///
/// Only the fields the pipeline reads are modeled; the rest are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEnvelope {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub data: Option<ScoreData>,
}

impl ScoreEnvelope {
    /// Take the score list out of `data.model.scores`, if present.
    pub fn into_entries(self) -> Option<Vec<ScoreEntry>> {
        self.data.and_then(|d| d.model).and_then(|m| m.scores)
    }
}

/// `data` object of the envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoreData {
    #[serde(default)]
    pub model: Option<ScoreModel>,
}

/// `data.model`: the score list plus paging metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreModel {
    #[serde(default)]
    pub scores: Option<Vec<ScoreEntry>>,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub page_index: i64,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub total_row: i64,
}

/// One entry of `data.model.scores` as sent on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreEntry {
    #[serde(deserialize_with = "scalar_as_string")]
    pub school_code: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub school_name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub score: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub majors_code: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub majors_name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub province_name: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub subject_group: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub school_slug: String,
    #[serde(deserialize_with = "scalar_as_string")]
    pub majors_slug: String,
}

/// Read any JSON scalar as its text. `null` reads as an empty string, and
/// numbers and booleans keep their printed form.
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number, boolean, or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<String, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}
