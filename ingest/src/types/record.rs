//! Raw and cleaned record types for the metadata dump.
//!
//! [`RawRecord`] is the as-parsed JSON object for one input line of the dump.
//! Every field that downstream stages enforce is optional or defaulted here, so
//! that a structurally valid JSON line always parses and field-level problems
//! surface as per-record drops in the transform stage rather than read errors.

use serde::{Deserialize, Serialize};

/// One version entry of a raw record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawVersion {
    /// Version label, e.g. `"v1"`.
    #[serde(default)]
    pub version: String,
    /// Creation timestamp in RFC 2822 form, e.g. `"Mon, 2 Apr 2007 19:18:42 GMT"`.
    pub created: Option<String>,
}

/// The as-parsed JSON object for one input line of the dump.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: Option<String>,
    pub submitter: Option<String>,
    /// Structured author-name tuples, typically `[last, first, suffix]`.
    #[serde(default)]
    pub authors_parsed: Vec<Vec<String>>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub comments: Option<String>,
    #[serde(rename = "journal-ref")]
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    /// Whitespace-joined category tokens, e.g. `"cs.AI math.GT"`.
    pub categories: Option<String>,
    #[serde(default)]
    pub versions: Vec<RawVersion>,
    pub update_date: Option<String>,
}

/// A fully normalized record, ready for both backing stores.
///
/// Every field required by the two sinks is present and of the declared type;
/// a record that cannot satisfy this is dropped during transformation instead
/// of being partially written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub id: String,
    pub submitter: String,
    /// Deduplicated author names, including the submitter, in sorted order.
    pub authors: Vec<String>,
    pub title: String,
    /// Scrubbed comments; an absent comment becomes an empty string, never null.
    pub comments: String,
    #[serde(rename = "journal-ref")]
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    /// Expanded category tokens: every `major.minor` token also contributes
    /// its standalone `major` prefix. Sorted, duplicate free.
    pub categories: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Calendar date of the earliest version, `YYYY-MM-DD`.
    pub create_date: String,
    /// Calendar date of the latest version, `YYYY-MM-DD`.
    pub update_date: String,
}

/// Why a record was discarded during normalization.
///
/// Drops are deliberate best-effort behavior: individual corrupt records must
/// never halt throughput. Keeping the reason explicit makes drop counts
/// observable and testable instead of silently suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    MissingId,
    MissingSubmitter,
    MissingTitle,
    MissingAbstract,
    MissingCategories,
    NoVersions,
    InvalidTimestamp,
}

impl DropReason {
    /// Stable lowercase name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MissingId => "missing_id",
            DropReason::MissingSubmitter => "missing_submitter",
            DropReason::MissingTitle => "missing_title",
            DropReason::MissingAbstract => "missing_abstract",
            DropReason::MissingCategories => "missing_categories",
            DropReason::NoVersions => "no_versions",
            DropReason::InvalidTimestamp => "invalid_timestamp",
        }
    }
}

/// The per-record failure result of normalization.
#[derive(Debug, Clone)]
pub struct RecordDrop {
    /// Identifier of the dropped record, when it was present.
    pub id: Option<String>,
    pub reason: DropReason,
}

impl RecordDrop {
    pub fn new(id: Option<String>, reason: DropReason) -> Self {
        Self { id, reason }
    }
}
