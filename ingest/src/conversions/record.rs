//! Normalization of a [`RawRecord`] into a [`CleanRecord`].
//!
//! Any failure drops the whole record, even for trivially recoverable cases
//! like a single malformed timestamp. The drop carries an explicit
//! [`DropReason`] so callers can count and report what was lost.

use std::collections::BTreeSet;

use chrono::DateTime;

use crate::conversions::text::scrub;
use crate::types::{CleanRecord, DropReason, RawRecord, RecordDrop};

/// Normalizes one raw record, or reports why it had to be dropped.
///
/// Sub-steps, in order: author repair, text repair, category expansion, and
/// date derivation from the version timestamps. See the field documentation on
/// [`CleanRecord`] for the exact output shape.
pub fn normalize(raw: RawRecord) -> Result<CleanRecord, RecordDrop> {
    let id = raw
        .id
        .ok_or_else(|| RecordDrop::new(None, DropReason::MissingId))?;

    let drop = |reason| RecordDrop::new(Some(id.clone()), reason);

    // The reader filters null submitters before records enter the pipeline, but
    // normalization must hold on its own for callers that feed it directly.
    let submitter = raw.submitter.ok_or_else(|| drop(DropReason::MissingSubmitter))?;

    let authors = repair_authors(&raw.authors_parsed, &submitter);

    let title = scrub(&raw.title.ok_or_else(|| drop(DropReason::MissingTitle))?);
    let abstract_text = scrub(
        &raw.abstract_text
            .ok_or_else(|| drop(DropReason::MissingAbstract))?,
    );
    let comments = raw.comments.as_deref().map(scrub).unwrap_or_default();

    let categories = expand_categories(
        &raw.categories
            .ok_or_else(|| drop(DropReason::MissingCategories))?,
    );

    let (create_date, update_date) = derive_dates(&raw.versions, &drop)?;

    Ok(CleanRecord {
        id,
        submitter,
        authors,
        title,
        comments,
        journal_ref: raw.journal_ref,
        doi: raw.doi,
        categories,
        abstract_text,
        create_date,
        update_date,
    })
}

/// Joins each structured author tuple into one name and deduplicates.
///
/// Embedded newlines are stripped, anything after a double-space separator is
/// cut off, and the submitter is always part of the result. Materialized in
/// sorted order so the output is stable across runs.
fn repair_authors(authors_parsed: &[Vec<String>], submitter: &str) -> Vec<String> {
    let mut authors = BTreeSet::new();

    for author in authors_parsed {
        let full_name = author.join(" ").replace('\n', "");
        let full_name = full_name.split("  ").next().unwrap_or("").trim().to_string();
        if !full_name.is_empty() {
            authors.insert(full_name);
        }
    }

    authors.insert(submitter.to_string());

    authors.into_iter().collect()
}

/// Expands the space-delimited category string into a sorted, duplicate-free list.
///
/// Every dotted `major.minor` token also contributes its standalone `major`
/// prefix; tokens without a dot are taken as-is.
fn expand_categories(categories: &str) -> Vec<String> {
    let mut expanded = BTreeSet::new();

    for token in categories.split_whitespace() {
        if let Some((major, _minor)) = token.split_once('.') {
            expanded.insert(major.to_string());
        }
        expanded.insert(token.to_string());
    }

    expanded.into_iter().collect()
}

/// Derives the create and update calendar dates from the version timestamps.
///
/// The minimum creation timestamp becomes `create_date`, the maximum becomes
/// `update_date`, each formatted as `YYYY-MM-DD`.
fn derive_dates(
    versions: &[crate::types::RawVersion],
    drop: &impl Fn(DropReason) -> RecordDrop,
) -> Result<(String, String), RecordDrop> {
    if versions.is_empty() {
        return Err(drop(DropReason::NoVersions));
    }

    let mut stamps = Vec::with_capacity(versions.len());
    for version in versions {
        let created = version
            .created
            .as_deref()
            .ok_or_else(|| drop(DropReason::InvalidTimestamp))?;
        let stamp = DateTime::parse_from_rfc2822(created)
            .map_err(|_| drop(DropReason::InvalidTimestamp))?;

        stamps.push(stamp);
    }

    stamps.sort();

    let create_date = stamps[0].format("%Y-%m-%d").to_string();
    let update_date = stamps[stamps.len() - 1].format("%Y-%m-%d").to_string();

    Ok((create_date, update_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawVersion;

    fn raw_record() -> RawRecord {
        RawRecord {
            id: Some("0704.0001".to_string()),
            submitter: Some("Jane Roe".to_string()),
            authors_parsed: vec![
                vec!["Doe".to_string(), "John".to_string(), "".to_string()],
                vec!["Roe".to_string(), "Jane".to_string(), "".to_string()],
            ],
            title: Some("A study\n  of things".to_string()),
            abstract_text: Some("  We study $x$.  ".to_string()),
            comments: Some("12 pages".to_string()),
            journal_ref: None,
            doi: None,
            categories: Some("cs.AI math.GT".to_string()),
            versions: vec![
                RawVersion {
                    version: "v1".to_string(),
                    created: Some("Mon, 2 Apr 2007 19:18:42 GMT".to_string()),
                },
                RawVersion {
                    version: "v2".to_string(),
                    created: Some("Tue, 24 Jul 2007 20:10:27 GMT".to_string()),
                },
            ],
            update_date: Some("2007-07-24".to_string()),
        }
    }

    #[test]
    fn normalizes_a_well_formed_record() {
        let clean = normalize(raw_record()).unwrap();

        assert_eq!(clean.id, "0704.0001");
        assert_eq!(clean.title, "A study of things");
        assert_eq!(clean.abstract_text, "We study x.");
        assert_eq!(clean.create_date, "2007-04-02");
        assert_eq!(clean.update_date, "2007-07-24");
    }

    #[test]
    fn submitter_is_in_authors_exactly_once() {
        let mut raw = raw_record();
        // The submitter also appears among the parsed authors.
        raw.authors_parsed
            .push(vec!["Jane Roe".to_string(), "".to_string()]);

        let clean = normalize(raw).unwrap();
        let occurrences = clean.authors.iter().filter(|a| *a == "Jane Roe").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn author_tuples_are_joined_and_cut_at_double_space() {
        let mut raw = raw_record();
        raw.authors_parsed = vec![vec![
            "Doe".to_string(),
            "John".to_string(),
            " (affiliation)".to_string(),
        ]];

        let clean = normalize(raw).unwrap();
        assert!(clean.authors.contains(&"Doe John".to_string()));
    }

    #[test]
    fn dotted_categories_contribute_their_major_prefix() {
        let clean = normalize(raw_record()).unwrap();

        assert_eq!(
            clean.categories,
            vec!["cs", "cs.AI", "math", "math.GT"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn undotted_categories_are_taken_as_is() {
        let mut raw = raw_record();
        raw.categories = Some("hep-ph".to_string());

        let clean = normalize(raw).unwrap();
        assert_eq!(clean.categories, vec!["hep-ph".to_string()]);
    }

    #[test]
    fn duplicate_category_tokens_collapse() {
        let mut raw = raw_record();
        raw.categories = Some("cs.AI cs.LG cs".to_string());

        let clean = normalize(raw).unwrap();
        assert_eq!(
            clean.categories,
            vec!["cs".to_string(), "cs.AI".to_string(), "cs.LG".to_string()]
        );
    }

    #[test]
    fn absent_comments_become_an_empty_string() {
        let mut raw = raw_record();
        raw.comments = None;

        let clean = normalize(raw).unwrap();
        assert_eq!(clean.comments, "");
    }

    #[test]
    fn missing_versions_drop_the_record() {
        let mut raw = raw_record();
        raw.versions = vec![];

        let err = normalize(raw).unwrap_err();
        assert_eq!(err.reason, DropReason::NoVersions);
        assert_eq!(err.id.as_deref(), Some("0704.0001"));
    }

    #[test]
    fn one_bad_timestamp_drops_the_whole_record() {
        let mut raw = raw_record();
        raw.versions.push(RawVersion {
            version: "v3".to_string(),
            created: Some("not a date".to_string()),
        });

        let err = normalize(raw).unwrap_err();
        assert_eq!(err.reason, DropReason::InvalidTimestamp);
    }

    #[test]
    fn missing_submitter_drops_the_record() {
        let mut raw = raw_record();
        raw.submitter = None;

        let err = normalize(raw).unwrap_err();
        assert_eq!(err.reason, DropReason::MissingSubmitter);
    }
}
