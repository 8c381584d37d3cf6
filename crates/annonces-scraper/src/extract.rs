//! Turns one fetched page into records and item-level errors.
//!
//! Everything here is synchronous: the parsed document is `!Send` and must
//! be dropped before the crawl awaits its next fetch.

use annonces_core::{ErrorContext, ExtractedRecord, ExtractionError, FieldFailurePolicy, FieldRole};
use scraper::ElementRef;

use crate::parse::{parse_document, CompiledSite};

/// Result of extracting a single listing container.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ItemOutcome {
    pub record: Option<ExtractedRecord>,
    pub errors: Vec<ExtractionError>,
}

/// What one page produced, in document order.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub containers: usize,
    pub records: Vec<ExtractedRecord>,
    pub errors: Vec<ExtractionError>,
}

/// Applies `policy` to the fields resolved for one container.
///
/// Under [`FieldFailurePolicy::Partial`] each missing field is reported and
/// the rest of the record is kept; a container where nothing resolves yields
/// no record and a single parse failure. Under
/// [`FieldFailurePolicy::DiscardRecord`] the first missing field drops the
/// record.
#[must_use]
pub fn extract_item(
    site: &CompiledSite<'_>,
    container: ElementRef<'_>,
    context: ErrorContext,
    policy: FieldFailurePolicy,
) -> ItemOutcome {
    let record = ExtractedRecord::from_values(site.extract_values(container));
    let columns = site.site().columns();
    let missing: Vec<&'static str> = FieldRole::ALL
        .into_iter()
        .filter(|&role| record.get(role).is_none())
        .map(|role| columns[role.index()])
        .collect();

    if record.is_empty() {
        return ItemOutcome {
            record: None,
            errors: vec![ExtractionError::parse(
                context,
                "listing container has none of the expected fields",
            )],
        };
    }

    match policy {
        FieldFailurePolicy::Partial => ItemOutcome {
            errors: missing
                .into_iter()
                .map(|column| ExtractionError::element_not_found(context, column))
                .collect(),
            record: Some(record),
        },
        FieldFailurePolicy::DiscardRecord => match missing.first() {
            Some(column) => ItemOutcome {
                record: None,
                errors: vec![ExtractionError::element_not_found(context, *column)],
            },
            None => ItemOutcome {
                record: Some(record),
                errors: Vec::new(),
            },
        },
    }
}

/// Parses `html` and extracts every listing container on page `page`.
///
/// A page without containers is an empty success.
#[must_use]
pub fn extract_page(
    site: &CompiledSite<'_>,
    html: &str,
    page: u32,
    policy: FieldFailurePolicy,
) -> PageExtraction {
    let document = parse_document(html);
    let containers = site.find_containers(&document);

    let mut extraction = PageExtraction {
        containers: containers.len(),
        ..PageExtraction::default()
    };
    for (i, container) in containers.into_iter().enumerate() {
        let outcome = extract_item(site, container, ErrorContext::item(page, i + 1), policy);
        extraction.records.extend(outcome.record);
        extraction.errors.extend(outcome.errors);
    }
    extraction
}
