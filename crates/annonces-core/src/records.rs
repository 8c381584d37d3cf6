//! Records, errors, and the aggregated result of one crawl.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic role of one of the four extracted columns.
///
/// Column display names differ per source (`details` vs `Nom`), roles do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    PrimaryText,
    Price,
    Location,
    Link,
}

impl FieldRole {
    /// All roles in column order.
    pub const ALL: [FieldRole; 4] = [
        FieldRole::PrimaryText,
        FieldRole::Price,
        FieldRole::Location,
        FieldRole::Link,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            FieldRole::PrimaryText => 0,
            FieldRole::Price => 1,
            FieldRole::Location => 2,
            FieldRole::Link => 3,
        }
    }
}

/// The fields extracted from one listing.
///
/// Values are never empty strings: a blank value is stored as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    primary_text: Option<String>,
    price: Option<String>,
    location: Option<String>,
    link: Option<String>,
}

impl ExtractedRecord {
    /// Builds a record from values in [`FieldRole::ALL`] order.
    #[must_use]
    pub fn from_values(values: [Option<String>; 4]) -> Self {
        let [primary_text, price, location, link] = values.map(non_blank);
        Self {
            primary_text,
            price,
            location,
            link,
        }
    }

    #[must_use]
    pub fn get(&self, role: FieldRole) -> Option<&str> {
        match role {
            FieldRole::PrimaryText => self.primary_text.as_deref(),
            FieldRole::Price => self.price.as_deref(),
            FieldRole::Location => self.location.as_deref(),
            FieldRole::Link => self.link.as_deref(),
        }
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> [Option<&str>; 4] {
        FieldRole::ALL.map(|role| self.get(role))
    }

    /// `true` when every field is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values().iter().all(Option::is_some)
    }

    /// `true` when no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Where an [`ExtractionError`] happened. `item` is 1-based and absent for
/// page-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    pub page: u32,
    pub item: Option<usize>,
}

impl ErrorContext {
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self { page, item: None }
    }

    #[must_use]
    pub fn item(page: u32, item: usize) -> Self {
        Self {
            page,
            item: Some(item),
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item {
            Some(item) => write!(f, "page {}, item {item}", self.page),
            None => write!(f, "page {}", self.page),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorCause {
    #[error("element not found: {what}")]
    ElementNotFound { what: String },

    #[error("network failure: {message}")]
    NetworkFailure { message: String },

    #[error("parse failure: {message}")]
    ParseFailure { message: String },
}

/// A page- or item-level failure, reported alongside the records rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{context}: {cause}")]
pub struct ExtractionError {
    pub context: ErrorContext,
    pub cause: ErrorCause,
}

impl ExtractionError {
    #[must_use]
    pub fn element_not_found(context: ErrorContext, what: impl Into<String>) -> Self {
        Self {
            context,
            cause: ErrorCause::ElementNotFound { what: what.into() },
        }
    }

    #[must_use]
    pub fn network(page: u32, message: impl Into<String>) -> Self {
        Self {
            context: ErrorContext::page(page),
            cause: ErrorCause::NetworkFailure {
                message: message.into(),
            },
        }
    }

    #[must_use]
    pub fn parse(context: ErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            cause: ErrorCause::ParseFailure {
                message: message.into(),
            },
        }
    }

    /// `true` for failures that cover a whole page.
    #[must_use]
    pub fn is_page_level(&self) -> bool {
        self.context.item.is_none()
    }
}

/// Everything one crawl produced, in page order then document order.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub source: String,
    /// Display names of the four columns, in [`FieldRole::ALL`] order.
    pub columns: [&'static str; 4],
    pub pages_requested: u32,
    pub pages_fetched: u32,
    pub records: Vec<ExtractedRecord>,
    pub errors: Vec<ExtractionError>,
    /// Set when a cancellation token stopped the crawl early.
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlResult {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        columns: [&'static str; 4],
        pages_requested: u32,
    ) -> Self {
        Self {
            source: source.into(),
            columns,
            pages_requested,
            pages_fetched: 0,
            records: Vec::new(),
            errors: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Page-level failures only.
    pub fn page_errors(&self) -> impl Iterator<Item = &ExtractionError> {
        self.errors.iter().filter(|e| e.is_page_level())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
