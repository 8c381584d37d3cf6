//! CSV export of crawl results.
//!
//! Files are UTF-8, comma-delimited, with a header row of the source's
//! column names and one row per record in result order. An absent field is
//! an empty cell, and an empty cell reads back as absent.

use std::io::Write;

use annonces_core::CrawlResult;

/// Writes `result` as CSV and returns the number of data rows written.
///
/// # Errors
///
/// Returns [`csv::Error`] if writing to `writer` fails.
pub(crate) fn write_csv<W: Write>(result: &CrawlResult, writer: W) -> csv::Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(result.columns)?;
    for record in &result.records {
        out.write_record(record.values().map(|v| v.unwrap_or_default()))?;
    }
    out.flush()?;
    Ok(result.records.len())
}
