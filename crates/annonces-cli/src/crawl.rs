//! `crawl` command: runs one crawl and writes its records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use annonces_core::{
    AppConfig, ContinuationPolicy, CrawlResult, FetchStrategy, FieldFailurePolicy,
};
use annonces_scraper::CrawlRequest;
use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;

use crate::export::write_csv;

#[derive(Debug, Args)]
pub(crate) struct CrawlArgs {
    /// Source display name or slug (see `sources`)
    #[arg(long)]
    pub source: String,

    /// Number of listing pages to crawl, starting from page 1
    #[arg(long)]
    pub pages: u32,

    /// Override the source's fetch strategy (rendered, direct)
    #[arg(long)]
    pub strategy: Option<FetchStrategy>,

    /// What to do when a page fails to load (fail-fast, best-effort)
    #[arg(long)]
    pub policy: Option<ContinuationPolicy>,

    /// What to do when a listing is missing a field (partial, discard)
    #[arg(long)]
    pub field_policy: Option<FieldFailurePolicy>,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Emit the whole result, errors included, as JSON instead of CSV
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    /// Applies command-line overrides on top of the environment config.
    pub(crate) fn apply_to(&self, config: &mut AppConfig) {
        if let Some(strategy) = self.strategy {
            config.fetch_strategy = Some(strategy);
        }
        if let Some(policy) = self.policy {
            config.continuation_policy = policy;
        }
        if let Some(field_policy) = self.field_policy {
            config.field_policy = field_policy;
        }
    }
}

/// Runs the crawl described by `args` and writes its output.
///
/// # Errors
///
/// Returns an error for an unknown source, an out-of-range page count, a
/// fetch session that cannot be opened, or an output that cannot be written.
/// Page- and listing-level failures are reported on stderr, not returned.
pub(crate) async fn run_crawl(
    mut config: AppConfig,
    args: &CrawlArgs,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    args.apply_to(&mut config);
    let request = CrawlRequest {
        source: args.source.clone(),
        page_count: args.pages,
    };

    let result = annonces_scraper::crawl(&request, &config, cancel)
        .await
        .with_context(|| format!("crawl of '{}' failed", args.source))?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_output(&result, args.json, BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => write_output(&result, args.json, std::io::stdout().lock())
            .context("failed to write to stdout")?,
    }

    eprint!("{}", summarize(&result));
    Ok(())
}

fn write_output<W: Write>(result: &CrawlResult, json: bool, mut writer: W) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut writer, result)?;
        writeln!(writer)?;
        writer.flush()?;
    } else {
        write_csv(result, writer)?;
    }
    Ok(())
}

/// Human-readable recap for stderr: counts, then every page-level failure,
/// then a count of listing-level problems.
fn summarize(result: &CrawlResult) -> String {
    let mut out = format!(
        "{}: {} records from {}/{} pages\n",
        result.source,
        result.records.len(),
        result.pages_fetched,
        result.pages_requested,
    );
    if result.cancelled {
        out.push_str("crawl was cancelled before all pages were visited\n");
    }
    for err in result.page_errors() {
        out.push_str(&format!("  {err}\n"));
    }
    let item_errors = result.errors.iter().filter(|e| !e.is_page_level()).count();
    if item_errors > 0 {
        out.push_str(&format!(
            "  {item_errors} listing-level problems (use --json for details)\n"
        ));
    }
    out
}
