pub mod crawl;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pagination;
pub mod parse;
mod rate_limit;

pub use crawl::{crawl, crawl_site, Crawl, CrawlOptions, CrawlRequest};
pub use error::ScraperError;
pub use fetch::{open_fetcher, HttpFetcher, PageFetcher, RenderedFetcher, RenderedSettings};
pub use normalize::normalize_price;
pub use parse::CompiledSite;
