//! Page-index iteration for numbered listing pages.
//!
//! Every source paginates with a 1-based page number substituted into its
//! URL template (`?page=3`, `&nb=3`). A crawl of `n` pages visits indices
//! `1..=n` exactly once each, in increasing order.

use annonces_core::{ConfigError, SiteDescriptor, MAX_PAGES};

/// Checks that a requested page count is within `1..=MAX_PAGES`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPageCount`] for zero or anything above [`MAX_PAGES`].
pub fn validate_page_count(requested: u32) -> Result<u32, ConfigError> {
    if (1..=MAX_PAGES).contains(&requested) {
        Ok(requested)
    } else {
        Err(ConfigError::InvalidPageCount {
            requested,
            max: MAX_PAGES,
        })
    }
}

/// Yields `(page, url)` for pages `1..=page_count` of `site`.
pub fn page_urls(
    site: &SiteDescriptor,
    page_count: u32,
) -> impl Iterator<Item = (u32, String)> + '_ {
    (1..=page_count).map(move |page| (page, site.page_url(page)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use annonces_core::{SiteId, SiteRegistry};

    use super::*;

    fn dogs() -> &'static SiteDescriptor {
        SiteRegistry::builtin()
            .get(SiteId::CoinafriqueDogs)
            .expect("builtin site")
    }

    #[test]
    fn zero_pages_is_rejected() {
        assert!(matches!(
            validate_page_count(0),
            Err(ConfigError::InvalidPageCount { requested: 0, .. })
        ));
    }

    #[test]
    fn more_than_max_pages_is_rejected() {
        assert!(validate_page_count(MAX_PAGES + 1).is_err());
    }

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(validate_page_count(1).unwrap(), 1);
        assert_eq!(validate_page_count(MAX_PAGES).unwrap(), MAX_PAGES);
    }

    #[test]
    fn single_page_yields_single_url() {
        let urls: Vec<_> = page_urls(dogs(), 1).collect();
        assert_eq!(
            urls,
            vec![(1, "https://sn.coinafrique.com/categorie/chiens?page=1".to_owned())]
        );
    }

    #[test]
    fn pages_are_increasing_and_distinct() {
        let urls: Vec<_> = page_urls(dogs(), 5).collect();
        let pages: Vec<u32> = urls.iter().map(|(p, _)| *p).collect();
        assert_eq!(pages, vec![1, 2, 3, 4, 5]);
        let distinct: HashSet<&String> = urls.iter().map(|(_, u)| u).collect();
        assert_eq!(distinct.len(), 5);
        assert!(urls[4].1.ends_with("page=5"));
    }
}
