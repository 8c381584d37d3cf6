//! Listing-container discovery and per-field value lookup.
//!
//! A [`CompiledSite`] holds the parsed selectors of one source. It is built
//! once per crawl, so a malformed selector fails the crawl before any page
//! is requested instead of failing every listing on every page.

use annonces_core::{FieldRole, Locator, PathStep, SiteDescriptor};
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;
use crate::normalize::{clean_text, extract_style_url, normalize_price, resolve_link};

enum CompiledLocator {
    Text(Selector),
    Attr(Selector, &'static str),
    StyleUrl(Selector),
    ChildPath(&'static [PathStep]),
}

struct CompiledField {
    role: FieldRole,
    locators: Vec<CompiledLocator>,
}

/// Selectors of one source, ready to run against parsed pages.
pub struct CompiledSite<'s> {
    site: &'s SiteDescriptor,
    listing: Selector,
    fields: Vec<CompiledField>,
}

fn compile_selector(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_locator(locator: &Locator) -> Result<CompiledLocator, ScraperError> {
    Ok(match *locator {
        Locator::Text(css) => CompiledLocator::Text(compile_selector(css)?),
        Locator::Attr { selector, attr } => {
            CompiledLocator::Attr(compile_selector(selector)?, attr)
        }
        Locator::StyleUrl(css) => CompiledLocator::StyleUrl(compile_selector(css)?),
        Locator::ChildPath(steps) => CompiledLocator::ChildPath(steps),
    })
}

impl<'s> CompiledSite<'s> {
    /// Parses the listing selector and every field locator of `site`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first selector that
    /// does not parse.
    pub fn compile(site: &'s SiteDescriptor) -> Result<Self, ScraperError> {
        let listing = compile_selector(site.listing_selector)?;
        let fields = FieldRole::ALL
            .into_iter()
            .map(|role| {
                let locators = site
                    .field(role)
                    .locators
                    .iter()
                    .map(compile_locator)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledField { role, locators })
            })
            .collect::<Result<Vec<_>, ScraperError>>()?;
        Ok(Self {
            site,
            listing,
            fields,
        })
    }

    #[must_use]
    pub fn site(&self) -> &'s SiteDescriptor {
        self.site
    }

    /// Listing containers of `document`, in document order. An empty vector
    /// means the page has no listings, which is not an error.
    #[must_use]
    pub fn find_containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.listing).collect()
    }

    /// Resolves all four fields of one container, in [`FieldRole::ALL`] order.
    ///
    /// Each field is looked up on its own; a miss on one never affects the
    /// others. Values come back cleaned: prices normalized, links absolute.
    #[must_use]
    pub fn extract_values(&self, container: ElementRef<'_>) -> [Option<String>; 4] {
        let mut values: [Option<String>; 4] = Default::default();
        for field in &self.fields {
            values[field.role.index()] = field
                .locators
                .iter()
                .find_map(|locator| self.resolve(field.role, locator, container));
        }
        values
    }

    fn resolve(
        &self,
        role: FieldRole,
        locator: &CompiledLocator,
        container: ElementRef<'_>,
    ) -> Option<String> {
        let raw = match locator {
            CompiledLocator::Text(selector) => container
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty())?,
            CompiledLocator::Attr(selector, attr) => container
                .select(selector)
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())?
                .to_owned(),
            CompiledLocator::StyleUrl(selector) => container
                .select(selector)
                .filter_map(|el| el.value().attr("style"))
                .find_map(extract_style_url)?,
            CompiledLocator::ChildPath(steps) => element_text(follow_path(container, steps)?),
        };

        let value = match role {
            FieldRole::PrimaryText | FieldRole::Location => clean_text(&raw),
            FieldRole::Price => normalize_price(&raw),
            FieldRole::Link => resolve_link(&self.site.origin, &raw)?,
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Parses page markup. The returned document is `!Send`; keep it out of
/// `.await` points.
#[must_use]
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Walks child elements from `container`, taking the `nth` child named
/// `tag` at each step.
fn follow_path<'a>(container: ElementRef<'a>, steps: &[PathStep]) -> Option<ElementRef<'a>> {
    steps.iter().try_fold(container, |current, step| {
        current
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name().eq_ignore_ascii_case(step.tag))
            .nth(step.nth.checked_sub(1)?)
    })
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
