//! Built-in listing sources and the registry that resolves them by name.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::app_config::FetchStrategy;
use crate::records::FieldRole;
use crate::ConfigError;

/// Key of a built-in source. Dispatch goes through this enum, never through
/// display-name comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteId {
    DakarventeApartmentsRent,
    DakarventeApartmentsSale,
    DakarventeLandSale,
    CoinafriqueDogs,
    CoinafriqueSheep,
    CoinafriquePoultry,
    CoinafriqueOtherAnimals,
}

impl SiteId {
    pub const ALL: [SiteId; 7] = [
        SiteId::DakarventeApartmentsRent,
        SiteId::DakarventeApartmentsSale,
        SiteId::DakarventeLandSale,
        SiteId::CoinafriqueDogs,
        SiteId::CoinafriqueSheep,
        SiteId::CoinafriquePoultry,
        SiteId::CoinafriqueOtherAnimals,
    ];
}

/// One step of a structural path: the `nth` (1-based) child element named `tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStep {
    pub tag: &'static str,
    pub nth: usize,
}

/// How a single field value is located inside a listing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Inner text of the first descendant matching a CSS selector.
    Text(&'static str),
    /// Attribute value of the first descendant matching a CSS selector.
    Attr {
        selector: &'static str,
        attr: &'static str,
    },
    /// URL embedded in the `style` attribute (`url(...)`) of the first match.
    StyleUrl(&'static str),
    /// Inner text at a fixed child-element path from the container.
    ChildPath(&'static [PathStep]),
}

/// A column: its display name and the locators tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub column: &'static str,
    pub locators: &'static [Locator],
}

/// A URL pattern with a `{page}` placeholder for the 1-based page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub const PLACEHOLDER: &'static str = "{page}";

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the pattern has no `{page}` placeholder.
    pub fn new(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        if !pattern.contains(Self::PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                kind: "url template",
                value: pattern,
                expected: "a URL containing {page}",
            });
        }
        Ok(Self(pattern))
    }

    #[must_use]
    pub fn render(&self, page: u32) -> String {
        self.0.replace(Self::PLACEHOLDER, &page.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct SiteDescriptor {
    pub id: SiteId,
    pub name: &'static str,
    pub slug: &'static str,
    /// Scheme and host that relative links are resolved against.
    pub origin: String,
    pub url_template: UrlTemplate,
    pub strategy: FetchStrategy,
    /// CSS selector matching one listing container.
    pub listing_selector: &'static str,
    /// Field specs in [`FieldRole::ALL`] order.
    pub fields: [FieldSpec; 4],
}

impl SiteDescriptor {
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.render(page)
    }

    #[must_use]
    pub fn field(&self, role: FieldRole) -> &FieldSpec {
        &self.fields[role.index()]
    }

    #[must_use]
    pub fn columns(&self) -> [&'static str; 4] {
        self.fields.map(|f| f.column)
    }
}

/// Resolves source names to descriptors. Built once, never mutated.
#[derive(Debug)]
pub struct SiteRegistry {
    sites: Vec<SiteDescriptor>,
    index: HashMap<String, usize>,
}

static BUILTIN: LazyLock<SiteRegistry> = LazyLock::new(|| SiteRegistry::new(builtin_sites()));

impl SiteRegistry {
    /// Indexes `sites` by lowercase display name and by slug.
    #[must_use]
    pub fn new(sites: Vec<SiteDescriptor>) -> Self {
        let mut index = HashMap::with_capacity(sites.len() * 2);
        for (i, site) in sites.iter().enumerate() {
            index.insert(lookup_key(site.name), i);
            index.insert(lookup_key(site.slug), i);
        }
        Self { sites, index }
    }

    /// The process-wide registry of built-in sources.
    #[must_use]
    pub fn builtin() -> &'static SiteRegistry {
        &BUILTIN
    }

    /// Looks up a source by display name or slug (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSource`] if nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&SiteDescriptor, ConfigError> {
        self.index
            .get(&lookup_key(name))
            .map(|&i| &self.sites[i])
            .ok_or_else(|| ConfigError::UnknownSource {
                name: name.to_owned(),
            })
    }

    #[must_use]
    pub fn get(&self, id: SiteId) -> Option<&SiteDescriptor> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// All sources in registration order.
    pub fn all(&self) -> impl Iterator<Item = &SiteDescriptor> {
        self.sites.iter()
    }
}

fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

const DAKARVENTE_ORIGIN: &str = "https://dakarvente.com";
const COINAFRIQUE_ORIGIN: &str = "https://sn.coinafrique.com";

const DAKARVENTE_LISTING: &str = "[class='item-inner mv-effect-translate-1 mv-box-shadow-gray-1']";
const COINAFRIQUE_LISTING: &str = "div.col.s6.m4.l3";

const DAKARVENTE_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        column: "details",
        locators: &[Locator::Text(".content-desc")],
    },
    FieldSpec {
        column: "price",
        locators: &[Locator::Text(".content-price")],
    },
    FieldSpec {
        column: "location",
        locators: &[
            Locator::Text(".content-location"),
            Locator::ChildPath(&[
                PathStep { tag: "div", nth: 4 },
                PathStep { tag: "span", nth: 1 },
            ]),
        ],
    },
    FieldSpec {
        column: "image_link",
        locators: &[
            Locator::Attr {
                selector: "h2 a[href]",
                attr: "href",
            },
            Locator::Attr {
                selector: "a[href]",
                attr: "href",
            },
        ],
    },
];

const COINAFRIQUE_FIELDS: [FieldSpec; 4] = [
    FieldSpec {
        column: "Nom",
        locators: &[
            Locator::Text("p.ad__card-description"),
            Locator::Attr {
                selector: "img.ad__card-img",
                attr: "alt",
            },
        ],
    },
    FieldSpec {
        column: "Prix",
        locators: &[Locator::Text("p.ad__card-price")],
    },
    FieldSpec {
        column: "Adresse",
        locators: &[
            Locator::Text("p.ad__card-location span"),
            Locator::Text("p.ad__card-location"),
        ],
    },
    FieldSpec {
        column: "Image Link",
        locators: &[
            Locator::Attr {
                selector: "img.ad__card-img",
                attr: "src",
            },
            Locator::StyleUrl("[style*='url(']"),
            Locator::Attr {
                selector: "a.card-image",
                attr: "href",
            },
        ],
    },
];

fn dakarvente(
    id: SiteId,
    name: &'static str,
    slug: &'static str,
    path: &str,
    category: u32,
) -> SiteDescriptor {
    SiteDescriptor {
        id,
        name,
        slug,
        origin: DAKARVENTE_ORIGIN.to_owned(),
        url_template: UrlTemplate(format!(
            "{DAKARVENTE_ORIGIN}/{path}?page=annonces_categorie&id={category}&sort=&nb={{page}}"
        )),
        strategy: FetchStrategy::Rendered,
        listing_selector: DAKARVENTE_LISTING,
        fields: DAKARVENTE_FIELDS,
    }
}

fn coinafrique(
    id: SiteId,
    name: &'static str,
    slug: &'static str,
    category: &str,
) -> SiteDescriptor {
    SiteDescriptor {
        id,
        name,
        slug,
        origin: COINAFRIQUE_ORIGIN.to_owned(),
        url_template: UrlTemplate(format!(
            "{COINAFRIQUE_ORIGIN}/categorie/{category}?page={{page}}"
        )),
        strategy: FetchStrategy::Direct,
        listing_selector: COINAFRIQUE_LISTING,
        fields: COINAFRIQUE_FIELDS,
    }
}

fn builtin_sites() -> Vec<SiteDescriptor> {
    SiteId::ALL
        .into_iter()
        .map(|id| match id {
            SiteId::DakarventeApartmentsRent => dakarvente(
                id,
                "Appartement à louer",
                "dakarvente-appartements-louer",
                "annonces-categorie-appartements-louer-10.html",
                10,
            ),
            SiteId::DakarventeApartmentsSale => dakarvente(
                id,
                "Appartement à vendre",
                "dakarvente-appartements-vendre",
                "annonces-categorie-appartements-vendre-61.html",
                61,
            ),
            SiteId::DakarventeLandSale => dakarvente(
                id,
                "Terrain à vendre",
                "dakarvente-terrains-vendre",
                "annonces-categorie-terrains-vendre-13.html",
                13,
            ),
            SiteId::CoinafriqueDogs => {
                coinafrique(id, "Chiens à vendre", "coinafrique-chiens", "chiens")
            }
            SiteId::CoinafriqueSheep => {
                coinafrique(id, "Moutons à vendre", "coinafrique-moutons", "moutons")
            }
            SiteId::CoinafriquePoultry => coinafrique(
                id,
                "Poules, lapins et pigeons à vendre",
                "coinafrique-poules-lapins-pigeons",
                "poules-lapins-et-pigeons",
            ),
            SiteId::CoinafriqueOtherAnimals => coinafrique(
                id,
                "Autres animaux",
                "coinafrique-autres-animaux",
                "autres-animaux",
            ),
        })
        .collect()
}

#[cfg(test)]
#[path = "sites_test.rs"]
mod tests;
