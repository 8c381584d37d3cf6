//! `sources` command: prints the registered listing sources.

use annonces_core::{SiteDescriptor, SiteRegistry};

pub(crate) fn run_sources() {
    let registry = SiteRegistry::builtin();
    let slug_width = registry.all().map(|s| s.slug.len()).max().unwrap_or(0);
    println!("{:<slug_width$}  {:<8}  NAME", "SLUG", "FETCH");
    for site in registry.all() {
        println!("{}", format_source_line(site, slug_width));
    }
}

fn format_source_line(site: &SiteDescriptor, slug_width: usize) -> String {
    format!(
        "{:<slug_width$}  {:<8}  {}\n{:<slug_width$}  {:<8}  {}",
        site.slug,
        site.strategy.to_string(),
        site.name,
        "",
        "",
        site.url_template.as_str(),
    )
}
