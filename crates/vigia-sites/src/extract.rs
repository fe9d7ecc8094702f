//! Listing extraction from a rendered result page.

use crate::definition::SiteConfig;
use scraper::Html;
use serde::Serialize;
use vigia_core::Site;

/// One listing card read from a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Site the listing came from
    pub site: Site,
    /// Site-specific listing id, when the URL carries one
    pub external_id: Option<String>,
    /// Canonical listing URL
    pub url: String,
    /// Listing title
    pub title: Option<String>,
    /// Price in centavos
    pub price_cents: Option<i64>,
    /// Displayed location
    pub location: Option<String>,
    /// Thumbnail URL
    pub image_url: Option<String>,
}

/// Read every listing card from `html` using the site's selectors.
///
/// Cards without a usable link are skipped; duplicates (same canonical URL)
/// are kept once, first occurrence wins.
#[must_use]
pub fn extract_listings(config: &SiteConfig, html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let selectors = &config.selectors;
    let mut seen = std::collections::HashSet::new();
    let mut listings = Vec::new();

    for card in selectors.container.all_matches(&document) {
        // Some layouts make the card itself the anchor.
        let href = selectors
            .link
            .attr_in(card, "href")
            .or_else(|| card.value().attr("href").map(ToString::to_string));
        let Some(url) = href.as_deref().and_then(config.normalize_url) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let image_url = selectors
            .image
            .attr_in(card, "src")
            .or_else(|| selectors.image.attr_in(card, "data-src"));

        listings.push(Listing {
            site: config.site,
            external_id: (config.external_id)(&url),
            title: selectors.title.text_in(card),
            price_cents: selectors
                .price
                .text_in(card)
                .and_then(|text| (config.price_parser)(&text)),
            location: selectors.location.text_in(card),
            image_url,
            url,
        });
    }

    tracing::debug!(site = %config.site, count = listings.len(), "extracted listings");
    listings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::config_for;

    const OLX_PAGE: &str = r#"
        <html><body>
          <section class="olx-adcard">
            <a class="olx-adcard__link" href="https://sp.olx.com.br/autos/bicicleta-aro-29-1234567890?lis=1">
              <h2 class="olx-adcard__title">Bicicleta aro 29</h2>
            </a>
            <h3 class="olx-adcard__price">R$ 1.250</h3>
            <p class="olx-adcard__location">São Paulo, SP</p>
            <div class="olx-adcard__media"><img src="https://img.olx.com.br/1.jpg"></div>
          </section>
          <section class="olx-adcard">
            <a class="olx-adcard__link" href="https://sp.olx.com.br/autos/bicicleta-aro-29-1234567890">
              <h2 class="olx-adcard__title">Bicicleta aro 29 (repost)</h2>
            </a>
          </section>
          <section class="olx-adcard">
            <h2 class="olx-adcard__title">No link here</h2>
          </section>
        </body></html>
    "#;

    #[test]
    fn test_extracts_cards_with_site_parsers() {
        let listings = extract_listings(&config_for(Site::Olx), OLX_PAGE);

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(
            listing.url,
            "https://sp.olx.com.br/autos/bicicleta-aro-29-1234567890"
        );
        assert_eq!(listing.external_id.as_deref(), Some("1234567890"));
        assert_eq!(listing.title.as_deref(), Some("Bicicleta aro 29"));
        assert_eq!(listing.price_cents, Some(125_000));
        assert_eq!(listing.location.as_deref(), Some("São Paulo, SP"));
        assert_eq!(
            listing.image_url.as_deref(),
            Some("https://img.olx.com.br/1.jpg")
        );
    }

    #[test]
    fn test_card_that_is_itself_the_anchor() {
        let page = r#"<a href="/marketplace/item/42/?ref=search"><span class="x1lliihq">Sofá</span><span class="x193iq5w">R$ 300</span></a>"#;
        let listings = extract_listings(&config_for(Site::FacebookMarketplace), page);

        assert_eq!(listings.len(), 1);
        assert_eq!(
            listings[0].url,
            "https://www.facebook.com/marketplace/item/42/"
        );
        assert_eq!(listings[0].price_cents, Some(30_000));
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(extract_listings(&config_for(Site::MercadoLivre), "<html></html>").is_empty());
    }
}
