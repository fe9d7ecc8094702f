//! Built-in configuration for every supported marketplace.

use crate::definition::{
    AntiDetection, AuthMode, RateLimit, ScrollStrategy, Selectors, SiteConfig, StealthLevel,
    Timeouts,
};
use crate::parsers;
use crate::patterns::PagePatterns;
use crate::selectors::SelectorChain;
use vigia_core::Site;

const LOGIN_COMMON: &[&str] = &["faça login", "entre na sua conta", "acesse sua conta"];
const CHECKPOINT_COMMON: &[&str] = &[
    "não sou um robô",
    "captcha",
    "verifique que você é humano",
    "acesso negado",
];

fn chain(selectors: &[&str]) -> SelectorChain {
    SelectorChain::new(selectors.iter().copied())
}

fn with_common(specific: &[&'static str], common: &[&'static str]) -> Vec<&'static str> {
    specific.iter().chain(common).copied().collect()
}

fn domains(site: Site) -> Vec<String> {
    site.domains().iter().map(ToString::to_string).collect()
}

fn timeouts(retry_budgets_ms: &[u64], navigation_timeout_ms: u64, render_delay_ms: u64) -> Timeouts {
    Timeouts {
        retry_budgets_ms: retry_budgets_ms.to_vec(),
        navigation_timeout_ms,
        render_delay_ms,
    }
}

fn posture(stealth_level: StealthLevel, block_stylesheets: bool) -> AntiDetection {
    let careful = stealth_level >= StealthLevel::Standard;
    AntiDetection {
        stealth_level,
        block_images: true,
        block_fonts: true,
        block_media: true,
        block_stylesheets,
        randomize_viewport: careful,
        inject_stealth_scripts: careful,
    }
}

/// Configuration for one site.
#[must_use]
pub fn config_for(site: Site) -> SiteConfig {
    match site {
        Site::MercadoLivre => mercado_livre(),
        Site::FacebookMarketplace => facebook_marketplace(),
        Site::Olx => olx(),
        Site::ZapImoveis => zap_imoveis(),
        Site::VivaReal => viva_real(),
        Site::ImovelWeb => imovelweb(),
        Site::Superbid => superbid(),
        Site::SodreSantoro => sodre_santoro(),
        Site::MegaLeiloes => mega_leiloes(),
    }
}

/// Every built-in configuration, in [`Site::ALL`] order.
#[must_use]
pub fn builtin_configs() -> Vec<SiteConfig> {
    Site::ALL.into_iter().map(config_for).collect()
}

fn mercado_livre() -> SiteConfig {
    SiteConfig {
        site: Site::MercadoLivre,
        domains: domains(Site::MercadoLivre),
        auth_mode: AuthMode::CookiesOptional,
        search_url: "https://lista.mercadolivre.com.br/{query}".to_string(),
        selectors: Selectors {
            container: chain(&[
                "li.ui-search-layout__item",
                "div.poly-card",
                "div.ui-search-result__wrapper",
            ]),
            title: chain(&["h2.poly-component__title", "a.poly-component__title", "h2.ui-search-item__title"]),
            price: chain(&[
                "div.poly-price__current span.andes-money-amount",
                "span.andes-money-amount__fraction",
                "span.price-tag-fraction",
            ]),
            link: chain(&["a.poly-component__title", "a.ui-search-link", "a[href*='MLB']"]),
            location: chain(&["span.poly-component__location", "span.ui-search-item__location"]),
            image: chain(&["img.poly-component__picture", "img.ui-search-result-image__element"]),
        },
        rate_limit: RateLimit { tokens_per_min: 30 },
        timeouts: timeouts(&[15_000, 30_000, 60_000], 45_000, 1_500),
        scroll_strategy: ScrollStrategy::Fixed {
            steps: 4,
            delay_ms: 600,
        },
        anti_detection: posture(StealthLevel::Standard, false),
        patterns: PagePatterns::new(
            &[
                "não há anúncios que correspondam à sua busca",
                "escreva em outras palavras",
            ],
            &with_common(&["para continuar, acesse sua conta", "olá! para continuar"], LOGIN_COMMON),
            &with_common(&["account-verification", "estamos verificando"], CHECKPOINT_COMMON),
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::mercado_livre_id,
        normalize_url: parsers::normalize_mercado_livre,
    }
}

fn facebook_marketplace() -> SiteConfig {
    SiteConfig {
        site: Site::FacebookMarketplace,
        domains: domains(Site::FacebookMarketplace),
        auth_mode: AuthMode::CookiesRequired,
        search_url: "https://www.facebook.com/marketplace/search/?query={query}".to_string(),
        selectors: Selectors {
            container: chain(&[
                "a[href*='/marketplace/item/']",
                "div[data-testid='marketplace_feed_item']",
            ]),
            title: chain(&["span[style*='-webkit-line-clamp']", "span.x1lliihq"]),
            price: chain(&["span.x193iq5w", "span[dir='auto']"]),
            link: chain(&["a[href*='/marketplace/item/']"]),
            location: chain(&["span.x1j85h84", "span.xlyipyv"]),
            image: chain(&["img"]),
        },
        rate_limit: RateLimit { tokens_per_min: 6 },
        timeouts: timeouts(&[20_000, 40_000, 80_000], 60_000, 3_000),
        scroll_strategy: ScrollStrategy::Adaptive {
            max_attempts: 12,
            stable_threshold: 3,
            delay_ms: 1_500,
        },
        anti_detection: posture(StealthLevel::Aggressive, false),
        patterns: PagePatterns::new(
            &["nenhum resultado encontrado", "no results found"],
            &with_common(
                &["log in to facebook", "entrar no facebook", "you must log in"],
                LOGIN_COMMON,
            ),
            &with_common(
                &["checkpoint", "confirme sua identidade", "we suspended your account"],
                CHECKPOINT_COMMON,
            ),
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::facebook_marketplace_id,
        normalize_url: parsers::normalize_facebook,
    }
}

fn olx() -> SiteConfig {
    SiteConfig {
        site: Site::Olx,
        domains: domains(Site::Olx),
        auth_mode: AuthMode::CookiesOptional,
        search_url: "https://www.olx.com.br/brasil?q={query}".to_string(),
        selectors: Selectors {
            container: chain(&["section.olx-adcard", "li.sc-1fcmfeb-2", "div[data-ds-component='DS-AdCard']"]),
            title: chain(&["h2.olx-adcard__title", "h2"]),
            price: chain(&["h3.olx-adcard__price", "span[aria-label*='Preço']"]),
            link: chain(&["a.olx-adcard__link", "a[data-ds-component='DS-NewAdCard-Link']", "a"]),
            location: chain(&["p.olx-adcard__location", "span[aria-label*='Localização']"]),
            image: chain(&["div.olx-adcard__media img", "img"]),
        },
        rate_limit: RateLimit { tokens_per_min: 20 },
        timeouts: timeouts(&[15_000, 30_000, 60_000], 45_000, 1_000),
        scroll_strategy: ScrollStrategy::Fixed {
            steps: 5,
            delay_ms: 500,
        },
        anti_detection: posture(StealthLevel::Standard, false),
        patterns: PagePatterns::new(
            &["nenhum anúncio foi encontrado", "não encontramos nenhum resultado"],
            LOGIN_COMMON,
            &with_common(&["cloudflare", "attention required"], CHECKPOINT_COMMON),
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::olx_id,
        normalize_url: parsers::normalize_olx,
    }
}

fn real_estate_selectors() -> Selectors {
    Selectors {
        container: chain(&[
            "div[data-cy='rp-property-cd']",
            "div.result-card",
            "article.property-card__container",
        ]),
        title: chain(&["h2[data-cy='rp-cardProperty-location-txt']", "h2.card-title", "span.property-card__title"]),
        price: chain(&["div[data-cy='rp-cardProperty-price-txt'] p", "p.listing-price", "div.property-card__price"]),
        link: chain(&["a[href*='/imovel/']", "a.property-card__content-link", "a"]),
        location: chain(&["p[data-cy='rp-cardProperty-street-txt']", "span.property-card__address"]),
        image: chain(&["img[data-cy='rp-cardProperty-image-img']", "img"]),
    }
}

fn zap_imoveis() -> SiteConfig {
    SiteConfig {
        site: Site::ZapImoveis,
        domains: domains(Site::ZapImoveis),
        auth_mode: AuthMode::CookiesOptional,
        search_url: "https://www.zapimoveis.com.br/venda/?q={query}".to_string(),
        selectors: real_estate_selectors(),
        rate_limit: RateLimit { tokens_per_min: 15 },
        timeouts: timeouts(&[20_000, 40_000], 60_000, 2_000),
        scroll_strategy: ScrollStrategy::Adaptive {
            max_attempts: 8,
            stable_threshold: 2,
            delay_ms: 800,
        },
        anti_detection: posture(StealthLevel::Standard, false),
        patterns: PagePatterns::new(
            &["não encontramos imóveis", "nenhum imóvel encontrado"],
            LOGIN_COMMON,
            CHECKPOINT_COMMON,
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::real_estate_portal_id,
        normalize_url: parsers::normalize_zap,
    }
}

fn viva_real() -> SiteConfig {
    SiteConfig {
        site: Site::VivaReal,
        domains: domains(Site::VivaReal),
        auth_mode: AuthMode::CookiesOptional,
        search_url: "https://www.vivareal.com.br/venda/?q={query}".to_string(),
        selectors: real_estate_selectors(),
        rate_limit: RateLimit { tokens_per_min: 15 },
        timeouts: timeouts(&[20_000, 40_000], 60_000, 2_000),
        scroll_strategy: ScrollStrategy::Adaptive {
            max_attempts: 8,
            stable_threshold: 2,
            delay_ms: 800,
        },
        anti_detection: posture(StealthLevel::Standard, false),
        patterns: PagePatterns::new(
            &["não encontramos imóveis", "nenhum imóvel encontrado"],
            LOGIN_COMMON,
            CHECKPOINT_COMMON,
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::real_estate_portal_id,
        normalize_url: parsers::normalize_viva_real,
    }
}

fn imovelweb() -> SiteConfig {
    SiteConfig {
        site: Site::ImovelWeb,
        domains: domains(Site::ImovelWeb),
        auth_mode: AuthMode::Anonymous,
        search_url: "https://www.imovelweb.com.br/imoveis-venda-q-{query}.html".to_string(),
        selectors: Selectors {
            container: chain(&["div[data-qa='posting PROPERTY']", "div.postingCard"]),
            title: chain(&["h3[data-qa='POSTING_CARD_DESCRIPTION']", "a.postingCard-title"]),
            price: chain(&["div[data-qa='POSTING_CARD_PRICE']", "span.firstPrice"]),
            link: chain(&["a[href$='.html']", "a"]),
            location: chain(&["div[data-qa='POSTING_CARD_LOCATION']", "span.postingCardLocation"]),
            image: chain(&["img"]),
        },
        rate_limit: RateLimit { tokens_per_min: 12 },
        timeouts: timeouts(&[20_000, 45_000], 60_000, 2_500),
        scroll_strategy: ScrollStrategy::Fixed {
            steps: 3,
            delay_ms: 700,
        },
        anti_detection: posture(StealthLevel::Aggressive, true),
        patterns: PagePatterns::new(
            &["não encontramos resultados", "nenhum resultado"],
            LOGIN_COMMON,
            &with_common(&["cloudflare", "just a moment"], CHECKPOINT_COMMON),
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::imovelweb_id,
        normalize_url: parsers::normalize_imovelweb,
    }
}

fn superbid() -> SiteConfig {
    SiteConfig {
        site: Site::Superbid,
        domains: domains(Site::Superbid),
        auth_mode: AuthMode::CookiesOptional,
        search_url: "https://www.superbid.net/busca?searchTerm={query}".to_string(),
        selectors: Selectors {
            container: chain(&["div[data-testid='offer-card']", "div.offer-card"]),
            title: chain(&["h3", "p.offer-card__title"]),
            price: chain(&["p[data-testid='offer-price']", "span.offer-card__price"]),
            link: chain(&["a[href*='/oferta/']", "a"]),
            location: chain(&["span[data-testid='offer-location']", "span.offer-card__location"]),
            image: chain(&["img"]),
        },
        rate_limit: RateLimit { tokens_per_min: 20 },
        timeouts: timeouts(&[15_000, 30_000], 45_000, 1_500),
        scroll_strategy: ScrollStrategy::Fixed {
            steps: 3,
            delay_ms: 500,
        },
        anti_detection: posture(StealthLevel::Minimal, true),
        patterns: PagePatterns::new(
            &["nenhuma oferta encontrada", "não encontramos ofertas"],
            LOGIN_COMMON,
            CHECKPOINT_COMMON,
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::superbid_id,
        normalize_url: parsers::normalize_superbid,
    }
}

fn sodre_santoro() -> SiteConfig {
    SiteConfig {
        site: Site::SodreSantoro,
        domains: domains(Site::SodreSantoro),
        auth_mode: AuthMode::Anonymous,
        search_url: "https://www.sodresantoro.com.br/busca?q={query}".to_string(),
        selectors: Selectors {
            container: chain(&["div.lote-card", "article.card-lote"]),
            title: chain(&["h3.lote-card__title", "h3"]),
            price: chain(&["span.lote-card__lance", "span.valor"]),
            link: chain(&["a[href*='/lote/']", "a"]),
            location: chain(&["span.lote-card__local", "span.local"]),
            image: chain(&["img"]),
        },
        rate_limit: RateLimit { tokens_per_min: 20 },
        timeouts: timeouts(&[15_000, 30_000], 45_000, 1_000),
        scroll_strategy: ScrollStrategy::Fixed {
            steps: 2,
            delay_ms: 500,
        },
        anti_detection: posture(StealthLevel::Minimal, true),
        patterns: PagePatterns::new(
            &["nenhum lote encontrado", "não há lotes"],
            LOGIN_COMMON,
            CHECKPOINT_COMMON,
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::sodre_santoro_id,
        normalize_url: parsers::normalize_sodre_santoro,
    }
}

fn mega_leiloes() -> SiteConfig {
    SiteConfig {
        site: Site::MegaLeiloes,
        domains: domains(Site::MegaLeiloes),
        auth_mode: AuthMode::Anonymous,
        search_url: "https://www.megaleiloes.com.br/busca?pesquisa={query}".to_string(),
        selectors: Selectors {
            container: chain(&["div.card", "div.leilao-card"]),
            title: chain(&["a.card-title", "h3"]),
            price: chain(&["div.card-price", "span.instance-value"]),
            link: chain(&["a.card-title", "a"]),
            location: chain(&["a.card-locality", "span.local"]),
            image: chain(&["div.card-image img", "img"]),
        },
        rate_limit: RateLimit { tokens_per_min: 20 },
        timeouts: timeouts(&[15_000, 30_000], 45_000, 1_000),
        scroll_strategy: ScrollStrategy::Fixed {
            steps: 2,
            delay_ms: 500,
        },
        anti_detection: posture(StealthLevel::Minimal, true),
        patterns: PagePatterns::new(
            &["nenhum leilão encontrado", "sua busca não retornou resultados"],
            LOGIN_COMMON,
            CHECKPOINT_COMMON,
        ),
        price_parser: parsers::parse_brl_price,
        external_id: parsers::mega_leiloes_id,
        normalize_url: parsers::normalize_mega_leiloes,
    }
}
