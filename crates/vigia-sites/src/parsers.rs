//! Pure per-site parsing functions.
//!
//! These are plugged into [`SiteConfig`](crate::SiteConfig) as plain function
//! pointers. None of them touch the network or allocate beyond their output.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

/// Parse a Brazilian-formatted price (`R$ 1.234,56`) into centavos.
///
/// Thousands use `.`, decimals use `,`. The first amount in the text wins.
#[must_use]
pub fn parse_brl_price(text: &str) -> Option<i64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"(\d{1,3}(?:\.\d{3})+|\d+)(?:,(\d{1,2}))?");

    let caps = re.captures(text)?;
    let reais: i64 = caps.get(1)?.as_str().replace('.', "").parse().ok()?;
    let centavos: i64 = match caps.get(2).map(|m| m.as_str()) {
        None => 0,
        Some(digits) if digits.len() == 1 => digits.parse::<i64>().ok()? * 10,
        Some(digits) => digits.parse().ok()?,
    };
    reais.checked_mul(100)?.checked_add(centavos)
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `MLB1234567890` from any Mercado Livre listing URL.
#[must_use]
pub fn mercado_livre_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"(?i)\bMLB-?(\d+)"), url).map(|digits| format!("MLB{digits}"))
}

/// Numeric item id from a Marketplace item URL.
#[must_use]
pub fn facebook_marketplace_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"/marketplace/item/(\d+)"), url)
}

/// Trailing numeric id of an OLX ad slug (`...-1234567890`).
#[must_use]
pub fn olx_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"-(\d{6,})(?:[/?#]|$)"), url)
}

/// `id-<digits>` segment used by the Grupo OLX real estate portals.
#[must_use]
pub fn real_estate_portal_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"[/-]id-(\d+)"), url)
}

/// Imovelweb property id (`...-2987654321.html`).
#[must_use]
pub fn imovelweb_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"-(\d+)\.html"), url)
}

/// Superbid offer id, from the path (`/oferta/...-4321`) or an `offerId` parameter.
#[must_use]
pub fn superbid_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"(?:offerId=|/oferta/(?:[^/?#]*-)?)(\d+)"), url)
}

/// Sodré Santoro lot id (`/lote/12345`).
#[must_use]
pub fn sodre_santoro_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"/lotes?/(\d+)"), url)
}

/// Mega Leilões auction id: the trailing alphanumeric code of the path
/// (`.../apartamento-em-sao-paulo-j123456`).
#[must_use]
pub fn mega_leiloes_id(url: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(cached(&RE, r"-([a-z]\d{4,})/?(?:[?#]|$)"), url)
}

/// Resolve `raw` against `base`, force https, drop query and fragment.
fn canonical(raw: &str, base: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let mut url = base.join(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_scheme("https").ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Canonical Mercado Livre listing URL.
#[must_use]
pub fn normalize_mercado_livre(raw: &str) -> Option<String> {
    canonical(raw, "https://www.mercadolivre.com.br/")
}

/// Canonical Marketplace item URL, rebuilt from the item id.
#[must_use]
pub fn normalize_facebook(raw: &str) -> Option<String> {
    let absolute = canonical(raw, "https://www.facebook.com/")?;
    let id = facebook_marketplace_id(&absolute)?;
    Some(format!("https://www.facebook.com/marketplace/item/{id}/"))
}

/// Canonical OLX ad URL.
#[must_use]
pub fn normalize_olx(raw: &str) -> Option<String> {
    canonical(raw, "https://www.olx.com.br/")
}

/// Canonical ZAP Imóveis URL.
#[must_use]
pub fn normalize_zap(raw: &str) -> Option<String> {
    canonical(raw, "https://www.zapimoveis.com.br/")
}

/// Canonical Viva Real URL.
#[must_use]
pub fn normalize_viva_real(raw: &str) -> Option<String> {
    canonical(raw, "https://www.vivareal.com.br/")
}

/// Canonical Imovelweb URL.
#[must_use]
pub fn normalize_imovelweb(raw: &str) -> Option<String> {
    canonical(raw, "https://www.imovelweb.com.br/")
}

/// Canonical Superbid URL.
#[must_use]
pub fn normalize_superbid(raw: &str) -> Option<String> {
    canonical(raw, "https://www.superbid.net/")
}

/// Canonical Sodré Santoro URL.
#[must_use]
pub fn normalize_sodre_santoro(raw: &str) -> Option<String> {
    canonical(raw, "https://www.sodresantoro.com.br/")
}

/// Canonical Mega Leilões URL.
#[must_use]
pub fn normalize_mega_leiloes(raw: &str) -> Option<String> {
    canonical(raw, "https://www.megaleiloes.com.br/")
}
