use rand::seq::SliceRandom;
use vigia_sites::{AntiDetection, StealthLevel};

/// Common desktop user agents
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

/// Common viewport sizes
const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// Hides the automation flag from page scripts.
const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Masks the most common headless tells.
const MASK_HEADLESS: &str = r"
Object.defineProperty(navigator, 'languages', { get: () => ['pt-BR', 'pt', 'en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
  window.navigator.permissions.query = (parameters) =>
    parameters.name === 'notifications'
      ? Promise.resolve({ state: Notification.permission })
      : originalQuery(parameters);
}
";

/// Browser identity presented to a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// User agent override; `None` keeps Chromium's own
    pub user_agent: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub timezone: String,
    pub locale: String,
}

impl Fingerprint {
    /// Fingerprint matching a site's anti-detection posture.
    ///
    /// `default_viewport` is used unless the posture randomizes it.
    pub fn for_posture(posture: &AntiDetection, default_viewport: (u32, u32)) -> Self {
        let mut rng = rand::thread_rng();

        let user_agent = (posture.stealth_level >= StealthLevel::Standard)
            .then(|| USER_AGENTS.choose(&mut rng).map(ToString::to_string))
            .flatten();

        let (width, height) = if posture.randomize_viewport {
            VIEWPORTS.choose(&mut rng).copied().unwrap_or(default_viewport)
        } else {
            default_viewport
        };

        Self {
            user_agent,
            viewport_width: width,
            viewport_height: height,
            timezone: "America/Sao_Paulo".to_string(),
            locale: "pt-BR".to_string(),
        }
    }
}

/// Script injected before any page script runs, if the posture asks for one.
pub fn stealth_script(posture: &AntiDetection) -> Option<String> {
    if !posture.inject_stealth_scripts {
        return None;
    }
    match posture.stealth_level {
        StealthLevel::Minimal => None,
        StealthLevel::Standard => Some(HIDE_WEBDRIVER.to_string()),
        StealthLevel::Aggressive => Some(format!("{HIDE_WEBDRIVER}\n{MASK_HEADLESS}")),
    }
}

/// URL patterns blocked for the posture's resource types.
pub fn blocked_url_patterns(posture: &AntiDetection) -> Vec<String> {
    posture
        .blocked_resource_types()
        .into_iter()
        .flat_map(|kind| match kind {
            "Image" => &["*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg"][..],
            "Font" => &["*.woff", "*.woff2", "*.ttf", "*.otf"][..],
            "Media" => &["*.mp4", "*.webm", "*.mp3", "*.m3u8"][..],
            "Stylesheet" => &["*.css"][..],
            _ => &[][..],
        })
        .map(ToString::to_string)
        .collect()
}
