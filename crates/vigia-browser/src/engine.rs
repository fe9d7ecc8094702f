use crate::error::{BrowserError, Result};
use crate::fingerprint::{blocked_url_patterns, stealth_script, Fingerprint};
use crate::session::{BrowserLauncher, BrowsingSession, LaunchRequest, StorageCookie};
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, SetBlockedUrLsParams, SetUserAgentOverrideParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vigia_core::BrowserConfig;

/// Launches one headless Chromium per browsing session.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn cdp_config(&self, fingerprint: &Fingerprint) -> Result<CdpBrowserConfig> {
        let mut builder = CdpBrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg(format!("--lang={}", fingerprint.locale))
            .arg("--disable-blink-features=AutomationControlled");

        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, request: LaunchRequest) -> Result<Box<dyn BrowsingSession>> {
        let fingerprint = Fingerprint::for_posture(
            &request.anti_detection,
            (self.config.window_width, self.config.window_height),
        );

        let (mut browser, mut handler) = Browser::launch(self.cdp_config(&fingerprint)?)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "chromium handler event error");
                }
            }
        });

        match prepare_page(&browser, &request, &fingerprint).await {
            Ok(page) => {
                info!(
                    site = %request.site,
                    authenticated = request.is_authenticated(),
                    cookies = request.cookies.len(),
                    "browser session opened"
                );
                Ok(Box::new(ChromiumSession {
                    browser: Mutex::new(Some(browser)),
                    page,
                    handler_task,
                    navigation_timeout: request.navigation_timeout,
                }))
            }
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "failed to close browser after setup error");
                }
                handler_task.abort();
                Err(e)
            }
        }
    }
}

async fn prepare_page(
    browser: &Browser,
    request: &LaunchRequest,
    fingerprint: &Fingerprint,
) -> Result<Page> {
    let page = browser.new_page("about:blank").await?;

    if let Some(user_agent) = &fingerprint.user_agent {
        let mut params = SetUserAgentOverrideParams::new(user_agent.clone());
        params.accept_language = Some(fingerprint.locale.clone());
        page.execute(params).await?;
    }

    page.execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
        .await?;

    if let Some(script) = stealth_script(&request.anti_detection) {
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await?;
    }

    let blocked = blocked_url_patterns(&request.anti_detection);
    if !blocked.is_empty() {
        page.execute(SetBlockedUrLsParams::new(blocked)).await?;
    }

    if !request.cookies.is_empty() {
        let cookies = request
            .cookies
            .iter()
            .map(cookie_param)
            .collect::<Result<Vec<_>>>()?;
        page.set_cookies(cookies).await?;
    }

    Ok(page)
}

fn cookie_param(cookie: &StorageCookie) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .secure(cookie.secure)
        .http_only(cookie.http_only);

    if let Some(expires) = cookie.expires.filter(|e| *e > 0.0) {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }

    builder
        .build()
        .map_err(|e| BrowserError::InvalidStorageState(format!("cookie {}: {e}", cookie.name)))
}

/// A Chromium tab plus the browser process behind it.
pub struct ChromiumSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
}

#[async_trait::async_trait]
impl BrowsingSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))?
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn visible_text(&self) -> Result<String> {
        let text = self
            .page
            .evaluate("document.body ? document.body.innerText : ''")
            .await?
            .into_value::<String>()
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;
        Ok(text)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "failed waiting for browser exit");
        }
        self.handler_task.abort();
        debug!("browser session closed");

        closed.map(|_| ()).map_err(BrowserError::from)
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_param_conversion() {
        let cookie = StorageCookie {
            name: "ssid".to_string(),
            value: "v".to_string(),
            domain: ".mercadolivre.com.br".to_string(),
            path: "/".to_string(),
            expires: Some(-1.0),
            http_only: true,
            secure: true,
        };

        let param = cookie_param(&cookie).expect("param");
        assert_eq!(param.name, "ssid");
        assert_eq!(param.domain.as_deref(), Some(".mercadolivre.com.br"));
        assert!(param.expires.is_none());
    }
}
