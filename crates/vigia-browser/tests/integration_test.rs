use serde_json::json;
use vigia_browser::{BrowserLauncher, ChromiumLauncher, LaunchRequest};
use vigia_core::{BrowserConfig, Site};
use vigia_sites::catalog::config_for;

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_launch_and_close() {
    let launcher = ChromiumLauncher::new(BrowserConfig::default());
    let request = LaunchRequest::anonymous(&config_for(Site::Superbid));

    let mut session = launcher.launch(request).await.expect("launch chromium");
    session.close().await.expect("close");
    // Second close is a no-op.
    session.close().await.expect("close again");
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium and network access
async fn test_navigation_with_cookies() {
    let launcher = ChromiumLauncher::new(BrowserConfig::default());
    let state = json!({
        "cookies": [{"name": "sid", "value": "1", "domain": "example.com"}],
        "origins": []
    });
    let request =
        LaunchRequest::with_storage_state(&config_for(Site::Olx), &state).expect("request");

    let mut session = launcher.launch(request).await.expect("launch chromium");
    session
        .navigate("https://example.com")
        .await
        .expect("navigate");
    let text = session.visible_text().await.expect("text");
    assert!(text.contains("Example Domain"));
    session.close().await.expect("close");
}
