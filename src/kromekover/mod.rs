//! Stealth script injection
//!
//! Scripts are registered with `Page.addScriptToEvaluateOnNewDocument`, so
//! they run before any site script on every document the page loads. Inject
//! while the page is still blank.

use anyhow::Result;
use chromiumoxide::{Page, cdp};
use futures::future::join_all;
use tracing::{debug, warn};

mod config;
pub use config::Config;

// Injection order is significant: the config bootstrap precedes these and
// the webdriver flag goes first.
pub const EVASION_SCRIPTS: &[(&str, &str)] = &[
    ("navigator_webdriver", include_str!("evasions/navigator_webdriver.js")),
    ("cdc_markers", include_str!("evasions/cdc_markers.js")),
    ("navigator_plugins", include_str!("evasions/navigator_plugins.js")),
    ("navigator_languages", include_str!("evasions/navigator_languages.js")),
    ("navigator_permissions", include_str!("evasions/navigator_permissions.js")),
    ("hardware", include_str!("evasions/hardware.js")),
    ("webgl_vendor", include_str!("evasions/webgl_vendor.js")),
    ("canvas_noise", include_str!("evasions/canvas_noise.js")),
    ("chrome_runtime", include_str!("evasions/chrome_runtime.js")),
];

async fn add_script(page: &Page, source: String) -> Result<()> {
    page.execute(
        cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
            source,
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        },
    )
    .await?;
    Ok(())
}

/// Register every evasion for new documents on `page`.
///
/// Individual script failures are logged; the call only fails when nothing
/// could be injected.
pub async fn inject(page: &Page) -> Result<()> {
    let seed: [u8; 16] = rand::random();
    let config = Config::with_seed(&seed);

    debug!("Injecting stealth config");
    add_script(page, config.bootstrap_script()?).await?;

    let results = join_all(EVASION_SCRIPTS.iter().map(|(name, source)| async move {
        (*name, add_script(page, (*source).to_string()).await)
    }))
    .await;

    let mut injected = 0;
    for (name, result) in results {
        match result {
            Ok(()) => injected += 1,
            Err(e) => warn!("Failed to inject {name}: {e}"),
        }
    }

    if injected == 0 {
        return Err(anyhow::anyhow!("Failed to inject any stealth scripts"));
    }

    // Registered last so it runs after every evasion has captured the config
    if let Err(e) = add_script(page, Config::teardown_script()).await {
        warn!("Failed to register stealth config removal: {e}");
    }

    // Drop the "Headless" marker from the UA the browser reports
    let version = page
        .execute(cdp::browser_protocol::browser::GetVersionParams {})
        .await?;
    page.execute(cdp::browser_protocol::network::SetUserAgentOverrideParams {
        user_agent: version.user_agent.replace("Headless", ""),
        accept_language: Some(config.accept_language.clone()),
        platform: Some(config.platform.clone()),
        user_agent_metadata: None,
    })
    .await?;

    debug!("Stealth injection complete: {injected}/{} scripts active", EVASION_SCRIPTS.len());
    Ok(())
}
