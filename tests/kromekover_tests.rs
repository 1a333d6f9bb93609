use anyhow::Result;
use chromiumoxide::Page;
use jobhound::BrowserSession;
use serde_json::Value;

async fn eval(page: &Page, script: &str) -> Result<Value> {
    Ok(page
        .evaluate(script)
        .await?
        .value()
        .cloned()
        .unwrap_or(Value::Null))
}

#[tokio::test]
#[ignore = "needs a local Chrome or Chromium"]
async fn session_pages_carry_the_evasions() -> Result<()> {
    let mut session = BrowserSession::acquire(true).await?;
    let profile = session
        .profile_dir()
        .map(std::path::Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("session without a profile dir"))?;
    let page = session.page()?;

    // Scripts only apply to documents loaded after injection
    page.goto("data:text/html,<html><body></body></html>").await?;

    assert_eq!(eval(&page, "navigator.webdriver").await?, Value::Bool(false));
    assert_eq!(eval(&page, "typeof window.__jobhoundStealth").await?, "undefined");
    assert_eq!(
        eval(&page, "Object.getOwnPropertyNames(window).some(k => k.includes('jobhound'))").await?,
        Value::Bool(false)
    );
    // The evasions keep their values after the global is gone
    assert_eq!(eval(&page, "navigator.hardwareConcurrency").await?, 8);

    let languages = eval(&page, "navigator.languages").await?;
    assert!(
        languages
            .as_array()
            .is_some_and(|l| l.iter().any(|v| v == "en-US")),
        "languages should contain en-US, got {languages}"
    );

    let user_agent = eval(&page, "navigator.userAgent").await?;
    assert!(!user_agent.as_str().unwrap_or_default().contains("Headless"));

    assert_eq!(
        eval(&page, "typeof chrome !== 'undefined' && typeof chrome.runtime !== 'undefined'").await?,
        Value::Bool(true)
    );

    session.release().await;
    session.release().await;
    assert!(!profile.exists());
    Ok(())
}
