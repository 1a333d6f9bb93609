use serde::Serialize;

use crate::browser_setup::WINDOW_SIZE;

/// Window property the evasions read their values from. Removed again by
/// [`Config::teardown_script`] once every evasion has captured it.
pub const CONFIG_GLOBAL: &str = "__jobhoundStealth";

/// Fingerprint values handed to the evasion scripts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(skip)]
    pub accept_language: String,
    pub platform: String,
    pub languages: Vec<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
    pub session_seed: String,
}

impl Config {
    /// Defaults carrying `seed` as the session seed.
    pub fn with_seed(seed: &[u8]) -> Self {
        Self {
            session_seed: hex::encode(seed),
            ..Self::default()
        }
    }

    /// Script defining the config object as a non-enumerable window
    /// property; must run before the evasions.
    pub fn bootstrap_script(&self) -> Result<String, serde_json::Error> {
        Ok(format!(
            "Object.defineProperty(window, '{CONFIG_GLOBAL}', \
             {{ value: {}, configurable: true, enumerable: false, writable: false }});",
            serde_json::to_string(self)?
        ))
    }

    /// Script deleting the config object; must run after the evasions.
    #[must_use]
    pub fn teardown_script() -> String {
        format!("delete window['{CONFIG_GLOBAL}'];")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accept_language: "en-US,en;q=0.9,he;q=0.8".to_string(),
            platform: "Win32".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            screen_width: WINDOW_SIZE.0,
            screen_height: WINDOW_SIZE.1,
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel(R) UHD Graphics".to_string(),
            hardware_concurrency: 8,
            session_seed: String::new(),
        }
    }
}
