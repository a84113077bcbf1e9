use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::{parse_roles, PageVisibility, RoleVisibility, Settings, SettingsForm};
use crate::snippet::CompactPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub site: SiteConfig,
    pub performance: PerformanceConfig,
    pub snippet: SnippetConfig,
    pub tracking: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Path of the site's home page, matched by `<front>`
    pub front_path: String,
}

/// Host-wide asset settings that decide snippet compaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub js_preprocess: bool,
    pub aggregator_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetConfig {
    /// `Cache-Control` max-age for the served snippet
    #[serde(default = "SnippetConfig::default_max_age_secs")]
    pub max_age_secs: u64,
}

impl PerformanceConfig {
    pub fn compact_policy(&self) -> CompactPolicy {
        CompactPolicy {
            js_preprocess: self.js_preprocess,
            aggregator_enabled: self.aggregator_enabled,
        }
    }
}

impl SnippetConfig {
    const fn default_max_age_secs() -> u64 {
        3600
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = var("API_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let front_path = var("SITE_FRONT_PATH").unwrap_or_else(|| "/".to_string());

        // Core JS preprocessing defaults to on
        let js_preprocess = var("JS_PREPROCESS").map(|v| is_truthy(&v)).unwrap_or(true);
        let aggregator_enabled = var("ADVAGG_ENABLED").map(|v| is_truthy(&v)).unwrap_or(false);

        let max_age_secs = var("SNIPPET_MAX_AGE_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("SNIPPET_MAX_AGE_SECS must be a whole number of seconds")?
            .unwrap_or_else(SnippetConfig::default_max_age_secs);

        let page_visibility = var("HOTJAR_VISIBILITY_PAGES")
            .map(|v| v.parse::<PageVisibility>())
            .transpose()
            .context("Invalid HOTJAR_VISIBILITY_PAGES")?
            .unwrap_or_default();
        let role_visibility = var("HOTJAR_VISIBILITY_ROLES")
            .map(|v| v.parse::<RoleVisibility>())
            .transpose()
            .context("Invalid HOTJAR_VISIBILITY_ROLES")?
            .unwrap_or_default();

        let form = SettingsForm {
            account: var("HOTJAR_ACCOUNT").unwrap_or_default(),
            snippet_version: var("HOTJAR_SNIPPET_VERSION").unwrap_or_else(|| "6".to_string()),
            page_visibility,
            pages: var("HOTJAR_PAGES").unwrap_or_default(),
            role_visibility,
            roles: parse_roles(&var("HOTJAR_ROLES").unwrap_or_default())
                .into_iter()
                .collect(),
        };
        let tracking = Settings::from_form(form).context("Invalid Hotjar settings")?;

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            site: SiteConfig { front_path },
            performance: PerformanceConfig {
                js_preprocess,
                aggregator_enabled,
            },
            snippet: SnippetConfig { max_age_secs },
            tracking,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
