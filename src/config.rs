//! Client configuration (file + environment) and user preferences (local store).

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::storage::{Storage, KEY_PASSWORD, KEY_USERNAME};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub database_url: Option<String>,
    pub request_timeout_secs: u64,
    /// Image proxy advertised by the server deployment; seeds the
    /// image-proxy preference defaults.
    pub default_image_proxy: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_url: None,
            request_timeout_secs: 30,
            default_image_proxy: String::new(),
        }
    }
}

impl ClientConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "vodcat", "vodcat").map(|p| p.config_dir().join("config.toml"))
    }

    /// Reads `path` (or the default location) if it exists, then applies
    /// `VODCAT_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut cfg = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(&p)
                    .with_context(|| format!("reading config: {}", p.display()))?;
                debug!(path = %p.display(), "loaded config file");
                Self::from_toml(&text).with_context(|| format!("parsing config: {}", p.display()))?
            }
            _ => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_toml(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_blank = |k: &str| var(k).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_blank("VODCAT_BASE_URL") { self.base_url = v; }
        if let Some(v) = non_blank("VODCAT_DATABASE_URL") { self.database_url = Some(v); }
        if let Some(v) = var("VODCAT_REQUEST_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.request_timeout_secs = v;
        }
        if let Some(v) = var("VODCAT_IMAGE_PROXY") { self.default_image_proxy = v; }
    }
}

// Local storage keys.
pub const KEY_ENABLE_OPTIMIZATION: &str = "enableOptimization";
pub const KEY_ENABLE_IMAGE_PROXY: &str = "enableImageProxy";
pub const KEY_IMAGE_PROXY_URL: &str = "imageProxyUrl";
pub const KEY_DOUBAN_PROXY_URL: &str = "doubanProxyUrl";
pub const KEY_DEFAULT_AGGREGATE: &str = "defaultAggregateSearch";

/// User preferences. Loaded once, passed to whoever needs them, written back
/// with [`Preferences::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub default_aggregate_search: bool,
    pub enable_optimization: bool,
    pub enable_image_proxy: bool,
    pub image_proxy_url: String,
    pub douban_proxy_url: String,
}

impl Preferences {
    /// Factory defaults. A server-provided image proxy turns the proxy on.
    pub fn defaults(default_image_proxy: &str) -> Self {
        Self {
            default_aggregate_search: true,
            enable_optimization: true,
            enable_image_proxy: !default_image_proxy.is_empty(),
            image_proxy_url: default_image_proxy.to_string(),
            douban_proxy_url: String::new(),
        }
    }

    pub async fn load(store: &dyn Storage, default_image_proxy: &str) -> Result<Self> {
        let mut p = Self::defaults(default_image_proxy);
        if let Some(v) = store.get_flag(KEY_DEFAULT_AGGREGATE).await? {
            p.default_aggregate_search = v;
        }
        if let Some(v) = store.get_flag(KEY_ENABLE_OPTIMIZATION).await? {
            p.enable_optimization = v;
        }
        if let Some(v) = store.get_flag(KEY_ENABLE_IMAGE_PROXY).await? { p.enable_image_proxy = v; }
        if let Some(v) = store.get_item(KEY_IMAGE_PROXY_URL).await? { p.image_proxy_url = v; }
        if let Some(v) = store.get_item(KEY_DOUBAN_PROXY_URL).await? { p.douban_proxy_url = v; }
        Ok(p)
    }

    pub async fn save(&self, store: &dyn Storage) -> Result<()> {
        store.set_flag(KEY_DEFAULT_AGGREGATE, self.default_aggregate_search).await?;
        store.set_flag(KEY_ENABLE_OPTIMIZATION, self.enable_optimization).await?;
        store.set_flag(KEY_ENABLE_IMAGE_PROXY, self.enable_image_proxy).await?;
        store.set_item(KEY_IMAGE_PROXY_URL, &self.image_proxy_url).await?;
        store.set_item(KEY_DOUBAN_PROXY_URL, &self.douban_proxy_url).await?;
        Ok(())
    }

    /// Restores defaults and persists them.
    pub async fn reset(store: &dyn Storage, default_image_proxy: &str) -> Result<Self> {
        let p = Self::defaults(default_image_proxy);
        p.save(store).await?;
        Ok(p)
    }

    /// Sets one preference by its storage key. Unknown keys and unparsable
    /// booleans are rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let flag = || -> Result<bool> {
            serde_json::from_str(value).with_context(|| format!("{key} expects true or false"))
        };
        match key {
            KEY_DEFAULT_AGGREGATE => self.default_aggregate_search = flag()?,
            KEY_ENABLE_OPTIMIZATION => self.enable_optimization = flag()?,
            KEY_ENABLE_IMAGE_PROXY => self.enable_image_proxy = flag()?,
            KEY_IMAGE_PROXY_URL => self.image_proxy_url = value.to_string(),
            KEY_DOUBAN_PROXY_URL => self.douban_proxy_url = value.to_string(),
            other => anyhow::bail!("unknown preference: {other}"),
        }
        Ok(())
    }

    /// Rewrites a poster URL through the image proxy when enabled.
    pub fn poster_url(&self, url: &str) -> String {
        if self.enable_image_proxy && !self.image_proxy_url.is_empty() && !url.is_empty() {
            let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
            format!("{}{encoded}", self.image_proxy_url)
        } else {
            url.to_string()
        }
    }
}

/// Username and password kept in the local store after login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Returns `None` unless both fields are present and non-empty.
    pub async fn load(store: &dyn Storage) -> Result<Option<Self>> {
        let username = store.get_item(KEY_USERNAME).await?.filter(|s| !s.is_empty());
        let password = store.get_item(KEY_PASSWORD).await?.filter(|s| !s.is_empty());
        Ok(username.zip(password).map(|(username, password)| Self { username, password }))
    }

    pub async fn save(&self, store: &dyn Storage) -> Result<()> {
        store.set_item(KEY_USERNAME, &self.username).await?;
        store.set_item(KEY_PASSWORD, &self.password).await
    }

    pub async fn clear(store: &dyn Storage) -> Result<()> {
        store.remove_item(KEY_USERNAME).await?;
        store.remove_item(KEY_PASSWORD).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let cfg = ClientConfig::from_toml("base_url = \"https://tv.example\"\n").unwrap();
        assert_eq!(cfg.base_url, "https://tv.example");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = ClientConfig::default();
        cfg.apply_env(|k| match k {
            "VODCAT_BASE_URL" => Some("https://env.example".into()),
            "VODCAT_REQUEST_TIMEOUT_SECS" => Some("5".into()),
            "VODCAT_DATABASE_URL" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(cfg.base_url, "https://env.example");
        assert_eq!(cfg.request_timeout_secs, 5);
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn image_proxy_default_enables_proxy() {
        assert!(!Preferences::defaults("").enable_image_proxy);
        let p = Preferences::defaults("https://proxy/?url=");
        assert!(p.enable_image_proxy);
        assert_eq!(
            p.poster_url("https://img/a b.jpg"),
            "https://proxy/?url=https%3A%2F%2Fimg%2Fa+b.jpg"
        );
    }

    #[test]
    fn set_rejects_bad_input() {
        let mut p = Preferences::defaults("");
        p.set(KEY_DEFAULT_AGGREGATE, "false").unwrap();
        assert!(!p.default_aggregate_search);
        assert!(p.set(KEY_ENABLE_OPTIMIZATION, "maybe").is_err());
        assert!(p.set("theme", "dark").is_err());
    }

    #[tokio::test]
    async fn preferences_load_save_reset() {
        let db = Database::open(Some("sqlite::memory:")).await.unwrap();
        let mut p = Preferences::load(&db, "").await.unwrap();
        assert_eq!(p, Preferences::defaults(""));

        p.enable_optimization = false;
        p.douban_proxy_url = "https://douban.proxy/".into();
        p.save(&db).await.unwrap();
        assert_eq!(db.get_item(KEY_ENABLE_OPTIMIZATION).await.unwrap().as_deref(), Some("false"));
        assert_eq!(Preferences::load(&db, "").await.unwrap(), p);

        let reset = Preferences::reset(&db, "").await.unwrap();
        assert_eq!(Preferences::load(&db, "").await.unwrap(), reset);
        assert!(reset.enable_optimization);
    }

    #[tokio::test]
    async fn credentials_require_both_fields() {
        let db = Database::open(Some("sqlite::memory:")).await.unwrap();
        db.set_item(KEY_USERNAME, "alice").await.unwrap();
        assert!(Credentials::load(&db).await.unwrap().is_none());
        Credentials { username: "alice".into(), password: "pw".into() }.save(&db).await.unwrap();
        assert_eq!(Credentials::load(&db).await.unwrap().unwrap().username, "alice");
        Credentials::clear(&db).await.unwrap();
        assert!(Credentials::load(&db).await.unwrap().is_none());
    }
}
