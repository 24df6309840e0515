use anyhow::Result;
use async_trait::async_trait;

/// Durable string key-value surface, the local stand-in for browser storage.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;

    /// Reads a JSON-encoded boolean; anything unparsable counts as absent.
    async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.get_item(key).await?.and_then(|v| serde_json::from_str::<bool>(&v).ok()))
    }

    async fn set_flag(&self, key: &str, value: bool) -> Result<()> {
        self.set_item(key, if value { "true" } else { "false" }).await
    }
}

pub const KEY_USERNAME: &str = "username";
pub const KEY_PASSWORD: &str = "password";
