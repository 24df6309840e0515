//! Administrative API: users, video sources and site settings.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Credentials;
use crate::error::{ClientError, ClientResult};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub banned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserConfig {
    pub allow_register: bool,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    /// Shipped in the server's config file; can be disabled but not deleted.
    Config,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub key: String,
    pub name: String,
    pub api: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    pub from: SourceOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteConfig {
    pub site_name: String,
    pub announcement: String,
    pub search_downstream_max_page: u32,
    pub site_interface_cache_time: u64,
    pub search_result_default_aggregate: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: String::new(),
            announcement: String::new(),
            search_downstream_max_page: 1,
            site_interface_cache_time: 7200,
            search_result_default_aggregate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminConfig {
    pub site_config: SiteConfig,
    pub user_config: UserConfig,
    #[serde(default)]
    pub source_config: Vec<SourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdminConfigResult {
    pub config: AdminConfig,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Add { username: String, password: String },
    Ban(String),
    Unban(String),
    SetAdmin(String),
    CancelAdmin(String),
    SetAllowRegister(bool),
}

impl UserAction {
    fn body(&self) -> Map<String, Value> {
        let (action, fields) = match self {
            UserAction::Add { username, password } => {
                ("add", json!({ "targetUsername": username, "targetPassword": password }))
            }
            UserAction::Ban(u) => ("ban", json!({ "targetUsername": u })),
            UserAction::Unban(u) => ("unban", json!({ "targetUsername": u })),
            UserAction::SetAdmin(u) => ("setAdmin", json!({ "targetUsername": u })),
            UserAction::CancelAdmin(u) => ("cancelAdmin", json!({ "targetUsername": u })),
            UserAction::SetAllowRegister(v) => ("setAllowRegister", json!({ "allowRegister": v })),
        };
        with_action(action, fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceAction {
    Add { key: String, name: String, api: String, detail: Option<String> },
    Enable(String),
    Disable(String),
    Delete(String),
    Sort(Vec<String>),
}

impl SourceAction {
    fn body(&self) -> Map<String, Value> {
        let (action, fields) = match self {
            SourceAction::Add { key, name, api, detail } => {
                let detail = detail.clone().unwrap_or_default();
                ("add", json!({ "key": key, "name": name, "api": api, "detail": detail }))
            }
            SourceAction::Enable(k) => ("enable", json!({ "key": k })),
            SourceAction::Disable(k) => ("disable", json!({ "key": k })),
            SourceAction::Delete(k) => ("delete", json!({ "key": k })),
            SourceAction::Sort(order) => ("sort", json!({ "order": order })),
        };
        with_action(action, fields)
    }
}

fn with_action(action: &str, fields: Value) -> Map<String, Value> {
    let mut m = match fields {
        Value::Object(m) => m,
        _ => Map::new(),
    };
    m.insert("action".into(), Value::String(action.into()));
    m
}

/// Calls `/api/admin/*` using the credentials kept in the local store.
#[derive(Clone)]
pub struct AdminClient {
    api: ApiClient,
    store: Arc<dyn Storage>,
}

impl AdminClient {
    pub fn new(api: ApiClient, store: Arc<dyn Storage>) -> Self { Self { api, store } }

    async fn credentials(&self) -> ClientResult<Credentials> {
        Credentials::load(self.store.as_ref())
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?
            .ok_or(ClientError::MissingCredentials)
    }

    pub async fn current_username(&self) -> Option<String> {
        Credentials::load(self.store.as_ref()).await.ok().flatten().map(|c| c.username)
    }

    /// `GET /api/admin/config`, scoped to the stored username when there is one.
    pub async fn fetch_config(&self) -> ClientResult<AdminConfigResult> {
        let mut url = self.api.url("/api/admin/config")?;
        if let Some(u) = self.current_username().await {
            url.query_pairs_mut().append_pair("username", &u);
        }
        self.api.get_json(url).await
    }

    async fn post_with_credentials(
        &self,
        path: &str,
        mut body: Map<String, Value>,
    ) -> ClientResult<()> {
        let creds = self.credentials().await?;
        body.insert("username".into(), Value::String(creds.username));
        body.insert("password".into(), Value::String(creds.password));
        self.api.post_json(path, &body).await
    }

    pub async fn user_action(&self, action: &UserAction) -> ClientResult<()> {
        self.post_with_credentials("/api/admin/user", action.body()).await?;
        info!(?action, "user action applied");
        Ok(())
    }

    pub async fn source_action(&self, action: &SourceAction) -> ClientResult<()> {
        self.post_with_credentials("/api/admin/source", action.body()).await?;
        info!(?action, "source action applied");
        Ok(())
    }

    pub async fn save_site(&self, site: &SiteConfig) -> ClientResult<()> {
        let body = match serde_json::to_value(site)? {
            Value::Object(m) => m,
            _ => Map::new(),
        };
        self.post_with_credentials("/api/admin/site", body).await
    }

    /// `GET /api/admin/reset`: restores the server's default configuration.
    pub async fn reset(&self) -> ClientResult<()> {
        let creds = self.credentials().await?;
        let mut url = self.api.url("/api/admin/reset")?;
        url.query_pairs_mut()
            .append_pair("username", &creds.username)
            .append_pair("password", &creds.password);
        self.api.get_ok(url).await?;
        warn!("server configuration reset");
        Ok(())
    }
}

/// Display order: the current user, then the owner, admins, everyone else.
pub fn sorted_users<'a>(users: &'a [UserEntry], current: Option<&str>) -> Vec<&'a UserEntry> {
    let priority = |u: &UserEntry| {
        if Some(u.username.as_str()) == current { 0 } else {
            match u.role {
                Role::Owner => 1,
                Role::Admin => 2,
                Role::User => 3,
            }
        }
    };
    let mut out: Vec<&UserEntry> = users.iter().collect();
    out.sort_by_key(|u| priority(*u));
    out
}

/// Owners manage everyone but themselves; admins manage plain users only.
pub fn can_operate(actor: Role, current: Option<&str>, target: &UserEntry) -> bool {
    if Some(target.username.as_str()) == current { return false; }
    match actor {
        Role::Owner => true,
        Role::Admin => target.role == Role::User,
        Role::User => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdminTab {
    Site,
    Users,
    Sources,
}

/// Local state of the admin page on top of [`AdminClient`].
pub struct AdminPanel {
    client: AdminClient,
    config: Option<AdminConfig>,
    role: Option<Role>,
    sources: Vec<SourceEntry>,
    order_changed: bool,
    allow_register: bool,
    expanded: BTreeSet<AdminTab>,
}

impl AdminPanel {
    pub fn new(client: AdminClient) -> Self {
        Self {
            client,
            config: None,
            role: None,
            sources: Vec::new(),
            order_changed: false,
            allow_register: false,
            expanded: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> Option<&AdminConfig> { self.config.as_ref() }
    pub fn role(&self) -> Option<Role> { self.role }
    pub fn sources(&self) -> &[SourceEntry] { &self.sources }
    pub fn order_changed(&self) -> bool { self.order_changed }
    pub fn allow_register(&self) -> bool { self.allow_register }

    pub async fn refresh(&mut self) -> ClientResult<()> {
        let res = self.client.fetch_config().await?;
        self.sources = res.config.source_config.clone();
        self.allow_register = res.config.user_config.allow_register;
        self.order_changed = false;
        self.role = Some(res.role);
        self.config = Some(res.config);
        Ok(())
    }

    pub fn toggle_tab(&mut self, tab: AdminTab) -> bool {
        if !self.expanded.remove(&tab) { self.expanded.insert(tab); }
        self.is_expanded(tab)
    }
    pub fn is_expanded(&self, tab: AdminTab) -> bool { self.expanded.contains(&tab) }

    pub async fn users(&self) -> Vec<UserEntry> {
        let current = self.client.current_username().await;
        let Some(cfg) = &self.config else { return Vec::new() };
        sorted_users(&cfg.user_config.users, current.as_deref()).into_iter().cloned().collect()
    }

    /// Flips registration immediately and puts it back if the server refuses.
    pub async fn set_allow_register(&mut self, value: bool) -> ClientResult<()> {
        let previous = self.allow_register;
        self.allow_register = value;
        match self.client.user_action(&UserAction::SetAllowRegister(value)).await {
            Ok(()) => self.refresh().await,
            Err(e) => {
                self.allow_register = previous;
                Err(e)
            }
        }
    }

    pub async fn user_action(&mut self, action: UserAction) -> ClientResult<()> {
        if let UserAction::Add { username, password } = &action {
            if username.is_empty() || password.is_empty() {
                return Err(ClientError::Rejected("username and password are required".into()));
            }
        }
        self.client.user_action(&action).await?;
        self.refresh().await
    }

    pub async fn add_source(
        &mut self,
        key: &str,
        name: &str,
        api: &str,
        detail: Option<&str>,
    ) -> ClientResult<()> {
        if key.is_empty() || name.is_empty() || api.is_empty() {
            return Err(ClientError::Rejected("name, key and api are required".into()));
        }
        let action = SourceAction::Add {
            key: key.into(),
            name: name.into(),
            api: api.into(),
            detail: detail.filter(|d| !d.is_empty()).map(str::to_string),
        };
        self.client.source_action(&action).await?;
        self.refresh().await
    }

    /// Enables a disabled source or disables an enabled one.
    pub async fn toggle_source(&mut self, key: &str) -> ClientResult<()> {
        let src = self.find_source(key)?;
        let action = if src.disabled {
            SourceAction::Enable(key.into())
        } else {
            SourceAction::Disable(key.into())
        };
        self.client.source_action(&action).await?;
        self.refresh().await
    }

    pub async fn delete_source(&mut self, key: &str) -> ClientResult<()> {
        if self.find_source(key)?.from == SourceOrigin::Config {
            return Err(ClientError::Rejected(format!(
                "source {key} comes from the config file and cannot be deleted"
            )));
        }
        self.client.source_action(&SourceAction::Delete(key.into())).await?;
        self.refresh().await
    }

    /// Moves a source locally; the new order is sent by [`Self::save_source_order`].
    pub fn move_source(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.sources.len() || to >= self.sources.len() { return false; }
        let item = self.sources.remove(from);
        self.sources.insert(to, item);
        self.order_changed = true;
        true
    }

    pub async fn save_source_order(&mut self) -> ClientResult<()> {
        let order = self.sources.iter().map(|s| s.key.clone()).collect();
        self.client.source_action(&SourceAction::Sort(order)).await?;
        self.refresh().await
    }

    pub async fn save_site(&self, site: &SiteConfig) -> ClientResult<()> {
        self.client.save_site(site).await
    }

    /// Only the owner may reset the server configuration.
    pub async fn reset(&self) -> ClientResult<()> {
        if self.role != Some(Role::Owner) {
            return Err(ClientError::Rejected("only the owner can reset the configuration".into()));
        }
        self.client.reset().await
    }

    fn find_source(&self, key: &str) -> ClientResult<&SourceEntry> {
        self.sources
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| ClientError::Rejected(format!("unknown source: {key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role) -> UserEntry {
        UserEntry { username: name.into(), role, banned: false }
    }

    #[test]
    fn users_sorted_self_owner_admin_rest() {
        let users = vec![
            user("carol", Role::User),
            user("bob", Role::Admin),
            user("dave", Role::User),
            user("olga", Role::Owner),
        ];
        let names: Vec<_> =
            sorted_users(&users, Some("dave")).iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["dave", "olga", "bob", "carol"]);
    }

    #[test]
    fn permissions() {
        let admin = user("bob", Role::Admin);
        let plain = user("carol", Role::User);
        let owner = user("olga", Role::Owner);
        assert!(can_operate(Role::Owner, Some("olga"), &admin));
        assert!(!can_operate(Role::Owner, Some("olga"), &owner));
        assert!(can_operate(Role::Admin, Some("bob"), &plain));
        assert!(!can_operate(Role::Admin, Some("bob"), &owner));
        assert!(!can_operate(Role::Admin, Some("zed"), &admin));
    }

    #[test]
    fn action_bodies() {
        let b = UserAction::SetAllowRegister(true).body();
        assert_eq!(b["action"], "setAllowRegister");
        assert_eq!(b["allowRegister"], true);
        let b = SourceAction::Sort(vec!["a".into(), "b".into()]).body();
        assert_eq!(b["action"], "sort");
        assert_eq!(b["order"], json!(["a", "b"]));
        let b = UserAction::Add { username: "x".into(), password: "y".into() }.body();
        assert_eq!(b["targetUsername"], "x");
        assert_eq!(b["targetPassword"], "y");
    }

    #[test]
    fn config_json_shape() {
        let json = r#"{
            "Role": "owner",
            "Config": {
                "SiteConfig": {
                    "SiteName": "TV",
                    "Announcement": "hi",
                    "SearchDownstreamMaxPage": 5,
                    "SiteInterfaceCacheTime": 7200,
                    "SearchResultDefaultAggregate": true
                },
                "UserConfig": {
                    "AllowRegister": false,
                    "Users": [{"username": "olga", "role": "owner"}]
                },
                "SourceConfig": [
                    {"key": "a", "name": "A", "api": "https://a/api", "from": "config"},
                    {"key": "b", "name": "B", "api": "https://b/api", "detail": "https://b",
                     "disabled": true, "from": "custom"}
                ]
            }
        }"#;
        let res: AdminConfigResult = serde_json::from_str(json).unwrap();
        assert_eq!(res.role, Role::Owner);
        assert_eq!(res.config.site_config.search_downstream_max_page, 5);
        assert!(!res.config.user_config.users[0].banned);
        assert_eq!(res.config.source_config[1].from, SourceOrigin::Custom);
        assert!(res.config.source_config[1].disabled);
    }

    #[test]
    fn site_config_serializes_pascal_case() {
        let v = serde_json::to_value(SiteConfig::default()).unwrap();
        assert_eq!(v["SiteInterfaceCacheTime"], 7200);
        assert_eq!(v["SearchDownstreamMaxPage"], 1);
    }
}
