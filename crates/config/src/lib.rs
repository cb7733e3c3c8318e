use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "palaver.toml",
    "config/palaver.toml",
    "crates/config/palaver.toml",
    "../palaver.toml",
    "../config/palaver.toml",
    "../crates/config/palaver.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://palaver.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_issuer")]
    pub issuer: String,
    #[serde(default = "AuthConfig::default_audience")]
    pub audience: String,
    #[serde(default = "AuthConfig::default_token_ttl")]
    pub token_ttl_seconds: u64,
}

impl AuthConfig {
    fn default_jwt_secret() -> String {
        "change_me_in_production".to_string()
    }

    fn default_issuer() -> String {
        "palaver".to_string()
    }

    fn default_audience() -> String {
        "palaver-users".to_string()
    }

    const fn default_token_ttl() -> u64 {
        86_400
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_jwt_secret(),
            issuer: Self::default_issuer(),
            audience: Self::default_audience(),
            token_ttl_seconds: Self::default_token_ttl(),
        }
    }
}

/// Where uploaded files land on the local filesystem.
///
/// ```
/// use palaver_config::StorageConfig;
///
/// let storage = StorageConfig::default();
/// assert_eq!(storage.max_upload_bytes, 50 * 1024 * 1024);
/// assert!(storage.room_avatar_dir().ends_with("room_avatar"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    #[serde(default = "StorageConfig::default_avatar_subdir")]
    pub avatar_subdir: String,
    #[serde(default = "StorageConfig::default_upload_subdir")]
    pub upload_subdir: String,
    #[serde(default = "StorageConfig::default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl StorageConfig {
    fn default_avatar_subdir() -> String {
        "room_avatar".to_string()
    }

    fn default_upload_subdir() -> String {
        "upload".to_string()
    }

    const fn default_max_upload_bytes() -> u64 {
        50 * 1024 * 1024
    }

    pub fn room_avatar_dir(&self) -> PathBuf {
        PathBuf::from(&self.root).join(&self.avatar_subdir)
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.root).join(&self.upload_subdir)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "chat_storage".to_string(),
            avatar_subdir: Self::default_avatar_subdir(),
            upload_subdir: Self::default_upload_subdir(),
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use palaver_config::load;
///
/// std::env::remove_var("PALAVER_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder();
    builder = builder
        .set_default("http.address", defaults.http.address.clone())
        .unwrap()
        .set_default("http.port", i64::from(defaults.http.port))
        .unwrap()
        .set_default("database.url", defaults.database.url.clone())
        .unwrap()
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )
        .unwrap()
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())
        .unwrap()
        .set_default("auth.issuer", defaults.auth.issuer.clone())
        .unwrap()
        .set_default("auth.audience", defaults.auth.audience.clone())
        .unwrap()
        .set_default(
            "auth.token_ttl_seconds",
            i64::try_from(defaults.auth.token_ttl_seconds).unwrap_or(i64::MAX),
        )
        .unwrap()
        .set_default("storage.root", defaults.storage.root.clone())
        .unwrap()
        .set_default("storage.avatar_subdir", defaults.storage.avatar_subdir.clone())
        .unwrap()
        .set_default("storage.upload_subdir", defaults.storage.upload_subdir.clone())
        .unwrap()
        .set_default(
            "storage.max_upload_bytes",
            i64::try_from(defaults.storage.max_upload_bytes).unwrap_or(i64::MAX),
        )
        .unwrap();

    let environment_overrides = config::Environment::with_prefix("PALAVER").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("PALAVER_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via PALAVER_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}
