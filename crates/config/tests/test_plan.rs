//! Tests for the `palaver-config` loader: defaults, file discovery,
//! and environment overrides.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

use palaver_config::load;

const ENV_VARS_TO_RESET: &[&str] = &[
    "PALAVER_CONFIG",
    "PALAVER__AUTH__JWT_SECRET",
    "PALAVER__AUTH__TOKEN_TTL_SECONDS",
    "PALAVER__DATABASE__MAX_CONNECTIONS",
    "PALAVER__DATABASE__URL",
    "PALAVER__HTTP__ADDRESS",
    "PALAVER__HTTP__PORT",
    "PALAVER__STORAGE__ROOT",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        let mut ctx = Self {
            vars: Vec::new(),
            original_dir: None,
        };
        for key in ENV_VARS_TO_RESET {
            ctx.remove_var(key);
        }
        ctx
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn chdir(&mut self, dir: &std::path::Path) {
        self.original_dir = std::env::current_dir().ok();
        std::env::set_current_dir(dir).unwrap();
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        for (key, previous) in self.vars.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
        if let Some(dir) = self.original_dir.take() {
            let _ = std::env::set_current_dir(dir);
        }
    }
}

#[test]
#[serial]
fn defaults_apply_without_file_or_env() {
    let mut ctx = TestContext::new();
    let empty = TempDir::new().unwrap();
    ctx.chdir(empty.path());

    let config = load().unwrap();
    assert_eq!(config.http.port, 7070);
    assert_eq!(config.database.url, "sqlite://palaver.db");
    assert_eq!(config.auth.issuer, "palaver");
    assert_eq!(config.storage.max_upload_bytes, 50 * 1024 * 1024);
}

#[test]
#[serial]
fn environment_overrides_take_precedence() {
    let mut ctx = TestContext::new();
    let empty = TempDir::new().unwrap();
    ctx.chdir(empty.path());
    ctx.set_var("PALAVER__HTTP__PORT", "9000");
    ctx.set_var("PALAVER__DATABASE__URL", "sqlite://override.db");
    ctx.set_var("PALAVER__AUTH__JWT_SECRET", "test-secret");

    let config = load().unwrap();
    assert_eq!(config.http.port, 9000);
    assert_eq!(config.database.url, "sqlite://override.db");
    assert_eq!(config.auth.jwt_secret, "test-secret");
}

#[test]
#[serial]
fn config_file_is_discovered_in_cwd() {
    let mut ctx = TestContext::new();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("palaver.toml"),
        r#"
[http]
address = "0.0.0.0"
port = 8088

[storage]
root = "/var/lib/palaver"
"#,
    )
    .unwrap();
    ctx.chdir(dir.path());

    let config = load().unwrap();
    assert_eq!(config.http.address, "0.0.0.0");
    assert_eq!(config.http.port, 8088);
    assert_eq!(config.storage.root, "/var/lib/palaver");
    assert!(config
        .storage
        .room_avatar_dir()
        .ends_with("room_avatar"));
}

#[test]
#[serial]
fn explicit_config_path_wins_over_discovery() {
    let mut ctx = TestContext::new();
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("elsewhere.toml");
    fs::write(&explicit, "[http]\nport = 6000\n").unwrap();
    fs::write(dir.path().join("palaver.toml"), "[http]\nport = 6001\n").unwrap();
    ctx.chdir(dir.path());
    ctx.set_var("PALAVER_CONFIG", explicit.display().to_string());

    let config = load().unwrap();
    assert_eq!(config.http.port, 6000);
}
