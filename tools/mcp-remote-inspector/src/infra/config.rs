use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::shared::types::TransportKind;

const CONFIG_DIR_ENV: &str = "APP_CONFIG_DIR";
const CONFIG_PROFILE_ENV: &str = "APP_CONFIG_PROFILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_PROFILE: &str = "default";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CLIENT_NAME: &str = "mcp-remote-inspector";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub sse_url: Option<String>,
    pub streamable_http_url: Option<String>,
    pub transport: Option<TransportKind>,
    pub connect_timeout_ms: Option<u64>,
    pub auth_token: Option<String>,
    pub client_name: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let base_dir = env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));
        Self::load_from_dir(&base_dir)
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut config = AppConfig::default();
        let mut overlays = Vec::new();

        if dir.exists() {
            let mut profiles = Vec::new();
            profiles.push(DEFAULT_PROFILE.to_string());
            if let Ok(active_profile) = env::var(CONFIG_PROFILE_ENV) {
                if !active_profile.trim().is_empty() && active_profile != DEFAULT_PROFILE {
                    profiles.push(active_profile);
                }
            }
            profiles.push("local".to_string());

            for profile in profiles {
                let candidate = dir.join(format!("{profile}.toml"));
                if let Some(overlay) = ConfigOverlay::from_file(&candidate)? {
                    overlays.push(overlay);
                }
            }
        }

        overlays.push(ConfigOverlay::from_env());

        for overlay in overlays {
            config.apply_overlay(overlay);
        }

        Ok(config)
    }

    pub fn url_for(&self, kind: TransportKind) -> String {
        let configured = match kind {
            TransportKind::Sse => self.sse_url.as_deref(),
            TransportKind::StreamableHttp => self.streamable_http_url.as_deref(),
        };
        configured
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(kind.default_url())
            .to_string()
    }

    pub fn initial_transport(&self) -> TransportKind {
        self.transport.unwrap_or_default()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(
            self.connect_timeout_ms
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        )
    }

    pub fn client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(value) = overlay.sse_url {
            self.sse_url = Some(value);
        }
        if let Some(value) = overlay.streamable_http_url {
            self.streamable_http_url = Some(value);
        }
        if let Some(value) = overlay.transport {
            self.transport = Some(value);
        }
        if let Some(value) = overlay.connect_timeout_ms {
            self.connect_timeout_ms = Some(value);
        }
        if let Some(value) = overlay.auth_token {
            self.auth_token = Some(value);
        }
        if let Some(value) = overlay.client_name {
            self.client_name = Some(value);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    sse_url: Option<String>,
    streamable_http_url: Option<String>,
    transport: Option<TransportKind>,
    connect_timeout_ms: Option<u64>,
    auth_token: Option<String>,
    client_name: Option<String>,
}

impl ConfigOverlay {
    fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let overlay: Self = toml::from_str(&contents)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(Some(overlay))
    }

    fn from_env() -> Self {
        let sse_url = env::var("MCP_SSE_URL").ok();
        let streamable_http_url = env::var("MCP_STREAMABLE_HTTP_URL").ok();
        let transport = env::var("MCP_TRANSPORT")
            .ok()
            .and_then(|raw| raw.parse::<TransportKind>().ok());
        let connect_timeout_ms = env::var("MCP_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());
        let auth_token = env::var("MCP_AUTH_TOKEN").ok();
        let client_name = env::var("MCP_CLIENT_NAME").ok();
        Self {
            sse_url,
            streamable_http_url,
            transport,
            connect_timeout_ms,
            auth_token,
            client_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 7] = [
        CONFIG_PROFILE_ENV,
        "MCP_SSE_URL",
        "MCP_STREAMABLE_HTTP_URL",
        "MCP_TRANSPORT",
        "MCP_CONNECT_TIMEOUT_MS",
        "MCP_AUTH_TOKEN",
        "MCP_CLIENT_NAME",
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let _guard = ENV_MUTEX.lock().expect("env mutex");
        let snapshot: Vec<(String, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (k.to_string(), env::var(k).ok()))
            .collect();
        for key in ALL_VARS {
            unsafe {
                // SAFETY: env access is serialized by ENV_MUTEX and restored below.
                env::remove_var(key);
            }
        }
        for (key, value) in vars {
            if let Some(val) = value {
                unsafe {
                    env::set_var(key, val);
                }
            }
        }
        f();
        for (key, value) in snapshot {
            match value {
                Some(val) => unsafe {
                    env::set_var(&key, val);
                },
                None => unsafe {
                    env::remove_var(&key);
                },
            }
        }
    }

    #[test]
    fn load_from_dir_without_files_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        with_env(&[], || {
            let cfg = AppConfig::load_from_dir(dir.path()).expect("config load");
            assert_eq!(cfg.url_for(TransportKind::Sse), "https://mcp.deepwiki.com/sse");
            assert_eq!(
                cfg.url_for(TransportKind::StreamableHttp),
                "https://mcp.context7.com/mcp"
            );
            assert_eq!(cfg.initial_transport(), TransportKind::Sse);
            assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
            assert_eq!(cfg.client_name(), "mcp-remote-inspector");
            assert!(cfg.auth_token.is_none());
        });
        Ok(())
    }

    #[test]
    fn load_merges_profile_local_and_env() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("default.toml"),
            "sse_url = \"http://127.0.0.1:9100/sse\"\nconnect_timeout_ms = 2500\n",
        )?;
        std::fs::write(
            dir.path().join("staging.toml"),
            "transport = \"streamable_http\"\n",
        )?;
        std::fs::write(
            dir.path().join("local.toml"),
            "streamable_http_url = \"http://127.0.0.1:9101/mcp\"\n",
        )?;

        with_env(
            &[
                (CONFIG_PROFILE_ENV, Some("staging")),
                ("MCP_SSE_URL", Some("http://10.0.0.2:9100/sse")),
                ("MCP_AUTH_TOKEN", Some("secret")),
            ],
            || {
                let cfg = AppConfig::load_from_dir(dir.path()).expect("config load");
                assert_eq!(cfg.url_for(TransportKind::Sse), "http://10.0.0.2:9100/sse");
                assert_eq!(
                    cfg.url_for(TransportKind::StreamableHttp),
                    "http://127.0.0.1:9101/mcp"
                );
                assert_eq!(cfg.initial_transport(), TransportKind::StreamableHttp);
                assert_eq!(cfg.connect_timeout(), Duration::from_millis(2500));
                assert_eq!(cfg.auth_token.as_deref(), Some("secret"));
            },
        );
        Ok(())
    }

    #[test]
    fn blank_urls_fall_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("default.toml"), "sse_url = \"  \"\n")?;
        with_env(&[], || {
            let cfg = AppConfig::load_from_dir(dir.path()).expect("config load");
            assert_eq!(cfg.url_for(TransportKind::Sse), "https://mcp.deepwiki.com/sse");
        });
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("default.toml"), "transport = \"carrier-pigeon\"\n")?;
        with_env(&[], || {
            let err = AppConfig::load_from_dir(dir.path()).unwrap_err();
            assert!(err.to_string().contains("default.toml"));
        });
        Ok(())
    }
}
