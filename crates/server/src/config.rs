//! Server configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use shared::ALLOWED_EXTENSIONS;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_STATIC_PORT: u16 = 8000;
pub const DEFAULT_API_PORT: u16 = 8501;
pub const DEFAULT_STATIC_ROOT: &str = "static";
pub const UPLOADS_SUBPATH: &str = "uploads";

/// Fixed layout of the asset server: where uploads land and where they are served from
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host both servers bind to and that public URLs are rooted at
    pub host: String,
    /// Port of the static asset server
    pub static_port: u16,
    /// Port of the host API (upload, selection)
    pub api_port: u16,
    /// Document root of the static asset server
    pub static_root: PathBuf,
    /// Directory under `static_root` holding uploaded assets
    pub uploads_subpath: String,
    /// Lower-cased extensions accepted by intake
    pub allowed_extensions: Vec<String>,
    /// How long a fresh start may take to accept connections
    pub readiness_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            static_port: DEFAULT_STATIC_PORT,
            api_port: DEFAULT_API_PORT,
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            uploads_subpath: UPLOADS_SUBPATH.to_string(),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            readiness_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Defaults, overridden by `VIEWER_HOST`, `VIEWER_STATIC_PORT`,
    /// `VIEWER_API_PORT` and `VIEWER_STATIC_ROOT` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(host) = lookup("VIEWER_HOST").filter(|h| !h.is_empty()) {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "VIEWER_STATIC_PORT") {
            config.static_port = port;
        }
        if let Some(port) = parse_var(&lookup, "VIEWER_API_PORT") {
            config.api_port = port;
        }
        if let Some(root) = lookup("VIEWER_STATIC_ROOT").filter(|r| !r.is_empty()) {
            config.static_root = PathBuf::from(root);
        }
        config
    }

    /// Directory accepted assets are written to
    pub fn upload_dir(&self) -> PathBuf {
        self.static_root.join(&self.uploads_subpath)
    }

    /// Base URL under which the renderer resolves uploaded assets
    pub fn public_base_url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.host, self.static_port, self.uploads_subpath
        )
    }

    /// Public URL of a single asset
    pub fn asset_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_base_url(), filename)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {key}={raw:?}: not a valid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_fixed_layout() {
        let config = ServerConfig::default();
        assert_eq!(config.static_port, 8000);
        assert_eq!(config.upload_dir(), PathBuf::from("static").join("uploads"));
        assert_eq!(config.public_base_url(), "http://localhost:8000/uploads");
        assert_eq!(
            config.asset_url("model.glb"),
            "http://localhost:8000/uploads/model.glb"
        );
        assert_eq!(config.allowed_extensions, vec!["glb", "gltf"]);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("VIEWER_HOST", "127.0.0.1"),
            ("VIEWER_STATIC_PORT", "9000"),
            ("VIEWER_STATIC_ROOT", "/srv/assets"),
        ]);
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.static_port, 9000);
        assert_eq!(config.api_port, DEFAULT_API_PORT);
        assert_eq!(config.public_base_url(), "http://127.0.0.1:9000/uploads");
        assert_eq!(config.upload_dir(), PathBuf::from("/srv/assets/uploads"));
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = ServerConfig::from_lookup(|k| {
            (k == "VIEWER_STATIC_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.static_port, DEFAULT_STATIC_PORT);
    }
}
