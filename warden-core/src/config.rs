//! Application configuration loaded from YAML profile files and
//! environment variables.
//!
//! Resolution order (lowest to highest priority):
//! 1. `application.yaml` (base)
//! 2. `application-{profile}.yaml` (profile override)
//! 3. `.env` / `.env.{profile}` files (loaded into the process
//!    environment, never overwriting already-set variables)
//! 4. `WARDEN_*` environment variables (`WARDEN_SERVER_BIND`
//!    overrides `server.bind`)
//!
//! Profile is determined by `WARDEN_PROFILE`, then the argument,
//! then the default `"dev"`.

use std::collections::HashMap;
use std::path::Path;

/// URL prefixes that are outside the authorization regime entirely.
pub const DEFAULT_BYPASS_PREFIXES: [&str; 8] = [
    "/admin/",
    "/accounts/",
    "/dashboard/",
    "/static/",
    "/media/",
    "/favicon.ico",
    "/api/schema/",
    "/api/docs/",
];

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading files.
    Load(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Flattened dot-keyed application configuration.
#[derive(Debug, Clone, Default)]
pub struct WardenConfig {
    values: HashMap<String, String>,
    profile: String,
}

impl WardenConfig {
    /// Load configuration for the given profile (or `WARDEN_PROFILE`,
    /// or `dev`) from the current working directory.
    pub fn load(profile: Option<&str>) -> Result<Self, ConfigError> {
        let profile = std::env::var("WARDEN_PROFILE")
            .ok()
            .or_else(|| profile.map(str::to_string))
            .unwrap_or_else(|| "dev".to_string());

        // .env files never overwrite real environment variables.
        dotenvy::dotenv().ok();
        dotenvy::from_filename(format!(".env.{profile}")).ok();

        let mut values = HashMap::new();
        load_yaml_file(Path::new("application.yaml"), &mut values)?;
        load_yaml_file(
            Path::new(&format!("application-{profile}.yaml")),
            &mut values,
        )?;
        apply_env_overrides(&mut values);

        Ok(Self { values, profile })
    }

    /// An empty configuration (defaults only).
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            profile: "dev".to_string(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let raw = self
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        match raw {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "bool",
            }),
        }
    }

    /// A list value: either indexed YAML entries (`key.0`, `key.1`, …)
    /// or a comma-separated environment override.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        let mut items = Vec::new();
        let mut index = 0;
        while let Some(item) = self.get(&format!("{key}.{index}")) {
            items.push(item.to_string());
            index += 1;
        }
        if !items.is_empty() {
            return Some(items);
        }
        self.get(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    // ── Typed sections ──────────────────────────────────────────────

    pub fn server(&self) -> ServerSettings {
        ServerSettings {
            bind: self
                .get("server.bind")
                .unwrap_or("127.0.0.1:8080")
                .to_string(),
        }
    }

    pub fn database(&self) -> DatabaseSettings {
        DatabaseSettings {
            url: self
                .get("database.url")
                .unwrap_or("sqlite::memory:")
                .to_string(),
        }
    }

    pub fn authz(&self) -> AuthzSettings {
        AuthzSettings {
            bypass_prefixes: self.get_list("authz.bypass_prefixes").unwrap_or_else(|| {
                DEFAULT_BYPASS_PREFIXES.iter().map(|p| p.to_string()).collect()
            }),
            debug_errors: self.get_bool("authz.debug_errors").unwrap_or(false),
        }
    }
}

/// Where the HTTP server listens.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

/// Policy-store connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

/// Authorization-layer settings.
#[derive(Debug, Clone)]
pub struct AuthzSettings {
    pub bypass_prefixes: Vec<String>,
    pub debug_errors: bool,
}

fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, String>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated string keys. Sequences are
/// stored per element (`key.0`, `key.1`, …).
fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&full, v, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, item) in seq.iter().enumerate() {
                flatten_yaml(&format!("{prefix}.{i}"), item, out);
            }
        }
        serde_yaml::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        serde_yaml::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        serde_yaml::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_yaml::Value::Null | serde_yaml::Value::Tagged(_) => {}
    }
}

/// `WARDEN_SERVER_BIND=...` overrides `server.bind`.
fn apply_env_overrides(values: &mut HashMap<String, String>) {
    for (name, value) in std::env::vars() {
        if name == "WARDEN_PROFILE" {
            continue;
        }
        if let Some(rest) = name.strip_prefix("WARDEN_") {
            let key = rest.to_lowercase().replace('_', ".");
            values.insert(key, value);
        }
    }
}
