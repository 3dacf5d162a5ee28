use std::{collections::HashMap, fs, path::PathBuf};

use tracing::{info, warn};

pub const SETTINGS_FILE: &str = "server.toml";

/// Environment variables recognised by the server, paired with the key the
/// same setting uses in `server.toml`.
const ENV_KEYS: &[(&str, &str)] = &[
    ("HOST", "host"),
    ("PORT", "port"),
    ("MONGODB_URI", "mongodb_uri"),
    ("DB_NAME", "db_name"),
    ("COLLECTION_NAME", "collection_name"),
    ("TODO_COLLECTION_NAME", "todo_collection_name"),
    ("STATIC_DIR", "static_dir"),
    ("FEED_PATH", "feed_path"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: Option<String>,
    pub db_name: String,
    pub collection_name: String,
    pub todo_collection_name: String,
    pub static_dir: PathBuf,
    pub feed_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            mongodb_uri: None,
            db_name: "flask_form_db".into(),
            collection_name: "submissions".into(),
            todo_collection_name: "todos".into(),
            static_dir: PathBuf::from("static"),
            feed_path: PathBuf::from("data.json"),
        }
    }
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn apply(&mut self, key: &str, value: String) {
        match key {
            "host" => self.host = value,
            "port" => match value.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(error) => warn!(%value, %error, "ignoring invalid port"),
            },
            "mongodb_uri" => {
                self.mongodb_uri = Some(value).filter(|uri| !uri.trim().is_empty());
            }
            "db_name" => self.db_name = value,
            "collection_name" => self.collection_name = value,
            "todo_collection_name" => self.todo_collection_name = value,
            "static_dir" => self.static_dir = PathBuf::from(value),
            "feed_path" => self.feed_path = PathBuf::from(value),
            other => warn!(key = other, "unknown setting ignored"),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    if file.is_some() {
        info!(path = SETTINGS_FILE, "loaded settings file");
    }
    settings_from_sources(file.as_deref(), |name| std::env::var(name).ok())
}

/// Defaults, then the settings file, then the environment. For each variable
/// the `APP__` prefixed form overrides the plain one.
pub fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    match value {
                        toml::Value::String(s) => settings.apply(&key, s),
                        toml::Value::Integer(i) => settings.apply(&key, i.to_string()),
                        other => warn!(%key, kind = other.type_str(), "unsupported setting value"),
                    }
                }
            }
            Err(error) => warn!(%error, "settings file is not valid TOML, ignoring it"),
        }
    }

    for &(name, key) in ENV_KEYS {
        if let Some(value) = env(name) {
            settings.apply(key, value);
        }
        if let Some(value) = env(format!("APP__{name}").as_str()) {
            settings.apply(key, value);
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
