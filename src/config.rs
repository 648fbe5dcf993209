use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SplitmateConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub session_probe_timeout_ms: u64,
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_probe_timeout_ms() -> u64 {
    4000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for SplitmateConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                request_timeout_secs: default_request_timeout_secs(),
                session_probe_timeout_ms: default_probe_timeout_ms(),
            },
            storage: StorageConfig {
                data_dir: "./data/splitmate".to_string(),
            },
        }
    }
}

impl SplitmateConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        tracing::info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        tracing::warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                let _ = std::fs::write(path, s);
            }
            config
        }
    }
}
