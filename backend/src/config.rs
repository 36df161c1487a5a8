use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub inference: InferenceConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub base_url: String,
    pub max_upload_bytes: usize,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            base_url: "http://127.0.0.1:5000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    pub model_server_url: String,
    pub model_name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_image_size")]
    pub image_size: Vec<u32>,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_confidence_threshold() -> f32 {
    0.60
}

fn default_top_n() -> usize {
    3
}

fn default_max_concurrency() -> usize {
    4
}

fn default_image_size() -> Vec<u32> {
    vec![224, 224]
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["png".into(), "jpg".into(), "jpeg".into()]
}

impl InferenceConfig {
    /// Configured input size as `(height, width)`.
    pub fn image_dims(&self) -> (u32, u32) {
        (self.image_size[0], self.image_size[1])
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub class_indices: PathBuf,
    pub species_info: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub images: ImageStorageConfig,
    pub records: RecordStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images: ImageStorageConfig::Local {
                dir: PathBuf::from("uploads"),
            },
            records: RecordStorageConfig::Jsonl {
                path: PathBuf::from("feedback.jsonl"),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ImageStorageConfig {
    Local { dir: PathBuf },
    S3 { bucket: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum RecordStorageConfig {
    Jsonl { path: PathBuf },
    Dynamodb {
        feedback_table: String,
        quiz_table: String,
    },
    Memory,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        log::info!("Loading configuration from {}", config_path.display());
        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::Io(config_path.clone(), e))?;
        let mut config = Self::from_yaml_str(&config_str)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("BUTTERFLY_CONFIG") {
            return PathBuf::from(path);
        }
        match std::env::var("CARGO_MANIFEST_DIR") {
            Ok(manifest_dir) => PathBuf::from(format!("{}/../config/butterfly.yaml", manifest_dir)),
            Err(_) => PathBuf::from("config/butterfly.yaml"),
        }
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(config_str)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(base_url) = lookup("BASE_URL") {
            self.server.base_url = base_url;
        }
        if let Some(url) = lookup("MODEL_SERVER_URL") {
            self.inference.model_server_url = url;
        }
        if let (Some(bucket), ImageStorageConfig::S3 { bucket: current }) =
            (lookup("S3_BUCKET_NAME"), &mut self.storage.images)
        {
            *current = bucket;
        }
        if let RecordStorageConfig::Dynamodb {
            feedback_table,
            quiz_table,
        } = &mut self.storage.records
        {
            if let Some(table) = lookup("DYNAMODB_FEEDBACK_TABLE") {
                *feedback_table = table;
            }
            if let Some(table) = lookup("DYNAMODB_QUIZ_TABLE") {
                *quiz_table = table;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let inference = &self.inference;
        if !(0.0..=1.0).contains(&inference.confidence_threshold) {
            return Err(ConfigError::Invalid {
                key: "inference.confidence_threshold",
                reason: format!("{} is outside [0, 1]", inference.confidence_threshold),
            });
        }
        if inference.top_n == 0 {
            return Err(ConfigError::Invalid {
                key: "inference.top_n",
                reason: "must be at least 1".to_string(),
            });
        }
        if inference.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "inference.max_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if inference.image_size.len() != 2 || inference.image_size.contains(&0) {
            return Err(ConfigError::Invalid {
                key: "inference.image_size",
                reason: format!("expected [height, width], got {:?}", inference.image_size),
            });
        }
        url::Url::parse(&inference.model_server_url).map_err(|e| ConfigError::Invalid {
            key: "inference.model_server_url",
            reason: e.to_string(),
        })?;
        url::Url::parse(&self.server.base_url).map_err(|e| ConfigError::Invalid {
            key: "server.base_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
