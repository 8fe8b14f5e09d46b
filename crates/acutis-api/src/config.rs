use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use acutis_storage::ObjectStore;
use acutis_storage::fs::FsStore;
use acutis_storage::s3::S3Store;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Added in v1.
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_seed_catalog")]
    pub seed_catalog: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    Filesystem {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        region: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_seed_catalog() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            bind_addr: default_bind_addr(),
            storage: StorageConfig::default(),
            log_format: LogFormat::default(),
            seed_catalog: true,
        }
    }
}

impl StorageConfig {
    pub async fn open(&self) -> ObjectStore {
        match self {
            Self::Memory => ObjectStore::memory(),
            Self::Filesystem { root } => ObjectStore::Filesystem(FsStore::new(root)),
            Self::S3 { bucket, region } => {
                ObjectStore::S3(S3Store::from_env(bucket, region.clone()).await)
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Memory => "memory".to_string(),
            Self::Filesystem { root } => format!("filesystem:{}", root.display()),
            Self::S3 { bucket, .. } => format!("s3:{bucket}"),
        }
    }
}

/// `ACUTIS_CONFIG` if set, else the per-user config directory.
pub fn config_path() -> eyre::Result<PathBuf> {
    if let Some(path) = std::env::var_os("ACUTIS_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("acutis-intake").join("config.json"))
}

/// Load the config from [`config_path`] and apply environment overrides.
/// A missing file yields the defaults.
pub fn load_config() -> eyre::Result<ServiceConfig> {
    let mut config = load_config_from(&config_path()?)?;
    apply_overrides(
        &mut config,
        std::env::var("ACUTIS_BIND_ADDR").ok(),
        std::env::var("ACUTIS_BUCKET").ok(),
        std::env::var("AWS_REGION").ok(),
    );
    Ok(config)
}

pub fn load_config_from(path: &Path) -> eyre::Result<ServiceConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ServiceConfig::default());
        }
        Err(e) => {
            return Err(eyre::eyre!(
                "failed to read config at {}: {e}",
                path.display()
            ));
        }
    };

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: ServiceConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

fn apply_overrides(
    config: &mut ServiceConfig,
    bind_addr: Option<String>,
    bucket: Option<String>,
    region: Option<String>,
) {
    if let Some(bind_addr) = bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(bucket) = bucket {
        let region = match &config.storage {
            StorageConfig::S3 {
                region: Some(region),
                ..
            } => Some(region.clone()),
            _ => region,
        };
        config.storage = StorageConfig::S3 { bucket, region };
    }
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update acutis-intake."
        ));
    }

    // v0 → v1: add log_format
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("log_format")
            .or_insert(serde_json::Value::String("json".to_string()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (added log_format)");
    }

    Ok(json)
}

pub fn save_config_to(config: &ServiceConfig, path: &Path) -> eyre::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| eyre::eyre!("config path has no parent: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;
    let json = serde_json::to_string_pretty(&stamped)?;

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
