use crate::constants;
use crate::error::{CatalogError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub images: ImagesConfig,
    pub listing: ListingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source_csv: PathBuf,
    pub backup_csv: PathBuf,
    pub public_dir: PathBuf,
    pub images_dir: PathBuf,
    pub uploads_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: constants::DEFAULT_PORT }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_csv: PathBuf::from(constants::SOURCE_CSV),
            backup_csv: PathBuf::from(constants::BACKUP_CSV),
            public_dir: PathBuf::from(constants::PUBLIC_DIR),
            images_dir: PathBuf::from(constants::IMAGES_DIR),
            uploads_dir: PathBuf::from(constants::UPLOADS_DIR),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: constants::MAX_DIMENSION,
            jpeg_quality: constants::JPEG_QUALITY,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self { page_size: constants::DEFAULT_PAGE_SIZE }
    }
}

impl Config {
    /// Loads `config.toml` if present; a missing file yields the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CatalogError::Config(format!("Failed to parse '{}': {}", path.display(), e)))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.server.port, constants::DEFAULT_PORT);
        assert_eq!(config.images.max_dimension, 1200);
        assert_eq!(config.listing.page_size, 24);
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.images.jpeg_quality, constants::JPEG_QUALITY);
    }
}
