use std::path::{Path, PathBuf};

use lidar_core::{crs::EPSG_WEB_MERCATOR, EpsgCode};
use lidar_pipeline::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Root under which every region's `ept.json` lives.
    pub base_url: String,
    /// CRS of the catalog bounds and of the extents sent to datasets.
    pub input_epsg: EpsgCode,
    pub catalog_path: PathBuf,
    pub template_path: PathBuf,
    pub pdal_path: PathBuf,
    pub parallel: bool,
    pub proj_data_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            input_epsg: EPSG_WEB_MERCATOR,
            catalog_path: PathBuf::from("data/usgs_3dep_regions.csv"),
            template_path: PathBuf::from("data/pipeline.json"),
            pdal_path: PathBuf::from("pdal"),
            parallel: false,
            proj_data_dir: None,
        }
    }
}

impl FetchConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"parallel": true, "pdal_path": "/opt/pdal/bin/pdal"}"#).unwrap();

        let config = FetchConfig::from_path(&path).unwrap();
        assert!(config.parallel);
        assert_eq!(config.pdal_path, PathBuf::from("/opt/pdal/bin/pdal"));
        assert_eq!(config.input_epsg, 3857);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"paralel": true}"#).unwrap();
        assert!(matches!(
            FetchConfig::from_path(&path),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            FetchConfig::from_path(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
