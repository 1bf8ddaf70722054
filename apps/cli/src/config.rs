use std::fs;
use std::path::{Path, PathBuf};

use presence_core::{GeoPoint, Geofence};
use serde::{Deserialize, Serialize};

const DEFAULT_OFFICE_LAT: f64 = 30.0444;
const DEFAULT_OFFICE_LNG: f64 = 31.2357;
const DEFAULT_OFFICE_RADIUS_METERS: f64 = 150.0;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub office_lat: f64,
    pub office_lng: f64,
    pub office_radius_meters: f64,
    pub poll_interval_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            office_lat: DEFAULT_OFFICE_LAT,
            office_lng: DEFAULT_OFFICE_LNG,
            office_radius_meters: DEFAULT_OFFICE_RADIUS_METERS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl CliConfig {
    pub fn office(&self) -> Geofence {
        Geofence::new(
            GeoPoint::new(self.office_lat, self.office_lng),
            self.office_radius_meters,
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.office_lat)
            || !(-180.0..=180.0).contains(&self.office_lng)
        {
            return Err(format!(
                "office coordinates out of range: {}, {}",
                self.office_lat, self.office_lng
            ));
        }
        if !self.office_radius_meters.is_finite() || self.office_radius_meters < 0.0 {
            return Err(format!(
                "invalid office radius: {}",
                self.office_radius_meters
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CliConfig,
    pub file: PathBuf,
    pub created: bool,
}

pub fn load_or_create(file: &Path) -> Result<ConfigLoad, String> {
    if file.exists() {
        let contents = fs::read_to_string(file)
            .map_err(|err| format!("read config {}: {}", file.display(), err))?;
        let config: CliConfig = toml::from_str(&contents)
            .map_err(|err| format!("parse config {}: {}", file.display(), err))?;
        config
            .validate()
            .map_err(|err| format!("config {}: {}", file.display(), err))?;
        return Ok(ConfigLoad {
            config,
            file: file.to_path_buf(),
            created: false,
        });
    }

    let config = CliConfig::default();
    let contents =
        toml::to_string_pretty(&config).map_err(|err| format!("serialize config: {}", err))?;
    fs::write(file, contents).map_err(|err| format!("write config {}: {}", file.display(), err))?;

    Ok(ConfigLoad {
        config,
        file: file.to_path_buf(),
        created: true,
    })
}
