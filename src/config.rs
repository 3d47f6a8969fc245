use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub map: MapConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub geojson: PathBuf,
    #[serde(default)]
    pub properties: PropertyKeys,
}

/// Which feature properties in the input document carry the district
/// fields. Defaults match the Copperbelt source data.
#[derive(Debug, Deserialize, Clone)]
pub struct PropertyKeys {
    #[serde(default = "default_name_key")]
    pub name: String,
    #[serde(default = "default_population_key")]
    pub population: String,
    #[serde(default = "default_status_key")]
    pub status: String,
    #[serde(default = "default_start_key")]
    pub outage_start: String,
    #[serde(default = "default_end_key")]
    pub outage_end: String,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        PropertyKeys {
            name: default_name_key(),
            population: default_population_key(),
            status: default_status_key(),
            outage_start: default_start_key(),
            outage_end: default_end_key(),
        }
    }
}

fn default_name_key() -> String {
    "NAME_2".to_string()
}

fn default_population_key() -> String {
    "PopEst".to_string()
}

fn default_status_key() -> String {
    "Status".to_string()
}

fn default_start_key() -> String {
    "StartTime".to_string()
}

fn default_end_key() -> String {
    "EndTime".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MapConfig {
    /// Labels are hidden as a group below this zoom level.
    #[serde(default = "default_label_zoom")]
    pub label_zoom_threshold: u8,
    #[serde(default = "default_alert_color")]
    pub alert_color: String,
    #[serde(default = "default_normal_color")]
    pub normal_color: String,
    #[serde(default = "default_neutral_color")]
    pub neutral_color: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            label_zoom_threshold: default_label_zoom(),
            alert_color: default_alert_color(),
            normal_color: default_normal_color(),
            neutral_color: default_neutral_color(),
            weight: default_weight(),
            fill_opacity: default_fill_opacity(),
        }
    }
}

fn default_label_zoom() -> u8 {
    7
}

fn default_alert_color() -> String {
    "red".to_string()
}

fn default_normal_color() -> String {
    "green".to_string()
}

fn default_neutral_color() -> String {
    "gray".to_string()
}

fn default_weight() -> f64 {
    2.0
}

fn default_fill_opacity() -> f64 {
    0.4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(".")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            geojson = "districts.geojson"
            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.input.properties.name, "NAME_2");
        assert_eq!(config.map.label_zoom_threshold, 7);
        assert_eq!(config.map.alert_color, "red");
        assert_eq!(config.server.static_dir, PathBuf::from("."));
    }

    #[test]
    fn property_keys_can_be_overridden() {
        let config: AppConfig = toml::from_str(
            r#"
            [input]
            geojson = "districts.geojson"
            [input.properties]
            name = "DISTRICT"
            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.input.properties.name, "DISTRICT");
        assert_eq!(config.input.properties.status, "Status");
    }
}
