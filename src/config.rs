use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::decision::{PipelineSettings, LABEL_PLACEHOLDER};
use crate::ingest::{SourceConfig, MAX_FRAME_DIMENSION};

const DEFAULT_SOURCE_URL: &str = "stub://street";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_TRAFFIC_LIGHT_LABEL: &str = "traffic light";
const DEFAULT_ALERT_TEMPLATE: &str = "{label} nearby, be careful";

#[derive(Debug, Deserialize, Default)]
struct HazardConfigFile {
    labels_path: Option<PathBuf>,
    source: Option<SourceConfigFile>,
    models: Option<ModelConfigFile>,
    alerts: Option<AlertConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    detector: Option<PathBuf>,
    classifier: Option<PathBuf>,
    detector_fixture: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    traffic_light_label: Option<String>,
    template: Option<String>,
    alert_mode: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct HazardConfig {
    /// Label file; the bundled COCO map is used when unset.
    pub labels_path: Option<PathBuf>,
    pub source: SourceConfig,
    pub models: ModelSettings,
    pub alerts: AlertSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSettings {
    pub detector: Option<PathBuf>,
    pub classifier: Option<PathBuf>,
    /// JSON detector outputs replayed instead of a model.
    pub detector_fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSettings {
    pub traffic_light_label: String,
    pub template: String,
    /// Proximity alert mode at startup.
    pub alert_mode: bool,
}

impl HazardConfig {
    /// Load from an explicit file (if any), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            traffic_light_label: self.alerts.traffic_light_label.clone(),
            alert_template: self.alerts.template.clone(),
            render_overlay: false,
        }
    }

    fn from_file(file: HazardConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        let models = file.models.unwrap_or_default();
        let alerts = file.alerts.unwrap_or_default();
        Self {
            labels_path: file.labels_path,
            source: SourceConfig {
                url: source.url.unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                target_fps: source.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
                width: source.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
                height: source.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            },
            models: ModelSettings {
                detector: models.detector,
                classifier: models.classifier,
                detector_fixture: models.detector_fixture,
            },
            alerts: AlertSettings {
                traffic_light_label: alerts
                    .traffic_light_label
                    .unwrap_or_else(|| DEFAULT_TRAFFIC_LIGHT_LABEL.to_string()),
                template: alerts
                    .template
                    .unwrap_or_else(|| DEFAULT_ALERT_TEMPLATE.to_string()),
                alert_mode: alerts.alert_mode.unwrap_or(false),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = non_empty_env("HAZARD_SOURCE") {
            self.source.url = url;
        }
        if let Some(path) = non_empty_env("HAZARD_LABELS") {
            self.labels_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_env("HAZARD_DETECTOR_MODEL") {
            self.models.detector = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_env("HAZARD_CLASSIFIER_MODEL") {
            self.models.classifier = Some(PathBuf::from(path));
        }
        if let Some(label) = non_empty_env("HAZARD_TRAFFIC_LIGHT_LABEL") {
            self.alerts.traffic_light_label = label;
        }
        if let Some(value) = non_empty_env("HAZARD_ALERT_MODE") {
            self.alerts.alert_mode = parse_bool(&value).ok_or_else(|| {
                anyhow!("HAZARD_ALERT_MODE must be one of true/false/on/off/1/0")
            })?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source width and height must be greater than zero"));
        }
        if self.source.width > MAX_FRAME_DIMENSION || self.source.height > MAX_FRAME_DIMENSION {
            return Err(anyhow!(
                "source width and height must be at most {}",
                MAX_FRAME_DIMENSION
            ));
        }
        self.alerts.traffic_light_label = self.alerts.traffic_light_label.trim().to_string();
        if self.alerts.traffic_light_label.is_empty() {
            return Err(anyhow!("traffic_light_label must not be empty"));
        }
        if !self.alerts.template.contains(LABEL_PLACEHOLDER) {
            return Err(anyhow!(
                "alert template must contain the {} placeholder",
                LABEL_PLACEHOLDER
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<HazardConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
