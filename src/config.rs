//! Configuration loading and validation

use std::path::{Path, PathBuf};

use cgmath::Vector3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::ar::placement::OrientationMode;
use crate::ar::platform::{FeatureRequest, SessionFeature};
use crate::assets::ModelDefaults;
use crate::gfx::scene::HemisphereLight;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub reticle: ReticleConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path, file:// or http(s):// URL of a .glb, .gltf or .obj model
    #[serde(default = "default_model_url")]
    pub url: String,
    /// Uniform scale applied when the model is loaded
    #[serde(default = "default_one")]
    pub scale: f32,
    /// Position before the first placement
    #[serde(default)]
    pub position: [f32; 3],
    /// Fallback color for models without material colors
    #[serde(default = "default_model_color")]
    pub color: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: default_model_url(),
            scale: default_one(),
            position: [0.0; 3],
            color: default_model_color(),
        }
    }
}

fn default_model_url() -> String {
    "model.glb".to_string()
}

fn default_model_color() -> String {
    "#cccccc".to_string()
}

fn default_one() -> f32 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// `position-only` keeps the model upright; `full-pose` also copies the surface orientation
    #[serde(default)]
    pub orientation: OrientationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReticleConfig {
    #[serde(default = "default_inner_radius")]
    pub inner_radius: f32,
    #[serde(default = "default_outer_radius")]
    pub outer_radius: f32,
    #[serde(default = "default_segments")]
    pub segments: u32,
    #[serde(default = "default_white")]
    pub color: String,
}

impl Default for ReticleConfig {
    fn default() -> Self {
        Self {
            inner_radius: default_inner_radius(),
            outer_radius: default_outer_radius(),
            segments: default_segments(),
            color: default_white(),
        }
    }
}

fn default_inner_radius() -> f32 {
    0.05
}

fn default_outer_radius() -> f32 {
    0.06
}

fn default_segments() -> u32 {
    32
}

fn default_white() -> String {
    "#ffffff".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_white")]
    pub sky_color: String,
    #[serde(default = "default_ground_color")]
    pub ground_color: String,
    #[serde(default = "default_one")]
    pub intensity: f32,
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            sky_color: default_white(),
            ground_color: default_ground_color(),
            intensity: default_one(),
            position: default_light_position(),
        }
    }
}

fn default_ground_color() -> String {
    "#bbbbff".to_string()
}

fn default_light_position() -> [f32; 3] {
    [0.5, 1.0, 0.25]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_required_features")]
    pub required_features: Vec<SessionFeature>,
    #[serde(default)]
    pub optional_features: Vec<SessionFeature>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            required_features: default_required_features(),
            optional_features: Vec::new(),
        }
    }
}

fn default_required_features() -> Vec<SessionFeature> {
    vec![SessionFeature::HitTest]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Background when no camera passthrough is available
    #[serde(default = "default_clear_color")]
    pub clear_color: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: default_clear_color(),
        }
    }
}

fn default_clear_color() -> String {
    "#1a1a24".to_string()
}

impl ArConfig {
    /// Load configuration from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(
                "configuration file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.model.scale.is_finite() || self.model.scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "model.scale must be positive, got {}",
                self.model.scale
            )));
        }
        if [self.reticle.inner_radius, self.reticle.outer_radius]
            .iter()
            .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(ConfigError::Invalid(
                "reticle radii must be positive and finite".to_string(),
            ));
        }
        if self.reticle.inner_radius >= self.reticle.outer_radius {
            return Err(ConfigError::Invalid(format!(
                "reticle.inner_radius ({}) must be smaller than outer_radius ({})",
                self.reticle.inner_radius, self.reticle.outer_radius
            )));
        }
        if self.reticle.segments < 3 {
            return Err(ConfigError::Invalid(
                "reticle.segments must be at least 3".to_string(),
            ));
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov must be between 0 and 180 degrees, got {}",
                self.camera.fov
            )));
        }
        if !self.camera.near.is_finite()
            || !self.camera.far.is_finite()
            || self.camera.near <= 0.0
            || self.camera.near >= self.camera.far
        {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                self.camera.near, self.camera.far
            )));
        }

        for color in [
            &self.model.color,
            &self.reticle.color,
            &self.light.sky_color,
            &self.light.ground_color,
            &self.renderer.clear_color,
        ] {
            parse_hex_color(color)?;
        }
        Ok(())
    }

    pub fn feature_request(&self) -> FeatureRequest {
        FeatureRequest {
            required: self.session.required_features.clone(),
            optional: self.session.optional_features.clone(),
        }
    }

    pub fn hemisphere_light(&self) -> Result<HemisphereLight, ConfigError> {
        let [x, y, z] = self.light.position;
        Ok(HemisphereLight {
            sky_color: parse_hex_color(&self.light.sky_color)?,
            ground_color: parse_hex_color(&self.light.ground_color)?,
            intensity: self.light.intensity,
            position: Vector3::new(x, y, z),
        })
    }

    pub fn model_defaults(&self) -> Result<ModelDefaults, ConfigError> {
        let [r, g, b] = parse_hex_color(&self.model.color)?;
        let [x, y, z] = self.model.position;
        Ok(ModelDefaults {
            scale: self.model.scale,
            position: Vector3::new(x, y, z),
            color: [r, g, b, 1.0],
        })
    }

    pub fn reticle_color(&self) -> Result<[f32; 4], ConfigError> {
        let [r, g, b] = parse_hex_color(&self.reticle.color)?;
        Ok([r, g, b, 1.0])
    }

    pub fn clear_color(&self) -> Result<[f64; 4], ConfigError> {
        let [r, g, b] = parse_hex_color(&self.renderer.clear_color)?;
        Ok([r as f64, g as f64, b as f64, 1.0])
    }
}

/// Parses `#rrggbb` (leading `#` optional) into normalized sRGB 0..1 components
pub fn parse_hex_color(value: &str) -> Result<[f32; 3], ConfigError> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || ConfigError::InvalidColor(value.to_string());

    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map(|v| v as f32 / 255.0)
            .map_err(|_| invalid())
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ArConfig::from_toml_str("").unwrap();

        assert_eq!(config, ArConfig::default());
        assert_eq!(config.model.url, "model.glb");
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.reticle.segments, 32);
        assert_eq!(config.placement.orientation, OrientationMode::PositionOnly);
        assert_eq!(
            config.feature_request().required,
            vec![SessionFeature::HitTest]
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ArConfig::from_toml_str(
            r#"
            [model]
            url = "https://example.com/chair.glb"
            scale = 0.5

            [placement]
            orientation = "full-pose"

            [session]
            optional_features = ["dom-overlay"]
            "#,
        )
        .unwrap();

        assert_eq!(config.model.url, "https://example.com/chair.glb");
        assert_eq!(config.model.scale, 0.5);
        assert_eq!(config.model.position, [0.0; 3]);
        assert_eq!(config.placement.orientation, OrientationMode::FullPose);
        assert_eq!(config.session.required_features, vec![SessionFeature::HitTest]);
        assert_eq!(config.session.optional_features, vec![SessionFeature::DomOverlay]);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            "[model]\nscale = 0.0",
            "[reticle]\ninner_radius = 0.07",
            "[reticle]\nsegments = 2",
            "[camera]\nnear = 10.0\nfar = 1.0",
            "[light]\nsky_color = \"white\"",
        ];
        for case in cases {
            assert!(ArConfig::from_toml_str(case).is_err(), "accepted: {case}");
        }

        let non_finite = [
            "[model]\nscale = nan",
            "[model]\nscale = inf",
            "[reticle]\ninner_radius = nan",
            "[reticle]\nouter_radius = nan",
            "[camera]\nnear = nan",
            "[camera]\nfar = inf",
        ];
        for case in non_finite {
            assert!(
                matches!(ArConfig::from_toml_str(case), Err(ConfigError::Invalid(_))),
                "accepted: {case}"
            );
        }
    }

    #[test]
    fn unknown_feature_is_a_parse_error() {
        let err = ArConfig::from_toml_str("[session]\nrequired_features = [\"teleport\"]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn light_colors_match_hex_values() {
        let light = ArConfig::default().hemisphere_light().unwrap();

        assert_eq!(light.sky_color, [1.0, 1.0, 1.0]);
        assert!((light.ground_color[0] - 187.0 / 255.0).abs() < 1e-6);
        assert_eq!(light.ground_color[2], 1.0);
        assert_eq!(light.position, Vector3::new(0.5, 1.0, 0.25));
    }

    #[test]
    fn parse_hex_color_accepts_optional_hash() {
        assert_eq!(parse_hex_color("#ff0000").unwrap(), [1.0, 0.0, 0.0]);
        assert_eq!(parse_hex_color("00ff00").unwrap(), [0.0, 1.0, 0.0]);
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arplace.toml");
        let mut config = ArConfig::default();
        config.model.url = "models/lamp.obj".to_string();

        config.save(&path).unwrap();

        assert_eq!(ArConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ArConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ArConfig::default());
    }
}
