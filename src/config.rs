//! Viewer configuration
//!
//! Loaded from TOML. Every section is optional; missing keys fall back to the
//! defaults for the bundled knight scene.

use crate::animation::Easing;
use crate::error::ConfigError;
use crate::placement::GeometryVariant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "AR_VIEWER_CONFIG";

/// What the very first placement trigger does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstTriggerBehavior {
    /// Spawn a primitive and start the asset load in the background
    SpawnPrimitive,
    /// Start the asset load; no primitive for this trigger
    #[default]
    StartAssetLoad,
}

/// How placement triggers are handled while the asset is loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuringLoadTriggerPolicy {
    #[default]
    Ignore,
    SpawnPrimitiveAnyway,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub first_trigger_behavior: FirstTriggerBehavior,
    pub during_load_trigger_policy: DuringLoadTriggerPolicy,
    /// Bundle identifier handed to the bundle source
    pub bundle: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            first_trigger_behavior: FirstTriggerBehavior::default(),
            during_load_trigger_policy: DuringLoadTriggerPolicy::default(),
            bundle: "knight.glb".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Clip to start with; the first clip in source order when absent or unmatched
    pub default_clip: Option<String>,
    /// Blend time when switching clips, 0 for a hard cut
    pub crossfade_secs: f32,
    pub crossfade_easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_clip: Some("look around".to_string()),
            crossfade_secs: 0.0,
            crossfade_easing: Easing::EaseInOutSine,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub palette: Vec<GeometryVariant>,
    /// Spawn offset in the controller's local frame
    pub offset: [f32; 3],
    /// Radians of Y spin added to each instance per rendered frame
    pub spin_per_frame: f32,
    pub shininess: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            palette: GeometryVariant::default_palette(),
            offset: [0.0, 0.0, -0.3],
            spin_per_frame: 0.01,
            shininess: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory the file bundle source resolves identifiers against
    pub base_path: PathBuf,
    /// Where the loaded asset root is placed
    pub position: [f32; 3],
    pub scale: f32,
    /// Node names hidden after load (helper meshes shipped with the rig)
    pub hidden_nodes: Vec<String>,
    /// Fail the load after this much frame time without progress; 0 disables
    pub load_timeout_secs: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("assets"),
            position: [0.0, 0.0, -1.0],
            scale: 0.5,
            hidden_nodes: vec!["Cube".to_string()],
            load_timeout_secs: 30.0,
        }
    }
}

impl AssetConfig {
    /// The stall timeout, or `None` when `load_timeout_secs` is 0
    pub fn load_timeout(&self) -> Option<Duration> {
        if self.load_timeout_secs > 0.0 {
            Duration::try_from_secs_f32(self.load_timeout_secs).ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub session: SessionConfig,
    pub animation: AnimationConfig,
    pub placement: PlacementConfig,
    pub asset: AssetConfig,
    pub logging: LoggingConfig,
}

impl ViewerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&source, &path.display().to_string())
    }

    /// Resolve the config to use.
    ///
    /// Prefers the explicit path, then `AR_VIEWER_CONFIG`, then the platform
    /// config directory. Falls back to defaults when no file exists. Returns
    /// the path that was read, if any.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(&path)?, Some(path)));
        }
        if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
            let path = PathBuf::from(value);
            return Ok((Self::load(&path)?, Some(path)));
        }
        if let Some(path) = default_config_path().filter(|p| p.is_file()) {
            return Ok((Self::load(&path)?, Some(path)));
        }
        Ok((Self::default(), None))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.placement.palette.is_empty() {
            return Err(ConfigError::Invalid(
                "placement.palette must name at least one shape".to_string(),
            ));
        }
        let crossfade = self.animation.crossfade_secs;
        if crossfade.is_nan() || crossfade < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "animation.crossfade_secs must be >= 0, got {}",
                crossfade
            )));
        }
        let timeout = self.asset.load_timeout_secs;
        if timeout.is_nan() || timeout < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "asset.load_timeout_secs must be >= 0 (0 disables), got {}",
                timeout
            )));
        }
        let scale = self.asset.scale;
        if scale.is_nan() || scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "asset.scale must be > 0, got {}",
                scale
            )));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// `<platform config dir>/ar-viewer/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ar-viewer").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(
            config.session.first_trigger_behavior,
            FirstTriggerBehavior::StartAssetLoad
        );
        assert_eq!(
            config.session.during_load_trigger_policy,
            DuringLoadTriggerPolicy::Ignore
        );
        assert_eq!(config.animation.default_clip.as_deref(), Some("look around"));
        assert_eq!(config.placement.offset, [0.0, 0.0, -0.3]);
        assert_eq!(config.placement.palette.len(), 3);
        assert_eq!(config.asset.hidden_nodes, vec!["Cube".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [session]
            first_trigger_behavior = "spawn_primitive"
            during_load_trigger_policy = "spawn_primitive_anyway"

            [placement]
            palette = [{ shape = "sphere", radius = 0.2 }]
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(
            config.session.first_trigger_behavior,
            FirstTriggerBehavior::SpawnPrimitive
        );
        assert_eq!(
            config.session.during_load_trigger_policy,
            DuringLoadTriggerPolicy::SpawnPrimitiveAnyway
        );
        assert_eq!(config.session.bundle, "knight.glb");
        assert_eq!(
            config.placement.palette,
            vec![GeometryVariant::Sphere { radius: 0.2 }]
        );
    }

    #[test]
    fn test_empty_palette_rejected() {
        let result = ViewerConfig::from_toml_str("[placement]\npalette = []\n", "inline");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_crossfade_rejected() {
        let result =
            ViewerConfig::from_toml_str("[animation]\ncrossfade_secs = -1.0\n", "inline");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let result = ViewerConfig::from_toml_str(
            "[session]\nduring_load_trigger_policy = \"queue\"\n",
            "inline",
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = ViewerConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = ViewerConfig::from_toml_str(&text, "rendered").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_disabled_timeout_survives_round_trip() {
        let mut config = ViewerConfig::default();
        config.asset.load_timeout_secs = 0.0;
        assert_eq!(config.asset.load_timeout(), None);

        let text = config.to_toml_string().unwrap();
        let parsed = ViewerConfig::from_toml_str(&text, "rendered").unwrap();
        assert_eq!(parsed.asset.load_timeout_secs, 0.0);
        assert_eq!(parsed.asset.load_timeout(), None);
    }

    #[test]
    fn test_default_timeout_is_thirty_seconds() {
        let config = ViewerConfig::default();
        assert_eq!(config.asset.load_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let result =
            ViewerConfig::from_toml_str("[asset]
load_timeout_secs = -5.0
", "inline");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_nan_values_rejected() {
        for document in [
            "[animation]\ncrossfade_secs = nan\n",
            "[asset]\nload_timeout_secs = nan\n",
            "[asset]\nscale = nan\n",
        ] {
            let result = ViewerConfig::from_toml_str(document, "inline");
            assert!(
                matches!(result, Err(ConfigError::Invalid(_))),
                "accepted {:?}",
                document
            );
        }
    }

    #[test]
    #[serial]
    fn test_resolve_prefers_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[asset]\nscale = 2.0").unwrap();

        let (config, path) = ViewerConfig::resolve(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.asset.scale, 2.0);
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    #[serial]
    fn test_resolve_uses_env_var() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        let resolved = ViewerConfig::resolve(None);
        std::env::remove_var(CONFIG_ENV_VAR);

        let (config, path) = resolved.unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_read_error() {
        let result = ViewerConfig::resolve(Some(PathBuf::from("/definitely/not/here.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
