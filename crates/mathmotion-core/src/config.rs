use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorSpace};
use crate::error::{SceneError, SceneResult};
use crate::time::Duration;

/// Visible frame in scene units.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 8.0 * 16.0 / 9.0,
            height: 8.0,
        }
    }
}

/// Timing defaults for beats and for the sample stream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Run time of a `play` beat when no animation overrides it (seconds).
    pub default_run_time: f64,
    /// Length of a bare `wait` (seconds).
    pub default_wait: f64,
    /// Samples handed to the renderer per logical second.
    pub sample_rate: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            default_run_time: 1.0,
            default_wait: 1.0,
            sample_rate: 30.0,
        }
    }
}

/// Standard gaps used when arranging and placing objects.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpacingConfig {
    pub small_buff: f64,
    pub med_small_buff: f64,
    pub med_large_buff: f64,
    pub large_buff: f64,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            small_buff: 0.1,
            med_small_buff: 0.25,
            med_large_buff: 0.5,
            large_buff: 1.0,
        }
    }
}

/// Named colors, stored as hex strings so they read naturally in TOML.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Palette(pub BTreeMap<String, String>);

impl Default for Palette {
    fn default() -> Self {
        let entries = [
            ("WHITE", "#FFFFFF"),
            ("BLACK", "#000000"),
            ("GREY", "#888888"),
            ("BLUE", "#58C4DD"),
            ("BLUE_E", "#1C758A"),
            ("TEAL", "#5CD0B3"),
            ("GREEN", "#83C167"),
            ("YELLOW", "#FFFF00"),
            ("GOLD", "#F0AC5F"),
            ("RED", "#FC6255"),
            ("MAROON", "#C55F73"),
            ("PURPLE", "#9A72AC"),
        ];
        Palette(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Process-wide scene configuration. Immutable once loaded.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SceneConfig {
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub spacing: SpacingConfig,
    /// Space colors are blended in unless an animation asks otherwise.
    #[serde(default)]
    pub color_space: ColorSpace,
    #[serde(default)]
    pub palette: Palette,
}

static GLOBAL: OnceLock<SceneConfig> = OnceLock::new();

impl SceneConfig {
    /// Parse a configuration from TOML text. Missing sections keep their defaults;
    /// palette entries are merged over the default palette.
    pub fn from_toml_str(text: &str) -> SceneResult<Self> {
        let mut config: SceneConfig = toml::from_str(text)?;
        let mut palette = Palette::default();
        palette.0.append(&mut config.palette.0);
        config.palette = palette;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SceneResult<()> {
        if !(self.frame.width > 0.0 && self.frame.height > 0.0) {
            return Err(SceneError::InvalidArgument(
                "frame dimensions must be positive".into(),
            ));
        }
        if !(self.timing.sample_rate > 0.0) {
            return Err(SceneError::InvalidArgument(
                "sample_rate must be positive".into(),
            ));
        }
        if self.timing.default_run_time < 0.0 || self.timing.default_wait < 0.0 {
            return Err(SceneError::InvalidArgument(
                "default durations must not be negative".into(),
            ));
        }
        for (name, hex) in &self.palette.0 {
            Color::from_hex(hex).map_err(|e| {
                SceneError::InvalidArgument(format!("palette entry {}: {}", name, e))
            })?;
        }
        Ok(())
    }

    /// Install `config` as the process-wide table. Only the first call wins;
    /// a later call hands its rejected config back as the error.
    pub fn install(config: SceneConfig) -> Result<&'static SceneConfig, SceneConfig> {
        GLOBAL.set(config)?;
        Ok(Self::global())
    }

    /// The process-wide table, initialised with defaults on first use.
    pub fn global() -> &'static SceneConfig {
        GLOBAL.get_or_init(SceneConfig::default)
    }

    /// Look up a palette color by name (case-insensitive).
    pub fn color(&self, name: &str) -> SceneResult<Color> {
        let hex = self
            .palette
            .0
            .get(&name.to_ascii_uppercase())
            .ok_or_else(|| SceneError::InvalidArgument(format!("unknown color {:?}", name)))?;
        Color::from_hex(hex).map_err(|e| SceneError::InvalidArgument(e.to_string()))
    }

    pub fn default_run_time(&self) -> Duration {
        Duration::from_seconds(self.timing.default_run_time)
    }

    pub fn default_wait(&self) -> Duration {
        Duration::from_seconds(self.timing.default_wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert!((config.frame.height - 8.0).abs() < 1e-12);
        assert!((config.spacing.large_buff - 1.0).abs() < 1e-12);
        assert_eq!(config.color_space, ColorSpace::LinearRgb);
        assert_eq!(
            config.color("blue").unwrap(),
            Color::from_hex("#58C4DD").unwrap()
        );
    }

    #[test]
    fn test_from_toml_merges_palette() {
        let config = SceneConfig::from_toml_str(
            r##"
            color_space = "srgb"

            [timing]
            sample_rate = 60.0

            [palette]
            ACCENT = "#FF8800"
            "##,
        )
        .unwrap();
        assert_eq!(config.color_space, ColorSpace::Srgb);
        assert!((config.timing.sample_rate - 60.0).abs() < 1e-12);
        assert!((config.timing.default_run_time - 1.0).abs() < 1e-12);
        assert!(config.color("ACCENT").is_ok());
        assert!(config.color("TEAL").is_ok());
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        assert!(SceneConfig::from_toml_str("[timing]\nsample_rate = 0.0").is_err());
        assert!(SceneConfig::from_toml_str("[palette]\nBAD = \"#XYZ\"").is_err());
        assert!(matches!(
            SceneConfig::from_toml_str("frame = 3"),
            Err(SceneError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_color() {
        assert!(SceneConfig::default().color("chartreuse").is_err());
    }
}
