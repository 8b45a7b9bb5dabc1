use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{render::ChartStyle, timeline::TimingConfig, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sequence: TimingConfig,
    pub style: ChartStyle,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.sequence.validate()?;
        config.style.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EasingCurve, FuelMixError, TitleStyle};

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.sequence.fps, 30.0);
        assert_eq!(config.sequence.pause.default_seconds, 1.0);
    }

    #[test]
    fn reads_partial_sequence_settings() {
        let config = AppConfig::from_json_str(
            r##"{
                "sequence": {
                    "fps": 50,
                    "transition_seconds": 0.25,
                    "pause": { "default_seconds": 2.0, "overrides": { "2025": 3 } },
                    "title_style": "source",
                    "easing": "smoothstep"
                },
                "style": { "background": "#111111" }
            }"##,
        )
        .unwrap();

        assert_eq!(config.sequence.fps, 50.0);
        assert_eq!(config.sequence.pause.seconds_for("2025"), 3.0);
        assert_eq!(config.sequence.pause.seconds_for("2019"), 2.0);
        assert_eq!(config.sequence.title_style, TitleStyle::Source);
        assert_eq!(config.sequence.easing, EasingCurve::Smoothstep);
        assert_eq!(config.style.background, "#111111");
        assert_eq!(config.style.font_family, ChartStyle::default().font_family);
    }

    #[test]
    fn rejects_invalid_timing() {
        let err = AppConfig::from_json_str(r#"{ "sequence": { "fps": -5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            FuelMixError::InvalidTiming {
                parameter: "fps",
                ..
            }
        ));
    }
}
