//! Feature configuration (match length, theme) and cloud sync configuration.

use serde::{Deserialize, Serialize};

/// Default match length in minutes, used for the minutes-played percentage.
pub const DEFAULT_MATCH_MINUTES: u32 = 80;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Club,
    Custom,
}

impl Theme {
    /// Preset (background, primary) colors.
    fn preset(self) -> (&'static str, &'static str) {
        match self {
            Theme::Dark | Theme::Custom => ("#0f1220", "#6ee7b7"),
            Theme::Light => ("#f1f5f9", "#2563eb"),
            Theme::Club => ("#0b1226", "#00b4d8"),
        }
    }
}

/// User-facing settings.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureConfig {
    #[serde(default = "default_match_minutes")]
    pub match_minutes: u32,
    #[serde(default)]
    pub theme: Theme,
    /// Custom background color (only used with `Theme::Custom`).
    #[serde(default)]
    pub bg: Option<String>,
    /// Custom primary color (only used with `Theme::Custom`).
    #[serde(default)]
    pub primary: Option<String>,
}

fn default_match_minutes() -> u32 {
    DEFAULT_MATCH_MINUTES
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            match_minutes: DEFAULT_MATCH_MINUTES,
            theme: Theme::Dark,
            bg: None,
            primary: None,
        }
    }
}

/// Resolved colors for the current theme.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Palette {
    pub bg: String,
    pub primary: String,
}

impl FeatureConfig {
    pub fn palette(&self) -> Palette {
        let (bg, primary) = self.theme.preset();
        match self.theme {
            Theme::Custom => Palette {
                bg: self.bg.clone().unwrap_or_else(|| bg.to_string()),
                primary: self.primary.clone().unwrap_or_else(|| primary.to_string()),
            },
            _ => Palette {
                bg: bg.to_string(),
                primary: primary.to_string(),
            },
        }
    }
}

/// Remote mirroring settings. `connection` is the remote project's client config, kept opaque.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub enabled: bool,
    pub connection: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_theme_falls_back_to_dark_preset() {
        let cfg = FeatureConfig {
            theme: Theme::Custom,
            primary: Some("#ff0000".into()),
            ..FeatureConfig::default()
        };
        let p = cfg.palette();
        assert_eq!(p.bg, "#0f1220");
        assert_eq!(p.primary, "#ff0000");
    }

    #[test]
    fn preset_ignores_custom_colors() {
        let cfg = FeatureConfig {
            theme: Theme::Light,
            bg: Some("#000".into()),
            ..FeatureConfig::default()
        };
        assert_eq!(cfg.palette().bg, "#f1f5f9");
    }
}
