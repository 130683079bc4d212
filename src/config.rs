//! Configuration for Hanami
//! Serde-backed app settings, color schemes, and named presets

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Color Scheme
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ColorScheme {
    pub name: String,
    /// Petal hue in degrees; the saturation/lightness ramps per swatch layer
    /// are fixed.
    pub petal_hue: f32,
    pub background: [u8; 3],
    pub ripple: [u8; 3],
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::sakura()
    }
}

impl ColorScheme {
    pub fn sakura() -> Self {
        Self {
            name: "Sakura".to_string(),
            petal_hue: 330.0,
            background: [24, 14, 34],
            ripple: [255, 255, 255],
        }
    }

    pub fn yozakura() -> Self {
        Self {
            name: "Yozakura".to_string(),
            petal_hue: 290.0,
            background: [8, 6, 20],
            ripple: [210, 210, 255],
        }
    }

    pub fn momiji() -> Self {
        Self {
            name: "Momiji".to_string(),
            petal_hue: 20.0,
            background: [26, 12, 8],
            ripple: [255, 240, 220],
        }
    }

    pub fn asagiri() -> Self {
        Self {
            name: "Asagiri".to_string(),
            petal_hue: 210.0,
            background: [10, 16, 28],
            ripple: [235, 245, 255],
        }
    }

    pub fn all_schemes() -> Vec<ColorScheme> {
        vec![
            Self::sakura(),
            Self::yozakura(),
            Self::momiji(),
            Self::asagiri(),
        ]
    }
}

// ============================================================================
// Petal Field
// ============================================================================

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct FieldConfig {
    pub enabled: bool,
    /// Petals per 1000 px of width at reinitialization.
    pub initial_count: u32,
    /// Spawn pacing: frames between spawns are round(spawn_scale * 1000 / width).
    pub spawn_scale: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_count: 30,
            spawn_scale: 10.0,
        }
    }
}

// ============================================================================
// Day Count
// ============================================================================

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CountdownConfig {
    pub enabled: bool,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            year: 2024,
            month: 10,
            day: 24,
        }
    }
}

impl CountdownConfig {
    /// None when the stored year/month/day is not a real calendar date.
    pub fn target_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

// ============================================================================
// Main App Configuration
// ============================================================================

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    pub field: FieldConfig,
    pub countdown: CountdownConfig,
    pub color_scheme_index: usize,
}

impl AppConfig {
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::all_schemes()
            .get(self.color_scheme_index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Get all available preset names
    pub fn preset_names() -> Vec<&'static str> {
        vec![
            "Default",
            "Full Bloom",
            "Quiet Garden",
            "Night Viewing",
            "Autumn Drift",
        ]
    }

    /// Apply a preset by name
    pub fn apply_preset(&mut self, name: &str) {
        match name {
            "Default" => self.preset_default(),
            "Full Bloom" => self.preset_full_bloom(),
            "Quiet Garden" => self.preset_quiet_garden(),
            "Night Viewing" => self.preset_night_viewing(),
            "Autumn Drift" => self.preset_autumn_drift(),
            _ => {}
        }
    }

    fn preset_default(&mut self) {
        self.field = FieldConfig::default();
        self.color_scheme_index = 0;
    }

    fn preset_full_bloom(&mut self) {
        self.field.enabled = true;
        self.field.initial_count = 60;
        self.field.spawn_scale = 4.0;
        self.color_scheme_index = 0;
    }

    fn preset_quiet_garden(&mut self) {
        self.field.enabled = true;
        self.field.initial_count = 10;
        self.field.spawn_scale = 20.0;
        self.color_scheme_index = 0;
    }

    fn preset_night_viewing(&mut self) {
        self.field.enabled = true;
        self.field.initial_count = 30;
        self.field.spawn_scale = 10.0;
        self.color_scheme_index = 1;
    }

    fn preset_autumn_drift(&mut self) {
        self.field.enabled = true;
        self.field.initial_count = 40;
        self.field.spawn_scale = 8.0;
        self.color_scheme_index = 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_json_round_trips() {
        let mut config = AppConfig::default();
        config.field.initial_count = 42;
        config.countdown.year = 2023;
        config.color_scheme_index = 2;

        let json = serde_json::to_string(&config).unwrap();
        let restored: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.field, config.field);
        assert_eq!(restored.countdown, config.countdown);
        assert_eq!(restored.color_scheme_index, config.color_scheme_index);
    }

    #[test]
    fn every_preset_name_applies() {
        for name in AppConfig::preset_names() {
            let mut config = AppConfig::default();
            config.apply_preset(name);
            assert!(
                config.color_scheme_index < ColorScheme::all_schemes().len(),
                "preset {name} selected a scheme that does not exist"
            );
        }
    }

    #[test]
    fn full_bloom_is_denser_than_quiet_garden() {
        let mut full = AppConfig::default();
        full.apply_preset("Full Bloom");
        let mut quiet = AppConfig::default();
        quiet.apply_preset("Quiet Garden");
        assert!(full.field.initial_count > quiet.field.initial_count);
        assert!(full.field.spawn_scale < quiet.field.spawn_scale);
    }

    #[test]
    fn default_target_date_is_valid() {
        let config = CountdownConfig::default();
        assert_eq!(config.target_date(), NaiveDate::from_ymd_opt(2024, 10, 24));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        let config = CountdownConfig {
            enabled: true,
            year: 2024,
            month: 2,
            day: 31,
        };
        assert!(config.target_date().is_none());
    }
}
