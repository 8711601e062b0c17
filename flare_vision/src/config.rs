//! Process configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `FLARE_*` environment overrides. The result is validated once, before the
//! first frame is read.
//!
//! ```toml
//! [analyzer]
//! target_width = 640
//! target_height = 480
//! lower_bound = [0, 120, 150]
//! upper_bound = [35, 255, 255]
//! pixel_threshold = 5000
//! min_contour_area = 2000.0
//!
//! [source]
//! uri = "stub://fire"
//! loop_on_eof = false
//!
//! [monitor]
//! frame_delay_ms = 30
//! max_frames = 500
//! ```

use crate::analyzer::AnalyzerConfig;
use crate::error::ConfigError;
use crate::core_modules::hsv::HsvPixel;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_ENV: &str = "FLARE_CONFIG";
pub const SOURCE_ENV: &str = "FLARE_SOURCE";
pub const FRAME_DELAY_ENV: &str = "FLARE_FRAME_DELAY_MS";
pub const PIXEL_THRESHOLD_ENV: &str = "FLARE_PIXEL_THRESHOLD";
pub const MIN_CONTOUR_AREA_ENV: &str = "FLARE_MIN_CONTOUR_AREA";

const DEFAULT_SOURCE_URI: &str = "stub://fire";
/// Roughly 33 frames per second.
const DEFAULT_FRAME_DELAY_MS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FlareConfigFile {
    analyzer: Option<AnalyzerConfigFile>,
    source: Option<SourceConfigFile>,
    monitor: Option<MonitorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AnalyzerConfigFile {
    target_width: Option<u32>,
    target_height: Option<u32>,
    lower_bound: Option<[u8; 3]>,
    upper_bound: Option<[u8; 3]>,
    pixel_threshold: Option<usize>,
    min_contour_area: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    uri: Option<String>,
    loop_on_eof: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MonitorConfigFile {
    frame_delay_ms: Option<u64>,
    max_frames: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub uri: String,
    pub loop_on_eof: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub frame_delay: Duration,
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlareConfig {
    pub analyzer: AnalyzerConfig,
    pub source: SourceSettings,
    pub monitor: MonitorSettings,
}

impl Default for FlareConfig {
    fn default() -> Self {
        Self::from_file(FlareConfigFile::default())
    }
}

impl FlareConfig {
    /// Loads `path` (or the file named by `FLARE_CONFIG`), applies environment
    /// overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_ENV).ok().filter(|p| !p.trim().is_empty());
        let file = match path.map(Path::to_path_buf).or(env_path.map(Into::into)) {
            Some(path) => read_config_file(&path)?,
            None => FlareConfigFile::default(),
        };
        let mut cfg = Self::from_file(file);
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a TOML document on top of the defaults. No environment lookups.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: FlareConfigFile = toml::from_str(raw)?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FlareConfigFile) -> Self {
        let defaults = AnalyzerConfig::default();
        let analyzer = file.analyzer.unwrap_or_default();
        let source = file.source.unwrap_or_default();
        let monitor = file.monitor.unwrap_or_default();

        Self {
            analyzer: AnalyzerConfig {
                target_width: analyzer.target_width.unwrap_or(defaults.target_width),
                target_height: analyzer.target_height.unwrap_or(defaults.target_height),
                lower_bound: analyzer
                    .lower_bound
                    .map(HsvPixel::from)
                    .unwrap_or(defaults.lower_bound),
                upper_bound: analyzer
                    .upper_bound
                    .map(HsvPixel::from)
                    .unwrap_or(defaults.upper_bound),
                pixel_threshold: analyzer.pixel_threshold.unwrap_or(defaults.pixel_threshold),
                min_contour_area: analyzer.min_contour_area.unwrap_or(defaults.min_contour_area),
            },
            source: SourceSettings {
                uri: source.uri.unwrap_or_else(|| DEFAULT_SOURCE_URI.to_string()),
                loop_on_eof: source.loop_on_eof.unwrap_or(false),
            },
            monitor: MonitorSettings {
                frame_delay: Duration::from_millis(
                    monitor.frame_delay_ms.unwrap_or(DEFAULT_FRAME_DELAY_MS),
                ),
                max_frames: monitor.max_frames,
            },
        }
    }

    /// Applies `FLARE_*` overrides using `lookup` to read variables.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(uri) = get(SOURCE_ENV) {
            self.source.uri = uri;
        }
        if let Some(delay) = get(FRAME_DELAY_ENV) {
            let millis: u64 = delay.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: FRAME_DELAY_ENV,
                value: delay.clone(),
            })?;
            self.monitor.frame_delay = Duration::from_millis(millis);
        }
        if let Some(threshold) = get(PIXEL_THRESHOLD_ENV) {
            self.analyzer.pixel_threshold =
                threshold.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: PIXEL_THRESHOLD_ENV,
                    value: threshold.clone(),
                })?;
        }
        if let Some(area) = get(MIN_CONTOUR_AREA_ENV) {
            self.analyzer.min_contour_area =
                area.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: MIN_CONTOUR_AREA_ENV,
                    value: area.clone(),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer.validate()?;
        if self.source.uri.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "source.uri",
                value: self.source.uri.clone(),
            });
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<FlareConfigFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = FlareConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, FlareConfig::default());
        assert_eq!(cfg.analyzer, AnalyzerConfig::default());
        assert_eq!(cfg.source.uri, "stub://fire");
        assert!(!cfg.source.loop_on_eof);
        assert_eq!(cfg.monitor.frame_delay, Duration::from_millis(30));
        assert_eq!(cfg.monitor.max_frames, None);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = FlareConfig::from_toml_str(
            r#"
            [analyzer]
            pixel_threshold = 1200
            upper_bound = [30, 255, 255]

            [monitor]
            max_frames = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analyzer.pixel_threshold, 1200);
        assert_eq!(cfg.analyzer.upper_bound, HsvPixel::new(30, 255, 255));
        assert_eq!(cfg.analyzer.lower_bound, HsvPixel::new(0, 120, 150));
        assert_eq!(cfg.monitor.max_frames, Some(10));
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let err = FlareConfig::from_toml_str(
            r#"
            [analyzer]
            lower_bound = [0, 200, 150]
            upper_bound = [35, 100, 255]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Analyzer(_)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = FlareConfig::from_toml_str("[analyzer]\nthreshold = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (SOURCE_ENV, "/srv/frames"),
            (FRAME_DELAY_ENV, "0"),
            (PIXEL_THRESHOLD_ENV, "42"),
            (MIN_CONTOUR_AREA_ENV, " "),
        ]);
        let mut cfg = FlareConfig::default();
        cfg.apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.source.uri, "/srv/frames");
        assert_eq!(cfg.monitor.frame_delay, Duration::ZERO);
        assert_eq!(cfg.analyzer.pixel_threshold, 42);
        assert_eq!(cfg.analyzer.min_contour_area, 2000.0);
    }

    #[test]
    fn malformed_override_is_reported_with_its_key() {
        let mut cfg = FlareConfig::default();
        let err = cfg
            .apply_overrides(|key| (key == PIXEL_THRESHOLD_ENV).then(|| "-5".to_string()))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, PIXEL_THRESHOLD_ENV);
                assert_eq!(value, "-5");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn loads_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flare.toml");
        std::fs::write(&path, "[source]\nuri = \"stub://dark\"\nloop_on_eof = true\n").unwrap();
        let file = read_config_file(&path).unwrap();
        let cfg = FlareConfig::from_file(file);
        assert_eq!(cfg.source.uri, "stub://dark");
        assert!(cfg.source.loop_on_eof);

        assert!(matches!(
            read_config_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
