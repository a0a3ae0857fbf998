use anyhow::{Context, Result};
use gazedwell_core::InputFormat;
use gazedwell_vision::FacePassConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime configuration: `GAZEDWELL_*` environment variables with defaults,
/// optionally overlaid by a TOML file, then by command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory containing the SCRFD ONNX model.
    pub model_dir: PathBuf,
    pub face_pass: FacePassConfig,
    pub input: InputFormat,
}

/// On-disk layout of the TOML config; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    model_dir: Option<PathBuf>,
    detection: DetectionSection,
    input: Option<InputFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DetectionSection {
    min_confidence: Option<f32>,
    scale_factor: Option<f32>,
    margin: Option<f64>,
}

impl Config {
    /// Load configuration from `GAZEDWELL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = FacePassConfig::default();
        Self {
            model_dir: std::env::var("GAZEDWELL_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            face_pass: FacePassConfig {
                min_confidence: env_parse("GAZEDWELL_MIN_CONFIDENCE", defaults.min_confidence),
                scale_factor: env_parse("GAZEDWELL_SCALE_FACTOR", defaults.scale_factor),
                margin: env_parse("GAZEDWELL_MARGIN", defaults.margin),
            },
            input: InputFormat::default(),
        }
    }

    /// Environment config overlaid with the keys present in a TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_env();
        if let Some(path) = path {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            config.apply_toml(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            tracing::info!(path = %path.display(), "loaded config file");
        }
        Ok(config)
    }

    fn apply_toml(&mut self, text: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(text)?;
        if let Some(dir) = file.model_dir {
            self.model_dir = dir;
        }
        if let Some(v) = file.detection.min_confidence {
            self.face_pass.min_confidence = v;
        }
        if let Some(v) = file.detection.scale_factor {
            self.face_pass.scale_factor = v;
        }
        if let Some(v) = file.detection.margin {
            self.face_pass.margin = v;
        }
        if let Some(input) = file.input {
            self.input = input;
        }
        Ok(())
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir
            .join(gazedwell_vision::SCRFD_MODEL_FILE)
            .to_string_lossy()
            .into_owned()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazedwell_core::MalformedPolicy;

    fn base() -> Config {
        Config {
            model_dir: PathBuf::from("models"),
            face_pass: FacePassConfig::default(),
            input: InputFormat::default(),
        }
    }

    #[test]
    fn test_apply_toml_overrides_present_keys() {
        let mut config = base();
        config
            .apply_toml(
                r#"
                model_dir = "/opt/models"

                [detection]
                min_confidence = 0.9

                [input]
                delimiter_candidates = [";"]
                on_malformed = "fail"
                "#,
            )
            .unwrap();

        assert_eq!(config.model_dir, PathBuf::from("/opt/models"));
        assert_eq!(config.face_pass.min_confidence, 0.9);
        assert_eq!(config.face_pass.scale_factor, 1.125);
        assert_eq!(config.input.delimiter_candidates, vec![';']);
        assert_eq!(config.input.header_rows_to_skip, 1);
        assert_eq!(config.input.on_malformed, MalformedPolicy::Fail);
    }

    #[test]
    fn test_apply_toml_empty_is_noop() {
        let mut config = base();
        config.apply_toml("").unwrap();
        assert_eq!(config, base());
    }

    #[test]
    fn test_apply_toml_tab_delimiter() {
        let mut config = base();
        config
            .apply_toml("[input]\ndelimiter_candidates = [\"\\t\"]\nheader_rows_to_skip = 2\n")
            .unwrap();
        assert_eq!(config.input.delimiter_candidates, vec!['\t']);
        assert_eq!(config.input.header_rows_to_skip, 2);
    }

    #[test]
    fn test_apply_toml_rejects_unknown_keys() {
        let mut config = base();
        assert!(config.apply_toml("threshold = 3").is_err());
    }

    #[test]
    fn test_scrfd_model_path() {
        assert_eq!(base().scrfd_model_path(), "models/det_10g.onnx");
    }

    #[test]
    fn test_env_parse_default() {
        assert_eq!(env_parse("GAZEDWELL_TEST_UNSET_KEY", 0.5f32), 0.5);
    }
}
