use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Config – session-wide defaults
// ---------------------------------------------------------------------------

/// Defaults shared by the façades of one [`Explabox`](crate::Explabox) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory results are written to.
    pub output_dir: PathBuf,
    /// Language of the dataset.
    pub locale: String,
    /// Split the `explabox` binary loads unsplit rows into and shows by
    /// default. Library façades always take an explicit split name.
    pub default_split: String,
    /// Seed for sampling and sensitivity tests; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            locale: "en".to_string(),
            default_split: "test".to_string(),
            seed: Some(0),
        }
    }
}

impl Config {
    /// Defaults overlaid with `EXPLABOX_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup("EXPLABOX_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(locale) = lookup("EXPLABOX_LOCALE") {
            self.locale = locale;
        }
        if let Some(split) = lookup("EXPLABOX_DEFAULT_SPLIT") {
            self.default_split = split;
        }
        if let Some(seed) = lookup("EXPLABOX_SEED") {
            self.seed = if seed.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(seed.parse().map_err(|_| {
                    Error::InvalidArgument(format!("EXPLABOX_SEED={seed} is not an integer"))
                })?)
            };
        }
        Ok(self)
    }
}

/// Create the directory to write results to. Existing directories are kept.
pub fn create_output_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    info!("Output folder located at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let env: HashMap<&str, &str> = [
            ("EXPLABOX_LOCALE", "nl"),
            ("EXPLABOX_SEED", "none"),
            ("EXPLABOX_DEFAULT_SPLIT", "validation"),
        ]
        .into_iter()
        .collect();
        let config = Config::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.locale, "nl");
        assert_eq!(config.seed, None);
        assert_eq!(config.default_split, "validation");
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn bad_seed_is_rejected() {
        let err = Config::default()
            .with_overrides(|k| (k == "EXPLABOX_SEED").then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explabox.json");
        std::fs::write(&path, r#"{"locale": "de"}"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.locale, "de");
        assert_eq!(config.default_split, "test");
        assert_eq!(config.seed, Some(0));
    }

    #[test]
    fn output_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("results");
        create_output_dir(&out).unwrap();
        assert!(out.is_dir());
        create_output_dir(&out).unwrap();
        assert!(out.is_dir());
    }
}
