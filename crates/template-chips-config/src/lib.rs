use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use template_chips_engine::parsing::marker_for;
use template_chips_engine::{CaretGuard, Document, ReconcilerOptions, Seed, WhitespacePolicy};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read seed file at {seed_path}: {source}")]
    SeedReadError {
        seed_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse seed file at {seed_path}: {source}")]
    SeedParseError {
        seed_path: PathBuf,
        source: template_chips_engine::EngineError,
    },
}

/// One insertable token in the fixed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,
}

impl CatalogEntry {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Token text inserted for this entry
    pub fn marker(&self) -> String {
        marker_for(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial content: `.html`/`.htm`, `.json` delta, anything else plain text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,
    pub caret_guard: CaretGuard,
    pub tail_reserve: usize,
    pub marker_whitespace: WhitespacePolicy,
    pub catalog: Vec<CatalogEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_path: None,
            caret_guard: CaretGuard::TrailingMarker,
            tail_reserve: 1,
            marker_whitespace: WhitespacePolicy::StripOnTyping,
            catalog: (1..=3)
                .map(|n| CatalogEntry::new(format!("Test Variable {n}")))
                .collect(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the seed path
        config.seed_path = config
            .seed_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/template-chips");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            caret_guard: self.caret_guard,
            tail_reserve: self.tail_reserve,
            whitespace: self.marker_whitespace,
        }
    }

    /// Read the configured seed file, if any.
    pub fn seed(&self) -> Result<Option<Seed>, ConfigError> {
        self.seed_path.as_deref().map(read_seed).transpose()
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Read a seed file, choosing the format from its extension.
pub fn read_seed(seed_path: &Path) -> Result<Seed, ConfigError> {
    let content =
        std::fs::read_to_string(seed_path).map_err(|source| ConfigError::SeedReadError {
            seed_path: seed_path.to_path_buf(),
            source,
        })?;

    let extension = seed_path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    let seed = match extension.as_deref() {
        Some("html" | "htm") => Seed::Html(content),
        Some("json") => {
            let document =
                Document::from_json(&content).map_err(|source| ConfigError::SeedParseError {
                    seed_path: seed_path.to_path_buf(),
                    source,
                })?;
            Seed::Delta(document)
        }
        _ => Seed::PlainText(content),
    };
    Ok(seed)
}
