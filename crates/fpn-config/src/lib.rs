//! Application configuration loaded from TOML.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use fpn_inp::ParseOptions;
use fpn_io::{DEFAULT_TRUSS_AREA, ProjectionOptions};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "FPN_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up the configuration: `explicit` path, then `FPN_CONFIG`, then
    /// `./config/default.toml`. Built-in defaults when none exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "failed to read the current directory".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parser options plus any candidate labels that name no known encoding.
    pub fn parse_options(&self) -> (ParseOptions, Vec<String>) {
        let p = &self.parser;
        let (options, unknown) =
            ParseOptions::default().with_candidate_labels(&p.candidate_encodings);
        (
            ParseOptions {
                probe_lines: p.probe_lines,
                offset_sample_limit: p.offset_sample_limit,
                ..options
            },
            unknown,
        )
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        let p = &self.projection;
        ProjectionOptions {
            model_part_name: p.model_part_name.clone(),
            only_referenced_nodes: p.only_referenced_nodes,
            default_truss_area: p.default_truss_area,
            bottom_fixity: p.bottom_fixity,
            bottom_tolerance: p.bottom_tolerance,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub probe_lines: usize,
    pub offset_sample_limit: usize,
    /// Encoding labels tried in order before the statistical guess.
    pub candidate_encodings: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let defaults = ParseOptions::default();
        Self {
            probe_lines: defaults.probe_lines,
            offset_sample_limit: defaults.offset_sample_limit,
            candidate_encodings: defaults
                .candidate_encodings
                .iter()
                .map(|e| e.name().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub model_part_name: String,
    pub only_referenced_nodes: bool,
    pub default_truss_area: f64,
    /// Fix the lowest nodes of a stage that has no active constraint.
    pub bottom_fixity: bool,
    pub bottom_tolerance: Option<f64>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            model_part_name: "Structure".to_string(),
            only_referenced_nodes: true,
            default_truss_area: DEFAULT_TRUSS_AREA,
            bottom_fixity: true,
            bottom_tolerance: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
