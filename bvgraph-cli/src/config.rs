//! Configuration file loading
//!
//! Defaults come from `--config FILE`, or else from `~/.bvgraphrc` or
//! `<config dir>/bvgraph/config.yaml`. Command-line flags override them.

use std::fs;
use std::path::{Path, PathBuf};

use bvgraph_core::{Config, Error, ErrorContext, ResultExt};
use serde::{Deserialize, Serialize};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default verbosity level
    pub verbosity: Option<String>,
    /// Default output format (`text` or `json`)
    pub format: Option<String>,
    /// Solver parameters and resource limits
    pub solver: Config,
}

impl CliConfig {
    fn default_path() -> Option<PathBuf> {
        dirs::home_dir()
            .map(|mut p| {
                p.push(".bvgraphrc");
                p
            })
            .filter(|p| p.exists())
            .or_else(|| {
                dirs::config_dir().map(|mut p| {
                    p.push("bvgraph");
                    p.push("config.yaml");
                    p
                })
            })
    }

    /// Load an explicit configuration file, or the default one if present.
    ///
    /// Errors in an explicit file are reported; a broken default file is
    /// ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ErrorContext> {
        if let Some(path) = explicit {
            let contents = fs::read_to_string(path)
                .map_err(Error::from)
                .with_context(|| format!("reading configuration {}", path.display()))?;
            return Self::parse(&contents)
                .with_context(|| format!("parsing configuration {}", path.display()));
        }

        if let Some(path) = Self::default_path()
            && path.exists()
            && let Ok(contents) = fs::read_to_string(&path)
            && let Ok(config) = Self::parse(&contents)
        {
            return Ok(config);
        }
        Ok(Self::default())
    }

    /// Parse YAML configuration text
    pub fn parse(contents: &str) -> Result<Self, Error> {
        serde_yaml::from_str(contents).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            Error::parse(line, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_yaml() {
        let config = CliConfig::parse(
            "verbosity: debug\nsolver:\n  sat:\n    random_seed: 5\n  limits:\n    conflicts: 100\n",
        )
        .unwrap();
        assert_eq!(config.verbosity.as_deref(), Some("debug"));
        assert_eq!(config.format, None);
        assert_eq!(config.solver.sat.random_seed, 5);
        assert_eq!(config.solver.limits.conflicts, 100);
        assert_eq!(config.solver.sat.var_decay, Config::default().sat.var_decay);
    }

    #[test]
    fn test_parse_error_has_line() {
        let err = CliConfig::parse("format: json\nsolver: [1, 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/bvgraph.yaml"))).unwrap_err();
        assert!(matches!(err.error, Error::Io(_)));
        assert!(err.format_full().contains("reading configuration"));
    }
}
