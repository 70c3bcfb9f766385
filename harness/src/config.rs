//! Run configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, a
//! `matbench.toml` file, command-line overrides.
//!
//! ```toml
//! matrix-size = 512
//! sample-count = 100
//! warmup-runs = 5
//! iterations = 50
//! seed = 42
//! shader = "kernels/tiled.wgsl"
//! entry-point = "main"
//! backend = "gpu"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::matrix::MatmulDims;

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "matbench.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Gpu,
    Cpu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Side length of the square matrices.
    pub matrix_size: usize,
    /// Output cells checked per verification pass.
    pub sample_count: usize,
    /// Verified runs before timing starts.
    pub warmup_runs: usize,
    /// Timed runs.
    pub iterations: usize,
    /// Seed for matrix generation and sampling. Random when unset.
    pub seed: Option<u64>,
    /// WGSL source file. The built-in shader is used when unset.
    pub shader: Option<PathBuf>,
    pub entry_point: String,
    pub backend: BackendKind,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            matrix_size: 256,
            sample_count: 50,
            warmup_runs: 3,
            iterations: 10,
            seed: None,
            shader: None,
            entry_point: "main".to_string(),
            backend: BackendKind::Gpu,
        }
    }
}

impl BenchConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BenchError::config(format!("failed to parse config: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        // shader paths are relative to the config file
        if let (Some(shader), Some(dir)) = (config.shader.as_mut(), path.parent()) {
            if shader.is_relative() {
                *shader = dir.join(&*shader);
            }
        }
        Ok(config)
    }

    /// Load `explicit` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            log::info!("loading config from {}", path.display());
            return Self::from_file(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            log::info!("loading config from {}", fallback.display());
            return Self::from_file(fallback);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.matrix_size == 0 {
            return Err(BenchError::config("matrix size must be at least 1"));
        }
        if self.sample_count == 0 {
            return Err(BenchError::config("sample count must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(BenchError::config("iterations must be at least 1"));
        }
        if self.entry_point.trim().is_empty() {
            return Err(BenchError::config("entry point must not be empty"));
        }
        if self.matrix_size.checked_mul(self.matrix_size).is_none() {
            return Err(BenchError::config(format!(
                "matrix size {} is too large",
                self.matrix_size
            )));
        }
        Ok(())
    }

    pub fn dims(&self) -> MatmulDims {
        MatmulDims::square(self.matrix_size)
    }

    /// Read the configured shader file, or `None` for the built-in shader.
    pub fn shader_source(&self) -> Result<Option<String>> {
        self.shader
            .as_deref()
            .map(|path| {
                std::fs::read_to_string(path).map_err(|e| {
                    BenchError::config(format!("failed to read shader {}: {}", path.display(), e))
                })
            })
            .transpose()
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub matrix_size: Option<usize>,
    pub sample_count: Option<usize>,
    pub warmup_runs: Option<usize>,
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
    pub shader: Option<PathBuf>,
    pub entry_point: Option<String>,
    pub backend: Option<BackendKind>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut BenchConfig) {
        if let Some(v) = self.matrix_size {
            config.matrix_size = v;
        }
        if let Some(v) = self.sample_count {
            config.sample_count = v;
        }
        if let Some(v) = self.warmup_runs {
            config.warmup_runs = v;
        }
        if let Some(v) = self.iterations {
            config.iterations = v;
        }
        if let Some(v) = self.seed {
            config.seed = Some(v);
        }
        if let Some(v) = self.shader {
            config.shader = Some(v);
        }
        if let Some(v) = self.entry_point {
            config.entry_point = v;
        }
        if let Some(v) = self.backend {
            config.backend = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.matrix_size, 256);
        assert_eq!(config.sample_count, 50);
        assert_eq!(config.entry_point, "main");
        assert_eq!(config.backend, BackendKind::Gpu);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = BenchConfig::from_toml_str(
            r#"
matrix-size = 512
warmup-runs = 0
backend = "cpu"
seed = 42
"#,
        )
        .unwrap();
        assert_eq!(config.matrix_size, 512);
        assert_eq!(config.warmup_runs, 0);
        assert_eq!(config.backend, BackendKind::Cpu);
        assert_eq!(config.seed, Some(42));
        // untouched keys keep their defaults
        assert_eq!(config.sample_count, 50);
        assert_eq!(config.iterations, 10);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = BenchConfig::from_toml_str("matrix_size = 4").unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = BenchConfig::from_toml_str("matrix-size = 64\niterations = 3").unwrap();
        ConfigOverrides {
            matrix_size: Some(128),
            entry_point: Some("matmul".to_string()),
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.matrix_size, 128);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.entry_point, "matmul");
    }

    #[test]
    fn test_validation() {
        let bad = [
            BenchConfig {
                matrix_size: 0,
                ..Default::default()
            },
            BenchConfig {
                sample_count: 0,
                ..Default::default()
            },
            BenchConfig {
                iterations: 0,
                ..Default::default()
            },
            BenchConfig {
                entry_point: "  ".to_string(),
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(BenchError::Config(_))));
        }
    }

    #[test]
    fn test_missing_shader_file() {
        let config = BenchConfig {
            shader: Some(PathBuf::from("/nonexistent/kernel.wgsl")),
            ..Default::default()
        };
        assert!(matches!(config.shader_source(), Err(BenchError::Config(_))));
        assert_eq!(BenchConfig::default().shader_source().unwrap(), None);
    }
}
