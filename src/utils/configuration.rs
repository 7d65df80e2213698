use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Prefix for environment overrides, e.g. `CONTIG_FORGE__ASSEMBLY__MIN_OVERLAP=20`
pub const ENV_PREFIX: &str = "CONTIG_FORGE";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Input/Output error: {message}")]
    IOError { message: String },

    #[error("Invalid input: {message}")]
    InputError { message: String },

    #[error("Validation error: {field} is invalid: {reason}")]
    ValidationError { field: String, reason: String },
}

impl PipelineError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        PipelineError::ValidationError {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::ConfigurationError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IOError {
            message: err.to_string(),
        }
    }
}

fn default_min_identity() -> f64 {
    1.0
}

/// Immutable assembly parameters.
///
/// Only `min_identity` has a default (1.0, exact matching). Everything else
/// must be stated by the caller or the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyParameters {
    /// Shortest suffix/prefix overlap accepted between two reads
    pub min_overlap: usize,
    /// Fraction of matching positions an overlap needs, in [0, 1]
    #[serde(default = "default_min_identity")]
    pub min_identity: f64,
    /// k for the de Bruijn path
    pub kmer_size: usize,
    /// Contigs shorter than this are dropped from the result
    pub min_contig_length: usize,
}

impl AssemblyParameters {
    /// Validated parameters with exact-match identity
    pub fn new(
        min_overlap: usize,
        kmer_size: usize,
        min_contig_length: usize,
    ) -> Result<Self, PipelineError> {
        Self::with_identity(min_overlap, default_min_identity(), kmer_size, min_contig_length)
    }

    pub fn with_identity(
        min_overlap: usize,
        min_identity: f64,
        kmer_size: usize,
        min_contig_length: usize,
    ) -> Result<Self, PipelineError> {
        let params = Self {
            min_overlap,
            min_identity,
            kmer_size,
            min_contig_length,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_overlap < 1 {
            return Err(PipelineError::invalid("assembly.min_overlap", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_identity) {
            return Err(PipelineError::invalid(
                "assembly.min_identity",
                format!("must be within [0, 1], got {}", self.min_identity),
            ));
        }
        if self.kmer_size < 1 {
            return Err(PipelineError::invalid("assembly.kmer_size", "must be at least 1"));
        }
        Ok(())
    }
}

/// End trimming of low-quality bases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityTrimConfig {
    /// Bases below this Phred score are trimmed from either end
    pub min_quality: u8,
    /// Reads shorter than this after trimming are discarded
    pub min_length: usize,
    /// ASCII offset of the quality encoding (Sanger/Illumina 1.8+ is 33)
    #[serde(default = "default_quality_offset")]
    pub quality_offset: u8,
}

fn default_quality_offset() -> u8 {
    33
}

impl QualityTrimConfig {
    pub fn new(min_quality: u8, min_length: usize) -> Self {
        Self {
            min_quality,
            min_length,
            quality_offset: default_quality_offset(),
        }
    }
}

/// k-mer spectrum error correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCorrectionConfig {
    pub kmer_size: usize,
    /// k-mers seen fewer times than this are treated as errors
    pub min_kmer_frequency: u32,
}

impl ErrorCorrectionConfig {
    pub fn new(kmer_size: usize, min_kmer_frequency: u32) -> Result<Self, PipelineError> {
        let config = Self {
            kmer_size,
            min_kmer_frequency,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.kmer_size < 1 {
            return Err(PipelineError::invalid(
                "preprocessing.error_correction.kmer_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    pub quality_trim: Option<QualityTrimConfig>,
    pub error_correction: Option<ErrorCorrectionConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStrategy {
    /// Overlap-layout-consensus
    #[default]
    Olc,
    DeBruijn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

fn default_gap_char() -> char {
    'N'
}

/// Everything one pipeline run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfiguration {
    pub assembly: AssemblyParameters,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub strategy: AssemblyStrategy,
    /// Placeholder base written into scaffold gaps
    #[serde(default = "default_gap_char")]
    pub gap_char: char,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PipelineConfiguration {
    pub fn new(assembly: AssemblyParameters) -> Self {
        Self {
            assembly,
            preprocessing: PreprocessingConfig::default(),
            strategy: AssemblyStrategy::default(),
            gap_char: default_gap_char(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.assembly.validate()?;

        if let Some(ref correction) = self.preprocessing.error_correction {
            correction.validate()?;
        }

        if !self.gap_char.is_ascii_graphic() {
            return Err(PipelineError::invalid(
                "gap_char",
                format!("must be a printable ASCII character, got {:?}", self.gap_char),
            ));
        }

        Ok(())
    }
}

/// Loads, validates and persists a [`PipelineConfiguration`]
#[derive(Debug, Clone)]
pub struct ConfigurationManager {
    config: PipelineConfiguration,
    config_path: Option<PathBuf>,
}

impl ConfigurationManager {
    /// Wrap an in-memory configuration
    pub fn from_config(config: PipelineConfiguration) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// Load a TOML file, layering `CONTIG_FORGE__*` environment overrides on top
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, PipelineError> {
        let config_path = config_path.as_ref().to_path_buf();
        if !config_path.exists() {
            return Err(PipelineError::IOError {
                message: format!("configuration file not found: {}", config_path.display()),
            });
        }

        let built = Config::builder()
            .add_source(File::from(config_path.as_path()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: PipelineConfiguration = built.try_deserialize()?;

        config.validate()?;
        info!("Loaded configuration from {}", config_path.display());

        Ok(Self {
            config,
            config_path: Some(config_path),
        })
    }

    pub fn config(&self) -> &PipelineConfiguration {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn into_config(self) -> PipelineConfiguration {
        self.config
    }

    /// Write the current configuration as TOML
    pub fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let toml_string = toml::to_string_pretty(&self.config).map_err(|e| {
            PipelineError::ConfigurationError {
                message: format!("Failed to serialize configuration: {e}"),
            }
        })?;

        std::fs::write(path.as_ref(), toml_string)?;

        info!("💾 Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Does nothing when a
/// subscriber is already installed, so hosts embedding the engine keep theirs.
pub fn init_logging(config: &LoggingConfig) -> Result<(), PipelineError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if tracing::dispatcher::has_been_set() {
        debug!("Logging already initialized, skipping setup");
        return Ok(());
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            PipelineError::ConfigurationError {
                message: format!("invalid log level {:?}: {e}", config.level),
            }
        })?,
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            subscriber.with(fmt::layer().json().with_target(true)),
        ),
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(subscriber.with(fmt::layer().compact()))
        }
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            subscriber.with(fmt::layer().without_time().with_target(false)),
        ),
    };

    if let Err(e) = installed {
        warn!("Could not install tracing subscriber: {}", e);
    }

    Ok(())
}
