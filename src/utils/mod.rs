pub mod configuration;

pub use configuration::{
    init_logging, AssemblyParameters, AssemblyStrategy, ConfigurationManager,
    ErrorCorrectionConfig, LogFormat, LoggingConfig, PipelineConfiguration, PipelineError,
    PreprocessingConfig, QualityTrimConfig,
};
