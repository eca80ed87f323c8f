pub mod config;
pub mod converter;
pub mod detect;
pub mod dispatcher;
pub mod download;
pub mod format;
pub mod lifecycle;
pub mod metrics;
pub mod storage;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ConversionConfig,
    CorsConfig, LifecycleConfig, ServerConfig, StorageConfig,
};
pub use converter::{
    CompressionLevel, ConversionEngine, ConversionOptions, ConversionOutcome, Converter,
    ConverterError, Route,
};
pub use detect::detect_format;
pub use dispatcher::{
    BatchProgress, ConversionDispatcher, ConversionJob, ConversionResult, ConversionStatus,
    DispatchError, DispatchSettings,
};
pub use download::{DownloadError, DownloadResolver, ResolvedDownload};
pub use format::FileFormat;
pub use lifecycle::{ArtifactKind, FileRegistry, Reaper, ReaperHandle, SweepReport};
pub use storage::{StorageError, StorageLayout};
