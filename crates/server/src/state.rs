use std::sync::Arc;

use fileforge_core::{
    Config, ConversionDispatcher, ConversionEngine, DispatchSettings, DownloadResolver,
    FileRegistry, StorageLayout,
};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<FileRegistry>,
    dispatcher: ConversionDispatcher,
    resolver: DownloadResolver,
}

impl AppState {
    /// Builds state around an existing registry and engine.
    pub fn new(config: Config, registry: Arc<FileRegistry>, engine: ConversionEngine) -> Self {
        let layout = StorageLayout::from_config(&config.storage);
        let resolver = DownloadResolver::new(layout.output_dir());
        let dispatcher = ConversionDispatcher::new(
            Arc::new(engine),
            Arc::clone(&registry),
            layout,
            DispatchSettings::from_config(&config),
        );
        Self {
            config,
            registry,
            dispatcher,
            resolver,
        }
    }

    /// State with the built-in conversion routes.
    pub fn with_default_engine(config: Config, registry: Arc<FileRegistry>) -> Self {
        let engine = ConversionEngine::with_defaults(config.conversion.default_image_quality);
        Self::new(config, registry, engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &ConversionDispatcher {
        &self.dispatcher
    }

    pub fn engine(&self) -> &ConversionEngine {
        self.dispatcher.engine()
    }

    pub fn resolver(&self) -> &DownloadResolver {
        &self.resolver
    }
}
