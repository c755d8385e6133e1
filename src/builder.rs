use crate::config::EngineConfiguration;
use crate::engine::{Completion, EngineRuntime, HyperRuntime};
use crate::error::{LaunchError, SetupError};
use crate::generator::{OpenApiConfigGenerator, SpecificationAdapter};
use crate::openapi::OpenApiPlugin;
use crate::outcome::StartOutcome;
use crate::plugin::Plugin;
use log::debug;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A builder providing a fluent API to assemble and launch a [`MockEngine`] step-by-step.
/// Use [`MockEngine::builder`] to get started.
///
/// An engine is configured from exactly one kind of source:
/// - one or more specification documents ([`with_specification_file`]), turned into a
///   configuration directory when the engine starts;
/// - or one or more configuration directories ([`with_configuration_dir`]).
///
/// [`MockEngine`]: crate::MockEngine
/// [`MockEngine::builder`]: crate::MockEngine::builder
/// [`with_specification_file`]: MockEngineBuilder::with_specification_file
/// [`with_configuration_dir`]: MockEngineBuilder::with_configuration_dir
pub struct MockEngineBuilder {
    specification_files: Vec<PathBuf>,
    configuration_dirs: Vec<PathBuf>,
    plugin: Arc<dyn Plugin>,
    adapter: Box<dyn SpecificationAdapter>,
    runtime: Box<dyn EngineRuntime>,
}

impl MockEngineBuilder {
    pub(crate) fn new() -> Self {
        Self {
            specification_files: vec![],
            configuration_dirs: vec![],
            plugin: Arc::new(OpenApiPlugin),
            adapter: Box::new(OpenApiConfigGenerator),
            runtime: Box::new(HyperRuntime),
        }
    }

    /// The plugin serving requests. [`OpenApiPlugin`] by default.
    pub fn with_plugin<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugin = Arc::new(plugin);
        self
    }

    /// A directory containing plugin configuration files.
    ///
    /// Can be called multiple times; cannot be combined with
    /// [`with_specification_file`](MockEngineBuilder::with_specification_file).
    pub fn with_configuration_dir(mut self, configuration_dir: impl Into<PathBuf>) -> Self {
        self.configuration_dirs.push(configuration_dir.into());
        self
    }

    /// The path to an OpenAPI/Swagger specification document, in YAML or JSON.
    ///
    /// Can be called multiple times; cannot be combined with
    /// [`with_configuration_dir`](MockEngineBuilder::with_configuration_dir).
    pub fn with_specification_file(mut self, specification_file: impl Into<PathBuf>) -> Self {
        self.specification_files.push(specification_file.into());
        self
    }

    /// How specification documents are turned into a configuration directory.
    /// [`OpenApiConfigGenerator`] by default.
    pub fn with_adapter<A: SpecificationAdapter + 'static>(mut self, adapter: A) -> Self {
        self.adapter = Box::new(adapter);
        self
    }

    /// Where the engine runs. [`HyperRuntime`] by default.
    pub fn with_runtime<R: EngineRuntime + 'static>(mut self, runtime: R) -> Self {
        self.runtime = Box::new(runtime);
        self
    }

    /// Finalise the builder and launch the engine!
    ///
    /// Setup happens right away, on the calling thread: validating the configuration sources,
    /// generating a configuration directory from the specification documents, resolving the
    /// configuration directories and allocating a free port. Any failure there is returned as a
    /// [`LaunchError`].
    ///
    /// The engine itself starts in the background: await the returned [`StartOutcome`] (or
    /// [`wait`](StartOutcome::wait) on it) to get hold of the running [`MockEngine`].
    ///
    /// ### Example:
    /// ```rust
    /// use mockboot::MockEngine;
    ///
    /// #[async_std::main]
    /// async fn main() {
    ///     // Arrange
    ///     let engine = MockEngine::builder()
    ///         .with_specification_file("tests/fixtures/petstore-simple.yaml")
    ///         .start()
    ///         .expect("Failed to launch the mock engine")
    ///         .await
    ///         .expect("The mock engine failed to start");
    ///
    ///     // Act
    ///     let status = reqwest::get(engine.base_url().join("example").unwrap())
    ///         .await
    ///         .unwrap()
    ///         .status();
    ///
    ///     // Assert
    ///     assert_eq!(status, 200);
    /// }
    /// ```
    ///
    /// [`MockEngine`]: crate::MockEngine
    pub fn start(self) -> Result<StartOutcome, LaunchError> {
        let Self {
            specification_files,
            mut configuration_dirs,
            plugin,
            adapter,
            runtime,
        } = self;

        if !specification_files.is_empty() && !configuration_dirs.is_empty() {
            return Err(SetupError::ConfigurationConflict.into());
        }
        let generated = if specification_files.is_empty() {
            None
        } else {
            let generated = adapter
                .generate_config(&specification_files)
                .map_err(SetupError::ConfigurationGeneration)?;
            configuration_dirs.push(generated.path().to_path_buf());
            Some(generated)
        };
        if configuration_dirs.is_empty() {
            return Err(SetupError::ConfigurationMissing.into());
        }

        let configuration = EngineConfiguration::assemble(plugin, &configuration_dirs)?;
        debug!("Deploying mock engine: {:?}", configuration);

        let host = configuration.host().to_string();
        let port = configuration.listen_port();
        let config_dirs = configuration.config_dirs().to_vec();
        let (completion, receiver) = Completion::channel();
        runtime
            .deploy(configuration, completion)
            .map_err(SetupError::Deploy)?;

        Ok(StartOutcome::new(receiver, host, port, config_dirs, generated))
    }
}

impl Default for MockEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockEngineBuilder")
            .field("specification_files", &self.specification_files)
            .field("configuration_dirs", &self.configuration_dirs)
            .field("plugin", &self.plugin.name())
            .finish_non_exhaustive()
    }
}
