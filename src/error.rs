//! Everything that can go wrong while bringing a mock engine up.
//!
//! Failures are split along the single suspension point of a launch:
//! - [`LaunchError`] is returned synchronously by [`MockEngineBuilder::start`] when the
//!   setup phase (validation, configuration generation, path resolution, port allocation,
//!   hand-off to the runtime) fails;
//! - [`EngineStartError`] is only ever delivered through the [`StartOutcome`] future, once
//!   the engine runtime reports that it could not start.
//!
//! [`MockEngineBuilder::start`]: crate::MockEngineBuilder::start
//! [`StartOutcome`]: crate::StartOutcome
use std::io;
use std::path::PathBuf;

/// A setup-time fault, returned by [`MockEngineBuilder::start`](crate::MockEngineBuilder::start)
/// before anything has been handed to the engine runtime.
///
/// Use [`LaunchError::cause`] to find out which step failed.
#[derive(Debug, thiserror::Error)]
#[error("Error starting the mock engine: {cause}")]
pub struct LaunchError {
    #[source]
    cause: SetupError,
}

impl LaunchError {
    /// The setup step that failed.
    pub fn cause(&self) -> &SetupError {
        &self.cause
    }

    pub fn into_cause(self) -> SetupError {
        self.cause
    }
}

impl From<SetupError> for LaunchError {
    fn from(cause: SetupError) -> Self {
        Self { cause }
    }
}

/// The setup steps that can fail, in the order they are attempted.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Must specify only one of specification file or configuration directory")]
    ConfigurationConflict,
    #[error("Must specify one of specification file or configuration directory")]
    ConfigurationMissing,
    #[error("Failed to generate a configuration directory from the specification files")]
    ConfigurationGeneration(#[source] GenerationError),
    #[error("Failed to resolve configuration directory {}", path.display())]
    ConfigurationResolution {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to find a free port")]
    PortAllocation(#[source] io::Error),
    #[error("The engine runtime refused the deployment")]
    Deploy(#[source] io::Error),
}

/// Failures of a [`SpecificationAdapter`](crate::SpecificationAdapter).
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Failed to process {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a YAML or JSON specification document", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Failed to parse {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("Failed to serialize the generated configuration")]
    Serialize(#[from] serde_json::Error),
}

/// The engine runtime reported that it could not start.
///
/// Only observable through the [`StartOutcome`](crate::StartOutcome) future.
#[derive(Debug, thiserror::Error)]
pub enum EngineStartError {
    #[error("Failed to build the engine runtime")]
    Runtime(#[source] io::Error),
    #[error("Invalid configuration file {}: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },
    #[error("No configuration file found for plugin `{plugin}`")]
    NoConfiguration { plugin: String },
    #[error("Plugin `{plugin}` failed to load its configuration")]
    Plugin {
        plugin: String,
        #[source]
        source: PluginError,
    },
    #[error("Failed to bind {address}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("The engine runtime dropped the deployment without reporting an outcome")]
    Abandoned,
}

/// Failures raised by a [`Plugin`](crate::Plugin) while loading its configuration.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("{0}")]
    Invalid(String),
}

impl EngineStartError {
    pub(crate) fn bind(host: &str, port: u16, source: io::Error) -> Self {
        Self::Bind {
            address: format!("{}:{}", host, port),
            source,
        }
    }
}
