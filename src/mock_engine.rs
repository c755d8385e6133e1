use crate::builder::MockEngineBuilder;
use crate::engine::Deployment;
use crate::generator::GeneratedConfig;
use crate::handle::EngineHandle;
use std::net::SocketAddr;
use std::ops::Deref;

/// A mock engine running in the background, ready to answer HTTP requests.
///
/// Use [`MockEngine::builder`] to configure and launch one.
///
/// `MockEngine` dereferences to its [`EngineHandle`]: call [`base_url`], [`specification_ui_url`]
/// or [`combined_specification_url`] on it directly.
///
/// When a `MockEngine` goes out of scope the HTTP server running in the background is shut
/// down, its port is released and the configuration generated for it (if any) is deleted.
///
/// [`base_url`]: EngineHandle::base_url
/// [`specification_ui_url`]: EngineHandle::specification_ui_url
/// [`combined_specification_url`]: EngineHandle::combined_specification_url
#[derive(Debug)]
pub struct MockEngine {
    handle: EngineHandle,
    // Dropping the deployment shuts the server down.
    deployment: Deployment,
    _generated: Option<GeneratedConfig>,
}

impl MockEngine {
    pub(crate) fn new(
        handle: EngineHandle,
        deployment: Deployment,
        generated: Option<GeneratedConfig>,
    ) -> Self {
        Self {
            handle,
            deployment,
            _generated: generated,
        }
    }

    /// Start configuring a new engine.
    ///
    /// ### Example:
    /// ```rust
    /// use mockboot::MockEngine;
    ///
    /// let engine = MockEngine::builder()
    ///     .with_specification_file("tests/fixtures/petstore-simple.yaml")
    ///     .start()
    ///     .unwrap()
    ///     .wait()
    ///     .unwrap();
    ///
    /// assert_eq!(engine.address().port(), engine.port());
    /// ```
    pub fn builder() -> MockEngineBuilder {
        MockEngineBuilder::new()
    }

    pub fn handle(&self) -> &EngineHandle {
        &self.handle
    }

    /// The socket address the engine is listening on, as reported by the engine runtime.
    pub fn address(&self) -> &SocketAddr {
        self.deployment.address()
    }
}

impl Deref for MockEngine {
    type Target = EngineHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}
