use std::fmt;
use url::Url;

pub(crate) const DEFAULT_SCHEME: &str = "http";
/// Where the `openapi` plugin serves the specification browsing UI.
pub(crate) const SPECIFICATION_UI_PATH: &str = "/_spec/";
/// Where the `openapi` plugin serves the combined, machine-readable specification.
pub(crate) const COMBINED_SPECIFICATION_PATH: &str = "/_spec/combined.json";

/// The addresses at which a running mock engine can be reached.
///
/// An `EngineHandle` is built once the engine runtime has confirmed that the engine is up and
/// listening, using the port that was allocated for that very engine instance.
/// It is a plain value: no method performs any I/O.
///
/// You usually get to an `EngineHandle` through [`MockEngine`](crate::MockEngine), which
/// dereferences to it.
///
/// ### Example:
/// ```rust
/// use mockboot::MockEngine;
///
/// #[async_std::main]
/// async fn main() {
///     let engine = MockEngine::builder()
///         .with_specification_file("tests/fixtures/petstore-simple.yaml")
///         .start()
///         .unwrap()
///         .await
///         .unwrap();
///
///     let base_url = engine.base_url();
///     assert_eq!(base_url.port(), Some(engine.port()));
///     assert_eq!(
///         engine.specification_ui_url().as_str(),
///         format!("http://127.0.0.1:{}/_spec/", engine.port())
///     );
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineHandle {
    host: String,
    port: u16,
}

impl EngineHandle {
    pub(crate) fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port the engine is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The scheme used by [`base_url`](EngineHandle::base_url), `http`.
    pub fn scheme(&self) -> &str {
        DEFAULT_SCHEME
    }

    /// Return the base url of the engine, e.g. `http://127.0.0.1:4372/`.
    ///
    /// Use this method to compose urls when interacting with the engine via an HTTP client.
    pub fn base_url(&self) -> Url {
        self.base_url_with_scheme(DEFAULT_SCHEME)
    }

    /// Same as [`base_url`](EngineHandle::base_url), with a custom scheme.
    ///
    /// `scheme` must be a valid url scheme, e.g. `https` or `ws`: host and port always make a
    /// well-formed url, so only the scheme can break it.
    ///
    /// # Panics
    ///
    /// Panics if `scheme` is not a valid url scheme.
    pub fn base_url_with_scheme(&self, scheme: &str) -> Url {
        Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port))
            .unwrap_or_else(|e| panic!("`{}` is not a valid url scheme: {}", scheme, e))
    }

    /// The url of the specification browsing UI.
    pub fn specification_ui_url(&self) -> Url {
        self.join(SPECIFICATION_UI_PATH)
    }

    /// The url of the combined specification document, as JSON.
    pub fn combined_specification_url(&self) -> Url {
        self.join(COMBINED_SPECIFICATION_PATH)
    }

    fn join(&self, path: &str) -> Url {
        let mut url = self.base_url();
        url.set_path(path);
        url
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", DEFAULT_SCHEME, self.host, self.port)
    }
}
