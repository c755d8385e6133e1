//! `mockboot` launches an HTTP mock engine from within your Rust program - typically a test
//! suite - without having to manage an external process.
//!
//! Point it at OpenAPI/Swagger specification documents (or at a directory of plugin
//! configuration files) and get back the address of a running engine answering requests with
//! the examples declared in the documents.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Launch sequence](#launch-sequence)
//! 3. [Plugins](#plugins)
//! 4. [Runtime compatibility](#runtime-compatibility)
//!
//! ## Getting started
//! ```rust
//! use mockboot::MockEngine;
//!
//! #[async_std::main]
//! async fn main() {
//!     // Start an engine in the background on a random local port
//!     let engine = MockEngine::builder()
//!         .with_specification_file("tests/fixtures/petstore-simple.yaml")
//!         .start()
//!         .expect("Failed to launch the mock engine")
//!         .await
//!         .expect("The mock engine failed to start");
//!
//!     // Operations declared in the specification answer with their example
//!     let response = reqwest::get(engine.base_url().join("example").unwrap())
//!         .await
//!         .unwrap();
//!     assert_eq!(response.status(), 200);
//!
//!     // Anything else is a 404
//!     let status = reqwest::get(engine.base_url().join("missing").unwrap())
//!         .await
//!         .unwrap()
//!         .status();
//!     assert_eq!(status, 404);
//! }
//! ```
//!
//! ## Launch sequence
//!
//! [`MockEngineBuilder::start`] performs all setup on the calling thread - source validation,
//! configuration generation, path resolution, port allocation - and fails with a
//! [`LaunchError`] if any of it goes wrong.
//!
//! The engine then boots in the background. The returned [`StartOutcome`] resolves exactly once,
//! when the engine runtime reports back: to a [`MockEngine`] whose [`EngineHandle`] points at the
//! port allocated for it, or to an [`EngineStartError`].
//!
//! Each launch works on its own [`EngineConfiguration`]: engines can be started concurrently,
//! from parallel tests, without interfering with each other.
//!
//! ## Plugins
//!
//! How an engine answers requests is up to its [`Plugin`]. [`OpenApiPlugin`] is used unless you
//! select another one with [`MockEngineBuilder::with_plugin`].
//!
//! ## Runtime compatibility
//!
//! Each engine runs on its own thread, with its own `tokio` runtime: [`StartOutcome`] can be
//! awaited from any executor, or waited on synchronously with [`StartOutcome::wait`].
mod builder;
mod config;
mod engine;
mod error;
mod generator;
mod handle;
mod mock_engine;
mod openapi;
mod outcome;
mod plugin;
mod port;
mod request;
mod respond;
mod response_template;

pub use builder::MockEngineBuilder;
pub use config::EngineConfiguration;
pub use engine::{Completion, Deployment, EngineRuntime, HyperRuntime};
pub use error::{EngineStartError, GenerationError, LaunchError, PluginError, SetupError};
pub use generator::{GeneratedConfig, OpenApiConfigGenerator, SpecificationAdapter};
pub use handle::EngineHandle;
pub use mock_engine::MockEngine;
pub use openapi::OpenApiPlugin;
pub use outcome::StartOutcome;
pub use plugin::{Plugin, PluginConfig};
pub use request::Request;
pub use respond::Respond;
pub use response_template::ResponseTemplate;
