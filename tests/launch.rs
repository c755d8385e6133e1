use mockboot::{
    Completion, Deployment, EngineConfiguration, EngineRuntime, EngineStartError,
    GeneratedConfig, GenerationError, MockEngine, OpenApiConfigGenerator, SetupError,
    SpecificationAdapter,
};
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SPECIFICATION: &str = "tests/fixtures/petstore-simple.yaml";
const CONFIGURATION_DIR: &str = "tests/fixtures/config";

/// Keeps the configuration of every deployment and never reports back.
#[derive(Clone, Default)]
struct RecordingRuntime(Arc<Mutex<Vec<EngineConfiguration>>>);

impl RecordingRuntime {
    fn deployments(&self) -> Vec<EngineConfiguration> {
        self.0.lock().unwrap().clone()
    }
}

impl EngineRuntime for RecordingRuntime {
    fn deploy(&self, configuration: EngineConfiguration, completion: Completion) -> io::Result<()> {
        self.0.lock().unwrap().push(configuration);
        drop(completion);
        Ok(())
    }
}

/// Pretends the engine started, from another thread, without serving anything.
struct FakeRuntime;

impl EngineRuntime for FakeRuntime {
    fn deploy(&self, configuration: EngineConfiguration, completion: Completion) -> io::Result<()> {
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            let address = SocketAddr::from(([127, 0, 0, 1], configuration.listen_port()));
            completion.succeed(Deployment::new(address, ()));
        });
        Ok(())
    }
}

struct FailingRuntime;

impl EngineRuntime for FailingRuntime {
    fn deploy(&self, _configuration: EngineConfiguration, completion: Completion) -> io::Result<()> {
        completion.fail(EngineStartError::Runtime(io::Error::new(
            io::ErrorKind::Other,
            "no room for another engine",
        )));
        Ok(())
    }
}

struct RefusingRuntime;

impl EngineRuntime for RefusingRuntime {
    fn deploy(&self, _configuration: EngineConfiguration, _completion: Completion) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "cannot spawn"))
    }
}

/// Counts invocations, delegating to a fixed directory.
#[derive(Clone, Default)]
struct CountingAdapter(Arc<AtomicUsize>);

impl SpecificationAdapter for CountingAdapter {
    fn generate_config(&self, _files: &[PathBuf]) -> Result<GeneratedConfig, GenerationError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedConfig::persistent(CONFIGURATION_DIR))
    }
}

#[test]
fn both_specification_files_and_configuration_dirs_is_a_conflict() {
    // Arrange
    let runtime = RecordingRuntime::default();
    let adapter = CountingAdapter::default();

    // Act
    let outcome = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_adapter(adapter.clone())
        .with_runtime(runtime.clone())
        .start();

    // Assert
    let error = outcome.unwrap_err();
    assert!(matches!(error.cause(), SetupError::ConfigurationConflict));
    // Nothing was generated, nor deployed
    assert_eq!(adapter.0.load(Ordering::SeqCst), 0);
    assert!(runtime.deployments().is_empty());
}

#[test]
fn neither_specification_files_nor_configuration_dirs_is_missing_configuration() {
    let runtime = RecordingRuntime::default();

    let error = MockEngine::builder()
        .with_runtime(runtime.clone())
        .start()
        .unwrap_err();

    assert!(matches!(error.cause(), SetupError::ConfigurationMissing));
    assert!(runtime.deployments().is_empty());
}

#[test]
fn a_missing_configuration_dir_cannot_be_resolved() {
    let error = MockEngine::builder()
        .with_configuration_dir("tests/fixtures/does-not-exist")
        .with_runtime(RecordingRuntime::default())
        .start()
        .unwrap_err();

    match error.cause() {
        SetupError::ConfigurationResolution { path, .. } => {
            assert_eq!(path, &PathBuf::from("tests/fixtures/does-not-exist"))
        }
        other => panic!("Unexpected error: {:?}", other),
    }
}

#[test]
fn a_file_is_not_a_configuration_dir() {
    let error = MockEngine::builder()
        .with_configuration_dir(SPECIFICATION)
        .with_runtime(RecordingRuntime::default())
        .start()
        .unwrap_err();

    assert!(matches!(
        error.cause(),
        SetupError::ConfigurationResolution { .. }
    ));
}

#[test]
fn unsupported_specification_formats_are_rejected() {
    let error = MockEngine::builder()
        .with_specification_file("tests/fixtures/petstore.txt")
        .with_runtime(RecordingRuntime::default())
        .start()
        .unwrap_err();

    assert!(matches!(
        error.cause(),
        SetupError::ConfigurationGeneration(GenerationError::UnsupportedFormat { .. })
    ));
}

#[test]
fn malformed_specification_files_are_rejected() {
    let error = MockEngine::builder()
        .with_specification_file("tests/fixtures/malformed.yaml")
        .with_runtime(RecordingRuntime::default())
        .start()
        .unwrap_err();

    assert!(matches!(
        error.cause(),
        SetupError::ConfigurationGeneration(GenerationError::Malformed { .. })
    ));
}

#[test]
fn unreadable_specification_files_are_rejected() {
    let error = MockEngine::builder()
        .with_specification_file("tests/fixtures/does-not-exist.yaml")
        .with_runtime(RecordingRuntime::default())
        .start()
        .unwrap_err();

    assert!(matches!(
        error.cause(),
        SetupError::ConfigurationGeneration(GenerationError::Io { .. })
    ));
}

#[test]
fn a_refused_deployment_is_a_launch_error() {
    let error = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(RefusingRuntime)
        .start()
        .unwrap_err();

    assert!(matches!(error.cause(), SetupError::Deploy(_)));
}

#[test]
fn the_runtime_receives_a_fully_assembled_configuration() {
    // Arrange
    let runtime = RecordingRuntime::default();
    let adapter = CountingAdapter::default();

    // Act
    let _outcome = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .with_adapter(adapter.clone())
        .with_runtime(runtime.clone())
        .start()
        .unwrap();

    // Assert
    assert_eq!(adapter.0.load(Ordering::SeqCst), 1);
    let deployments = runtime.deployments();
    assert_eq!(deployments.len(), 1);
    let configuration = &deployments[0];
    assert_eq!(configuration.host(), "127.0.0.1");
    assert_ne!(configuration.listen_port(), 0);
    assert!(configuration.plugin_args().is_empty());
    let plugins: Vec<_> = configuration.plugins().iter().map(|p| p.name()).collect();
    assert_eq!(plugins, vec!["openapi"]);
    assert_eq!(
        configuration.config_dirs(),
        &[PathBuf::from(CONFIGURATION_DIR).canonicalize().unwrap()]
    );
}

#[async_std::test]
async fn an_abandoned_deployment_resolves_the_outcome_with_an_error() {
    let outcome = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(RecordingRuntime::default())
        .start()
        .unwrap();

    let error = outcome.await.unwrap_err();

    assert!(matches!(error, EngineStartError::Abandoned));
}

#[async_std::test]
async fn runtime_failures_are_reported_through_the_outcome() {
    let outcome = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(FailingRuntime)
        .start()
        .expect("Setup should succeed");

    let error = outcome.await.unwrap_err();

    assert!(matches!(error, EngineStartError::Runtime(_)));
}

#[async_std::test]
async fn the_handle_is_built_from_the_allocated_port() {
    // Act
    let engine = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(FakeRuntime)
        .start()
        .unwrap()
        .await
        .unwrap();

    // Assert
    assert_eq!(engine.address().port(), engine.port());
    assert_eq!(engine.base_url().port(), Some(engine.port()));
    assert_eq!(
        engine.base_url().as_str(),
        format!("http://127.0.0.1:{}/", engine.address().port())
    );
}

#[test]
fn the_outcome_can_be_waited_on_synchronously() {
    let engine = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(FakeRuntime)
        .start()
        .unwrap()
        .wait()
        .unwrap();

    assert_eq!(engine.address().port(), engine.port());
}

#[async_std::test]
async fn engines_started_sequentially_listen_on_distinct_ports() {
    let first = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();
    let second = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();

    assert_ne!(first.port(), second.port());
    assert_eq!(first.address().port(), first.port());
    assert_eq!(second.address().port(), second.port());
    assert!(TcpStream::connect(first.address()).is_ok());
    assert!(TcpStream::connect(second.address()).is_ok());
}

#[async_std::test]
async fn dropping_the_engine_shuts_it_down() {
    // Arrange
    let engine = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();
    let address = *engine.address();
    assert!(TcpStream::connect(address).is_ok());

    // Act
    drop(engine);

    // Assert
    assert!(TcpStream::connect_timeout(&address, Duration::from_millis(200)).is_err());
}

#[async_std::test]
async fn an_invalid_specification_fails_the_engine_start_not_the_launch() {
    let outcome = MockEngine::builder()
        .with_configuration_dir("tests/fixtures/broken-config")
        .start()
        .expect("Setup should succeed");

    let error = outcome.await.unwrap_err();

    match error {
        EngineStartError::Plugin { plugin, .. } => assert_eq!(plugin, "openapi"),
        other => panic!("Unexpected error: {:?}", other),
    }
}

#[async_std::test]
async fn a_taken_port_fails_the_engine_start() {
    // Arrange - the runtime races against another process binding the port first
    struct SquattedRuntime;

    impl EngineRuntime for SquattedRuntime {
        fn deploy(
            &self,
            configuration: EngineConfiguration,
            completion: Completion,
        ) -> io::Result<()> {
            let squatter =
                std::net::TcpListener::bind((configuration.host(), configuration.listen_port()))?;
            let outcome = mockboot::HyperRuntime.deploy(configuration, completion);
            // Keep the port busy until the engine gave up
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_secs(2));
                drop(squatter);
            });
            outcome
        }
    }

    // Act
    let error = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .with_runtime(SquattedRuntime)
        .start()
        .unwrap()
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(error, EngineStartError::Bind { .. }));
}

#[test]
fn every_specification_file_gets_its_own_configuration_file() {
    // Arrange
    let files = [
        PathBuf::from("tests/fixtures/catalog.yaml"),
        PathBuf::from("tests/fixtures/catalog.json"),
        PathBuf::from("tests/fixtures/service-config.yaml"),
    ];

    // Act
    let generated = OpenApiConfigGenerator.generate_config(&files).unwrap();

    // Assert
    let mut config_files: Vec<_> = std::fs::read_dir(generated.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    config_files.sort();
    assert_eq!(
        config_files,
        vec![
            "catalog-1-config.json",
            "catalog-config.json",
            "service-config-config.json"
        ]
    );

    let spec_files: Vec<String> = config_files
        .iter()
        .map(|file| {
            let raw = std::fs::read_to_string(generated.path().join(file)).unwrap();
            let config: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(config["plugin"], "openapi");
            config["specFile"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        spec_files,
        vec![
            "specs/catalog.json",
            "specs/catalog.yaml",
            "specs/service-config.yaml"
        ]
    );
    for spec_file in &spec_files {
        assert!(generated.path().join(spec_file).is_file());
    }
}

#[test]
fn generated_configuration_is_deleted_with_its_owner() {
    let generated = OpenApiConfigGenerator
        .generate_config(&[PathBuf::from(SPECIFICATION)])
        .unwrap();
    let path = generated.path().to_path_buf();
    assert!(path.is_dir());

    drop(generated);

    assert!(!path.exists());
}

#[async_std::test]
async fn base_urls_can_use_another_scheme() {
    let engine = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(FakeRuntime)
        .start()
        .unwrap()
        .await
        .unwrap();

    let base_url = engine.base_url_with_scheme("https");

    assert_eq!(
        base_url.as_str(),
        format!("https://127.0.0.1:{}/", engine.port())
    );
    assert_eq!(engine.scheme(), "http");
    assert_eq!(engine.base_url().scheme(), "http");
}

#[test]
#[should_panic(expected = "is not a valid url scheme")]
fn malformed_schemes_are_a_caller_bug() {
    let engine = MockEngine::builder()
        .with_configuration_dir(CONFIGURATION_DIR)
        .with_runtime(FakeRuntime)
        .start()
        .unwrap()
        .wait()
        .unwrap();

    engine.base_url_with_scheme("not a scheme");
}
