use mockboot::MockEngine;
use reqwest::Client;

// Engines must come up, and answer, whatever the executor of the caller.
// Running these tests together would hang if the engine runtime leaked into the caller's.

const SPECIFICATION: &str = "tests/fixtures/petstore-simple.yaml";

#[tokio::test]
async fn hello_reqwest() {
    let engine = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();

    let resp = Client::new()
        .get(engine.base_url().join("example").unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn hello_reqwest_actix() {
    let engine = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();

    let resp = Client::new()
        .get(engine.base_url().join("example").unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[async_std::test]
async fn hello_reqwest_async_std() {
    let engine = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();

    let resp = Client::new()
        .get(engine.base_url().join("example").unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn hello_reqwest_http2() {
    let engine = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .await
        .unwrap();

    let resp = Client::builder()
        .http2_prior_knowledge()
        .build()
        .expect("http client")
        .get(engine.base_url().join("example").unwrap())
        .send()
        .await
        .expect("response");

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.version(), reqwest::Version::HTTP_2);
}

#[test]
fn hello_without_an_executor() {
    let engine = MockEngine::builder()
        .with_specification_file(SPECIFICATION)
        .start()
        .unwrap()
        .wait()
        .unwrap();

    // reqwest needs a tokio reactor of its own
    let status = tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(reqwest::get(engine.base_url().join("example").unwrap()))
        .unwrap()
        .status();

    assert_eq!(status, 200);
}

#[tokio::test]
async fn engines_can_be_started_concurrently() {
    let launches = (0..4).map(|_| {
        MockEngine::builder()
            .with_specification_file(SPECIFICATION)
            .start()
            .unwrap()
    });
    let engines = futures::future::try_join_all(launches).await.unwrap();

    let mut ports: Vec<_> = engines.iter().map(|engine| engine.port()).collect();
    ports.sort_unstable();
    ports.dedup();
    assert_eq!(ports.len(), engines.len());

    for engine in &engines {
        let resp = reqwest::get(engine.base_url().join("example").unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}
