use siddon::backend::MemoryBackend;
use siddon::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn connect_with_default_config() {
    let client = Client::connect(&ClientConfig::default()).await.unwrap();
    client.ping(&client.context()).await.unwrap();
    assert_eq!(client.backend().kind(), "memory");
    assert_eq!(client.database("app").name(), "app");
}

#[tokio::test]
async fn unsupported_scheme_is_a_connect_error() {
    let err = Client::connect(&ClientConfig::new("postgres://localhost", "x")).await.unwrap_err();
    assert!(matches!(err, DbError::Connect(ref m) if m.contains("postgres")));
}

#[tokio::test]
async fn unreachable_backend_fails_to_connect() {
    let mem = MemoryBackend::new();
    mem.set_reachable(false);
    let err = Client::with_backend(Arc::new(mem), Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, DbError::Connect(_)));
}

#[tokio::test]
async fn slow_ping_hits_the_connect_timeout() {
    let slow = MemoryBackend::new().with_latency(Duration::from_millis(300));
    let err = Client::with_backend(Arc::new(slow), Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, DbError::Connect(ref m) if m.contains("did not answer")));
}

#[tokio::test]
async fn lost_connection_surfaces_as_backend_error() {
    let mem = Arc::new(MemoryBackend::new());
    let client = Client::with_backend(mem.clone(), Duration::from_secs(1)).await.unwrap();
    let model = register_model::<crate::integration_tests::_support::Person>(&client.database("t"), "people").unwrap();
    mem.set_reachable(false);
    let err = model.find(Vec::<Params>::new()).many().exec(&Context::background()).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Backend { op: siddon::OpKind::FindMany, source: siddon::backend::StoreError::Unreachable(_), .. }
    ));
}

#[tokio::test]
async fn global_client_is_initialized_once() {
    let bad = Client::global(&ClientConfig::new("nope://", "x")).await;
    assert!(bad.is_err());

    let first = Client::global(&ClientConfig::new("memory://one", "a")).await.unwrap();
    let second = Client::global(&ClientConfig::new("memory://two", "b")).await.unwrap();
    assert!(std::ptr::eq(first, second));
}
