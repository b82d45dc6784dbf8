use crate::integration_tests::_support::Person;
use siddon::backend::{MemoryBackend, Namespace};
use siddon::prelude::*;
use std::sync::Arc;
use std::time::Duration;

async fn slow_people() -> (DocumentModel<Person>, Arc<MemoryBackend>) {
    let mem = Arc::new(MemoryBackend::new().with_latency(Duration::from_millis(100)));
    let client = Client::with_backend(mem.clone(), Duration::from_secs(2)).await.unwrap();
    (register_model::<Person>(&client.database("t"), "people").unwrap(), mem)
}

#[tokio::test]
async fn cancel_mid_flight_leaves_no_write() {
    let (model, mem) = slow_people().await;
    let ctx = Context::background();
    let trigger = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });
    let err = model.save().one(Person::new("ada", 1, 1)).exec(&ctx).await.unwrap_err();
    assert!(matches!(err, DbError::Canceled));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(mem.is_empty(&Namespace::new("t", "people")));
}

#[tokio::test]
async fn deadline_expiry_is_timed_out() {
    let (model, mem) = slow_people().await;
    let ctx = Context::with_timeout(Duration::from_millis(10));
    let err = model.save().one(Person::new("ada", 1, 1)).exec(&ctx).await.unwrap_err();
    assert!(matches!(err, DbError::TimedOut));
    assert!(mem.is_empty(&Namespace::new("t", "people")));
}

#[tokio::test]
async fn client_context_applies_configured_timeout() {
    let mem = Arc::new(MemoryBackend::new().with_latency(Duration::from_millis(100)));
    let client = Client::with_backend(mem, Duration::from_secs(2))
        .await
        .unwrap()
        .with_exec_timeout(Some(Duration::from_millis(10)));
    let model = register_model::<Person>(&client.database("t"), "people").unwrap();
    let err = model.find(Vec::<Params>::new()).many().exec(&client.context()).await.unwrap_err();
    assert!(matches!(err, DbError::TimedOut));
}

#[tokio::test]
async fn canceled_context_fails_before_the_backend() {
    let (model, _) = slow_people().await;
    let ctx = Context::background();
    ctx.cancel();
    let err = model.delete(Vec::<Params>::new()).many().exec(&ctx).await.unwrap_err();
    assert!(matches!(err, DbError::Canceled));
}
