use siddon::backend::StoreError;
use siddon::{DbError, OpKind};
use std::error::Error;

#[test]
fn backend_errors_keep_their_source() {
    let err = DbError::from_store(OpKind::DeleteMany, "users", StoreError::Unreachable("down".into()));
    assert_eq!(err.to_string(), "delete_many on `users` failed: backend unreachable: down");
    let source = err.source().unwrap();
    assert!(source.to_string().contains("down"));
}

#[test]
fn not_found_is_distinct_from_other_failures() {
    assert!(DbError::NotFound { collection: "c".into() }.is_not_found());
    assert!(!DbError::Canceled.is_not_found());
    assert!(!DbError::Validation("x".into()).is_not_found());
}
