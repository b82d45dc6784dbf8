use crate::integration_tests::_support::{Person, people};
use siddon::prelude::*;
use siddon::utils::devlog;

async fn seed(model: &DocumentModel<Person>) {
    let rows = [
        Person::new("cara", 30, 3),
        Person::new("abe", 50, 5),
        Person::new("dov", 10, 1),
        Person::new("eli", 40, 4),
        Person::new("bo", 20, 2),
    ];
    let report = model.save().many(&rows).exec(&Context::background()).await.unwrap();
    assert_eq!(report.inserted, 5);
}

#[tokio::test]
async fn sorted_skip_limit_returns_ranks_two_and_three() {
    let (model, _) = people().await;
    seed(&model).await;
    let got = model
        .find(Vec::<Params>::new())
        .many()
        .sort([set_sort("age", SortOrder::Asc)])
        .skip(1)
        .limit(2)
        .exec(&Context::background())
        .await
        .unwrap();
    let ranks: Vec<u32> = got.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, [2, 3]);
}

#[tokio::test]
async fn limit_zero_returns_everything() {
    let (model, _) = people().await;
    seed(&model).await;
    let got = model.find(Vec::<Params>::new()).many().limit(0).exec(&Context::background()).await.unwrap();
    assert_eq!(got.len(), 5);
}

#[tokio::test]
async fn find_one_without_match_is_not_found() {
    let (model, _) = people().await;
    seed(&model).await;
    let err = model
        .find([set_param("name", "nobody")])
        .one()
        .exec(&Context::background())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, DbError::NotFound { ref collection } if collection == "people"));
}

#[tokio::test]
async fn find_one_honours_sort() {
    let (model, _) = people().await;
    seed(&model).await;
    let oldest = model
        .find(Vec::<Params>::new())
        .one()
        .sort([set_sort("age", SortOrder::Desc)])
        .exec(&Context::background())
        .await
        .unwrap();
    assert_eq!(oldest, Person::new("abe", 50, 5));
}

#[tokio::test]
async fn filters_match_exact_values() {
    let (model, _) = people().await;
    seed(&model).await;
    let got = model
        .find([set_param("age", 40_i64), set_param("rank", 4_i64)])
        .one()
        .exec(&Context::background())
        .await
        .unwrap();
    assert_eq!(got.name, "eli");
}

#[tokio::test]
async fn column_restricts_returned_fields() {
    let (model, _) = people().await;
    seed(&model).await;
    let got = model
        .find([set_param("name", "bo")])
        .many()
        .column(["name"])
        .exec(&Context::background())
        .await
        .unwrap();
    assert_eq!(got, vec![Person { name: "bo".into(), age: 0, rank: 0 }]);
}

#[tokio::test]
async fn unknown_filter_key_fails_at_exec() {
    let (model, mem) = people().await;
    let query = model.find([set_param("nickname", "x")]).many();
    let err = query.exec(&Context::background()).await.unwrap_err();
    assert!(matches!(err, DbError::Validation(ref m) if m.contains("nickname")));
    assert!(mem.is_empty(&siddon::backend::Namespace::new("test", "people")));
}

#[tokio::test]
async fn last_sort_call_wins() {
    let (model, _) = people().await;
    seed(&model).await;
    let got = model
        .find(Vec::<Params>::new())
        .many()
        .sort([set_sort("$bad", SortOrder::Asc)])
        .sort([set_sort("rank", SortOrder::Desc)])
        .limit(1)
        .exec(&Context::background())
        .await
        .unwrap();
    assert_eq!(got[0].rank, 5);
}

#[tokio::test]
async fn each_exec_emits_one_query_record() {
    let (model, _) = people().await;
    seed(&model).await;
    let _sink = devlog::enable_thread_sink();
    model.find(Vec::<Params>::new()).many().exec(&Context::background()).await.unwrap();
    let _ = model.find([set_param("name", "zed")]).one().exec(&Context::background()).await;
    let lines = devlog::drain();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(first["op"], "find_many");
    assert_eq!(first["collection"], "people");
    assert_eq!(first["count"], 5);
    let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
    assert_eq!(second["ok"], false);
}
