use crate::integration_tests::_support::{Address, Customer, memory_client};
use siddon::bson::doc;
use siddon::prelude::*;

fn customer(id: &str, city: &str) -> Customer {
    Customer {
        id: id.into(),
        name: format!("customer {id}"),
        address: Address { city: city.into(), zip: "0150".into() },
        vip: id == "c1",
    }
}

#[tokio::test]
async fn embedded_records_round_trip_as_nested_documents() {
    let (client, mem) = memory_client().await;
    let model = client.database("shop").model::<Customer>("customers").unwrap();
    let ctx = Context::background();
    model.save().many([customer("c1", "Oslo"), customer("c2", "Bergen")]).exec(&ctx).await.unwrap();

    let stored = siddon::backend::Backend::find(
        mem.as_ref(),
        model.namespace(),
        doc! {"_id": "c2"},
        siddon::backend::FindOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(
        stored,
        vec![doc! {
            "_id": "c2",
            "full_name": "customer c2",
            "addr": {"city": "Bergen", "zip": "0150"},
            "vip": false,
        }]
    );

    let found = model.find([set_param("addr.city", "Oslo")]).one().exec(&ctx).await.unwrap();
    assert_eq!(found, customer("c1", "Oslo"));
}

#[tokio::test]
async fn dotted_path_must_start_at_a_known_key() {
    let (client, _) = memory_client().await;
    let model = client.database("shop").model::<Customer>("customers").unwrap();
    let err = model
        .find([set_param("address.city", "Oslo")])
        .many()
        .exec(&Context::background())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[tokio::test]
async fn column_on_nested_path_keeps_only_that_leaf() {
    let (client, _) = memory_client().await;
    let model = client.database("shop").model::<Customer>("customers").unwrap();
    let ctx = Context::background();
    model.save().one(customer("c1", "Oslo")).exec(&ctx).await.unwrap();

    let found = model.find(Vec::<Params>::new()).one().column(["addr.city"]).exec(&ctx).await.unwrap();
    assert_eq!(found.id, "c1");
    assert_eq!(found.address, Address { city: "Oslo".into(), zip: String::new() });
    assert_eq!(found.name, "");
    assert!(!found.vip);
}
