use crate::integration_tests::_support::{Person, people};
use proptest::prelude::*;
use siddon::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, .. ProptestConfig::default() })]

    #[test]
    fn many_sorted_by_age_then_rank_is_non_decreasing(rows in proptest::collection::vec((-50i64..50, 0u32..5), 0..20)) {
        let got = runtime().block_on(async {
            let (model, _) = people().await;
            let ctx = Context::background();
            let records: Vec<Person> = rows.iter().enumerate().map(|(i, (age, rank))| Person::new(&format!("p{i}"), *age, *rank)).collect();
            model.save().many(&records).exec(&ctx).await.unwrap();
            model
                .find(Vec::<Params>::new())
                .many()
                .sort([set_sort("age", SortOrder::Asc), set_sort("rank", SortOrder::Desc)])
                .exec(&ctx)
                .await
                .unwrap()
        });
        prop_assert_eq!(got.len(), rows.len());
        for w in got.windows(2) {
            prop_assert!(w[0].age < w[1].age || (w[0].age == w[1].age && w[0].rank >= w[1].rank));
        }
    }

    #[test]
    fn skip_and_limit_slice_the_sorted_result(n in 0usize..12, skip in 0u64..15, limit in 0u64..6) {
        let (all, page) = runtime().block_on(async {
            let (model, _) = people().await;
            let ctx = Context::background();
            let records: Vec<Person> = (0..n).map(|i| Person::new(&format!("p{i}"), (n - i) as i64, i as u32)).collect();
            model.save().many(&records).exec(&ctx).await.unwrap();
            let by_age = [set_sort("age", SortOrder::Asc)];
            let all = model.find(Vec::<Params>::new()).many().sort(by_age.clone()).exec(&ctx).await.unwrap();
            let page = model.find(Vec::<Params>::new()).many().sort(by_age).skip(skip).limit(limit).exec(&ctx).await.unwrap();
            (all, page)
        });
        let take = if limit == 0 { usize::MAX } else { limit as usize };
        let want: Vec<Person> = all.into_iter().skip(skip as usize).take(take).collect();
        prop_assert_eq!(page, want);
    }
}
