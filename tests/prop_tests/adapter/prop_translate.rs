use proptest::prelude::*;
use siddon::adapter::translate::{params_to_document, sort_params_to_document};
use siddon::bson::Bson;
use siddon::{SortOrder, set_param, set_sort};

fn distinct_keys() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-z][a-z0-9_]{0,7}", 0..16).prop_map(|s| s.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn params_keep_count_and_order(keys in distinct_keys(), seed in any::<i64>()) {
        let params: Vec<_> = keys.iter().enumerate().map(|(i, k)| set_param(k.as_str(), seed.wrapping_add(i as i64))).collect();
        let doc = params_to_document(params).unwrap();
        prop_assert_eq!(doc.len(), keys.len());
        let got: Vec<&String> = doc.keys().collect();
        let want: Vec<&String> = keys.iter().collect();
        prop_assert_eq!(got, want);
        for (i, k) in keys.iter().enumerate() {
            prop_assert_eq!(doc.get(k), Some(&Bson::Int64(seed.wrapping_add(i as i64))));
        }
    }

    #[test]
    fn sort_directions_map_to_signed_ones(entries in distinct_keys().prop_flat_map(|keys| {
        let n = keys.len();
        (Just(keys), proptest::collection::vec(any::<bool>(), n))
    })) {
        let (keys, asc) = entries;
        let sorts: Vec<_> = keys
            .iter()
            .zip(&asc)
            .map(|(k, a)| set_sort(k.as_str(), if *a { SortOrder::Asc } else { SortOrder::Desc }))
            .collect();
        let first = sort_params_to_document(sorts.clone()).unwrap();
        let again = sort_params_to_document(sorts).unwrap();
        prop_assert_eq!(&first, &again);
        for (k, a) in keys.iter().zip(&asc) {
            let want = if *a { 1 } else { -1 };
            prop_assert_eq!(first.get(k), Some(&Bson::Int32(want)));
        }
    }
}
