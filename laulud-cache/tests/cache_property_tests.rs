use async_trait::async_trait;
use laulud_cache::{CacheConfig, QueryCache, QueryFetcher};
use laulud_core::{LauludError, LauludResult};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

struct NeverFetcher;

#[async_trait]
impl QueryFetcher<u8, u32> for NeverFetcher {
    async fn fetch(&self, key: &u8) -> LauludResult<u32> {
        Err(LauludError::NotFound {
            route: key.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Increment(u8),
    Invalidate(u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        (0u8..4).prop_map(Op::Increment),
        (0u8..4).prop_map(Op::Invalidate),
    ]
}

fn cache() -> QueryCache<u8, u32> {
    QueryCache::new(Arc::new(NeverFetcher), CacheConfig::default())
}

proptest! {
    #[test]
    fn direct_writes_match_model(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let cache = cache();
        let mut model: HashMap<u8, u32> = HashMap::new();

        for op in ops {
            let before = cache.revision();
            let changed = match op {
                Op::Set(key, value) => {
                    cache.set_data(key, value);
                    model.insert(key, value);
                    true
                }
                Op::Increment(key) => {
                    let updated = cache.update_data(&key, |v| Some(v.wrapping_add(1)));
                    if let Some(v) = model.get_mut(&key) {
                        *v = v.wrapping_add(1);
                    }
                    prop_assert_eq!(updated, model.contains_key(&key));
                    updated
                }
                Op::Invalidate(key) => {
                    let invalidated = cache.invalidate(&key);
                    prop_assert_eq!(invalidated, cache.contains(&key));
                    invalidated
                }
            };
            let expected = if changed { before + 1 } else { before };
            prop_assert_eq!(cache.revision(), expected);
        }

        for (key, value) in &model {
            prop_assert_eq!(cache.data(key), Some(*value));
        }
    }

    #[test]
    fn batch_is_one_revision(values in proptest::collection::vec((0u8..8, any::<u32>()), 1..20)) {
        let cache = cache();
        let before = cache.revision();
        cache.batch(|batch| {
            for (key, value) in &values {
                batch.set_data(*key, *value);
            }
        });
        prop_assert_eq!(cache.revision(), before + 1);

        let mut last: HashMap<u8, u32> = HashMap::new();
        for (key, value) in values {
            last.insert(key, value);
        }
        for (key, value) in last {
            prop_assert_eq!(cache.data(&key), Some(value));
        }
    }
}
