// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cachers::backends::{CacheBackend, RawReply, RedisBackend, RedisConfig};
    use cachers::serializers::SerializerKind;
    use cachers::ErrorKind;

    use crate::integration::helpers::{redis_cache, start_redis};

    fn ttl_of(reply: RawReply) -> i64 {
        match reply {
            RawReply::Int(seconds) => seconds,
            other => panic!("unexpected TTL reply: {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_redis_operation_contract() {
        let node = start_redis().await;
        let cache = redis_cache(&node).namespace("contract").build().unwrap();

        let missing: Option<String> = cache.get("missing").await.unwrap();
        assert!(missing.is_none());

        assert!(cache.set("k", "v", None).await.unwrap());
        let value: Option<String> = cache.get("k").await.unwrap();
        assert_eq!(value.as_deref(), Some("v"));
        assert!(cache.exists("k").await.unwrap());

        assert!(cache.add("fresh", "first", None).await.unwrap());
        let err = cache.add("fresh", "second", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        let kept: Option<String> = cache.get("fresh").await.unwrap();
        assert_eq!(kept.as_deref(), Some("first"));

        assert_eq!(cache.delete("k").await.unwrap(), 1);
        assert_eq!(cache.delete("k").await.unwrap(), 0);
        cache.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_increment_translates_non_numeric_values() {
        let node = start_redis().await;
        let cache = redis_cache(&node).build().unwrap();

        assert_eq!(cache.increment("counter", 3).await.unwrap(), 3);
        assert_eq!(cache.increment("counter", -5).await.unwrap(), -2);

        cache.set("text", "not_a_number", None).await.unwrap();
        let err = cache.increment("text", 3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotANumber);
        let value: Option<String> = cache.get("text").await.unwrap();
        assert_eq!(value.as_deref(), Some("not_a_number"));

        cache.set("max", &i64::MAX.to_string(), None).await.unwrap();
        let err = cache.increment("max", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendProtocol);
        cache.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_expire_and_persist() {
        let node = start_redis().await;
        let cache = redis_cache(&node).build().unwrap();

        cache.set("k", "v", Some(5)).await.unwrap();
        assert!(ttl_of(cache.raw("TTL", &["k"]).await.unwrap()) > 0);

        assert!(cache.expire("k", 0).await.unwrap());
        assert_eq!(ttl_of(cache.raw("TTL", &["k"]).await.unwrap()), -1);
        assert!(!cache.expire("missing", 10).await.unwrap());

        let err = cache.expire("k", u64::MAX).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendProtocol);
        assert!(cache.exists("k").await.unwrap());

        cache.set("zero", "v", Some(0)).await.unwrap();
        assert_eq!(ttl_of(cache.raw("TTL", &["zero"]).await.unwrap()), -1);
        cache.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_multi_set_with_ttl() {
        let node = start_redis().await;
        let cache = redis_cache(&node)
            .serializer(SerializerKind::Json)
            .build()
            .unwrap();

        cache
            .multi_set(&[("k1", vec![1, 2]), ("k2", vec![3])], Some(10))
            .await
            .unwrap();
        let values: Vec<Option<Vec<i32>>> = cache.multi_get(&["k1", "k2", "k3"]).await.unwrap();
        assert_eq!(values, vec![Some(vec![1, 2]), Some(vec![3]), None]);

        for key in ["k1", "k2"] {
            let ttl = ttl_of(cache.raw("TTL", &[key]).await.unwrap());
            assert!(ttl > 0 && ttl <= 10, "{} has ttl {}", key, ttl);
        }
        cache.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_clear_namespace_leaves_other_keys() {
        let node = start_redis().await;
        let cache = redis_cache(&node).build().unwrap();
        for key in ["ns:a", "ns:b", "other:c"] {
            cache.set(key, "v", None).await.unwrap();
        }

        let bulk = redis_cache(&node).namespace("bulk").build().unwrap();
        let pairs: Vec<(String, String)> = (0..1200)
            .map(|i| (format!("item{}", i), i.to_string()))
            .collect();
        bulk.multi_set(&pairs, None).await.unwrap();

        assert!(cache.clear(Some("ns")).await.unwrap());
        assert!(cache.clear(Some("bulk")).await.unwrap());
        assert!(cache.clear(Some("empty")).await.unwrap());

        let values: Vec<Option<String>> =
            cache.multi_get(&["ns:a", "ns:b", "other:c"]).await.unwrap();
        assert_eq!(values, vec![None, None, Some("v".to_string())]);
        assert_eq!(cache.raw::<&str>("DBSIZE", &[]).await.unwrap(), RawReply::Int(1));

        cache.clear(None).await.unwrap();
        assert_eq!(cache.raw::<&str>("DBSIZE", &[]).await.unwrap(), RawReply::Int(0));
        cache.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_identical_parameters_share_one_pool() {
        let node = start_redis().await;
        let config = RedisConfig {
            port: node.port,
            ..RedisConfig::default()
        };

        let first = RedisBackend::new(config.clone(), Some("utf-8"));
        let second = RedisBackend::new(config.clone(), Some("utf-8"));
        let other_db = RedisBackend::new(
            RedisConfig {
                db: 1,
                ..config.clone()
            },
            Some("utf-8"),
        );

        let (a, b) = tokio::join!(first.pool(), second.pool());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));

        let c = other_db.pool().await.unwrap();
        assert!(!Arc::ptr_eq(&a, &c));

        let registered = RedisBackend::registry().get(first.identity()).unwrap();
        assert!(Arc::ptr_eq(&a, &registered));

        first.close().await.unwrap();
        assert!(RedisBackend::registry().get(second.identity()).is_none());
        assert!(second.set("after-close", b"v".to_vec(), None).await.unwrap());
        other_db.close().await.unwrap();
        second.close().await.unwrap();
    }
}
