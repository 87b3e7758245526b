// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use cachers::backends::{CacheBackend, MemoryBackend};
    use cachers::cache::{Cache, CacheBuilder};
    use cachers::serializers::SerializerKind;
    use cachers::ErrorKind;
    use config::Config;

    fn builder(backend: &MemoryBackend) -> CacheBuilder {
        Cache::builder()
            .config(Config::default())
            .with_backend(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn test_multi_get_length_matches_keys() {
        let backend = MemoryBackend::new();
        let cache = builder(&backend).build().unwrap();
        cache.set("k2", "v2", None).await.unwrap();

        let key_sets: [&[&str]; 4] = [&[], &["k1"], &["k1", "k2", "k1"], &["k2", "k3", "k4", "k5"]];
        for keys in key_sets {
            let values: Vec<Option<String>> = cache.multi_get(keys).await.unwrap();
            assert_eq!(values.len(), keys.len());
            for (key, value) in keys.iter().zip(&values) {
                assert_eq!(value.is_some(), *key == "k2");
            }
        }
    }

    #[tokio::test]
    async fn test_namespaces_share_a_backend_without_collisions() {
        let backend = MemoryBackend::new();
        let users = builder(&backend).namespace("users").build().unwrap();
        let orders = builder(&backend).namespace("orders").build().unwrap();

        users.set("1", "ada", None).await.unwrap();
        orders.set("1", "book", None).await.unwrap();

        let user: Option<String> = users.get("1").await.unwrap();
        let order: Option<String> = orders.get("1").await.unwrap();
        assert_eq!(user.as_deref(), Some("ada"));
        assert_eq!(order.as_deref(), Some("book"));

        users.clear(users.namespace()).await.unwrap();
        assert!(!users.exists("1").await.unwrap());
        assert!(orders.exists("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_json_serializer_stores_text() {
        let backend = MemoryBackend::new();
        let cache = builder(&backend)
            .serializer(SerializerKind::Json)
            .namespace("docs")
            .build()
            .unwrap();

        let mut doc = BTreeMap::new();
        doc.insert("name".to_string(), "cachers".to_string());
        cache.set("readme", &doc, None).await.unwrap();

        let stored = backend.get("docs:readme").await.unwrap().unwrap();
        assert_eq!(stored, br#"{"name":"cachers"}"#.to_vec());

        let loaded: Option<BTreeMap<String, String>> = cache.get("readme").await.unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let backend = MemoryBackend::new();
        let cache = builder(&backend).build().unwrap();

        let results =
            futures::future::join_all((0..50).map(|_| cache.increment("hits", 1))).await;
        assert!(results.iter().all(Result::is_ok));

        let total: Option<String> = cache.get("hits").await.unwrap();
        assert_eq!(total.as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn test_add_conflict_is_typed() {
        let backend = MemoryBackend::new();
        let cache = builder(&backend).build().unwrap();
        cache.set("lock", "owner-a", None).await.unwrap();

        match cache.add("lock", "owner-b", Some(30)).await {
            Err(err) => assert_eq!(err.kind(), ErrorKind::AlreadyExists),
            Ok(_) => panic!("add must not overwrite an existing key"),
        }
        let owner: Option<String> = cache.get("lock").await.unwrap();
        assert_eq!(owner.as_deref(), Some("owner-a"));
    }
}
