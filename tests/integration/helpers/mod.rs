// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use cachers::backends::BackendKind;
use cachers::cache::{Cache, CacheBuilder};
use config::Config;
use testcontainers::runners::AsyncRunner;

pub struct RedisNode {
    pub port: u16,
    _container: testcontainers::ContainerAsync<testcontainers::GenericImage>,
}

/// 启动 Redis 容器并等待其可以响应 PING
pub async fn start_redis() -> RedisNode {
    let container = testcontainers::GenericImage::new("redis", "7-alpine")
        .start()
        .await
        .expect("Failed to start Redis");
    let port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get Redis port");

    let client = redis::Client::open(format!("redis://127.0.0.1:{}", port))
        .expect("Invalid Redis URL");
    for _ in 0..50 {
        if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
            let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
            if pong.is_ok() {
                return RedisNode {
                    port,
                    _container: container,
                };
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Redis did not become ready on port {}", port);
}

/// 指向测试容器的缓存构建器
pub fn redis_cache(node: &RedisNode) -> CacheBuilder {
    Cache::builder()
        .config(Config::default())
        .backend(BackendKind::Redis)
        .endpoint("127.0.0.1")
        .port(node.port)
}
