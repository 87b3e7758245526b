// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use cachers::cache::Cache;
use cachers::config::settings::{self, Settings};
use cachers::utils::telemetry;
use tracing::info;

/// 主函数
///
/// 加载配置并对配置的后端执行一轮读写
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting cachers...");

    // 2. Load configuration
    let config = settings::load_config()?;
    let settings = Settings::from_config(&config)?;
    settings::set_config(config);
    info!("Configuration loaded, backend: {}", settings.cache.backend);

    // 3. Build the cache
    let cache = Cache::from_config()?;

    // 4. Exercise a short round
    cache.set("greeting", "hello", Some(60)).await?;
    let greeting: Option<String> = cache.get("greeting").await?;
    info!("greeting = {:?}", greeting);

    let visits = cache.increment("visits", 1).await?;
    info!("visits = {}", visits);

    match cache.add("greeting", "again", None).await {
        Ok(_) => info!("greeting was missing and has been added"),
        Err(e) => info!("add rejected: {}", e),
    }

    // 5. Clean up only the demo keys unless the cache owns a namespace
    match cache.namespace().map(str::to_string) {
        Some(namespace) => {
            cache.clear(Some(&namespace)).await?;
        }
        None => {
            cache.delete("greeting").await?;
            cache.delete("visits").await?;
        }
    }
    cache.close().await?;
    info!("Done");
    Ok(())
}
