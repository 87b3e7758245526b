// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置加载测试
///
/// 覆盖默认配置文件、环境变量覆盖以及进程级配置快照
#[cfg(test)]
mod tests {
    use cachers::backends::BackendKind;
    use cachers::cache::Cache;
    use cachers::config::settings::{self, Settings};
    use config::Config;

    #[test]
    fn test_config_loading_from_default_toml() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.cache.backend, BackendKind::Memory);
        assert_eq!(settings.cache.timeout, Some(5.0));
        assert_eq!(settings.cache.plugins, vec!["hit_miss_ratio", "timing"]);
    }

    #[test]
    fn test_environment_overrides_files() {
        std::env::set_var("CACHERS__CACHE__POOL_MAX_SIZE", "3");
        let loaded = settings::load_config();
        std::env::remove_var("CACHERS__CACHE__POOL_MAX_SIZE");

        let settings = Settings::from_config(&loaded.unwrap()).unwrap();
        assert_eq!(settings.cache.pool_max_size, Some(3));
    }

    #[test]
    fn test_cache_from_process_config() {
        let config = Config::builder()
            .set_override("cache.namespace", "global")
            .unwrap()
            .set_override("cache.ttl", 60)
            .unwrap()
            .build()
            .unwrap();
        settings::set_config(config);
        let cache = Cache::from_config();
        settings::reset_config();

        let cache = cache.unwrap();
        assert_eq!(cache.backend_kind(), BackendKind::Memory);
        assert_eq!(cache.namespace(), Some("global"));
        assert_eq!(cache.default_ttl(), Some(60));
    }
}
