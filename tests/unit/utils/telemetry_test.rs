// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use cachers::utils::telemetry;

    #[test]
    fn test_telemetry_initialization_is_idempotent() {
        telemetry::init_telemetry();
        telemetry::init_telemetry();
        telemetry::init_json_telemetry();

        tracing::debug!(key = "ns:k", ttl = 10, "Cache set finished");
        tracing::warn!("Flushing every key of the memory backend");
    }
}
