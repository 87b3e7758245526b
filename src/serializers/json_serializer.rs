// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::errors::CacheResult;

/// JSON 序列化器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub const ENCODING: Option<&'static str> = Some("utf-8");

    pub fn dumps<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    pub fn loads<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_produces_text() {
        let stored = JsonSerializer.dumps(&json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(stored).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_integers_are_stored_as_plain_numbers() {
        let stored = JsonSerializer.dumps(&5).unwrap();
        assert_eq!(stored, b"5");
        let loaded: i64 = JsonSerializer.loads(b"8").unwrap();
        assert_eq!(loaded, 8);
    }

    #[test]
    fn test_sequences_round_trip() {
        let value = json!([1, "two", 3.5, false]);
        let stored = JsonSerializer.dumps(&value).unwrap();
        let loaded: Value = JsonSerializer.loads(&stored).unwrap();
        assert_eq!(loaded, value);
    }
}
