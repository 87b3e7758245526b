// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cachers::{CacheError, ErrorKind};

    #[test]
    fn test_messages_name_the_key() {
        let err = CacheError::AlreadyExists {
            key: "ns:k".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(err.to_string().contains("ns:k"));

        let err = CacheError::NotANumber {
            key: "counter".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NotANumber);
        assert!(err.to_string().contains("counter"));
    }

    #[test]
    fn test_timeout_reports_operation() {
        let err = CacheError::Timeout {
            operation: "multi_set",
            after: Duration::from_millis(250),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.to_string(), "Operation multi_set timed out after 250ms");
    }

    #[test]
    fn test_backend_errors_share_a_kind() {
        let redis_err = redis::RedisError::from(std::io::Error::other("connection reset"));
        assert_eq!(CacheError::from(redis_err).kind(), ErrorKind::BackendProtocol);
        assert_eq!(
            CacheError::Backend("unknown command".to_string()).kind(),
            ErrorKind::BackendProtocol
        );
    }
}
