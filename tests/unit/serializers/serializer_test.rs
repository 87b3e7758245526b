// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use cachers::serializers::{Serializer, SerializerKind};
    use cachers::ErrorKind;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Circle { radius: f64 },
        Square(u32),
        Empty,
    }

    #[test]
    fn test_pickle_keeps_non_json_shapes() {
        let serializer = Serializer::from(SerializerKind::Pickle);

        let mut grid: HashMap<(i32, i32), Shape> = HashMap::new();
        grid.insert((0, 0), Shape::Circle { radius: 1.5 });
        grid.insert((1, -1), Shape::Square(3));
        grid.insert((2, 2), Shape::Empty);

        let stored = serializer.dumps(&grid).unwrap();
        let loaded: Option<HashMap<(i32, i32), Shape>> = serializer.loads(Some(stored)).unwrap();
        assert_eq!(loaded, Some(grid));
    }

    #[test]
    fn test_json_rejects_non_string_map_keys() {
        let serializer = Serializer::from(SerializerKind::Json);
        let mut grid: HashMap<(i32, i32), u8> = HashMap::new();
        grid.insert((0, 0), 1);

        let err = serializer.dumps(&grid).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_json_produces_text() {
        let serializer = Serializer::from(SerializerKind::Json);
        let mut doc = BTreeMap::new();
        doc.insert("a", vec![1, 2]);
        doc.insert("b", vec![]);

        let stored = serializer.dumps(&doc).unwrap();
        assert_eq!(String::from_utf8(stored).unwrap(), r#"{"a":[1,2],"b":[]}"#);
    }

    #[test]
    fn test_default_only_accepts_text() {
        let serializer = Serializer::default();
        assert_eq!(serializer.dumps("plain").unwrap(), b"plain".to_vec());
        assert_eq!(
            serializer.dumps(&String::from("owned")).unwrap(),
            b"owned".to_vec()
        );

        for err in [
            serializer.dumps(&1.5).unwrap_err(),
            serializer.dumps(&true).unwrap_err(),
            serializer.dumps(&Shape::Square(1)).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        }
    }

    #[test]
    fn test_decoding_with_wrong_variant_fails() {
        let stored = Serializer::from(SerializerKind::Pickle)
            .dumps(&Shape::Square(9))
            .unwrap();
        let err = Serializer::from(SerializerKind::Json)
            .loads::<Shape>(Some(stored))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
