use serde::{Deserialize, Serialize};

/// Metadata attached to a declared type, consulted per property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Literal Avro schema for the property `name`, bypassing type mapping.
    SchemaOverride { name: String, schema: String },
    /// Free-form description. Ignored by synthesis.
    Description { text: String },
}

/// Raw schema text of the first override targeting `property`.
pub fn find_override<'a>(annotations: &'a [Annotation], property: &str) -> Option<&'a str> {
    annotations.iter().find_map(|a| match a {
        Annotation::SchemaOverride { name, schema } if name == property => Some(schema.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_override_wins() {
        let annotations = vec![
            Annotation::Description { text: "orders".into() },
            Annotation::SchemaOverride { name: "other".into(), schema: "\"int\"".into() },
            Annotation::SchemaOverride { name: "id".into(), schema: "\"long\"".into() },
            Annotation::SchemaOverride { name: "id".into(), schema: "\"string\"".into() },
        ];
        assert_eq!(find_override(&annotations, "id"), Some("\"long\""));
        assert_eq!(find_override(&annotations, "missing"), None);
        assert_eq!(find_override(&[], "id"), None);
    }

    #[test]
    fn deserializes_tagged() {
        let a: Annotation =
            serde_json::from_str(r#"{"kind":"schema_override","name":"x","schema":"\"int\""}"#).unwrap();
        assert_eq!(a, Annotation::SchemaOverride { name: "x".into(), schema: "\"int\"".into() });
    }
}
