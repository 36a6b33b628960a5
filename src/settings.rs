use serde::{Deserialize, Serialize};

/// Controls nullability and string representation of synthesized fields.
///
/// Built explicitly by the caller for every synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Emit required fields even for nullable classes.
    pub prefer_non_null: bool,
    /// Tag string schemas with the native-string marker.
    pub native_string: bool,
}

impl SchemaSettings {
    pub const fn new(prefer_non_null: bool, native_string: bool) -> Self {
        SchemaSettings { prefer_non_null, native_string }
    }
}
