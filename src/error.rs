//! Error types for schema synthesis, raw schema parsing and rendering.
use thiserror::Error;

pub type Result<T, E = SynthError> = std::result::Result<T, E>;

/// Failures raised while synthesizing a field or assembling a record.
///
/// None of these are transient: they describe a declaration the engine
/// cannot express in Avro.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("invalid property name as Avro does not allow dot '.' in field names (property '{property}')")]
    InvalidPropertyName { property: String },

    #[error("failed to parse Avro schema for property '{property}': {source}")]
    SchemaParse {
        property: String,
        #[source]
        source: ParseError,
    },

    #[error("property '{property}' type '{ty}' does not have a mapping to an Avro type (consider using a schema-override annotation)")]
    UnmappableType { property: String, ty: String },

    #[error("property type cannot be an event type with an underlying of type '{underlying}'")]
    NotAnEventType { underlying: String },

    #[error("duplicate field '{field}' in record '{record}'")]
    DuplicateField { record: String, field: String },

    #[error("type '{0}' is already declared")]
    DuplicateType(String),
}

/// Raw schema text that is not a valid Avro schema.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("'{0}' is not a valid Avro name")]
    InvalidName(String),

    #[error("{kind} schema is missing the '{attr}' attribute")]
    MissingAttribute { kind: &'static str, attr: &'static str },

    #[error("attribute '{attr}' has an unexpected value: {found}")]
    UnexpectedValue { attr: &'static str, found: String },

    #[error("unions may not immediately contain other unions")]
    NestedUnion,

    #[error("duplicate in union: {0}")]
    DuplicateUnionMember(String),

    #[error("can't redefine: {0}")]
    Redefinition(String),

    #[error("duplicate field '{0}'")]
    DuplicateField(String),

    #[error("duplicate enum symbol '{0}'")]
    DuplicateSymbol(String),
}

/// A schema value that cannot be written out as Avro JSON.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("'{0}' is not a valid Avro name")]
    InvalidName(String),

    #[error("nested union: {0}")]
    NestedUnion(String),

    #[error("empty name reference")]
    EmptyReference,
}

impl RenderError {
    /// Short name of the failure, used by diagnostic placeholders.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::InvalidName(_) => "InvalidName",
            RenderError::NestedUnion(_) => "NestedUnion",
            RenderError::EmptyReference => "EmptyReference",
        }
    }
}

/// A declaration document that does not deserialize.
#[derive(Debug, Error)]
#[error("at JSON path {path}: {source}")]
pub struct DeclarationError {
    pub path: String,
    #[source]
    pub source: serde_json::Error,
}
