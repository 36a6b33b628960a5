//! Declaration documents and record assembly.
//!
//! This is the caller side of synthesis: it turns a list of declared types
//! into record schemas, one property at a time, and registers each record
//! so later declarations can reference it by name.
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::annotation::Annotation;
use crate::error::{DeclarationError, Result, SynthError};
use crate::registry::{CompositeType, InMemoryRegistry, TypeHandle, TypeRegistry};
use crate::schema::{RecordSchema, Schema};
use crate::settings::SchemaSettings;
use crate::synth::{synthesize_field, FieldAssembler};
use crate::types::{ClassRef, Primitive, TypeRef, ARRAY_MARKER};

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declarations {
    #[serde(default)]
    pub namespace: Option<String>,
    /// Overrides the caller's settings for this document.
    #[serde(default)]
    pub settings: Option<SchemaSettings>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub doc: Option<String>,
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeSpec>,
}

/// A property type as written in a document: a type string or a nested
/// map of properties.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Name(String),
    Nested(IndexMap<String, Option<TypeSpec>>),
}

impl Declarations {
    /// Deserializes a JSON document; errors carry the JSON path.
    pub fn from_json(src: &str) -> std::result::Result<Self, DeclarationError> {
        from_str_with_path(src)
    }
}

fn from_str_with_path<T: DeserializeOwned>(src: &str) -> std::result::Result<T, DeclarationError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| DeclarationError {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

impl TypeSpec {
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            TypeSpec::Name(name) => parse_type_name(name),
            TypeSpec::Nested(props) => TypeRef::Nested(
                props
                    .iter()
                    .map(|(k, v)| (k.clone(), type_ref_of(v.as_ref())))
                    .collect(),
            ),
        }
    }
}

fn type_ref_of(spec: Option<&TypeSpec>) -> TypeRef {
    spec.map(TypeSpec::to_type_ref).unwrap_or(TypeRef::None)
}

/// Reads a type string.
///
/// Class names map to [`TypeRef::Class`]; anything unrecognized is taken
/// as the name of a composite type, array marker included.
pub fn parse_type_name(name: &str) -> TypeRef {
    let name = name.trim();
    if name == "null" {
        return TypeRef::None;
    }
    match parse_class(name) {
        Some(class) => TypeRef::Class(class),
        None => TypeRef::Named(name.to_string()),
    }
}

fn parse_class(name: &str) -> Option<ClassRef> {
    if let Some(component) = name.strip_suffix(ARRAY_MARKER) {
        return parse_class(component).map(ClassRef::array_of);
    }
    let class = match name {
        "boolean" => ClassRef::Primitive(Primitive::Boolean),
        "byte" => ClassRef::Primitive(Primitive::Byte),
        "short" => ClassRef::Primitive(Primitive::Short),
        "char" => ClassRef::Primitive(Primitive::Char),
        "int" => ClassRef::Primitive(Primitive::Int),
        "long" => ClassRef::Primitive(Primitive::Long),
        "float" => ClassRef::Primitive(Primitive::Float),
        "double" => ClassRef::Primitive(Primitive::Double),
        "Boolean" => ClassRef::Boxed(Primitive::Boolean),
        "Byte" => ClassRef::Boxed(Primitive::Byte),
        "Short" => ClassRef::Boxed(Primitive::Short),
        "Character" => ClassRef::Boxed(Primitive::Char),
        "Integer" => ClassRef::Boxed(Primitive::Int),
        "Long" => ClassRef::Boxed(Primitive::Long),
        "Float" => ClassRef::Boxed(Primitive::Float),
        "Double" => ClassRef::Boxed(Primitive::Double),
        "String" => ClassRef::String,
        "CharSequence" => ClassRef::CharSequence,
        "Map" | "HashMap" | "LinkedHashMap" | "TreeMap" => ClassRef::Map(name.to_string()),
        qualified if qualified.contains('.') => ClassRef::Other(qualified.to_string()),
        _ => return None,
    };
    Some(class)
}

// ————————————————————————————————————————————————————————————————————————————
// RECORD ASSEMBLY
// ————————————————————————————————————————————————————————————————————————————

/// Builds one record schema field by field.
#[derive(Debug)]
pub struct RecordAssembler {
    name: String,
    namespace: Option<String>,
    doc: Option<String>,
    fields: FieldAssembler,
}

impl RecordAssembler {
    pub fn new(name: impl Into<String>) -> Self {
        RecordAssembler { name: name.into(), namespace: None, doc: None, fields: FieldAssembler::new() }
    }

    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn add(
        &mut self,
        property: &str,
        ty: &TypeRef,
        annotations: &[Annotation],
        settings: SchemaSettings,
        registry: &dyn TypeRegistry,
    ) -> Result<&mut Self> {
        if self.fields.contains(property) {
            return Err(SynthError::DuplicateField {
                record: self.name.clone(),
                field: property.to_string(),
            });
        }
        synthesize_field(&mut self.fields, property, ty, annotations, settings, registry)?;
        Ok(self)
    }

    pub fn finish(self) -> Schema {
        Schema::Record(RecordSchema {
            namespace: self.namespace,
            doc: self.doc,
            ..RecordSchema::new(self.name, self.fields.into_fields())
        })
    }
}

/// Assembles `decl` and registers it as a schema-bearing type.
pub fn declare_type(
    decl: &TypeDecl,
    namespace: Option<&str>,
    settings: SchemaSettings,
    registry: &mut InMemoryRegistry,
) -> Result<TypeHandle> {
    let mut record = RecordAssembler::new(decl.name.clone())
        .namespace(namespace.map(str::to_string))
        .doc(decl.doc.clone());
    for prop in &decl.properties {
        let ty = type_ref_of(prop.ty.as_ref());
        record.add(&prop.name, &ty, &decl.annotations, settings, registry)?;
    }
    let schema = record.finish();
    debug!(record = %decl.name, fields = decl.properties.len(), "declared avro type");
    registry.register(CompositeType::avro(decl.name.clone(), schema))
}

/// Declares every type of `doc` in order. The document's own settings,
/// when present, replace `settings`.
pub fn declare_all(
    doc: &Declarations,
    settings: SchemaSettings,
    registry: &mut InMemoryRegistry,
) -> Result<Vec<TypeHandle>> {
    let settings = doc.settings.unwrap_or(settings);
    doc.types
        .iter()
        .map(|decl| declare_type(decl, doc.namespace.as_deref(), settings, registry))
        .collect()
}
