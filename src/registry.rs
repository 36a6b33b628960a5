//! Composite-type registry consumed by the synthesizer.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Result, SynthError};
use crate::schema::Schema;

/// How a composite type stores its events.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    /// Avro record events; owns its synthesized schema.
    Avro(Schema),
    Map,
    ObjectArray,
    /// Plain object events of the named class.
    Bean(String),
}

/// Class name of the underlying value, as reported in errors.
impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Avro(_) => f.write_str("org.apache.avro.generic.GenericData$Record"),
            Representation::Map => f.write_str("java.util.Map"),
            Representation::ObjectArray => f.write_str("[Ljava.lang.Object;"),
            Representation::Bean(class) => f.write_str(class),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeType {
    pub name: String,
    pub representation: Representation,
}

pub type TypeHandle = Arc<CompositeType>;

impl CompositeType {
    pub fn new(name: impl Into<String>, representation: Representation) -> Self {
        CompositeType { name: name.into(), representation }
    }

    pub fn avro(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, Representation::Avro(schema))
    }

    pub fn is_schema_bearing(&self) -> bool {
        matches!(self.representation, Representation::Avro(_))
    }

    /// The synthesized schema, for schema-bearing types only.
    pub fn schema(&self) -> Option<&Schema> {
        match &self.representation {
            Representation::Avro(schema) => Some(schema),
            _ => None,
        }
    }
}

/// Lookup of previously declared composite types.
///
/// Lookups must be stable for a fixed registry state and safe to run from
/// several threads at once.
pub trait TypeRegistry: Send + Sync {
    fn resolve(&self, name: &str) -> Option<TypeHandle>;
}

/// Registry backed by an insertion-ordered map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRegistry {
    types: IndexMap<String, TypeHandle>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ty: CompositeType) -> Result<TypeHandle> {
        if self.types.contains_key(&ty.name) {
            return Err(SynthError::DuplicateType(ty.name));
        }
        let handle = Arc::new(ty);
        self.types.insert(handle.name.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeHandle> {
        self.types.values()
    }
}

impl TypeRegistry for InMemoryRegistry {
    fn resolve(&self, name: &str) -> Option<TypeHandle> {
        self.types.get(name).cloned()
    }
}
