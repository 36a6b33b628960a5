//! Avro field synthesis for engine-declared event types.
//!
//! [`synth::synthesize_field`] maps one property (name, declared type,
//! annotations) to one Avro record field. The rest of the crate is what it
//! needs around it: the schema model and its JSON text form, engine type
//! descriptors, the composite-type registry, and caller-side record
//! assembly from declaration documents.
pub mod annotation;
pub mod cli;
pub mod decl;
pub mod error;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod synth;
pub mod types;

pub use annotation::{find_override, Annotation};
pub use error::{ParseError, RenderError, SynthError};
pub use registry::{CompositeType, InMemoryRegistry, Representation, TypeHandle, TypeRegistry};
pub use schema::{find_union_record_schema_single, to_schema_string_safe, Field, Schema};
pub use settings::SchemaSettings;
pub use synth::{synthesize_field, FieldAssembler};
pub use types::{ClassRef, Primitive, TypeRef};
