//! Field synthesis: one property descriptor in, one Avro field out.
//!
//! Dispatch, first match wins:
//! 1. property names may not contain `.`
//! 2. a matching schema-override annotation is parsed and used verbatim
//! 3. no type gives a `null` field
//! 4. composite types, by name or by handle, embed their registered schema
//! 5. classes go through the req/opt tables in [`policy`]
//! 6. anything else has no mapping
pub mod policy;

use tracing::trace;

use crate::annotation::{find_override, Annotation};
use crate::error::{Result, SynthError};
use crate::registry::{CompositeType, TypeRegistry};
use crate::schema::{parse_schema, to_schema_string_safe, Field, Schema};
use crate::settings::SchemaSettings;
use crate::types::{strip_array_marker, ClassRef, Primitive, TypeRef};
use policy::{req_opt, ArrayKind, FieldShape, ScalarKind};

/// Separator for nested property paths; not allowed in Avro field names.
pub const PROPERTY_SEPARATOR: char = '.';

/// Ordered fields of the record under construction.
///
/// Owned by the caller for one record; synthesis only appends.
#[derive(Debug, Default, Clone)]
pub struct FieldAssembler {
    fields: Vec<Field>,
}

impl FieldAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}

/// Synthesizes the field for one property and appends it to `collector`.
///
/// On error nothing is appended.
pub fn synthesize_field(
    collector: &mut FieldAssembler,
    name: &str,
    ty: &TypeRef,
    annotations: &[Annotation],
    settings: SchemaSettings,
    registry: &dyn TypeRegistry,
) -> Result<()> {
    let field = synthesize(name, ty, annotations, settings, registry)?;
    trace!(property = name, schema = %to_schema_string_safe(&field.schema), "assembled field");
    collector.push(field);
    Ok(())
}

/// Same as [`synthesize_field`] but hands the field back instead of appending it.
pub fn synthesize(
    name: &str,
    ty: &TypeRef,
    annotations: &[Annotation],
    settings: SchemaSettings,
    registry: &dyn TypeRegistry,
) -> Result<Field> {
    if name.contains(PROPERTY_SEPARATOR) {
        return Err(SynthError::InvalidPropertyName { property: name.to_string() });
    }

    if let Some(text) = find_override(annotations, name) {
        let schema = parse_schema(text).map_err(|source| SynthError::SchemaParse {
            property: name.to_string(),
            source,
        })?;
        return Ok(Field::new(name, schema));
    }

    let shape = match ty {
        TypeRef::None => FieldShape::required(Schema::null()),
        TypeRef::Named(type_name) => {
            let (bare, is_array) = strip_array_marker(type_name);
            let schema = registry
                .resolve(bare)
                .and_then(|t| t.schema().cloned())
                .ok_or_else(|| unmappable(name, type_name))?;
            FieldShape::required(if is_array { Schema::array(schema) } else { schema })
        }
        TypeRef::Composite(handle) => FieldShape::required(composite_schema(handle)?),
        TypeRef::CompositeArray(handles) => {
            let first = handles.first().ok_or_else(|| unmappable(name, ty))?;
            FieldShape::required(Schema::array(composite_schema(first)?))
        }
        TypeRef::Class(class) => class_shape(name, class, settings)?,
        TypeRef::Nested(_) => return Err(unmappable(name, ty)),
    };
    Ok(shape.into_field(name))
}

fn composite_schema(ty: &CompositeType) -> Result<Schema> {
    ty.schema().cloned().ok_or_else(|| SynthError::NotAnEventType {
        underlying: ty.representation.to_string(),
    })
}

fn class_shape(name: &str, class: &ClassRef, settings: SchemaSettings) -> Result<FieldShape> {
    let nullable = class.is_nullable();
    let prefer_non_null = settings.prefer_non_null;
    let form = req_opt(prefer_non_null, nullable);

    let shape = match class.boxed() {
        ClassRef::Boxed(p) => match ScalarKind::of(p) {
            Some(kind) => kind.shape(form),
            None => return Err(unmappable(name, class)),
        },
        text if text.is_string_like() => ScalarKind::string(settings.native_string).shape(form),
        ClassRef::Array(component) if *component == ClassRef::Primitive(Primitive::Byte) => {
            ScalarKind::Bytes.shape(form)
        }
        ClassRef::Array(component) => array_shape(name, class, &component, settings)?,
        ClassRef::Map(_) => FieldShape::outer(Schema::map(Schema::string_repr(settings.native_string)), prefer_non_null),
        _ => return Err(unmappable(name, class)),
    };
    Ok(shape)
}

fn array_shape(name: &str, class: &ClassRef, component: &ClassRef, settings: SchemaSettings) -> Result<FieldShape> {
    let nullable_elements = component.is_nullable();
    match component.boxed() {
        ClassRef::Boxed(p) => ArrayKind::of(p)
            .map(|kind| kind.shape(nullable_elements, settings.prefer_non_null))
            .ok_or_else(|| unmappable(name, class)),
        text if text.is_string_like() => Ok(FieldShape::outer(
            Schema::array(Schema::string_repr(settings.native_string)),
            settings.prefer_non_null,
        )),
        _ => Err(unmappable(name, class)),
    }
}

fn unmappable(property: &str, ty: impl ToString) -> SynthError {
    SynthError::UnmappableType { property: property.to_string(), ty: ty.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{InMemoryRegistry, Representation};
    use crate::schema::{RecordSchema, PROP_JAVA_STRING_KEY};
    use serde_json::{json, Value};

    const NON_NULL: SchemaSettings = SchemaSettings::new(true, false);
    const NULLABLE: SchemaSettings = SchemaSettings::new(false, false);

    fn field(ty: impl Into<TypeRef>, settings: SchemaSettings) -> Field {
        synthesize("f", &ty.into(), &[], settings, &InMemoryRegistry::new()).unwrap()
    }

    fn class(c: ClassRef) -> TypeRef {
        TypeRef::Class(c)
    }

    #[test]
    fn boxed_vs_primitive() {
        let boxed = field(ClassRef::Boxed(Primitive::Double), NULLABLE);
        assert_eq!(boxed.schema, Schema::nullable(Schema::double()));
        assert_eq!(boxed.default, Some(Value::Null));

        let int = field(ClassRef::Primitive(Primitive::Int), NULLABLE);
        assert_eq!(int.schema, Schema::int());
        assert_eq!(int.default, None);

        let byte = field(ClassRef::Boxed(Primitive::Byte), NON_NULL);
        assert_eq!(byte.schema, Schema::int());
    }

    #[test]
    fn strings_and_bytes() {
        let native = field(ClassRef::String, SchemaSettings::new(false, true));
        assert_eq!(native.schema, Schema::nullable(Schema::native_string()));
        assert_eq!(native.default, None);

        let plain = field(ClassRef::CharSequence, NULLABLE);
        assert_eq!(plain.schema, Schema::nullable(Schema::string()));
        assert_eq!(plain.default, Some(Value::Null));

        let bytes = field(ClassRef::array_of(ClassRef::Primitive(Primitive::Byte)), NON_NULL);
        assert_eq!(bytes.schema, Schema::bytes());
        let bytes = field(ClassRef::array_of(ClassRef::Primitive(Primitive::Byte)), NULLABLE);
        assert_eq!(bytes.schema, Schema::nullable(Schema::bytes()));
        assert_eq!(bytes.default, None);
    }

    #[test]
    fn boxed_byte_array_is_int_array() {
        let f = field(ClassRef::array_of(ClassRef::Boxed(Primitive::Byte)), NON_NULL);
        assert_eq!(f.schema, Schema::array(Schema::nullable(Schema::int())));
    }

    #[test]
    fn maps_hold_strings() {
        let f = field(ClassRef::Map("Map".into()), SchemaSettings::new(true, true));
        assert_eq!(f.schema, Schema::map(Schema::native_string()));
        let f = field(ClassRef::Map("Map".into()), NULLABLE);
        assert_eq!(f.schema, Schema::nullable(Schema::map(Schema::string())));
    }

    #[test]
    fn null_type() {
        assert_eq!(field(TypeRef::None, NULLABLE).schema, Schema::null());
    }

    #[test]
    fn unsupported_classes() {
        let reg = InMemoryRegistry::new();
        for c in [
            ClassRef::Primitive(Primitive::Short),
            ClassRef::Boxed(Primitive::Char),
            ClassRef::Other("java.math.BigInteger".into()),
            ClassRef::array_of(ClassRef::Primitive(Primitive::Short)),
            ClassRef::array_of(ClassRef::array_of(ClassRef::Primitive(Primitive::Int))),
            ClassRef::array_of(ClassRef::Other("Object".into())),
        ] {
            let shown = c.to_string();
            let err = synthesize("p", &class(c), &[], NULLABLE, &reg).unwrap_err();
            match err {
                SynthError::UnmappableType { property, ty } => {
                    assert_eq!(property, "p");
                    assert_eq!(ty, shown);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn override_beats_dispatch_and_has_no_default() {
        let annotations = [Annotation::SchemaOverride {
            name: "f".into(),
            schema: r#"{"type":"long","logicalType":"timestamp-millis"}"#.into(),
        }];
        let f = synthesize("f", &class(ClassRef::Other("Instant".into())), &annotations, NULLABLE, &InMemoryRegistry::new())
            .unwrap();
        assert_eq!(f.schema.prop("logicalType"), Some(&json!("timestamp-millis")));
        assert_eq!(f.default, None);
    }

    #[test]
    fn failed_synthesis_leaves_collector_untouched() {
        let reg = InMemoryRegistry::new();
        let mut collector = FieldAssembler::new();
        synthesize_field(&mut collector, "ok", &class(ClassRef::String), &[], NON_NULL, &reg).unwrap();

        let bad_override = [Annotation::SchemaOverride { name: "x".into(), schema: "{".into() }];
        let err = synthesize_field(&mut collector, "x", &TypeRef::None, &bad_override, NON_NULL, &reg).unwrap_err();
        assert!(matches!(err, SynthError::SchemaParse { ref property, .. } if property == "x"));

        let err = synthesize_field(&mut collector, "a.b", &TypeRef::None, &[], NON_NULL, &reg).unwrap_err();
        assert!(matches!(err, SynthError::InvalidPropertyName { .. }));

        assert_eq!(collector.len(), 1);
        assert!(collector.contains("ok"));
    }

    #[test]
    fn composites_by_name_and_handle() {
        let inner = Schema::Record(RecordSchema::new("Inner", vec![Field::new("v", Schema::int())]));
        let mut reg = InMemoryRegistry::new();
        let avro = reg.register(CompositeType::avro("Inner", inner.clone())).unwrap();
        let map = reg.register(CompositeType::new("Plain", Representation::Map)).unwrap();

        let by_name = synthesize("f", &TypeRef::Named("Inner[]".into()), &[], NULLABLE, &reg).unwrap();
        assert_eq!(by_name.schema, Schema::array(inner.clone()));
        assert_eq!(by_name.default, None);

        let by_handle = synthesize("f", &TypeRef::Composite(avro.clone()), &[], NULLABLE, &reg).unwrap();
        assert_eq!(by_handle.schema, inner);

        let err = synthesize("f", &TypeRef::Named("Plain".into()), &[], NULLABLE, &reg).unwrap_err();
        assert!(matches!(err, SynthError::UnmappableType { ty, .. } if ty == "Plain"));

        let err = synthesize("f", &TypeRef::CompositeArray(vec![map]), &[], NULLABLE, &reg).unwrap_err();
        assert!(matches!(err, SynthError::NotAnEventType { underlying } if underlying == "java.util.Map"));

        let err = synthesize("f", &TypeRef::CompositeArray(Vec::new()), &[], NULLABLE, &reg).unwrap_err();
        assert!(matches!(err, SynthError::UnmappableType { .. }));
    }

    #[test]
    fn native_string_marker_is_the_only_difference() {
        let arr = ClassRef::array_of(ClassRef::String);
        let plain = field(arr.clone(), NON_NULL);
        let native = field(arr, SchemaSettings::new(true, true));
        let Schema::Array { items, .. } = &native.schema else { panic!("expected array") };
        assert!(items.prop(PROP_JAVA_STRING_KEY).is_some());
        assert_eq!(plain.schema, Schema::array(Schema::string()));
    }
}
