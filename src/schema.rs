// Avro schema model. Built by the synthesizer and the override parser,
// written out by `render`. Values are never mutated once handed out.
pub mod parse;
pub mod render;

use indexmap::IndexMap;
use serde_json::Value;

pub use parse::parse_schema;
pub use render::{to_schema_string_safe, to_json};

/// Property key marking a string that should surface as a native string
/// on the consuming side.
pub const PROP_JAVA_STRING_KEY: &str = "avro.java.string";
/// Value paired with [`PROP_JAVA_STRING_KEY`].
pub const PROP_JAVA_STRING_VALUE: &str = "String";

pub type Props = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Null,
        PrimitiveKind::Boolean,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Bytes,
        PrimitiveKind::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Null => "null",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::String => "string",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Discriminant of a [`Schema`], mirroring Avro's `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Primitive(PrimitiveKind),
    Array,
    Map,
    Union,
    Record,
    Enum,
    Fixed,
    Ref,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive { kind: PrimitiveKind, props: Props },
    Array { items: Box<Schema>, props: Props },
    Map { values: Box<Schema>, props: Props },
    Union(Vec<Schema>),
    Record(RecordSchema),
    Enum(EnumSchema),
    Fixed(FixedSchema),
    /// Reference to a named type, by full name. Only left in place where
    /// the definition is still open (a recursive type naming itself).
    Ref(String),
}

/// `record` or `error`; both are written out the same way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub is_error: bool,
    pub fields: Vec<Field>,
    pub props: Props,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub symbols: Vec<String>,
    pub default: Option<String>,
    pub props: Props,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedSchema {
    pub name: String,
    pub namespace: Option<String>,
    pub doc: Option<String>,
    pub aliases: Vec<String>,
    pub size: u64,
    pub props: Props,
}

/// Sort order of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOrder {
    Ascending,
    Descending,
    Ignore,
}

impl FieldOrder {
    pub fn name(self) -> &'static str {
        match self {
            FieldOrder::Ascending => "ascending",
            FieldOrder::Descending => "descending",
            FieldOrder::Ignore => "ignore",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [FieldOrder::Ascending, FieldOrder::Descending, FieldOrder::Ignore]
            .into_iter()
            .find(|o| o.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    /// `None` is "no default"; `Some(Value::Null)` is a null default.
    pub default: Option<Value>,
    pub doc: Option<String>,
    pub order: Option<FieldOrder>,
    pub aliases: Vec<String>,
    pub props: Props,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Field {
            name: name.into(),
            schema,
            default: None,
            doc: None,
            order: None,
            aliases: Vec::new(),
            props: Props::new(),
        }
    }

    pub fn with_default(mut self, default: Option<Value>) -> Self {
        self.default = default;
        self
    }
}

// -------------------- constructors --------------------

impl Schema {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Schema::Primitive { kind, props: Props::new() }
    }

    pub fn null() -> Self { Self::primitive(PrimitiveKind::Null) }
    pub fn boolean() -> Self { Self::primitive(PrimitiveKind::Boolean) }
    pub fn int() -> Self { Self::primitive(PrimitiveKind::Int) }
    pub fn long() -> Self { Self::primitive(PrimitiveKind::Long) }
    pub fn float() -> Self { Self::primitive(PrimitiveKind::Float) }
    pub fn double() -> Self { Self::primitive(PrimitiveKind::Double) }
    pub fn bytes() -> Self { Self::primitive(PrimitiveKind::Bytes) }
    pub fn string() -> Self { Self::primitive(PrimitiveKind::String) }

    /// `string` tagged with the native-string marker.
    pub fn native_string() -> Self {
        let mut props = Props::new();
        props.insert(PROP_JAVA_STRING_KEY.into(), Value::from(PROP_JAVA_STRING_VALUE));
        Schema::Primitive { kind: PrimitiveKind::String, props }
    }

    /// Plain or native string depending on the flag.
    pub fn string_repr(native: bool) -> Self {
        if native { Self::native_string() } else { Self::string() }
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array { items: Box::new(items), props: Props::new() }
    }

    pub fn map(values: Schema) -> Self {
        Schema::Map { values: Box::new(values), props: Props::new() }
    }

    /// `union[null, inner]`: null first so a null default stays legal.
    pub fn nullable(inner: Schema) -> Self {
        Schema::Union(vec![Schema::null(), inner])
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Primitive { kind, .. } => SchemaKind::Primitive(*kind),
            Schema::Array { .. } => SchemaKind::Array,
            Schema::Map { .. } => SchemaKind::Map,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Enum(_) => SchemaKind::Enum,
            Schema::Fixed(_) => SchemaKind::Fixed,
            Schema::Ref(_) => SchemaKind::Ref,
        }
    }

    /// Attributes beyond the ones Avro itself defines for this kind
    /// (`logicalType`, `avro.java.string`, `java-class`, ...).
    pub fn props(&self) -> Option<&Props> {
        match self {
            Schema::Primitive { props, .. } | Schema::Array { props, .. } | Schema::Map { props, .. } => Some(props),
            Schema::Record(r) => Some(&r.props),
            Schema::Enum(e) => Some(&e.props),
            Schema::Fixed(f) => Some(&f.props),
            Schema::Union(_) | Schema::Ref(_) => None,
        }
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props()?.get(key)
    }

    /// Full name of a named type or reference.
    pub fn full_name(&self) -> Option<String> {
        match self {
            Schema::Record(r) => Some(r.full_name()),
            Schema::Enum(e) => Some(full_name(&e.name, e.namespace.as_deref())),
            Schema::Fixed(f) => Some(full_name(&f.name, f.namespace.as_deref())),
            Schema::Ref(name) => Some(name.clone()),
            _ => None,
        }
    }

    pub fn is_native_string(&self) -> bool {
        matches!(self, Schema::Primitive { kind: PrimitiveKind::String, .. })
            && self.prop(PROP_JAVA_STRING_KEY) == Some(&Value::from(PROP_JAVA_STRING_VALUE))
    }
}

/// Full name of a named type: `namespace.name`, or just `name`.
pub fn full_name(name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() && !name.contains('.') => format!("{ns}.{name}"),
        _ => name.to_string(),
    }
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        RecordSchema { name: name.into(), fields, ..RecordSchema::default() }
    }

    pub fn full_name(&self) -> String {
        full_name(&self.name, self.namespace.as_deref())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Returns the one record member of a union.
///
/// `None` when `schema` is not a union, has no record member, or has more
/// than one (there is no unique record variant to recover).
///
/// Parsed schemas carry the definition wherever a record is named again, so
/// a `["null", "Node"]` member is found like an inline one.
pub fn find_union_record_schema_single(schema: &Schema) -> Option<&Schema> {
    let Schema::Union(members) = schema else {
        return None;
    };
    let mut found = None;
    for member in members {
        if member.kind() == SchemaKind::Record {
            if found.is_some() {
                return None;
            }
            found = Some(member);
        }
    }
    found
}
