//! Raw Avro schema text to [`Schema`].
//!
//! Used for per-property override annotations. Accepts the JSON schema
//! form: primitive names, `array`, `map`, unions, `record`/`error`, `enum`,
//! `fixed` and references to named types defined earlier in the same text.
//! Attributes outside Avro's own vocabulary are kept on the node they were
//! found on, so an override comes back out exactly as it was written.
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::{full_name, EnumSchema, Field, FieldOrder, FixedSchema, PrimitiveKind, Props, RecordSchema, Schema};
use crate::error::ParseError;

static NAME_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static name pattern")
});

const PRIMITIVE_ATTRS: &[&str] = &["type"];
const ARRAY_ATTRS: &[&str] = &["type", "items"];
const MAP_ATTRS: &[&str] = &["type", "values"];
const RECORD_ATTRS: &[&str] = &["type", "name", "namespace", "doc", "aliases", "fields"];
const ENUM_ATTRS: &[&str] = &["type", "name", "namespace", "doc", "aliases", "symbols", "default"];
const FIXED_ATTRS: &[&str] = &["type", "name", "namespace", "doc", "aliases", "size"];
const FIELD_ATTRS: &[&str] = &["name", "type", "doc", "default", "order", "aliases"];

/// `true` when every dotted segment of `name` is a legal Avro name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(|seg| NAME_SEGMENT.is_match(seg))
}

pub fn parse_schema(text: &str) -> Result<Schema, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    parse_value(&value)
}

pub fn parse_value(value: &Value) -> Result<Schema, ParseError> {
    Parser::default().parse(value, None)
}

#[derive(Default)]
struct Parser {
    // every full name claimed so far, finished or not
    names: HashSet<String>,
    // finished definitions; a later reference gets a copy of these
    defined: HashMap<String, Schema>,
}

impl Parser {
    fn parse(&mut self, value: &Value, ns: Option<&str>) -> Result<Schema, ParseError> {
        match value {
            Value::String(name) => self.parse_name(name, ns),
            Value::Array(members) => self.parse_union(members, ns),
            Value::Object(obj) => self.parse_object(obj, ns),
            other => Err(ParseError::UnexpectedValue { attr: "type", found: other.to_string() }),
        }
    }

    fn parse_name(&self, name: &str, ns: Option<&str>) -> Result<Schema, ParseError> {
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(Schema::primitive(kind));
        }
        let full = self.resolve(name, ns).ok_or_else(|| ParseError::UnknownType(name.to_string()))?;
        Ok(match self.defined.get(&full) {
            Some(definition) => definition.clone(),
            None => Schema::Ref(full),
        })
    }

    fn resolve(&self, name: &str, ns: Option<&str>) -> Option<String> {
        let qualified = full_name(name, ns);
        if self.names.contains(&qualified) {
            return Some(qualified);
        }
        self.names.contains(name).then(|| name.to_string())
    }

    fn parse_union(&mut self, members: &[Value], ns: Option<&str>) -> Result<Schema, ParseError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let schema = self.parse(member, ns)?;
            let key = match &schema {
                Schema::Union(_) => return Err(ParseError::NestedUnion),
                Schema::Primitive { kind, .. } => kind.name().to_string(),
                Schema::Array { .. } => "array".to_string(),
                Schema::Map { .. } => "map".to_string(),
                named => named.full_name().unwrap_or_default(),
            };
            if !seen.insert(key.clone()) {
                return Err(ParseError::DuplicateUnionMember(key));
            }
            out.push(schema);
        }
        Ok(Schema::Union(out))
    }

    fn parse_object(&mut self, obj: &Map<String, Value>, ns: Option<&str>) -> Result<Schema, ParseError> {
        let ty = match obj.get("type") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(ParseError::UnexpectedValue { attr: "type", found: other.to_string() });
            }
            None => return Err(ParseError::MissingAttribute { kind: "schema", attr: "type" }),
        };

        if let Some(kind) = PrimitiveKind::from_name(ty) {
            return Ok(Schema::Primitive { kind, props: extra_props(obj, PRIMITIVE_ATTRS) });
        }

        match ty {
            "array" => {
                let items = obj
                    .get("items")
                    .ok_or(ParseError::MissingAttribute { kind: "array", attr: "items" })?;
                Ok(Schema::Array { items: Box::new(self.parse(items, ns)?), props: extra_props(obj, ARRAY_ATTRS) })
            }
            "map" => {
                let values = obj
                    .get("values")
                    .ok_or(ParseError::MissingAttribute { kind: "map", attr: "values" })?;
                Ok(Schema::Map { values: Box::new(self.parse(values, ns)?), props: extra_props(obj, MAP_ATTRS) })
            }
            "record" => self.parse_record(obj, ns, false),
            "error" => self.parse_record(obj, ns, true),
            "enum" => self.parse_enum(obj, ns),
            "fixed" => self.parse_fixed(obj, ns),
            other => self.parse_name(other, ns),
        }
    }

    /// Reads `name`/`namespace` and claims the full name.
    ///
    /// An explicit empty namespace opts out of the enclosing one.
    fn define(
        &mut self,
        obj: &Map<String, Value>,
        kind: &'static str,
        ns: Option<&str>,
    ) -> Result<(String, Option<String>), ParseError> {
        let name = str_attr(obj, "name")?
            .ok_or(ParseError::MissingAttribute { kind, attr: "name" })?;
        let namespace = match str_attr(obj, "namespace")? {
            Some("") => None,
            Some(explicit) => Some(explicit.to_string()),
            None => ns.map(str::to_string),
        };
        if !is_valid_name(name) {
            return Err(ParseError::InvalidName(name.to_string()));
        }
        if let Some(space) = namespace.as_deref() {
            if !is_valid_name(space) {
                return Err(ParseError::InvalidName(space.to_string()));
            }
        }
        let full = full_name(name, namespace.as_deref());
        if PrimitiveKind::from_name(&full).is_some() || !self.names.insert(full.clone()) {
            return Err(ParseError::Redefinition(full));
        }
        Ok((name.to_string(), namespace))
    }

    fn parse_record(
        &mut self,
        obj: &Map<String, Value>,
        ns: Option<&str>,
        is_error: bool,
    ) -> Result<Schema, ParseError> {
        let kind = if is_error { "error" } else { "record" };
        let (name, namespace) = self.define(obj, kind, ns)?;
        let raw_fields = match obj.get("fields") {
            Some(Value::Array(fields)) => fields,
            Some(other) => {
                return Err(ParseError::UnexpectedValue { attr: "fields", found: other.to_string() });
            }
            None => return Err(ParseError::MissingAttribute { kind, attr: "fields" }),
        };

        // fields resolve unqualified names against the record's own namespace
        let inner_ns = name
            .rsplit_once('.')
            .map(|(space, _)| space.to_string())
            .or_else(|| namespace.clone());
        let mut fields: Vec<Field> = Vec::with_capacity(raw_fields.len());
        for raw in raw_fields {
            let Value::Object(field_obj) = raw else {
                return Err(ParseError::UnexpectedValue { attr: "fields", found: raw.to_string() });
            };
            let field = self.parse_field(field_obj, inner_ns.as_deref())?;
            if fields.iter().any(|f| f.name == field.name) {
                return Err(ParseError::DuplicateField(field.name));
            }
            fields.push(field);
        }

        let mut record = RecordSchema {
            name,
            namespace,
            doc: str_attr(obj, "doc")?.map(str::to_string),
            aliases: aliases(obj)?,
            is_error,
            fields,
            props: extra_props(obj, RECORD_ATTRS),
        };
        // the record is finished now, so self references can point at it
        let full = record.full_name();
        let finished = Schema::Record(record.clone());
        for field in &mut record.fields {
            close_references(&mut field.schema, &full, &finished);
        }
        Ok(self.finish(full, Schema::Record(record)))
    }

    fn parse_field(&mut self, obj: &Map<String, Value>, ns: Option<&str>) -> Result<Field, ParseError> {
        let name = str_attr(obj, "name")?
            .ok_or(ParseError::MissingAttribute { kind: "field", attr: "name" })?;
        if !NAME_SEGMENT.is_match(name) {
            return Err(ParseError::InvalidName(name.to_string()));
        }
        let field_type = obj
            .get("type")
            .ok_or(ParseError::MissingAttribute { kind: "field", attr: "type" })?;
        let order = match str_attr(obj, "order")? {
            Some(raw) => Some(
                FieldOrder::from_name(raw)
                    .ok_or_else(|| ParseError::UnexpectedValue { attr: "order", found: raw.to_string() })?,
            ),
            None => None,
        };
        Ok(Field {
            name: name.to_string(),
            schema: self.parse(field_type, ns)?,
            default: obj.get("default").cloned(),
            doc: str_attr(obj, "doc")?.map(str::to_string),
            order,
            aliases: aliases(obj)?,
            props: extra_props(obj, FIELD_ATTRS),
        })
    }

    fn parse_enum(&mut self, obj: &Map<String, Value>, ns: Option<&str>) -> Result<Schema, ParseError> {
        let (name, namespace) = self.define(obj, "enum", ns)?;
        let Some(Value::Array(raw)) = obj.get("symbols") else {
            return Err(ParseError::MissingAttribute { kind: "enum", attr: "symbols" });
        };
        let mut symbols = Vec::with_capacity(raw.len());
        for sym in raw {
            let Value::String(sym) = sym else {
                return Err(ParseError::UnexpectedValue { attr: "symbols", found: sym.to_string() });
            };
            if !NAME_SEGMENT.is_match(sym) {
                return Err(ParseError::InvalidName(sym.clone()));
            }
            if symbols.contains(sym) {
                return Err(ParseError::DuplicateSymbol(sym.clone()));
            }
            symbols.push(sym.clone());
        }
        let default = str_attr(obj, "default")?.map(str::to_string);
        if let Some(default) = default.as_ref().filter(|d| !symbols.contains(*d)) {
            return Err(ParseError::UnexpectedValue { attr: "default", found: default.clone() });
        }
        let e = EnumSchema {
            name,
            namespace,
            doc: str_attr(obj, "doc")?.map(str::to_string),
            aliases: aliases(obj)?,
            symbols,
            default,
            props: extra_props(obj, ENUM_ATTRS),
        };
        Ok(self.finish(full_name(&e.name, e.namespace.as_deref()), Schema::Enum(e)))
    }

    fn parse_fixed(&mut self, obj: &Map<String, Value>, ns: Option<&str>) -> Result<Schema, ParseError> {
        let (name, namespace) = self.define(obj, "fixed", ns)?;
        let size = match obj.get("size") {
            Some(v) => v
                .as_u64()
                .ok_or_else(|| ParseError::UnexpectedValue { attr: "size", found: v.to_string() })?,
            None => return Err(ParseError::MissingAttribute { kind: "fixed", attr: "size" }),
        };
        let f = FixedSchema {
            name,
            namespace,
            doc: str_attr(obj, "doc")?.map(str::to_string),
            aliases: aliases(obj)?,
            size,
            props: extra_props(obj, FIXED_ATTRS),
        };
        Ok(self.finish(full_name(&f.name, f.namespace.as_deref()), Schema::Fixed(f)))
    }

    fn finish(&mut self, full: String, schema: Schema) -> Schema {
        self.defined.insert(full, schema.clone());
        schema
    }
}

/// Swaps references to `full` for its finished definition. The copy keeps
/// its own inner references, so a recursive type unrolls exactly once.
fn close_references(schema: &mut Schema, full: &str, definition: &Schema) {
    if matches!(schema, Schema::Ref(name) if name == full) {
        *schema = definition.clone();
        return;
    }
    match schema {
        Schema::Array { items, .. } => close_references(items, full, definition),
        Schema::Map { values, .. } => close_references(values, full, definition),
        Schema::Union(members) => {
            for member in members {
                close_references(member, full, definition);
            }
        }
        Schema::Record(record) => {
            for field in &mut record.fields {
                close_references(&mut field.schema, full, definition);
            }
        }
        _ => {}
    }
}

fn extra_props(obj: &Map<String, Value>, known: &[&str]) -> Props {
    obj.iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn aliases(obj: &Map<String, Value>) -> Result<Vec<String>, ParseError> {
    let raw = match obj.get("aliases") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(raw)) => raw,
        Some(other) => return Err(ParseError::UnexpectedValue { attr: "aliases", found: other.to_string() }),
    };
    raw.iter()
        .map(|alias| match alias {
            Value::String(a) if is_valid_name(a) => Ok(a.clone()),
            Value::String(a) => Err(ParseError::InvalidName(a.clone())),
            other => Err(ParseError::UnexpectedValue { attr: "aliases", found: other.to_string() }),
        })
        .collect()
}

fn str_attr<'a>(obj: &'a Map<String, Value>, attr: &'static str) -> Result<Option<&'a str>, ParseError> {
    match obj.get(attr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ParseError::UnexpectedValue { attr, found: other.to_string() }),
    }
}
