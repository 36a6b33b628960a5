//! [`Schema`] to Avro JSON.
use std::collections::HashSet;
use std::fmt;

use serde_json::{json, Map, Value};

use super::parse::is_valid_name;
use super::{full_name, Field, Props, Schema};
use crate::error::RenderError;

/// Canonical Avro JSON for `schema`.
///
/// A named type that shows up a second time is written as its name, and a
/// namespace equal to the enclosing one is left out, the way Avro tooling
/// writes schemas.
pub fn to_json(schema: &Schema) -> Result<Value, RenderError> {
    Renderer::default().emit(schema)
}

/// Compact Avro JSON text.
pub fn render(schema: &Schema) -> Result<String, RenderError> {
    Ok(to_json(schema)?.to_string())
}

/// Like [`render`], but never fails: a schema that cannot be written out
/// comes back as a bracketed placeholder naming the failure. Meant for logs.
pub fn to_schema_string_safe(schema: &Schema) -> String {
    match render(schema) {
        Ok(text) => text,
        Err(err) => format!("[Invalid schema: {}: {err}]", err.kind()),
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_schema_string_safe(self))
    }
}

/// Common header of records, enums and fixeds.
struct Named<'a> {
    ty: &'static str,
    name: &'a str,
    namespace: Option<&'a str>,
    doc: Option<&'a str>,
    aliases: &'a [String],
}

impl Named<'_> {
    /// Namespace the type's own name lives in.
    fn space(&self) -> Option<&str> {
        match self.name.rsplit_once('.') {
            Some((space, _)) => Some(space),
            None => self.namespace.filter(|ns| !ns.is_empty()),
        }
    }
}

#[derive(Default)]
struct Renderer {
    defined: HashSet<String>,
    // namespace of the innermost record being written
    space: Option<String>,
}

impl Renderer {
    fn emit(&mut self, schema: &Schema) -> Result<Value, RenderError> {
        match schema {
            Schema::Primitive { kind, props } => {
                if props.is_empty() {
                    return Ok(Value::from(kind.name()));
                }
                let mut o = Map::new();
                o.insert("type".into(), Value::from(kind.name()));
                Ok(with_props(o, props))
            }
            Schema::Array { items, props } => {
                let mut o = Map::new();
                o.insert("type".into(), Value::from("array"));
                o.insert("items".into(), self.emit(items)?);
                Ok(with_props(o, props))
            }
            Schema::Map { values, props } => {
                let mut o = Map::new();
                o.insert("type".into(), Value::from("map"));
                o.insert("values".into(), self.emit(values)?);
                Ok(with_props(o, props))
            }
            Schema::Union(members) => {
                let mut out = Vec::with_capacity(members.len());
                for (index, member) in members.iter().enumerate() {
                    if let Schema::Union(_) = member {
                        return Err(RenderError::NestedUnion(format!("member {index}")));
                    }
                    out.push(self.emit(member)?);
                }
                Ok(Value::Array(out))
            }
            Schema::Record(record) => {
                let header = Named {
                    ty: if record.is_error { "error" } else { "record" },
                    name: &record.name,
                    namespace: record.namespace.as_deref(),
                    doc: record.doc.as_deref(),
                    aliases: &record.aliases,
                };
                let Some(mut o) = self.named(&header)? else {
                    return Ok(self.reference(&record.full_name()));
                };
                let outer = std::mem::replace(&mut self.space, header.space().map(str::to_string));
                let fields = record.fields.iter().map(|f| self.emit_field(f)).collect::<Result<Vec<_>, _>>();
                self.space = outer;
                o.insert("fields".into(), Value::Array(fields?));
                Ok(with_props(o, &record.props))
            }
            Schema::Enum(e) => {
                let header = Named {
                    ty: "enum",
                    name: &e.name,
                    namespace: e.namespace.as_deref(),
                    doc: e.doc.as_deref(),
                    aliases: &e.aliases,
                };
                let Some(mut o) = self.named(&header)? else {
                    return Ok(self.reference(&full_name(&e.name, e.namespace.as_deref())));
                };
                o.insert("symbols".into(), json!(e.symbols));
                if let Some(default) = &e.default {
                    o.insert("default".into(), Value::from(default.clone()));
                }
                Ok(with_props(o, &e.props))
            }
            Schema::Fixed(f) => {
                let header = Named {
                    ty: "fixed",
                    name: &f.name,
                    namespace: f.namespace.as_deref(),
                    doc: f.doc.as_deref(),
                    aliases: &f.aliases,
                };
                let Some(mut o) = self.named(&header)? else {
                    return Ok(self.reference(&full_name(&f.name, f.namespace.as_deref())));
                };
                o.insert("size".into(), Value::from(f.size));
                Ok(with_props(o, &f.props))
            }
            Schema::Ref(name) => {
                if name.is_empty() {
                    return Err(RenderError::EmptyReference);
                }
                Ok(self.reference(name))
            }
        }
    }

    /// Header of a named type, or `None` when it was already written out.
    fn named(&mut self, header: &Named<'_>) -> Result<Option<Map<String, Value>>, RenderError> {
        if !is_valid_name(header.name) {
            return Err(RenderError::InvalidName(header.name.to_string()));
        }
        if !self.defined.insert(full_name(header.name, header.namespace)) {
            return Ok(None);
        }
        let mut o = Map::new();
        o.insert("type".into(), Value::from(header.ty));
        o.insert("name".into(), Value::from(header.name));
        if !header.name.contains('.') && header.space() != self.space.as_deref() {
            o.insert("namespace".into(), Value::from(header.space().unwrap_or_default()));
        }
        if let Some(doc) = header.doc {
            o.insert("doc".into(), Value::from(doc));
        }
        if !header.aliases.is_empty() {
            o.insert("aliases".into(), json!(header.aliases));
        }
        Ok(Some(o))
    }

    /// Name of an already written type, short when it shares the current namespace.
    fn reference(&self, full: &str) -> Value {
        match (full.rsplit_once('.'), self.space.as_deref()) {
            (Some((space, short)), Some(current)) if space == current => Value::from(short),
            _ => Value::from(full),
        }
    }

    fn emit_field(&mut self, field: &Field) -> Result<Value, RenderError> {
        let mut o = Map::new();
        o.insert("name".into(), Value::from(field.name.clone()));
        o.insert("type".into(), self.emit(&field.schema)?);
        if let Some(doc) = &field.doc {
            o.insert("doc".into(), Value::from(doc.clone()));
        }
        if let Some(default) = &field.default {
            o.insert("default".into(), default.clone());
        }
        if let Some(order) = field.order {
            o.insert("order".into(), Value::from(order.name()));
        }
        if !field.aliases.is_empty() {
            o.insert("aliases".into(), json!(field.aliases));
        }
        Ok(with_props(o, &field.props))
    }
}

/// Appends extra attributes; Avro's own keys already in `o` win.
fn with_props(mut o: Map<String, Value>, props: &Props) -> Value {
    for (k, v) in props {
        o.entry(k.clone()).or_insert_with(|| v.clone());
    }
    Value::Object(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema, RecordSchema};

    fn point() -> Schema {
        Schema::Record(RecordSchema {
            name: "Point".into(),
            namespace: Some("geo".into()),
            fields: vec![
                Field::new("x", Schema::double()),
                Field::new("label", Schema::nullable(Schema::native_string())).with_default(Some(Value::Null)),
            ],
            ..RecordSchema::default()
        })
    }

    #[test]
    fn record_layout() {
        let v = to_json(&point()).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "record", "name": "Point", "namespace": "geo",
                "fields": [
                    {"name": "x", "type": "double"},
                    {"name": "label", "type": ["null", {"type": "string", "avro.java.string": "String"}], "default": null}
                ]
            })
        );
    }

    #[test]
    fn repeated_named_type_becomes_reference() {
        let pair = Schema::array(Schema::Union(vec![Schema::null(), point()]));
        let outer = Schema::map(pair);
        let twice = Schema::Record(RecordSchema::new("Pair", vec![Field::new("a", point()), Field::new("b", outer)]));
        let v = to_json(&twice).unwrap();
        assert_eq!(v["fields"][1]["type"]["values"]["items"][1], json!("geo.Point"));
    }

    #[test]
    fn rendered_text_parses_back() {
        let text = render(&point()).unwrap();
        assert_eq!(parse_schema(&text).unwrap(), point());
    }

    #[test]
    fn inner_types_inherit_the_namespace() {
        let inner = Schema::Record(RecordSchema {
            namespace: Some("geo".into()),
            ..RecordSchema::new("Tag", Vec::new())
        });
        let stray = Schema::Record(RecordSchema::new("Loose", Vec::new()));
        let outer = Schema::Record(RecordSchema {
            namespace: Some("geo".into()),
            ..RecordSchema::new("Shape", vec![Field::new("tag", inner), Field::new("loose", stray)])
        });
        let v = to_json(&outer).unwrap();
        assert_eq!(v["namespace"], "geo");
        assert_eq!(v["fields"][0]["type"].get("namespace"), None);
        assert_eq!(v["fields"][1]["type"]["namespace"], "");
        assert_eq!(parse_schema(&v.to_string()).unwrap(), outer);
    }

    #[test]
    fn attributes_survive_a_round_trip() {
        let texts = [
            json!({"type": "fixed", "name": "Dec", "size": 16, "logicalType": "decimal", "precision": 38, "scale": 9}),
            json!({"type": "array", "items": "int", "java-class": "java.util.List"}),
            json!({"type": "map", "values": {"type": "bytes", "logicalType": "decimal", "precision": 4}, "x": 1}),
            json!({"type": "enum", "name": "Side", "doc": "d", "aliases": ["Dir"], "symbols": ["BUY", "SELL"], "default": "SELL"}),
            json!({
                "type": "error", "name": "Failure", "namespace": "ops", "doc": "boom", "aliases": ["Fault"],
                "fields": [
                    {"name": "code", "type": "int", "order": "descending", "aliases": ["status"], "x-unit": "http"},
                    {"name": "cause", "type": ["null", "Failure"], "default": null, "order": "ignore"}
                ],
                "java-class": "com.acme.Failure"
            }),
        ];
        for text in texts {
            let schema = parse_schema(&text.to_string()).unwrap();
            assert_eq!(to_json(&schema).unwrap(), text);
        }
    }

    #[test]
    fn safe_string_never_fails() {
        let corrupt = Schema::Union(vec![Schema::null(), Schema::Union(vec![Schema::int()])]);
        let s = to_schema_string_safe(&corrupt);
        assert!(s.starts_with("[Invalid schema: NestedUnion:"), "{s}");

        let bad_name = Schema::Record(RecordSchema::new("has space", Vec::new()));
        assert!(to_schema_string_safe(&bad_name).starts_with("[Invalid schema: InvalidName:"));
        assert_eq!(
            to_schema_string_safe(&Schema::Ref(String::new())),
            "[Invalid schema: EmptyReference: empty name reference]"
        );
        assert_eq!(to_schema_string_safe(&Schema::int()), "\"int\"");
        assert_eq!(Schema::long().to_string(), "\"long\"");
    }
}
