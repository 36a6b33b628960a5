//! Required-vs-optional ("req/opt") policy and the precomputed fragments
//! it selects from.
//!
//! Tables are built once on first use and only read afterwards, so any
//! number of threads may synthesize concurrently.
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::schema::{Field, Schema};
use crate::types::Primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Required,
    Optional,
}

/// preferNonNull wins; otherwise only nullable classes become optional.
pub fn req_opt(prefer_non_null: bool, nullable: bool) -> Form {
    if !prefer_non_null && nullable {
        Form::Optional
    } else {
        Form::Required
    }
}

/// Schema plus default of a field, minus its name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub schema: Schema,
    pub default: Option<Value>,
}

impl FieldShape {
    pub fn required(schema: Schema) -> Self {
        FieldShape { schema, default: None }
    }

    /// Bare when preferring non-null, else `union[null, schema]`; never a default.
    pub fn outer(schema: Schema, prefer_non_null: bool) -> Self {
        if prefer_non_null {
            Self::required(schema)
        } else {
            Self::required(Schema::nullable(schema))
        }
    }

    pub fn into_field(self, name: &str) -> Field {
        Field::new(name, self.schema).with_default(self.default)
    }
}

/// The two fixed variants of one kind.
#[derive(Debug)]
pub struct ReqOpt<T> {
    pub required: T,
    pub optional: T,
}

impl<T> ReqOpt<T> {
    pub fn pick(&self, form: Form) -> &T {
        match form {
            Form::Required => &self.required,
            Form::Optional => &self.optional,
        }
    }
}

// -------------------- scalars --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    NativeString,
    Bytes,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 8] = [
        ScalarKind::Boolean,
        ScalarKind::Int,
        ScalarKind::Long,
        ScalarKind::Float,
        ScalarKind::Double,
        ScalarKind::String,
        ScalarKind::NativeString,
        ScalarKind::Bytes,
    ];

    /// Scalar kind of a boxed primitive; byte widens to int.
    pub fn of(p: Primitive) -> Option<Self> {
        match p {
            Primitive::Boolean => Some(ScalarKind::Boolean),
            Primitive::Int | Primitive::Byte => Some(ScalarKind::Int),
            Primitive::Long => Some(ScalarKind::Long),
            Primitive::Float => Some(ScalarKind::Float),
            Primitive::Double => Some(ScalarKind::Double),
            Primitive::Short | Primitive::Char => None,
        }
    }

    pub fn string(native: bool) -> Self {
        if native { ScalarKind::NativeString } else { ScalarKind::String }
    }

    fn leaf(self) -> Schema {
        match self {
            ScalarKind::Boolean => Schema::boolean(),
            ScalarKind::Int => Schema::int(),
            ScalarKind::Long => Schema::long(),
            ScalarKind::Float => Schema::float(),
            ScalarKind::Double => Schema::double(),
            ScalarKind::String => Schema::string(),
            ScalarKind::NativeString => Schema::native_string(),
            ScalarKind::Bytes => Schema::bytes(),
        }
    }

    // native strings and bytes are wrapped by hand upstream: no null default
    fn optional_defaults_to_null(self) -> bool {
        !matches!(self, ScalarKind::NativeString | ScalarKind::Bytes)
    }

    pub fn table(self) -> &'static ReqOpt<FieldShape> {
        &SCALARS[self as usize]
    }

    pub fn shape(self, form: Form) -> FieldShape {
        self.table().pick(form).clone()
    }
}

static SCALARS: Lazy<[ReqOpt<FieldShape>; 8]> = Lazy::new(|| {
    ScalarKind::ALL.map(|kind| ReqOpt {
        required: FieldShape::required(kind.leaf()),
        optional: FieldShape {
            schema: Schema::nullable(kind.leaf()),
            default: kind.optional_defaults_to_null().then_some(Value::Null),
        },
    })
});

// -------------------- arrays of primitives --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Boolean,
    Int,
    Long,
    Float,
    Double,
}

impl ArrayKind {
    pub const ALL: [ArrayKind; 5] = [
        ArrayKind::Boolean,
        ArrayKind::Int,
        ArrayKind::Long,
        ArrayKind::Float,
        ArrayKind::Double,
    ];

    /// Element kind of a boxed component; byte elements reuse the int entry.
    pub fn of(p: Primitive) -> Option<Self> {
        match p {
            Primitive::Boolean => Some(ArrayKind::Boolean),
            Primitive::Int | Primitive::Byte => Some(ArrayKind::Int),
            Primitive::Long => Some(ArrayKind::Long),
            Primitive::Float => Some(ArrayKind::Float),
            Primitive::Double => Some(ArrayKind::Double),
            Primitive::Short | Primitive::Char => None,
        }
    }

    fn leaf(self) -> Schema {
        match self {
            ArrayKind::Boolean => Schema::boolean(),
            ArrayKind::Int => Schema::int(),
            ArrayKind::Long => Schema::long(),
            ArrayKind::Float => Schema::float(),
            ArrayKind::Double => Schema::double(),
        }
    }

    /// `array<X>` as required, `array<union[null, X]>` as optional.
    pub fn table(self) -> &'static ReqOpt<Schema> {
        &ARRAYS[self as usize]
    }

    /// Elements follow their own nullability; the array itself follows
    /// `prefer_non_null`.
    pub fn shape(self, nullable_elements: bool, prefer_non_null: bool) -> FieldShape {
        let form = if nullable_elements { Form::Optional } else { Form::Required };
        FieldShape::outer(self.table().pick(form).clone(), prefer_non_null)
    }
}

static ARRAYS: Lazy<[ReqOpt<Schema>; 5]> = Lazy::new(|| {
    ArrayKind::ALL.map(|kind| ReqOpt {
        required: Schema::array(kind.leaf()),
        optional: Schema::array(Schema::nullable(kind.leaf())),
    })
});
