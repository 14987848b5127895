//! Structured values produced by the converter.
//!
//! A [`MessageValue`] is a typed tree that mirrors a [`MessageDescriptor`]:
//! every present field carries its descriptor (so the codec knows the exact
//! wire encoding) and a [`Value`]. Fields are keyed by number, which fixes
//! the canonical encoding order.
//!
//! [`MessageDescriptor`]: crate::schema::MessageDescriptor

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Number, Value as Json};

use crate::schema::FieldDescriptor;

/// A single typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Enum number, with its symbolic name when the schema defines one.
    Enum {
        number: i32,
        symbol: Option<String>,
    },
    Message(MessageValue),
    /// Elements of a repeated field.
    List(Vec<Value>),
}

/// A present field: its descriptor and value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub descriptor: FieldDescriptor,
    pub value: Value,
}

/// A message instance conforming to one message descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageValue {
    type_name: String,
    fields: BTreeMap<u32, FieldValue>,
}

impl MessageValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Name of the message type this value conforms to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Sets a field, replacing any previous value with the same number.
    pub(crate) fn set(&mut self, descriptor: FieldDescriptor, value: Value) {
        self.fields
            .insert(descriptor.number, FieldValue { descriptor, value });
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .values()
            .find(|f| f.descriptor.name == name)
            .map(|f| &f.value)
    }

    pub(crate) fn get_by_number_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.fields.get_mut(&number).map(|f| &mut f.value)
    }

    pub fn contains_number(&self, number: u32) -> bool {
        self.fields.contains_key(&number)
    }

    /// Present fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders the value as a JSON object, keyed by field name.
    ///
    /// Bytes render as standard base64, enums as their symbol when known, and 64-bit
    /// integers as plain JSON numbers.
    pub fn to_json(&self) -> Map<String, Json> {
        self.fields
            .values()
            .map(|f| (f.descriptor.name.clone(), f.value.to_json()))
            .collect()
    }
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum { .. } => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Bool(v) => Json::Bool(*v),
            Value::I32(v) => Json::from(*v),
            Value::I64(v) => Json::from(*v),
            Value::U32(v) => Json::from(*v),
            Value::U64(v) => Json::from(*v),
            Value::F32(v) => float_to_json(f64::from(*v)),
            Value::F64(v) => float_to_json(*v),
            Value::String(v) => Json::String(v.clone()),
            Value::Bytes(v) => Json::String(BASE64.encode(v)),
            Value::Enum { number, symbol } => match symbol {
                Some(symbol) => Json::String(symbol.clone()),
                None => Json::from(*number),
            },
            Value::Message(m) => Json::Object(m.to_json()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

fn float_to_json(v: f64) -> Json {
    Number::from_f64(v).map(Json::Number).unwrap_or(Json::Null)
}
