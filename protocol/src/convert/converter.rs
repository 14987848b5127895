//! Schema-driven conversion of untyped JSON into [`MessageValue`]s.
//!
//! The converter walks the descriptor, not the input: every declared field
//! is looked up in the input mapping and converted according to its type,
//! recursing into nested messages. Input keys the descriptor does not
//! declare are rejected before any field is converted. The first violation
//! aborts conversion with [`LauncherError::SchemaMismatch`] carrying the
//! dotted path of the offending value.
//!
//! `bytes` fields are read the way the protobuf JSON mapping writes them:
//! base64, standard or URL-safe alphabet, padding optional.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde_json::{Map, Value as Json};

use super::value::{MessageValue, Value};
use crate::error::{LauncherError, Result};
use crate::schema::{FieldDescriptor, FieldType, MessageDescriptor, ScalarType, ServiceSchema};

/// Converts JSON objects into values of messages from one schema module.
pub struct ValueConverter<'s> {
    schema: &'s ServiceSchema,
}

impl<'s> ValueConverter<'s> {
    pub fn new(schema: &'s ServiceSchema) -> Self {
        Self { schema }
    }

    /// Converts `fields` into a value of `descriptor`.
    ///
    /// Field paths in errors are relative to the root object.
    pub fn convert(
        &self,
        descriptor: &MessageDescriptor,
        fields: &Map<String, Json>,
    ) -> Result<MessageValue> {
        self.convert_message(descriptor, fields, "")
    }

    fn convert_message(
        &self,
        descriptor: &MessageDescriptor,
        fields: &Map<String, Json>,
        path: &str,
    ) -> Result<MessageValue> {
        if let Some(unknown) = fields
            .keys()
            .find(|key| descriptor.field_by_name(key).is_none())
        {
            return Err(LauncherError::mismatch(
                join(path, unknown),
                format!("unknown field for message `{}`", descriptor.name),
            ));
        }

        let mut message = MessageValue::new(descriptor.name.clone());
        for field in &descriptor.fields {
            let field_path = join(path, &field.name);
            match fields.get(&field.name) {
                None | Some(Json::Null) => {
                    if field.is_required() {
                        return Err(LauncherError::mismatch(
                            field_path,
                            "missing required field",
                        ));
                    }
                }
                Some(json) => {
                    let value = self.convert_field(field, json, &field_path)?;
                    // An empty list is the same as an absent repeated field.
                    if matches!(&value, Value::List(items) if items.is_empty()) {
                        continue;
                    }
                    message.set(field.clone(), value);
                }
            }
        }
        Ok(message)
    }

    fn convert_field(&self, field: &FieldDescriptor, json: &Json, path: &str) -> Result<Value> {
        if !field.is_repeated() {
            return self.convert_single(&field.field_type, json, path);
        }

        let Json::Array(items) = json else {
            return Err(LauncherError::mismatch(
                path,
                format!("expected array, found {}", kind(json)),
            ));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.convert_single(&field.field_type, item, &format!("{}[{}]", path, i))
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn convert_single(&self, field_type: &FieldType, json: &Json, path: &str) -> Result<Value> {
        match field_type {
            FieldType::Scalar(scalar) => convert_scalar(*scalar, json, path),
            FieldType::Message { message } => {
                let descriptor = self.schema.message(message)?;
                let Json::Object(fields) = json else {
                    return Err(LauncherError::mismatch(
                        path,
                        format!("expected object `{}`, found {}", message, kind(json)),
                    ));
                };
                self.convert_message(descriptor, fields, path)
                    .map(Value::Message)
            }
            FieldType::Enum { name } => {
                let enumeration = self.schema.enumeration(name).ok_or_else(|| {
                    LauncherError::mismatch(path, format!("enum `{}` is not defined", name))
                })?;
                match json {
                    Json::String(symbol) => {
                        let number = enumeration.value_of(symbol).ok_or_else(|| {
                            LauncherError::mismatch(
                                path,
                                format!("`{}` is not a value of enum `{}`", symbol, name),
                            )
                        })?;
                        Ok(Value::Enum {
                            number,
                            symbol: Some(symbol.clone()),
                        })
                    }
                    Json::Number(_) => {
                        let number = json
                            .as_i64()
                            .and_then(|n| i32::try_from(n).ok())
                            .ok_or_else(|| {
                                LauncherError::mismatch(path, "enum number out of range")
                            })?;
                        Ok(Value::Enum {
                            number,
                            symbol: enumeration.name_of(number).map(str::to_string),
                        })
                    }
                    other => Err(LauncherError::mismatch(
                        path,
                        format!("expected enum `{}`, found {}", name, kind(other)),
                    )),
                }
            }
        }
    }
}

/// Converts `fields` into a value of `descriptor`, resolving nested types
/// in `schema`.
pub fn convert(
    schema: &ServiceSchema,
    descriptor: &MessageDescriptor,
    fields: &Map<String, Json>,
) -> Result<MessageValue> {
    ValueConverter::new(schema).convert(descriptor, fields)
}

fn convert_scalar(scalar: ScalarType, json: &Json, path: &str) -> Result<Value> {
    let mismatch = || {
        LauncherError::mismatch(
            path,
            format!("expected {}, found {}", scalar.name(), kind(json)),
        )
    };
    let out_of_range = || {
        LauncherError::mismatch(
            path,
            format!("value {} out of range for {}", json, scalar.name()),
        )
    };
    let signed = || -> Result<i64> {
        if !json.is_number() || json.is_f64() {
            return Err(mismatch());
        }
        json.as_i64().ok_or_else(out_of_range)
    };
    let unsigned = || -> Result<u64> {
        if !json.is_number() || json.is_f64() {
            return Err(mismatch());
        }
        json.as_u64().ok_or_else(out_of_range)
    };

    match scalar {
        ScalarType::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => {
            let v = signed()?;
            i32::try_from(v).map(Value::I32).map_err(|_| out_of_range())
        }
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => signed().map(Value::I64),
        ScalarType::Uint32 | ScalarType::Fixed32 => {
            let v = unsigned()?;
            u32::try_from(v).map(Value::U32).map_err(|_| out_of_range())
        }
        ScalarType::Uint64 | ScalarType::Fixed64 => unsigned().map(Value::U64),
        ScalarType::Float => {
            let v = json.as_f64().ok_or_else(mismatch)? as f32;
            if v.is_finite() {
                Ok(Value::F32(v))
            } else {
                Err(out_of_range())
            }
        }
        ScalarType::Double => json.as_f64().map(Value::F64).ok_or_else(mismatch),
        ScalarType::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(mismatch),
        ScalarType::Bytes => {
            let text = json.as_str().ok_or_else(mismatch)?;
            decode_base64(text).map(Value::Bytes).map_err(|e| {
                LauncherError::mismatch(path, format!("invalid base64 bytes: {}", e))
            })
        }
    }
}

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);
const URL_SAFE_BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    if text.contains(|c: char| c == '-' || c == '_') {
        URL_SAFE_BASE64.decode(text)
    } else {
        STANDARD_BASE64.decode(text)
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
