//! Protobuf wire codec for dynamically typed [`MessageValue`]s.
//!
//! Encoding is canonical for a given value: fields are written in ascending
//! number order, every present field is written even when it holds a zero
//! value, and repeated numeric fields are packed. An empty repeated field
//! is not written at all. The decoder accepts both packed and unpacked
//! repeated numerics and skips unknown fields.

use bytes::Buf;
use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, WireType};

use super::value::{MessageValue, Value};
use crate::error::{LauncherError, Result};
use crate::schema::{FieldDescriptor, FieldType, MessageDescriptor, ScalarType, ServiceSchema};

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serializes a message value to protobuf bytes.
///
/// Fails with [`LauncherError::SchemaMismatch`] when a value does not match
/// the declared type of its field. Nothing is returned in that case, so a
/// partially written message can never reach the signer.
pub fn encode_message(message: &MessageValue) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_into(message, "", &mut buf)?;
    Ok(buf)
}

fn encode_into(message: &MessageValue, path: &str, buf: &mut Vec<u8>) -> Result<()> {
    for field in message.fields() {
        let field_path = if path.is_empty() {
            field.descriptor.name.clone()
        } else {
            format!("{}.{}", path, field.descriptor.name)
        };
        encode_field(&field.descriptor, &field.value, &field_path, buf)?;
    }
    Ok(())
}

fn encode_field(
    descriptor: &FieldDescriptor,
    value: &Value,
    path: &str,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let number = descriptor.number;
    let items = match value {
        Value::List(items) if descriptor.is_repeated() => items,
        Value::List(_) => {
            return Err(LauncherError::mismatch(path, "list given for a singular field"));
        }
        _ if descriptor.is_repeated() => {
            return Err(LauncherError::mismatch(
                path,
                format!("repeated field holds a single {} value", value.kind()),
            ));
        }
        single => return encode_single(number, &descriptor.field_type, single, path, buf),
    };

    // An empty repeated field is absent on the wire, packed or not.
    if items.is_empty() {
        return Ok(());
    }

    match &descriptor.field_type {
        FieldType::Scalar(scalar) if scalar.is_packable() => {
            let mut packed = Vec::new();
            for (i, item) in items.iter().enumerate() {
                encode_scalar_payload(*scalar, item, &indexed(path, i), &mut packed)?;
            }
            write_length_delimited(number, &packed, buf);
        }
        FieldType::Enum { .. } => {
            let mut packed = Vec::new();
            for (i, item) in items.iter().enumerate() {
                encode_enum_payload(item, &indexed(path, i), &mut packed)?;
            }
            write_length_delimited(number, &packed, buf);
        }
        field_type => {
            for (i, item) in items.iter().enumerate() {
                encode_single(number, field_type, item, &indexed(path, i), buf)?;
            }
        }
    }
    Ok(())
}

fn encode_single(
    number: u32,
    field_type: &FieldType,
    value: &Value,
    path: &str,
    buf: &mut Vec<u8>,
) -> Result<()> {
    match field_type {
        FieldType::Message { message } => {
            let Value::Message(nested) = value else {
                return Err(type_mismatch(path, message, value));
            };
            let mut payload = Vec::new();
            encode_into(nested, path, &mut payload)?;
            write_length_delimited(number, &payload, buf);
        }
        FieldType::Enum { .. } => {
            encode_key(number, WireType::Varint, buf);
            encode_enum_payload(value, path, buf)?;
        }
        FieldType::Scalar(scalar) => {
            encode_key(number, scalar_wire_type(*scalar), buf);
            encode_scalar_payload(*scalar, value, path, buf)?;
        }
    }
    Ok(())
}

fn write_length_delimited(number: u32, payload: &[u8], buf: &mut Vec<u8>) {
    encode_key(number, WireType::LengthDelimited, buf);
    encode_varint(payload.len() as u64, buf);
    buf.extend_from_slice(payload);
}

fn encode_enum_payload(value: &Value, path: &str, buf: &mut Vec<u8>) -> Result<()> {
    let Value::Enum { number, .. } = value else {
        return Err(type_mismatch(path, "enum", value));
    };
    encode_varint(i64::from(*number) as u64, buf);
    Ok(())
}

/// Writes the value of a scalar without its key.
fn encode_scalar_payload(
    scalar: ScalarType,
    value: &Value,
    path: &str,
    buf: &mut Vec<u8>,
) -> Result<()> {
    match (scalar, value) {
        (ScalarType::Bool, Value::Bool(v)) => encode_varint(u64::from(*v), buf),
        (ScalarType::Int32, Value::I32(v)) => encode_varint(i64::from(*v) as u64, buf),
        (ScalarType::Int64, Value::I64(v)) => encode_varint(*v as u64, buf),
        (ScalarType::Uint32, Value::U32(v)) => encode_varint(u64::from(*v), buf),
        (ScalarType::Uint64, Value::U64(v)) => encode_varint(*v, buf),
        (ScalarType::Sint32, Value::I32(v)) => encode_varint(u64::from(zigzag32(*v)), buf),
        (ScalarType::Sint64, Value::I64(v)) => encode_varint(zigzag64(*v), buf),
        (ScalarType::Fixed32, Value::U32(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (ScalarType::Fixed64, Value::U64(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (ScalarType::Sfixed32, Value::I32(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (ScalarType::Sfixed64, Value::I64(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (ScalarType::Float, Value::F32(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (ScalarType::Double, Value::F64(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (ScalarType::String, Value::String(v)) => {
            encode_varint(v.len() as u64, buf);
            buf.extend_from_slice(v.as_bytes());
        }
        (ScalarType::Bytes, Value::Bytes(v)) => {
            encode_varint(v.len() as u64, buf);
            buf.extend_from_slice(v);
        }
        (scalar, value) => return Err(type_mismatch(path, scalar.name(), value)),
    }
    Ok(())
}

fn type_mismatch(path: &str, declared: impl std::fmt::Display, value: &Value) -> LauncherError {
    LauncherError::mismatch(
        path,
        format!("{} value does not match declared type {}", value.kind(), declared),
    )
}

fn indexed(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

fn scalar_wire_type(scalar: ScalarType) -> WireType {
    match scalar {
        ScalarType::Bool
        | ScalarType::Int32
        | ScalarType::Int64
        | ScalarType::Uint32
        | ScalarType::Uint64
        | ScalarType::Sint32
        | ScalarType::Sint64 => WireType::Varint,
        ScalarType::Fixed32 | ScalarType::Sfixed32 | ScalarType::Float => WireType::ThirtyTwoBit,
        ScalarType::Fixed64 | ScalarType::Sfixed64 | ScalarType::Double => WireType::SixtyFourBit,
        ScalarType::String | ScalarType::Bytes => WireType::LengthDelimited,
    }
}

fn zigzag32(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn unzigzag32(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

fn unzigzag64(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parses protobuf bytes as a value of `descriptor`, resolving nested types
/// in `schema`.
pub fn decode_message(
    schema: &ServiceSchema,
    descriptor: &MessageDescriptor,
    bytes: &[u8],
) -> Result<MessageValue> {
    let mut buf = bytes;
    decode_from(schema, descriptor, &mut buf)
}

fn decode_from(
    schema: &ServiceSchema,
    descriptor: &MessageDescriptor,
    buf: &mut &[u8],
) -> Result<MessageValue> {
    let context = descriptor.name.as_str();
    let mut message = MessageValue::new(descriptor.name.clone());

    while buf.has_remaining() {
        let (number, wire_type) =
            decode_key(buf).map_err(|e| LauncherError::decode(context, e))?;
        let Some(field) = descriptor.field_by_number(number) else {
            skip_field(wire_type, buf, context)?;
            continue;
        };
        let field_context = format!("{}.{}", context, field.name);

        if !field.is_repeated() {
            let value = decode_single(schema, &field.field_type, wire_type, buf, &field_context)?;
            message.set(field.clone(), value);
            continue;
        }

        let packed = wire_type == WireType::LengthDelimited
            && match &field.field_type {
                FieldType::Scalar(scalar) => scalar.is_packable(),
                FieldType::Enum { .. } => true,
                FieldType::Message { .. } => false,
            };

        let mut items = Vec::new();
        if packed {
            let mut chunk = read_length_delimited(buf, &field_context)?;
            while chunk.has_remaining() {
                items.push(decode_payload(schema, &field.field_type, &mut chunk, &field_context)?);
            }
        } else {
            items.push(decode_single(schema, &field.field_type, wire_type, buf, &field_context)?);
        }

        if items.is_empty() {
            continue;
        }
        if !message.contains_number(number) {
            message.set(field.clone(), Value::List(Vec::new()));
        }
        if let Some(Value::List(existing)) = message.get_by_number_mut(number) {
            existing.extend(items);
        }
    }

    if let Some(missing) = descriptor
        .fields
        .iter()
        .find(|f| f.is_required() && !message.contains_number(f.number))
    {
        return Err(LauncherError::decode(
            context,
            format!("missing required field `{}`", missing.name),
        ));
    }
    Ok(message)
}

fn decode_single(
    schema: &ServiceSchema,
    field_type: &FieldType,
    wire_type: WireType,
    buf: &mut &[u8],
    context: &str,
) -> Result<Value> {
    let expected = match field_type {
        FieldType::Scalar(scalar) => scalar_wire_type(*scalar),
        FieldType::Enum { .. } => WireType::Varint,
        FieldType::Message { .. } => WireType::LengthDelimited,
    };
    if wire_type != expected {
        return Err(LauncherError::decode(
            context,
            format!("wire type {:?} does not match declared {:?}", wire_type, expected),
        ));
    }
    decode_payload(schema, field_type, buf, context)
}

fn decode_payload(
    schema: &ServiceSchema,
    field_type: &FieldType,
    buf: &mut &[u8],
    context: &str,
) -> Result<Value> {
    match field_type {
        FieldType::Message { message } => {
            let descriptor = schema.message(message)?;
            let mut chunk = read_length_delimited(buf, context)?;
            decode_from(schema, descriptor, &mut chunk).map(Value::Message)
        }
        FieldType::Enum { name } => {
            let number = read_varint(buf, context)? as i32;
            let symbol = schema
                .enumeration(name)
                .and_then(|e| e.name_of(number))
                .map(str::to_string);
            Ok(Value::Enum { number, symbol })
        }
        FieldType::Scalar(scalar) => decode_scalar(*scalar, buf, context),
    }
}

fn decode_scalar(scalar: ScalarType, buf: &mut &[u8], context: &str) -> Result<Value> {
    Ok(match scalar {
        ScalarType::Bool => Value::Bool(read_varint(buf, context)? != 0),
        ScalarType::Int32 => Value::I32(read_varint(buf, context)? as i32),
        ScalarType::Int64 => Value::I64(read_varint(buf, context)? as i64),
        ScalarType::Uint32 => Value::U32(read_varint(buf, context)? as u32),
        ScalarType::Uint64 => Value::U64(read_varint(buf, context)?),
        ScalarType::Sint32 => Value::I32(unzigzag32(read_varint(buf, context)? as u32)),
        ScalarType::Sint64 => Value::I64(unzigzag64(read_varint(buf, context)?)),
        ScalarType::Fixed32 => {
            ensure_remaining(buf, 4, context)?;
            Value::U32(buf.get_u32_le())
        }
        ScalarType::Fixed64 => {
            ensure_remaining(buf, 8, context)?;
            Value::U64(buf.get_u64_le())
        }
        ScalarType::Sfixed32 => {
            ensure_remaining(buf, 4, context)?;
            Value::I32(buf.get_i32_le())
        }
        ScalarType::Sfixed64 => {
            ensure_remaining(buf, 8, context)?;
            Value::I64(buf.get_i64_le())
        }
        ScalarType::Float => {
            ensure_remaining(buf, 4, context)?;
            Value::F32(buf.get_f32_le())
        }
        ScalarType::Double => {
            ensure_remaining(buf, 8, context)?;
            Value::F64(buf.get_f64_le())
        }
        ScalarType::String => {
            let raw = read_length_delimited(buf, context)?;
            let text = std::str::from_utf8(raw)
                .map_err(|e| LauncherError::decode(context, e))?;
            Value::String(text.to_string())
        }
        ScalarType::Bytes => Value::Bytes(read_length_delimited(buf, context)?.to_vec()),
    })
}

fn read_varint(buf: &mut &[u8], context: &str) -> Result<u64> {
    decode_varint(buf).map_err(|e| LauncherError::decode(context, e))
}

fn ensure_remaining(buf: &&[u8], needed: usize, context: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(LauncherError::decode(
            context,
            format!("buffer underflow: need {} bytes, have {}", needed, buf.remaining()),
        ));
    }
    Ok(())
}

fn read_length_delimited<'a>(buf: &mut &'a [u8], context: &str) -> Result<&'a [u8]> {
    let len = read_varint(buf, context)?;
    let len = usize::try_from(len).map_err(|e| LauncherError::decode(context, e))?;
    ensure_remaining(buf, len, context)?;
    let slice: &'a [u8] = *buf;
    let (head, tail) = slice.split_at(len);
    *buf = tail;
    Ok(head)
}

fn skip_field(wire_type: WireType, buf: &mut &[u8], context: &str) -> Result<()> {
    match wire_type {
        WireType::Varint => {
            read_varint(buf, context)?;
        }
        WireType::SixtyFourBit => {
            ensure_remaining(buf, 8, context)?;
            buf.advance(8);
        }
        WireType::ThirtyTwoBit => {
            ensure_remaining(buf, 4, context)?;
            buf.advance(4);
        }
        WireType::LengthDelimited => {
            read_length_delimited(buf, context)?;
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(LauncherError::decode(context, "groups are not supported"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::converter::convert;
    use serde_json::{json, Value as Json};

    const SCHEMA: &str = r#"{
        "messages": {
            "Point": { "fields": [
                { "name": "x", "number": 1, "type": "sint64" },
                { "name": "y", "number": 2, "type": "sfixed32" }
            ] },
            "Config": { "fields": [
                { "name": "max_balance", "number": 1, "type": "uint64", "label": "required" },
                { "name": "limits", "number": 2, "type": "int32", "label": "repeated" },
                { "name": "origin", "number": 3, "type": { "message": "Point" } },
                { "name": "labels", "number": 4, "type": "string", "label": "repeated" },
                { "name": "enabled", "number": 5, "type": "bool" },
                { "name": "scale", "number": 6, "type": "float" },
                { "name": "checksum", "number": 7, "type": "fixed64" }
            ] }
        }
    }"#;

    fn schema() -> ServiceSchema {
        ServiceSchema::from_json("svc", "service", SCHEMA).unwrap()
    }

    fn convert_config(schema: &ServiceSchema, input: Json) -> MessageValue {
        let Json::Object(map) = input else {
            panic!("not an object")
        };
        convert(schema, schema.message("Config").unwrap(), &map).unwrap()
    }

    #[test]
    fn uint64_field_matches_reference_encoding() {
        let schema = schema();
        let value = convert_config(&schema, json!({ "max_balance": 1000 }));
        // Field 1, varint: key 0x08, 1000 = 0xe8 0x07.
        assert_eq!(encode_message(&value).unwrap(), vec![0x08, 0xe8, 0x07]);
    }

    #[test]
    fn zero_values_are_written() {
        let schema = schema();
        let value = convert_config(&schema, json!({ "max_balance": 0, "enabled": false }));
        assert_eq!(encode_message(&value).unwrap(), vec![0x08, 0x00, 0x28, 0x00]);
    }

    #[test]
    fn repeated_numerics_are_packed() {
        let schema = schema();
        let value = convert_config(&schema, json!({ "max_balance": 1, "limits": [1, 2, 3] }));
        assert_eq!(
            encode_message(&value).unwrap(),
            vec![0x08, 0x01, 0x12, 0x03, 0x01, 0x02, 0x03]
        );
    }

    #[test]
    fn negative_int32_uses_ten_byte_varint() {
        let schema = schema();
        let value = convert_config(&schema, json!({ "max_balance": 1, "limits": [-1] }));
        let bytes = encode_message(&value).unwrap();
        // key(1) + 1, key(2) + len(10) + 10 bytes of 0xff..0x01
        assert_eq!(bytes.len(), 2 + 2 + 10);
        assert_eq!(bytes[3], 10);
    }

    #[test]
    fn decode_recovers_converted_value() {
        let schema = schema();
        let input = json!({
            "max_balance": 18446744073709551615u64,
            "limits": [-7, 0, 42],
            "origin": { "x": -5, "y": -6 },
            "labels": ["a", "b"],
            "enabled": true,
            "scale": 0.5,
            "checksum": 99
        });
        let value = convert_config(&schema, input.clone());
        let bytes = encode_message(&value).unwrap();
        let decoded = decode_message(&schema, schema.message("Config").unwrap(), &bytes).unwrap();

        assert_eq!(decoded, value);
        assert_eq!(Json::Object(decoded.to_json()), input);
    }

    #[test]
    fn empty_repeated_fields_are_absent() {
        let schema = schema();
        let config = schema.message("Config").unwrap();
        let mut value = convert_config(&schema, json!({ "max_balance": 1, "limits": [], "labels": [] }));
        assert_eq!(encode_message(&value).unwrap(), vec![0x08, 0x01]);

        // Lists set directly follow the same rule.
        value.set(config.field_by_name("limits").unwrap().clone(), Value::List(Vec::new()));
        value.set(config.field_by_name("labels").unwrap().clone(), Value::List(Vec::new()));
        let bytes = encode_message(&value).unwrap();
        assert_eq!(bytes, vec![0x08, 0x01]);

        let decoded = decode_message(&schema, config, &bytes).unwrap();
        assert_eq!(Json::Object(decoded.to_json()), json!({ "max_balance": 1 }));
    }

    #[test]
    fn zero_length_packed_record_decodes_as_absent() {
        let schema = schema();
        let bytes = [0x08, 0x01, 0x12, 0x00];
        let decoded = decode_message(&schema, schema.message("Config").unwrap(), &bytes).unwrap();
        assert!(decoded.get("limits").is_none());
        assert_eq!(decoded.len(), 1);
    }

    fn mismatch_path(err: LauncherError) -> String {
        match err {
            LauncherError::SchemaMismatch { path, .. } => path,
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn mistyped_scalar_fails_encode() {
        let schema = schema();
        let config = schema.message("Config").unwrap();
        let mut value = MessageValue::new("Config");
        value.set(
            config.field_by_name("max_balance").unwrap().clone(),
            Value::String("oops".to_string()),
        );
        assert_eq!(mismatch_path(encode_message(&value).unwrap_err()), "max_balance");
    }

    #[test]
    fn mistyped_nested_and_repeated_values_fail_encode() {
        let schema = schema();
        let config = schema.message("Config").unwrap();
        let point = schema.message("Point").unwrap();

        let mut origin = MessageValue::new("Point");
        origin.set(point.field_by_name("x").unwrap().clone(), Value::U64(5));
        let mut value = convert_config(&schema, json!({ "max_balance": 1 }));
        value.set(config.field_by_name("origin").unwrap().clone(), Value::Message(origin));
        assert_eq!(mismatch_path(encode_message(&value).unwrap_err()), "origin.x");

        let mut value = convert_config(&schema, json!({ "max_balance": 1 }));
        value.set(
            config.field_by_name("limits").unwrap().clone(),
            Value::List(vec![Value::I32(1), Value::Bool(true)]),
        );
        assert_eq!(mismatch_path(encode_message(&value).unwrap_err()), "limits[1]");

        let mut value = convert_config(&schema, json!({ "max_balance": 1 }));
        value.set(config.field_by_name("origin").unwrap().clone(), Value::U32(1));
        assert_eq!(mismatch_path(encode_message(&value).unwrap_err()), "origin");

        let mut value = convert_config(&schema, json!({ "max_balance": 1 }));
        value.set(config.field_by_name("limits").unwrap().clone(), Value::I32(1));
        assert_eq!(mismatch_path(encode_message(&value).unwrap_err()), "limits");
    }

    #[test]
    fn unpacked_repeated_is_accepted() {
        let schema = schema();
        // max_balance = 1, limits = 4 and 5 written as two separate varint fields.
        let bytes = [0x08, 0x01, 0x10, 0x04, 0x10, 0x05];
        let decoded = decode_message(&schema, schema.message("Config").unwrap(), &bytes).unwrap();
        assert_eq!(
            decoded.get("limits"),
            Some(&Value::List(vec![Value::I32(4), Value::I32(5)]))
        );
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let schema = schema();
        // Field 15 (varint 7) precedes max_balance = 2.
        let bytes = [0x78, 0x07, 0x08, 0x02];
        let decoded = decode_message(&schema, schema.message("Config").unwrap(), &bytes).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get("max_balance"), Some(&Value::U64(2)));
    }

    #[test]
    fn missing_required_field_fails_decode() {
        let schema = schema();
        let err = decode_message(&schema, schema.message("Config").unwrap(), &[0x28, 0x01]).unwrap_err();
        assert!(matches!(err, LauncherError::Decode { .. }));
    }

    #[test]
    fn truncated_input_fails_decode() {
        let schema = schema();
        let err = decode_message(&schema, schema.message("Config").unwrap(), &[0x08, 0xe8]).unwrap_err();
        assert!(matches!(err, LauncherError::Decode { .. }));
    }

    #[test]
    fn zigzag_roundtrip_extremes() {
        for v in [0, -1, 1, i32::MIN, i32::MAX] {
            assert_eq!(unzigzag32(zigzag32(v)), v);
        }
        for v in [0, -1, 1, i64::MIN, i64::MAX] {
            assert_eq!(unzigzag64(zigzag64(v)), v);
        }
    }
}
