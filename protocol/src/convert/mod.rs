//! # Value Converter
//!
//! Turns untyped JSON field mappings into structured values of a resolved
//! message descriptor, and moves those values to and from protobuf bytes.
//!
//! ```text
//! value.rs    : MessageValue / Value tree
//! converter.rs: JSON → MessageValue, schema-driven, path-aware errors
//! codec.rs    : MessageValue ⇄ canonical protobuf bytes
//! ```

pub mod codec;
pub mod converter;
pub mod value;

pub use codec::{decode_message, encode_message};
pub use converter::{convert, ValueConverter};
pub use value::{FieldValue, MessageValue, Value};
