//! Message, field and enum descriptors, and the schema-file format they are
//! loaded from.
//!
//! A schema module is a JSON document listing the messages a service
//! publishes:
//!
//! ```json
//! {
//!   "package": "exonum.examples.cryptocurrency",
//!   "messages": {
//!     "Config": { "fields": [
//!       { "name": "max_balance", "number": 1, "type": "uint64", "label": "required" }
//!     ] },
//!     "TxTransfer": { "fields": [
//!       { "name": "to", "number": 1, "type": { "message": "PublicKey" } },
//!       { "name": "amount", "number": 2, "type": "uint64" }
//!     ] }
//!   },
//!   "enums": {}
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::TYPE_URL_PREFIX;
use crate::error::{LauncherError, Result};

/// Largest field number protobuf allows.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Protobuf scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Float,
    Double,
    String,
    Bytes,
}

impl ScalarType {
    /// Whether repeated values of this type are written packed.
    pub fn is_packable(self) -> bool {
        !matches!(self, ScalarType::String | ScalarType::Bytes)
    }

    /// Name as written in schema files.
    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }
}

/// Declared type of a field: a scalar, a message from the same module, or
/// an enum from the same module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldType {
    Scalar(ScalarType),
    Message {
        message: String,
    },
    Enum {
        #[serde(rename = "enum")]
        name: String,
    },
}

/// Cardinality of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    #[default]
    Optional,
    Required,
    Repeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: Label,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn is_required(&self) -> bool {
        self.label == Label::Required
    }
}

/// Definition of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Filled in from the key of the `messages` map at load time.
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }
}

/// Definition of an enum: symbolic names to numeric values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    #[serde(skip)]
    pub name: String,
    pub values: BTreeMap<String, i32>,
}

impl EnumDescriptor {
    pub fn value_of(&self, symbol: &str) -> Option<i32> {
        self.values.get(symbol).copied()
    }

    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| **v == value)
            .map(|(k, _)| k.as_str())
    }
}

/// On-disk layout of a schema module.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default)]
    package: String,
    #[serde(default)]
    messages: BTreeMap<String, MessageDescriptor>,
    #[serde(default)]
    enums: BTreeMap<String, EnumDescriptor>,
}

// ---------------------------------------------------------------------------
// ServiceSchema
// ---------------------------------------------------------------------------

/// The full set of message definitions one service module publishes.
///
/// Immutable once constructed; shared across the pipeline behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSchema {
    service: String,
    module: String,
    package: String,
    messages: BTreeMap<String, MessageDescriptor>,
    enums: BTreeMap<String, EnumDescriptor>,
}

impl ServiceSchema {
    /// Parses and validates a schema module.
    pub fn from_json(service: &str, module: &str, json: &str) -> Result<Self> {
        let origin = format!("{}/{}", service, module);
        let file: SchemaFile = serde_json::from_str(json).map_err(|e| {
            LauncherError::InvalidSchema {
                origin: origin.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut messages = file.messages;
        for (name, message) in messages.iter_mut() {
            message.name = name.clone();
        }
        let mut enums = file.enums;
        for (name, enumeration) in enums.iter_mut() {
            enumeration.name = name.clone();
        }

        let schema = Self {
            service: service.to_string(),
            module: module.to_string(),
            package: file.package,
            messages,
            enums,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Checks field numbering, name uniqueness and type references.
    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| LauncherError::InvalidSchema {
            origin: format!("{}/{}", self.service, self.module),
            reason,
        };

        for message in self.messages.values() {
            let mut names = HashSet::new();
            let mut numbers = HashSet::new();
            for field in &message.fields {
                if field.number == 0 || field.number > MAX_FIELD_NUMBER {
                    return Err(invalid(format!(
                        "{}.{}: field number {} out of range",
                        message.name, field.name, field.number
                    )));
                }
                if !names.insert(field.name.as_str()) {
                    return Err(invalid(format!(
                        "{}: duplicate field name `{}`",
                        message.name, field.name
                    )));
                }
                if !numbers.insert(field.number) {
                    return Err(invalid(format!(
                        "{}: duplicate field number {}",
                        message.name, field.number
                    )));
                }
                match &field.field_type {
                    FieldType::Message { message: target } if !self.messages.contains_key(target) => {
                        return Err(invalid(format!(
                            "{}.{}: unknown message type `{}`",
                            message.name, field.name, target
                        )));
                    }
                    FieldType::Enum { name } if !self.enums.contains_key(name) => {
                        return Err(invalid(format!(
                            "{}.{}: unknown enum type `{}`",
                            message.name, field.name, name
                        )));
                    }
                    _ => {}
                }
            }
        }

        for enumeration in self.enums.values() {
            if enumeration.values.is_empty() {
                return Err(invalid(format!("enum {} has no values", enumeration.name)));
            }
        }
        Ok(())
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Looks up a message by name, failing with `MessageNotFound`.
    pub fn message(&self, name: &str) -> Result<&MessageDescriptor> {
        self.messages
            .get(name)
            .ok_or_else(|| LauncherError::MessageNotFound {
                service: self.service.clone(),
                module: self.module.clone(),
                message: name.to_string(),
            })
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Fully-qualified protobuf name of a message in this module.
    pub fn full_name(&self, message: &str) -> String {
        if self.package.is_empty() {
            message.to_string()
        } else {
            format!("{}.{}", self.package, message)
        }
    }

    /// Type URL used when packing a message of this module into a
    /// polymorphic container.
    pub fn type_url(&self, message: &str) -> String {
        format!("{}{}", TYPE_URL_PREFIX, self.full_name(message))
    }
}
