//! # Schema Registry
//!
//! Services publish their message types (a `Config` used as constructor
//! data, plus any custom transaction types) as schema modules. The
//! registry maps `(service, module)` to a parsed [`ServiceSchema`]; the
//! converter and the envelope builder only ever see descriptors obtained
//! through it.

pub mod descriptor;
pub mod registry;

pub use descriptor::{
    EnumDescriptor, FieldDescriptor, FieldType, Label, MessageDescriptor, ScalarType,
    ServiceSchema,
};
pub use registry::{SchemaKey, SchemaRegistry};
