//! Pack/unpack contract for the polymorphic [`Any`] container.
//!
//! A container carries a type URL and the serialized bytes of one message.
//! Statically known messages implement [`TypedMessage`]; dynamically typed
//! values are packed with the type URL their schema module assigns.

use prost::Message;

use super::messages::{Any, RustArtifactSpec};
use crate::config::{RUST_ARTIFACT_SPEC_TYPE, TYPE_URL_PREFIX};
use crate::convert::{decode_message, encode_message, MessageValue};
use crate::error::{LauncherError, Result};
use crate::schema::ServiceSchema;

/// A statically declared message with a fixed fully-qualified name.
pub trait TypedMessage: Message + Default + Sized {
    const TYPE_NAME: &'static str;

    fn type_url() -> String {
        format!("{}{}", TYPE_URL_PREFIX, Self::TYPE_NAME)
    }
}

impl TypedMessage for RustArtifactSpec {
    const TYPE_NAME: &'static str = RUST_ARTIFACT_SPEC_TYPE;
}

impl Any {
    pub fn pack<M: TypedMessage>(message: &M) -> Self {
        Self {
            type_url: M::type_url(),
            value: message.encode_to_vec(),
        }
    }

    /// Decodes the payload as `M`, checking the type URL first.
    pub fn unpack<M: TypedMessage>(&self) -> Result<M> {
        let expected = M::type_url();
        if self.type_url != expected {
            return Err(LauncherError::UnexpectedTypeUrl {
                expected,
                actual: self.type_url.clone(),
            });
        }
        M::decode(self.value.as_slice()).map_err(|e| LauncherError::decode(M::TYPE_NAME, e))
    }

    /// Packs a converted value under the type URL of its schema module.
    pub fn pack_dynamic(schema: &ServiceSchema, value: &MessageValue) -> Result<Self> {
        Ok(Self {
            type_url: schema.type_url(value.type_name()),
            value: encode_message(value)?,
        })
    }

    /// Decodes the payload through `schema`, using the type URL to pick the
    /// message.
    pub fn unpack_dynamic(&self, schema: &ServiceSchema) -> Result<MessageValue> {
        let full_name = self.type_name();
        let message = if schema.package().is_empty() {
            Some(full_name)
        } else {
            full_name
                .strip_prefix(schema.package())
                .and_then(|rest| rest.strip_prefix('.'))
        };
        let descriptor = message
            .and_then(|name| schema.message(name).ok())
            .ok_or_else(|| LauncherError::UnexpectedTypeUrl {
                expected: format!("{}{}.*", TYPE_URL_PREFIX, schema.package()),
                actual: self.type_url.clone(),
            })?;
        decode_message(schema, descriptor, &self.value)
    }

    /// Fully-qualified message name: everything after the last `/`.
    pub fn type_name(&self) -> &str {
        self.type_url
            .rsplit_once('/')
            .map_or(self.type_url.as_str(), |(_, name)| name)
    }
}
