//! Transaction factory: one entry point per transaction kind.
//!
//! Each build runs the same pipeline: resolve the service schema (init and
//! custom calls only), convert the untyped input, assemble the envelope,
//! sign it. Any stage may fail; a failure is returned at once and no
//! partial transaction escapes.

use crate::config::CONFIG_MESSAGE_NAME;
use crate::convert::ValueConverter;
use crate::crypto::Keypair;
use crate::envelope::{custom_envelope, deploy_envelope, init_envelope};
use crate::error::Result;
use crate::schema::SchemaRegistry;

use super::request::{CustomRequest, DeployRequest, InitRequest, TransactionRequest};
use super::signing::{sign_with_keypair, SignedTransaction};

/// Builds signed transactions against a schema registry.
///
/// The factory holds no key material. The keypair is borrowed for the
/// duration of a single build.
///
/// # Examples
///
/// ```
/// use exonum_launcher::crypto::Keypair;
/// use exonum_launcher::schema::SchemaRegistry;
/// use exonum_launcher::transaction::{DeployRequest, TransactionFactory};
///
/// let registry = SchemaRegistry::new();
/// let factory = TransactionFactory::new(&registry);
/// let keypair = Keypair::generate();
///
/// let tx = factory
///     .build_deploy(&DeployRequest::new("cryptocurrency", "1.0.0"), &keypair)
///     .unwrap();
/// assert!(!tx.as_bytes().is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TransactionFactory<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> TransactionFactory<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r SchemaRegistry {
        self.registry
    }

    /// Builds a signed request to register an artifact with the Rust
    /// runtime. Needs no schema.
    pub fn build_deploy(
        &self,
        request: &DeployRequest,
        keypair: &Keypair,
    ) -> Result<SignedTransaction> {
        let artifact = &request.artifact;
        let message = deploy_envelope(&artifact.name, &artifact.version);
        let signed = sign_with_keypair(&message, keypair);

        tracing::debug!(
            artifact = %artifact.name,
            version = %artifact.version,
            hash = %signed.hash_hex(),
            "deploy transaction built"
        );
        Ok(signed)
    }

    /// Builds a signed request to start a service instance, converting the
    /// config through the service's `Config` message.
    pub fn build_init(&self, request: &InitRequest, keypair: &Keypair) -> Result<SignedTransaction> {
        let artifact = &request.artifact;
        let schema = self.registry.resolve(&artifact.name, &artifact.module)?;
        let descriptor = schema.message(CONFIG_MESSAGE_NAME)?;
        let config = ValueConverter::new(&schema).convert(descriptor, &request.config)?;

        let message = init_envelope(
            &artifact.name,
            &artifact.version,
            &request.instance_name,
            &schema,
            &config,
        )?;
        let signed = sign_with_keypair(&message, keypair);

        tracing::debug!(
            artifact = %artifact.name,
            instance = %request.instance_name,
            hash = %signed.hash_hex(),
            "init transaction built"
        );
        Ok(signed)
    }

    /// Builds a signed call to an arbitrary method of a running instance.
    ///
    /// The payload is the converted request itself; no `Any` wrapping.
    pub fn build_custom_call(
        &self,
        request: &CustomRequest,
        keypair: &Keypair,
    ) -> Result<SignedTransaction> {
        let artifact = &request.artifact;
        let schema = self.registry.resolve(&artifact.name, &artifact.module)?;
        let descriptor = schema.message(&request.message_type)?;
        let value = ValueConverter::new(&schema).convert(descriptor, &request.data)?;

        let message = custom_envelope(request.service_id, request.method_id, &value)?;
        let signed = sign_with_keypair(&message, keypair);

        tracing::debug!(
            artifact = %artifact.name,
            service_id = request.service_id,
            method_id = request.method_id,
            message = %request.message_type,
            hash = %signed.hash_hex(),
            "custom call built"
        );
        Ok(signed)
    }

    /// Dispatches on the request kind.
    pub fn build(&self, request: &TransactionRequest, keypair: &Keypair) -> Result<SignedTransaction> {
        match request {
            TransactionRequest::Deploy(r) => self.build_deploy(r, keypair),
            TransactionRequest::Init(r) => self.build_init(r, keypair),
            TransactionRequest::Custom(r) => self.build_custom_call(r, keypair),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use crate::schema::ServiceSchema;
    use crate::transaction::request::{CallArtifact, ServiceArtifact};
    use crate::transaction::verification::parse_signed_transaction;
    use serde_json::{json, Map, Value as Json};

    const CRYPTOCURRENCY: &str = r#"{
        "package": "exonum.examples.cryptocurrency",
        "messages": {
            "Config": { "fields": [
                { "name": "max_balance", "number": 1, "type": "uint64" }
            ] },
            "TxTransfer": { "fields": [
                { "name": "to", "number": 1, "type": "bytes" },
                { "name": "amount", "number": 2, "type": "uint64" },
                { "name": "seed", "number": 3, "type": "uint64" }
            ] }
        }
    }"#;

    fn registry() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        registry.register(
            ServiceSchema::from_json("cryptocurrency", "service", CRYPTOCURRENCY).unwrap(),
        );
        registry
    }

    fn object(value: Json) -> Map<String, Json> {
        match value {
            Json::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn init_request(config: Json) -> InitRequest {
        InitRequest {
            artifact: ServiceArtifact {
                name: "cryptocurrency".to_string(),
                version: "1.0.0".to_string(),
                module: "service".to_string(),
            },
            instance_name: "xnm-token".to_string(),
            config: object(config),
        }
    }

    #[test]
    fn init_round_trips_config() {
        let registry = registry();
        let factory = TransactionFactory::new(&registry);
        let kp = Keypair::from_seed(&[1u8; 32]);

        let signed = factory
            .build_init(&init_request(json!({ "max_balance": 1000 })), &kp)
            .unwrap();
        let parsed = parse_signed_transaction(signed.as_bytes()).unwrap();
        assert!(parsed.is_init());
        assert_eq!(parsed.init_tx().unwrap().instance_name, "xnm-token");

        let schema = registry.resolve("cryptocurrency", "service").unwrap();
        let config = parsed.init_config(&schema).unwrap();
        assert_eq!(Json::Object(config.to_json()), json!({ "max_balance": 1000 }));
    }

    #[test]
    fn init_rejects_string_for_integer() {
        let registry = registry();
        let factory = TransactionFactory::new(&registry);
        let err = factory
            .build_init(
                &init_request(json!({ "max_balance": "1000" })),
                &Keypair::generate(),
            )
            .unwrap_err();
        assert!(matches!(err, LauncherError::SchemaMismatch { ref path, .. } if path == "max_balance"));
    }

    #[test]
    fn custom_call_payload_is_bare_request() {
        let registry = registry();
        let factory = TransactionFactory::new(&registry);
        let request = CustomRequest {
            artifact: CallArtifact {
                name: "cryptocurrency".to_string(),
                module: "service".to_string(),
            },
            service_id: 1024,
            method_id: 0,
            message_type: "TxTransfer".to_string(),
            data: object(json!({ "to": "qrs=", "amount": 5, "seed": 1 })),
        };

        let signed = factory
            .build_custom_call(&request, &Keypair::from_seed(&[2u8; 32]))
            .unwrap();
        let parsed = parse_signed_transaction(signed.as_bytes()).unwrap();
        assert_eq!(parsed.call_info.instance_id, 1024);
        assert_eq!(parsed.call_info.method_id, 0);
        // to = [0xaa, 0xbb], amount = 5, seed = 1
        assert_eq!(
            parsed.payload,
            vec![0x0a, 0x02, 0xaa, 0xbb, 0x10, 0x05, 0x18, 0x01]
        );
    }

    #[test]
    fn unknown_module_is_schema_not_found() {
        let registry = registry();
        let factory = TransactionFactory::new(&registry);
        let mut request = init_request(json!({}));
        request.artifact.module = "missing".to_string();

        let err = factory.build_init(&request, &Keypair::generate()).unwrap_err();
        assert!(matches!(err, LauncherError::SchemaNotFound { .. }));
    }

    #[test]
    fn build_dispatches_on_kind() {
        let registry = registry();
        let factory = TransactionFactory::new(&registry);
        let kp = Keypair::from_seed(&[5u8; 32]);
        let deploy = DeployRequest::new("cryptocurrency", "1.0.0");

        let direct = factory.build_deploy(&deploy, &kp).unwrap();
        let dispatched = factory
            .build(&TransactionRequest::Deploy(deploy), &kp)
            .unwrap();
        assert_eq!(direct, dispatched);
    }
}
