//! Runtime registry of service schema modules.
//!
//! Schemas are addressed by `(service, module)`. They enter the registry in
//! one of two ways:
//!
//! - explicitly, via [`SchemaRegistry::register`] or an eager
//!   [`SchemaRegistry::load_search_path`] at process start;
//! - lazily, the first time [`SchemaRegistry::resolve`] misses and a search
//!   path is configured. The file is read under the write lock, so each key
//!   is populated at most once even under concurrent first access.
//!
//! The search path layout is `<root>/<service>/<module>.json`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use super::descriptor::ServiceSchema;
use crate::config::SCHEMA_FILE_EXTENSION;
use crate::error::{LauncherError, Result};

/// Registry key: artifact (service) name and schema module name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey {
    pub service: String,
    pub module: String,
}

impl SchemaKey {
    pub fn new(service: &str, module: &str) -> Self {
        Self {
            service: service.to_string(),
            module: module.to_string(),
        }
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.module)
    }
}

/// Thread-safe store of [`ServiceSchema`]s.
#[derive(Default)]
pub struct SchemaRegistry {
    search_path: Option<PathBuf>,
    schemas: RwLock<HashMap<SchemaKey, Arc<ServiceSchema>>>,
}

impl SchemaRegistry {
    /// An empty registry with no search path. Only explicitly registered
    /// schemas resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry that lazily loads missing schemas from `root`.
    pub fn with_search_path(root: impl Into<PathBuf>) -> Self {
        Self {
            search_path: Some(root.into()),
            schemas: RwLock::new(HashMap::new()),
        }
    }

    pub fn search_path(&self) -> Option<&Path> {
        self.search_path.as_deref()
    }

    /// Registers a schema, replacing any previous one for the same key.
    /// Returns the replaced schema, if any.
    pub fn register(&self, schema: ServiceSchema) -> Option<Arc<ServiceSchema>> {
        let key = SchemaKey::new(schema.service(), schema.module());
        tracing::debug!(schema = %key, "registering schema");
        self.schemas.write().insert(key, Arc::new(schema))
    }

    /// Eagerly registers every schema module found under the search path.
    ///
    /// Files without the schema extension are skipped. A module that fails
    /// to parse aborts the load. Returns the number of modules registered.
    pub fn load_search_path(&self) -> Result<usize> {
        let Some(root) = self.search_path.as_deref() else {
            return Ok(0);
        };

        let mut loaded = 0;
        for service_entry in read_dir(root)? {
            let service_dir = service_entry.path();
            if !service_dir.is_dir() {
                continue;
            }
            let Some(service) = file_name(&service_dir) else {
                continue;
            };

            for module_entry in read_dir(&service_dir)? {
                let module_path = module_entry.path();
                if module_path.extension().and_then(|e| e.to_str()) != Some(SCHEMA_FILE_EXTENSION)
                {
                    tracing::warn!(path = %module_path.display(), "skipping non-schema file");
                    continue;
                }
                let Some(module) = module_path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                let schema = load_file(&service, module, &module_path)?;
                self.register(schema);
                loaded += 1;
            }
        }

        tracing::info!(root = %root.display(), modules = loaded, "schema search path loaded");
        Ok(loaded)
    }

    /// Resolves the schema module published by `service` under `module`.
    ///
    /// Fails with [`LauncherError::SchemaNotFound`] when nothing is registered
    /// and nothing is loadable for the pair.
    pub fn resolve(&self, service: &str, module: &str) -> Result<Arc<ServiceSchema>> {
        let key = SchemaKey::new(service, module);
        if let Some(schema) = self.schemas.read().get(&key) {
            return Ok(Arc::clone(schema));
        }

        let not_found = || LauncherError::SchemaNotFound {
            service: service.to_string(),
            module: module.to_string(),
        };

        let root = self.search_path.as_deref().ok_or_else(not_found)?;
        if !is_plain_segment(service) || !is_plain_segment(module) {
            return Err(not_found());
        }

        let mut schemas = self.schemas.write();
        // Another caller may have populated the key between the two locks.
        if let Some(schema) = schemas.get(&key) {
            return Ok(Arc::clone(schema));
        }

        let path = root
            .join(service)
            .join(format!("{}.{}", module, SCHEMA_FILE_EXTENSION));
        if !path.is_file() {
            return Err(not_found());
        }

        let schema = Arc::new(load_file(service, module, &path)?);
        tracing::debug!(schema = %key, path = %path.display(), "schema loaded on demand");
        schemas.insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    /// Keys of all currently registered schemas, sorted.
    pub fn registered(&self) -> Vec<SchemaKey> {
        let mut keys: Vec<_> = self.schemas.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("search_path", &self.search_path)
            .field("schemas", &self.registered())
            .finish()
    }
}

/// A name that maps to exactly one path component.
fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

fn read_dir(path: &Path) -> Result<Vec<std::fs::DirEntry>> {
    let io_err = |source| LauncherError::SchemaIo {
        path: path.to_path_buf(),
        source,
    };
    let mut entries = std::fs::read_dir(path)
        .map_err(io_err)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_err)?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

fn load_file(service: &str, module: &str, path: &Path) -> Result<ServiceSchema> {
    let raw = std::fs::read_to_string(path).map_err(|source| LauncherError::SchemaIo {
        path: path.to_path_buf(),
        source,
    })?;
    ServiceSchema::from_json(service, module, &raw)
}
