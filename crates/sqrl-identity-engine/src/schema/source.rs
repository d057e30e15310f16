use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::SchemaError;

/// Schema JSON for a block type with no registered schema. Every block type
/// decodes with it, so its bytes always survive a round trip.
pub const UNKNOWN_BLOCK_SCHEMA: &str = include_str!("../../blockdef/unknown.json");

const BUILTIN_SCHEMAS: &[(u16, &str)] = &[
    (1, include_str!("../../blockdef/1.json")),
    (2, include_str!("../../blockdef/2.json")),
    (3, include_str!("../../blockdef/3.json")),
];

/// Where block schemas come from.
///
/// Lookups are synchronous and never retried. A source that has nothing for a
/// block type returns `None`, and the resolver falls back to the unknown-block
/// schema.
pub trait SchemaSource {
    /// Schema JSON for a block type, if one is registered
    fn fetch(&self, block_type: u16) -> Option<Vec<u8>>;

    /// Schema JSON for blocks without a registered schema.
    ///
    /// Nothing can be decoded without it, so failure here is fatal.
    fn fetch_unknown_fallback(&self) -> Result<Vec<u8>, SchemaError>;

    /// Block types this source can describe, in ascending order
    fn known_types(&self) -> Vec<u16> {
        Vec::new()
    }
}

impl<T: SchemaSource + ?Sized> SchemaSource for Box<T> {
    fn fetch(&self, block_type: u16) -> Option<Vec<u8>> {
        (**self).fetch(block_type)
    }

    fn fetch_unknown_fallback(&self) -> Result<Vec<u8>, SchemaError> {
        (**self).fetch_unknown_fallback()
    }

    fn known_types(&self) -> Vec<u16> {
        (**self).known_types()
    }
}

/// The standard SQRL block types, compiled into the library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSchemaSource;

impl SchemaSource for BuiltinSchemaSource {
    fn fetch(&self, block_type: u16) -> Option<Vec<u8>> {
        BUILTIN_SCHEMAS
            .iter()
            .find(|(known, _)| *known == block_type)
            .map(|(_, json)| json.as_bytes().to_vec())
    }

    fn fetch_unknown_fallback(&self) -> Result<Vec<u8>, SchemaError> {
        Ok(UNKNOWN_BLOCK_SCHEMA.as_bytes().to_vec())
    }

    fn known_types(&self) -> Vec<u16> {
        BUILTIN_SCHEMAS.iter().map(|(block_type, _)| *block_type).collect()
    }
}

/// Schemas stored as `<dir>/<block type>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySchemaSource {
    dir: PathBuf,
    fallback: Option<PathBuf>,
}

impl DirectorySchemaSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fallback: None,
        }
    }

    /// Read the unknown-block schema from a file instead of the bundled one
    pub fn with_fallback_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback = Some(path.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn schema_path(&self, block_type: u16) -> PathBuf {
        self.dir.join(format!("{block_type}.json"))
    }
}

impl SchemaSource for DirectorySchemaSource {
    fn fetch(&self, block_type: u16) -> Option<Vec<u8>> {
        let path = self.schema_path(block_type);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Cannot read block schema {}: {e}", path.display());
                None
            }
        }
    }

    fn fetch_unknown_fallback(&self) -> Result<Vec<u8>, SchemaError> {
        match &self.fallback {
            Some(path) => fs::read(path).map_err(|e| {
                SchemaError::FallbackUnavailable(format!("{}: {e}", path.display()))
            }),
            None => Ok(UNKNOWN_BLOCK_SCHEMA.as_bytes().to_vec()),
        }
    }

    fn known_types(&self) -> Vec<u16> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut types: Vec<u16> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem()?.to_str()?.parse().ok())
            .collect();
        types.sort_unstable();
        types
    }
}

/// Consults `primary` first and `secondary` for anything it lacks.
///
/// The unknown-block schema always comes from `primary`.
#[derive(Debug, Clone)]
pub struct LayeredSchemaSource<P, S> {
    primary: P,
    secondary: S,
}

impl<P: SchemaSource, S: SchemaSource> LayeredSchemaSource<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: SchemaSource, S: SchemaSource> SchemaSource for LayeredSchemaSource<P, S> {
    fn fetch(&self, block_type: u16) -> Option<Vec<u8>> {
        self.primary
            .fetch(block_type)
            .or_else(|| self.secondary.fetch(block_type))
    }

    fn fetch_unknown_fallback(&self) -> Result<Vec<u8>, SchemaError> {
        self.primary.fetch_unknown_fallback()
    }

    fn known_types(&self) -> Vec<u16> {
        let mut types = self.primary.known_types();
        types.extend(self.secondary.known_types());
        types.sort_unstable();
        types.dedup();
        types
    }
}

/// Schemas held in memory, registered by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct MemorySchemaSource {
    schemas: HashMap<u16, Vec<u8>>,
    fallback: Option<Vec<u8>>,
}

impl MemorySchemaSource {
    /// An empty source with no fallback schema
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty source using the bundled unknown-block schema
    pub fn with_builtin_fallback() -> Self {
        Self::new().with_fallback(UNKNOWN_BLOCK_SCHEMA)
    }

    pub fn with_schema(mut self, block_type: u16, json: impl Into<Vec<u8>>) -> Self {
        self.schemas.insert(block_type, json.into());
        self
    }

    pub fn with_fallback(mut self, json: impl Into<Vec<u8>>) -> Self {
        self.fallback = Some(json.into());
        self
    }
}

impl SchemaSource for MemorySchemaSource {
    fn fetch(&self, block_type: u16) -> Option<Vec<u8>> {
        self.schemas.get(&block_type).cloned()
    }

    fn fetch_unknown_fallback(&self) -> Result<Vec<u8>, SchemaError> {
        self.fallback.clone().ok_or_else(|| {
            SchemaError::FallbackUnavailable("no unknown-block schema registered".to_string())
        })
    }

    fn known_types(&self) -> Vec<u16> {
        let mut types: Vec<u16> = self.schemas.keys().copied().collect();
        types.sort_unstable();
        types
    }
}
