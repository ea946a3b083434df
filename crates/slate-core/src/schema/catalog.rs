//! Per-type schema cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::Schema;
use crate::dialect::Dialect;
use crate::entity::Entity;
use crate::error::SchemaError;

/// Derives schemas through one dialect and caches them by entity type.
///
/// The cache is shared by every session of an engine. Parsed schemas are
/// immutable `Arc` snapshots, so readers never block each other once a type
/// has been seen.
pub struct SchemaCatalog {
    dialect: Arc<dyn Dialect>,
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl SchemaCatalog {
    /// Creates an empty catalog for `dialect`.
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the dialect used to resolve column types.
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    /// Returns the schema of `E`, parsing it on first use.
    pub fn schema<E: Entity>(&self) -> Result<Arc<Schema>, SchemaError> {
        let key = TypeId::of::<E>();
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(schema));
        }

        let parsed = Arc::new(Schema::parse::<E>(self.dialect.as_ref())?);
        debug!(
            entity = E::DESCRIPTOR.name,
            table = parsed.name(),
            columns = parsed.fields().len(),
            "parsed entity schema"
        );

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        // Another session may have parsed the same type meanwhile; keep the first.
        Ok(Arc::clone(schemas.entry(key).or_insert(parsed)))
    }

    /// Returns the number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether no schema has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("dialect", &self.dialect.name())
            .field("schemas", &self.len())
            .finish()
    }
}
