use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use diesel::dsl::now;
use diesel::prelude::*;
use diesel::upsert::excluded;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::KeyValueStore;
use crate::schema::client_storage;

use super::models::{NewStoredEntryRow, StoredEntryRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

// ── Postgres ─────────────────────────────────────────────────────────────────

/// Key-value entries in the `client_storage` table. `put` overwrites.
pub struct DieselKeyValueStore {
    pool: DbPool,
}

impl DieselKeyValueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl KeyValueStore for DieselKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = client_storage::table
            .find(key)
            .select(StoredEntryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(|r| r.payload))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(client_storage::table)
            .values(&NewStoredEntryRow {
                storage_key: key,
                payload: value,
            })
            .on_conflict(client_storage::storage_key)
            .do_update()
            .set((
                client_storage::payload.eq(excluded(client_storage::payload)),
                client_storage::updated_at.eq(now),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}

// ── In memory ────────────────────────────────────────────────────────────────

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
