use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::client_storage;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = client_storage)]
#[diesel(primary_key(storage_key))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoredEntryRow {
    pub storage_key: String,
    pub payload: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = client_storage)]
pub struct NewStoredEntryRow<'a> {
    pub storage_key: &'a str,
    pub payload: &'a [u8],
}
