//! Durable storage for the store snapshot
//!
//! The durable slice of the store is written as one JSON record under a
//! fixed key. SQLite keeps it between runs; `MemoryStorage` stands in for
//! tests. Both go through the same serialization, so a reload in a test
//! behaves like a reload in production.


use std::sync::{Arc, Mutex};

use diesel::prelude::*;
use diesel::result::Error as DieselError;
use log::trace;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::{ConnectionPool, PooledConnection};
use crate::db::schema::settings;
use crate::error::Result;
use crate::store::DurableState;


/// Key under which the durable slice is stored
pub const SNAPSHOT_KEY: &str = "camviewer-auth";


/// Reads and writes the durable store snapshot
pub trait SnapshotStorage: Send + Sync {

    /// Reads the snapshot, or `None` if none was ever written
    fn load(&self) -> Result<Option<DurableState>>;

    /// Replaces the stored snapshot
    fn save(&self, state: &DurableState) -> Result<()>;
}


/// Serialized form of a stored value
#[derive(Insertable, Queryable)]
#[table_name = "settings"]
struct Record {
    name: String,
    value: String,
}


/// Snapshot storage backed by the SQLite `settings` table
pub struct SqliteStorage {
    pool: ConnectionPool,
}

impl SqliteStorage {

    pub fn new(pool: ConnectionPool) -> Self {
        SqliteStorage { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Retrieves the value stored under `name`
    ///
    /// If nothing has ever been stored under `name`, `None` is returned. If
    /// the stored data cannot be deserialized as `T`, an error is propagated
    /// from `serde_json`.
    fn get_value<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {

        trace!("retrieving \"{}\" from database", name);
        let conn = self.conn()?;
        let res = settings::table.find(name)
            .get_result(&conn);

        let record: Record = match res {

            Err(DieselError::NotFound) => {
                trace!("could not find \"{}\"", name);
                return Ok(None);
            },

            Ok(record) => record,

            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_str(&record.value)?))
    }

    /// Stores `value` under `name`, replacing any previous value
    fn set_value<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {

        let record = Record {
            name: name.into(),
            value: serde_json::to_string(value)?,
        };

        trace!("storing \"{}\" to database", name);
        let conn = self.conn()?;
        diesel::replace_into(settings::table)
            .values(&record)
            .execute(&conn)?;

        Ok(())
    }
}

impl SnapshotStorage for SqliteStorage {

    fn load(&self) -> Result<Option<DurableState>> {
        self.get_value(SNAPSHOT_KEY)
    }

    fn save(&self, state: &DurableState) -> Result<()> {
        self.set_value(SNAPSHOT_KEY, state)
    }
}


/// Snapshot storage that lives only as long as the value itself
///
/// Clones share the same record, which lets a test hand one clone to a store
/// and hydrate a second store from another.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    record: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {

    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON of the stored snapshot
    pub fn raw(&self) -> Option<String> {
        self.record.lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }
}

impl SnapshotStorage for MemoryStorage {

    fn load(&self) -> Result<Option<DurableState>> {
        match self.raw() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &DurableState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        *self.record.lock().unwrap_or_else(|err| err.into_inner()) = Some(json);
        Ok(())
    }
}
