//! Database connectivity


use std::path::Path;

use diesel::r2d2::{self, ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::embed_migrations;
use log::{debug, trace};

use crate::error::Result;


pub mod schema;


/// Connection pool type used throughout CamViewer
pub type ConnectionPool = Pool<ConnectionManager<SqliteConnection>>;


/// Pooled connection type used throughout CamViewer
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;


embed_migrations!();


/// Connects to and initializes the CamViewer database
///
/// The database file is named *camviewer.db* and placed under `state_dir`.
pub fn connect<P: AsRef<Path>>(state_dir: P) -> Result<ConnectionPool> {

    let db_url = state_dir.as_ref()
        .join("camviewer.db")
        .to_string_lossy()
        .into_owned();

    debug!("connecting to database at {}", db_url);
    let pool = Pool::new(ConnectionManager::new(db_url))?;

    migrate(&pool)?;

    Ok(pool)
}


/// Opens a private in-memory database
///
/// Every SQLite connection to `:memory:` sees its own database, so the pool
/// is limited to a single connection.
pub fn connect_in_memory() -> Result<ConnectionPool> {

    trace!("opening in-memory database");
    let pool = Pool::builder()
        .max_size(1)
        .build(ConnectionManager::new(":memory:"))?;

    migrate(&pool)?;

    Ok(pool)
}


fn migrate(pool: &ConnectionPool) -> Result<()> {

    debug!("running migrations if necessary");
    let conn = pool.get()?;
    embedded_migrations::run(&conn)?;

    Ok(())
}
