pub mod migrations;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Single shared SQLite connection. Callers on the async side go through
/// tokio::task::spawn_blocking.
pub type DbPool = Arc<Mutex<Connection>>;

/// Writer and reader connections onto the same database.
///
/// With a file database in WAL mode the two are separate connections, so a
/// read holding `reader` never waits on a write holding `writer`.
#[derive(Clone)]
pub struct Db {
    pub writer: DbPool,
    pub reader: DbPool,
}

/// Open `{data_dir}/{file_name}`, creating both if needed, then switch to
/// WAL, set the lock wait and bring the schema up to date.
pub fn init_db(
    data_dir: &str,
    file_name: &str,
    busy_timeout: Duration,
) -> Result<Db, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;

    let db_path = Path::new(data_dir).join(file_name);
    let mut writer = Connection::open(&db_path)?;

    // WAL lets readers proceed while a writer holds the lock
    writer.pragma_update(None, "journal_mode", "WAL")?;
    writer.pragma_update(None, "foreign_keys", "ON")?;
    writer.busy_timeout(busy_timeout)?;

    migrations::migrations().to_latest(&mut writer)?;

    // Opened after migrations so it sees the final schema
    let reader = Connection::open(&db_path)?;
    reader.pragma_update(None, "query_only", "ON")?;
    reader.busy_timeout(busy_timeout)?;

    tracing::info!("Database initialized at {}", db_path.display());

    Ok(Db {
        writer: Arc::new(Mutex::new(writer)),
        reader: Arc::new(Mutex::new(reader)),
    })
}

/// Open a private in-memory database with the full schema applied.
///
/// An in-memory database lives on one connection, so reads and writes share it.
pub fn open_in_memory() -> Result<Db, Box<dyn std::error::Error>> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    migrations::migrations().to_latest(&mut conn)?;
    let pool = Arc::new(Mutex::new(conn));
    Ok(Db {
        writer: pool.clone(),
        reader: pool,
    })
}
