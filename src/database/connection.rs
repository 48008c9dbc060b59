/*!
 * SQLite handle shared by the glossary and history stores.
 *
 * The server and the CLI may open the same file at once, so every handle
 * waits on a locked database instead of failing immediately. Async callers
 * go through `execute_async`, which moves the query onto the blocking pool.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::errors::StoreError;

use super::schema;

const DEFAULT_DB_FILENAME: &str = "doctran.db";

/// Directory created under the platform data dir
const DEFAULT_DB_DIRNAME: &str = "doctran";

/// How long a write waits for another process holding the file lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable handle to one migrated SQLite connection
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl DatabaseConnection {
    /// Open (or create) the store file, creating missing parent directories
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening glossary and history store at {:?}", db_path);
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set database busy timeout")?;

        Self::migrated(db_path, conn)
    }

    /// Store that lives only as long as the handle, used by tests and benches
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory store");
        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::migrated(PathBuf::from(":memory:"), conn)
    }

    fn migrated(db_path: PathBuf, conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// `<data dir>/doctran/doctran.db`, used when the config names no path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// File backing this handle, or `:memory:`
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Run `f` on the calling thread
    pub fn execute<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = lock(&self.connection)?;
        f(&conn)
    }

    /// Run `f` on tokio's blocking pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&connection)?;
            f(&conn)
        })
        .await
        .context("Store task panicked")?
    }
}

/// A poisoned lock means a query panicked mid-transaction; report it as a store failure
fn lock(connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    connection
        .lock()
        .map_err(|e| StoreError::Database(anyhow::anyhow!("Store lock poisoned: {}", e)))
}
