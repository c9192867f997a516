use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use super::{PunchMap, PunchStore, StorageError};
use crate::model::{Punch, StationCode};

const STORE: &str = "punch store";

/// Punch store backed by a sqlite file. The primary key is the punch identity, so the upsert is
/// a single atomic statement per punch.
#[derive(Clone)]
pub struct SqlitePunchStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePunchStore {
    /// # Errors
    ///
    /// Will return `Err` if the database cannot be opened or the schema cannot be created
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            StorageError::with_source(STORE, format!("cannot open {}", path.display()), e)
        })?;
        debug!(path = %path.display(), "Opened punch database");
        Self::from_connection(conn)
    }

    /// # Errors
    ///
    /// Will return `Err` if the schema cannot be created
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::with_source(STORE, "cannot open in-memory database", e))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(Duration::from_secs(5))
            .and_then(|()| conn.execute_batch(include_str!("../sql/schema/sqlite/00_punches.sql")))
            .map_err(|e| StorageError::with_source(STORE, "cannot create punch schema", e))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StorageError::new(STORE, "connection mutex poisoned"))?;
            f(&guard).map_err(|e| StorageError::with_source(STORE, "query failed", e))
        })
        .await
        .map_err(|e| StorageError::with_source(STORE, "blocking task failed", e))?
    }
}

#[async_trait]
impl PunchStore for SqlitePunchStore {
    async fn record(&self, punch: &Punch) -> Result<(), StorageError> {
        let punch = punch.clone();
        self.with_connection(move |conn| {
            conn.execute(
                include_str!("../sql/schema/sqlite/01_upsert_punch.sql"),
                params![punch.chip_number, punch.station.value(), punch.stage, punch.timestamp],
            )
            .map(|_| ())
        })
        .await
    }

    async fn punches_for(&self, chip_number: i64, stage: &str) -> Result<PunchMap, StorageError> {
        let stage = stage.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT station_code, time FROM punches WHERE chip_number = ?1 AND stage = ?2",
            )?;
            let rows = stmt.query_map(params![chip_number, stage], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
            let mut punches = PunchMap::new();
            for row in rows {
                let (station, time) = row?;
                punches.insert(StationCode::normalize(station), time);
            }
            Ok(punches)
        })
        .await
    }

    async fn stage_punches(&self, stage: &str) -> Result<HashMap<i64, PunchMap>, StorageError> {
        let stage = stage.to_string();
        self.with_connection(move |conn| {
            let mut stmt = conn
                .prepare("SELECT chip_number, station_code, time FROM punches WHERE stage = ?1")?;
            let rows = stmt.query_map(params![stage], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
            })?;
            let mut by_chip: HashMap<i64, PunchMap> = HashMap::new();
            for row in rows {
                let (chip, station, time) = row?;
                by_chip.entry(chip).or_default().insert(StationCode::normalize(station), time);
            }
            Ok(by_chip)
        })
        .await
    }
}
