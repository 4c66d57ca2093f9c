//! Asynchronous record store.
//!
//! [`RecordStore`] is the contract every consumer programs against.
//! [`SqliteRecordStore`] implements it on a [`tokio_rusqlite::Connection`],
//! which runs the [`storage`] statements on a dedicated thread so callers
//! suspend instead of blocking their executor. The handle is opened once and
//! cloned to consumers; all clones share one connection.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    FlightNumber, NewFlightNumber, NewSurvey, NewSurveyRecord, Survey, SurveyRecord, UserProfile,
};
use crate::storage::{self, migrations, StorageStats};

/// Persistent store for surveys, flight numbers, survey records and the
/// user profile.
///
/// Every operation is its own atomic unit against one collection. There is
/// no retry; failures are returned to the caller.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Bring the schema up to date. Calling it again changes nothing.
    async fn initialize(&self) -> Result<()>;

    /// Store a survey and return its new id.
    async fn add_survey(&self, survey: NewSurvey) -> Result<i64>;

    /// All stored surveys. Callers must not rely on the order.
    async fn list_surveys(&self) -> Result<Vec<Survey>>;

    /// Look up one survey.
    async fn get_survey(&self, id: i64) -> Result<Option<Survey>>;

    /// Remove a survey. Removing an absent id is not an error.
    async fn delete_survey(&self, id: i64) -> Result<()>;

    /// Store a flight number and return its new id.
    async fn add_flight_number(&self, flight: NewFlightNumber) -> Result<i64>;

    /// All stored flight numbers. Callers must not rely on the order.
    async fn list_flight_numbers(&self) -> Result<Vec<FlightNumber>>;

    /// Look up one flight number.
    async fn get_flight_number(&self, id: i64) -> Result<Option<FlightNumber>>;

    /// Remove a flight number. Removing an absent id is not an error.
    async fn delete_flight_number(&self, id: i64) -> Result<()>;

    /// Store a survey record snapshot and return its new id.
    async fn add_survey_record(&self, record: NewSurveyRecord) -> Result<i64>;

    /// All stored survey records. Callers must not rely on the order.
    async fn list_survey_records(&self) -> Result<Vec<SurveyRecord>>;

    /// Survey records not yet submitted.
    async fn list_pending_records(&self) -> Result<Vec<SurveyRecord>>;

    /// Look up one survey record.
    async fn get_survey_record(&self, id: i64) -> Result<Option<SurveyRecord>>;

    /// Remove a survey record. Removing an absent id is not an error.
    async fn delete_survey_record(&self, id: i64) -> Result<()>;

    /// Replace the record with `record.id`, creating it if absent.
    async fn update_survey_record(&self, record: SurveyRecord) -> Result<()>;

    /// The saved profile, if any.
    async fn get_user_profile(&self) -> Result<Option<UserProfile>>;

    /// Replace the saved profile.
    async fn set_user_profile(&self, profile: UserProfile) -> Result<()>;

    /// Collection counts and file details.
    async fn stats(&self) -> Result<StorageStats>;
}

/// [`RecordStore`] backed by a single `SQLite` file.
///
/// Cloning is cheap; the connection is reference-counted.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    path: PathBuf,
    conn: tokio_rusqlite::Connection,
}

impl SqliteRecordStore {
    /// Open (or create) the store at `path` and bring its schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        storage::create_parent_dir(&path)?;

        debug!("Opening database at {}", path.display());
        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|source| Error::DatabaseOpen {
                path: path.clone(),
                source,
            })?;
        conn.call(|conn| {
            storage::configure(conn)?;
            migrations::initialize_schema(conn)
        })
        .await?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Open an in-memory store for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub async fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(storage::IN_MEMORY);
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|source| Error::DatabaseOpen {
                path: path.clone(),
                source,
            })?;
        conn.call(|conn| migrations::initialize_schema(conn)).await?;
        Ok(Self { path, conn })
    }

    /// Path of the backing database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteRecordStore {
    async fn initialize(&self) -> Result<()> {
        debug!("Initializing record store at {}", self.path.display());
        Ok(self.conn.call(|conn| storage::initialize(conn)).await?)
    }

    async fn add_survey(&self, survey: NewSurvey) -> Result<i64> {
        Ok(self
            .conn
            .call(move |conn| storage::add_survey(conn, &survey))
            .await?)
    }

    async fn list_surveys(&self) -> Result<Vec<Survey>> {
        Ok(self.conn.call(|conn| storage::list_surveys(conn)).await?)
    }

    async fn get_survey(&self, id: i64) -> Result<Option<Survey>> {
        Ok(self
            .conn
            .call(move |conn| storage::get_survey(conn, id))
            .await?)
    }

    async fn delete_survey(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| storage::delete_survey(conn, id))
            .await?;
        Ok(())
    }

    async fn add_flight_number(&self, flight: NewFlightNumber) -> Result<i64> {
        Ok(self
            .conn
            .call(move |conn| storage::add_flight_number(conn, &flight))
            .await?)
    }

    async fn list_flight_numbers(&self) -> Result<Vec<FlightNumber>> {
        Ok(self
            .conn
            .call(|conn| storage::list_flight_numbers(conn))
            .await?)
    }

    async fn get_flight_number(&self, id: i64) -> Result<Option<FlightNumber>> {
        Ok(self
            .conn
            .call(move |conn| storage::get_flight_number(conn, id))
            .await?)
    }

    async fn delete_flight_number(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| storage::delete_flight_number(conn, id))
            .await?;
        Ok(())
    }

    async fn add_survey_record(&self, record: NewSurveyRecord) -> Result<i64> {
        Ok(self
            .conn
            .call(move |conn| storage::add_survey_record(conn, &record))
            .await?)
    }

    async fn list_survey_records(&self) -> Result<Vec<SurveyRecord>> {
        Ok(self
            .conn
            .call(|conn| storage::list_survey_records(conn))
            .await?)
    }

    async fn list_pending_records(&self) -> Result<Vec<SurveyRecord>> {
        Ok(self
            .conn
            .call(|conn| storage::list_pending_records(conn))
            .await?)
    }

    async fn get_survey_record(&self, id: i64) -> Result<Option<SurveyRecord>> {
        Ok(self
            .conn
            .call(move |conn| storage::get_survey_record(conn, id))
            .await?)
    }

    async fn delete_survey_record(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| storage::delete_survey_record(conn, id))
            .await?;
        Ok(())
    }

    async fn update_survey_record(&self, record: SurveyRecord) -> Result<()> {
        Ok(self
            .conn
            .call(move |conn| storage::update_survey_record(conn, &record))
            .await?)
    }

    async fn get_user_profile(&self) -> Result<Option<UserProfile>> {
        Ok(self
            .conn
            .call(|conn| storage::get_user_profile(conn))
            .await?)
    }

    async fn set_user_profile(&self, profile: UserProfile) -> Result<()> {
        Ok(self
            .conn
            .call(move |conn| storage::set_user_profile(conn, &profile))
            .await?)
    }

    async fn stats(&self) -> Result<StorageStats> {
        let path = self.path.clone();
        Ok(self
            .conn
            .call(move |conn| storage::stats(conn, &path))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_store() -> SqliteRecordStore {
        SqliteRecordStore::open_in_memory()
            .await
            .expect("failed to create test store")
    }

    fn scenario_record() -> NewSurveyRecord {
        NewSurveyRecord {
            survey_name: "Cabin Crew Feedback".to_string(),
            flight_number: "FA200".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            submitted: false,
            survey_url: "https://example.com/s1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_ids_scenario() {
        let store = create_test_store().await;

        let survey_id = store
            .add_survey(NewSurvey::new("Cabin Crew Feedback", "https://example.com/s1"))
            .await
            .unwrap();
        let flight_id = store
            .add_flight_number(NewFlightNumber::new("FA200"))
            .await
            .unwrap();
        let record_id = store.add_survey_record(scenario_record()).await.unwrap();

        assert_eq!(survey_id, 1);
        assert_eq!(flight_id, 1);
        assert_eq!(record_id, 1);

        let records = store.list_survey_records().await.unwrap();
        assert_eq!(records, vec![scenario_record().with_id(1)]);
    }

    #[tokio::test]
    async fn test_delete_absent_succeeds() {
        let store = create_test_store().await;
        store.delete_survey(12).await.unwrap();
        store.delete_flight_number(12).await.unwrap();
        store.delete_survey_record(12).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_then_list_excludes_id() {
        let store = create_test_store().await;
        let keep = store
            .add_survey(NewSurvey::new("Keep", "https://example.com/a"))
            .await
            .unwrap();
        let gone = store
            .add_survey(NewSurvey::new("Gone", "https://example.com/b"))
            .await
            .unwrap();

        store.delete_survey(gone).await.unwrap();

        let ids: Vec<i64> = store
            .list_surveys()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![keep]);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let store = create_test_store().await;
        store
            .add_flight_number(NewFlightNumber::new("FA1"))
            .await
            .unwrap();
        let before = store.list_flight_numbers().await.unwrap();

        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        assert_eq!(store.list_flight_numbers().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_profile_last_write_wins() {
        let store = create_test_store().await;
        assert!(store.get_user_profile().await.unwrap().is_none());

        for i in 0..3 {
            store
                .set_user_profile(UserProfile::new(format!("Crew {i}"), "crew@fitsair.com"))
                .await
                .unwrap();
        }

        assert_eq!(
            store.get_user_profile().await.unwrap(),
            Some(UserProfile::new("Crew 2", "crew@fitsair.com"))
        );
        assert!(store.stats().await.unwrap().has_profile);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = create_test_store().await;
        let other = store.clone();

        let id = other.add_survey_record(scenario_record()).await.unwrap();
        assert!(store.get_survey_record(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_initialize_converges() {
        let store = create_test_store().await;
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.initialize().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.stats().await.unwrap().schema_version, 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_get_unique_ids() {
        let store = create_test_store().await;
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.add_survey_record(scenario_record()).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);
        assert_eq!(store.list_survey_records().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = create_test_store().await;
        let survey_id = store
            .add_survey(NewSurvey::new("Cabin Crew Feedback", "https://example.com/s1"))
            .await
            .unwrap();
        let flight_id = store
            .add_flight_number(NewFlightNumber::new("FA200"))
            .await
            .unwrap();

        let survey = store.get_survey(survey_id).await.unwrap().unwrap();
        assert_eq!(survey.url, "https://example.com/s1");
        let flight = store.get_flight_number(flight_id).await.unwrap().unwrap();
        assert_eq!(flight.number, "FA200");

        assert!(store.get_survey(survey_id + 1).await.unwrap().is_none());
        assert!(matches!(
            store.get_flight_number(0).await,
            Err(Error::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_pending_records() {
        let store = create_test_store().await;
        let pending = store.add_survey_record(scenario_record()).await.unwrap();
        let mut done = scenario_record();
        done.submitted = true;
        store.add_survey_record(done).await.unwrap();

        let records = store.list_pending_records().await.unwrap();
        assert_eq!(records, vec![scenario_record().with_id(pending)]);
    }

    #[tokio::test]
    async fn test_update_survey_record() {
        let store = create_test_store().await;
        let id = store.add_survey_record(scenario_record()).await.unwrap();

        let mut record = store.get_survey_record(id).await.unwrap().unwrap();
        record.submitted = true;
        store.update_survey_record(record.clone()).await.unwrap();

        assert_eq!(store.get_survey_record(id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_open_file_store() {
        let db_path = std::env::temp_dir().join(format!(
            "cabinsurvey_store_test_{}.db",
            std::process::id()
        ));

        let store = SqliteRecordStore::open(&db_path).await.unwrap();
        assert_eq!(store.path(), db_path);
        store
            .add_survey(NewSurvey::new("S", "https://example.com"))
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteRecordStore::open(&db_path).await.unwrap();
        assert_eq!(reopened.list_surveys().await.unwrap().len(), 1);
        assert!(reopened.stats().await.unwrap().db_size_bytes > 0);

        drop(reopened);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
    }

    #[tokio::test]
    async fn test_open_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!(
            "cabinsurvey_store_dirs_{}",
            std::process::id()
        ));
        let db_path = root.join("nested/records.db");
        let _ = std::fs::remove_dir_all(&root);

        let store = SqliteRecordStore::open(&db_path).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(store.stats().await.unwrap().schema_version, 1);

        drop(store);
        let _ = std::fs::remove_dir_all(&root);
    }
}
