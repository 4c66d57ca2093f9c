//! Storage layer for cabinsurvey.
//!
//! This module holds the `SQLite` statements behind the record store: one
//! table per collection, version-gated schema creation, and the
//! per-collection create/read/delete operations. Every function takes a
//! plain [`Connection`] and runs a single autocommitted statement, so a
//! write is durable once it returns. [`crate::store`] runs them on the
//! connection's background thread.

pub mod migrations;
pub mod schema;

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    FlightNumber, NewFlightNumber, NewSurvey, NewSurveyRecord, Survey, SurveyRecord, UserProfile,
    PROFILE_KEY,
};

/// Collection names used in key validation errors.
const SURVEYS: &str = "surveys";
const FLIGHT_NUMBERS: &str = "flight_numbers";
const SURVEY_RECORDS: &str = "survey_records";

/// Path reported for in-memory databases.
pub const IN_MEMORY: &str = ":memory:";

const RECORD_COLUMNS: &str = "id, survey_name, flight_number, timestamp, submitted, survey_url";

/// Create the parent directories of a database file if they are missing.
///
/// # Errors
///
/// Returns [`Error::DirectoryCreate`] if a directory cannot be created.
pub fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Switch a file-backed connection to WAL journaling.
///
/// # Errors
///
/// Returns an error if the pragmas cannot be applied.
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
    Ok(())
}

/// Bring the schema up to date. Calling it again changes nothing.
///
/// # Errors
///
/// Returns an error if the schema cannot be brought up to date.
pub fn initialize(conn: &Connection) -> Result<()> {
    migrations::initialize_schema(conn)
}

// --- Surveys ---

/// Insert a survey and return its assigned id.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn add_survey(conn: &Connection, survey: &NewSurvey) -> Result<i64> {
    conn.execute(
        "INSERT INTO surveys (name, url) VALUES (?1, ?2)",
        params![survey.name, survey.url],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Inserted survey with id {}", id);
    Ok(id)
}

/// List all surveys.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_surveys(conn: &Connection) -> Result<Vec<Survey>> {
    let mut stmt = conn.prepare("SELECT id, name, url FROM surveys ORDER BY id")?;
    let surveys = stmt
        .query_map([], row_to_survey)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(surveys)
}

/// Get a survey by id.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
pub fn get_survey(conn: &Connection, id: i64) -> Result<Option<Survey>> {
    check_key(SURVEYS, id)?;
    let survey = conn
        .query_row(
            "SELECT id, name, url FROM surveys WHERE id = ?1",
            [id],
            row_to_survey,
        )
        .optional()?;
    Ok(survey)
}

/// Delete a survey. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
pub fn delete_survey(conn: &Connection, id: i64) -> Result<bool> {
    delete_by_id(conn, SURVEYS, id)
}

// --- Flight numbers ---

/// Insert a flight number and return its assigned id.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn add_flight_number(conn: &Connection, flight: &NewFlightNumber) -> Result<i64> {
    conn.execute(
        "INSERT INTO flight_numbers (number) VALUES (?1)",
        [&flight.number],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Inserted flight number with id {}", id);
    Ok(id)
}

/// List all flight numbers.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_flight_numbers(conn: &Connection) -> Result<Vec<FlightNumber>> {
    let mut stmt = conn.prepare("SELECT id, number FROM flight_numbers ORDER BY id")?;
    let flights = stmt
        .query_map([], row_to_flight)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(flights)
}

/// Get a flight number by id.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
pub fn get_flight_number(conn: &Connection, id: i64) -> Result<Option<FlightNumber>> {
    check_key(FLIGHT_NUMBERS, id)?;
    let flight = conn
        .query_row(
            "SELECT id, number FROM flight_numbers WHERE id = ?1",
            [id],
            row_to_flight,
        )
        .optional()?;
    Ok(flight)
}

/// Delete a flight number. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
pub fn delete_flight_number(conn: &Connection, id: i64) -> Result<bool> {
    delete_by_id(conn, FLIGHT_NUMBERS, id)
}

// --- Survey records ---

/// Insert a survey record and return its assigned id.
///
/// # Errors
///
/// Returns an error if the database operation fails, including when the id
/// counter is exhausted (see [`update_survey_record`]).
pub fn add_survey_record(conn: &Connection, record: &NewSurveyRecord) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO survey_records (survey_name, flight_number, timestamp, submitted, survey_url)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
        params![
            record.survey_name,
            record.flight_number,
            record.timestamp,
            record.submitted,
            record.survey_url,
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!("Inserted survey record with id {}", id);
    Ok(id)
}

/// List all survey records.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_survey_records(conn: &Connection) -> Result<Vec<SurveyRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM survey_records ORDER BY id"
    ))?;
    let records = stmt
        .query_map([], row_to_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// List the records that have not been submitted yet.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn list_pending_records(conn: &Connection) -> Result<Vec<SurveyRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM survey_records WHERE submitted = 0 ORDER BY id"
    ))?;
    let records = stmt
        .query_map([], row_to_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(records)
}

/// Get a survey record by id.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
pub fn get_survey_record(conn: &Connection, id: i64) -> Result<Option<SurveyRecord>> {
    check_key(SURVEY_RECORDS, id)?;
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM survey_records WHERE id = ?1"),
            [id],
            row_to_record,
        )
        .optional()?;
    Ok(record)
}

/// Delete a survey record. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
pub fn delete_survey_record(conn: &Connection, id: i64) -> Result<bool> {
    delete_by_id(conn, SURVEY_RECORDS, id)
}

/// Replace the record stored under `record.id`, creating it if absent.
///
/// # Errors
///
/// Returns an error if the key is malformed or the database operation fails.
///
/// Creating a row under an explicit id moves the generated-id counter past
/// it. Storing under `i64::MAX` therefore exhausts the counter, and every
/// later [`add_survey_record`] fails with [`Error::DatabaseQuery`]
/// (`SQLITE_FULL`).
pub fn update_survey_record(conn: &Connection, record: &SurveyRecord) -> Result<()> {
    check_key(SURVEY_RECORDS, record.id)?;
    conn.execute(
        r"
        INSERT INTO survey_records (id, survey_name, flight_number, timestamp, submitted, survey_url)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            survey_name = excluded.survey_name,
            flight_number = excluded.flight_number,
            timestamp = excluded.timestamp,
            submitted = excluded.submitted,
            survey_url = excluded.survey_url
        ",
        params![
            record.id,
            record.survey_name,
            record.flight_number,
            record.timestamp,
            record.submitted,
            record.survey_url,
        ],
    )?;
    debug!("Stored survey record with id {}", record.id);
    Ok(())
}

// --- User profile ---

/// Get the stored profile, if one was ever saved.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn get_user_profile(conn: &Connection) -> Result<Option<UserProfile>> {
    let profile = conn
        .query_row(
            "SELECT name, email FROM user_profile WHERE key = ?1",
            [PROFILE_KEY],
            |row| {
                Ok(UserProfile {
                    name: row.get(0)?,
                    email: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(profile)
}

/// Replace the profile.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn set_user_profile(conn: &Connection, profile: &UserProfile) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO user_profile (key, name, email) VALUES (?1, ?2, ?3)",
        params![PROFILE_KEY, profile.name, profile.email],
    )?;
    debug!("Saved user profile");
    Ok(())
}

// --- Maintenance ---

/// Get database statistics. `path` is the file behind `conn`, or
/// [`IN_MEMORY`].
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn stats(conn: &Connection, path: &Path) -> Result<StorageStats> {
    let surveys = count(conn, "SELECT COUNT(*) FROM surveys")?;
    let flight_numbers = count(conn, "SELECT COUNT(*) FROM flight_numbers")?;
    let survey_records = count(conn, "SELECT COUNT(*) FROM survey_records")?;
    let pending_records = count(conn, "SELECT COUNT(*) FROM survey_records WHERE submitted = 0")?;
    let has_profile = count(conn, "SELECT COUNT(*) FROM user_profile")? > 0;
    let schema_version = migrations::get_schema_version(conn)?;

    let db_size_bytes = if path.as_os_str() == IN_MEMORY {
        0
    } else {
        std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    };

    Ok(StorageStats {
        surveys,
        flight_numbers,
        survey_records,
        pending_records,
        has_profile,
        schema_version,
        db_size_bytes,
    })
}

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

fn delete_by_id(conn: &Connection, table: &'static str, id: i64) -> Result<bool> {
    check_key(table, id)?;
    let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
    if affected == 0 {
        debug!("Delete of missing id {} in {} ignored", id, table);
    }
    Ok(affected > 0)
}

/// Reject keys the store could never have generated.
fn check_key(collection: &'static str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(Error::InvalidKey {
            collection,
            key: id,
        });
    }
    Ok(())
}

fn row_to_survey(row: &rusqlite::Row) -> rusqlite::Result<Survey> {
    Ok(Survey {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
    })
}

fn row_to_flight(row: &rusqlite::Row) -> rusqlite::Result<FlightNumber> {
    Ok(FlightNumber {
        id: row.get(0)?,
        number: row.get(1)?,
    })
}

/// Convert a database row to a `SurveyRecord`.
fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<SurveyRecord> {
    Ok(SurveyRecord {
        id: row.get(0)?,
        survey_name: row.get(1)?,
        flight_number: row.get(2)?,
        timestamp: row.get(3)?,
        submitted: row.get(4)?,
        survey_url: row.get(5)?,
    })
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Number of stored surveys.
    pub surveys: i64,
    /// Number of stored flight numbers.
    pub flight_numbers: i64,
    /// Number of stored survey records.
    pub survey_records: i64,
    /// Number of survey records not yet submitted.
    pub pending_records: i64,
    /// Whether a user profile has been saved.
    pub has_profile: bool,
    /// Schema version recorded in the database.
    pub schema_version: i32,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
