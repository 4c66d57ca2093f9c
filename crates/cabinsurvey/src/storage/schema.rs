//! `SQLite` schema definitions for cabinsurvey.
//!
//! One table per collection, plus a metadata table holding the schema
//! version. Every collection table uses `AUTOINCREMENT` so ids are never
//! handed out twice, even after the highest row is deleted.

/// SQL statement to create the surveys table.
pub const CREATE_SURVEYS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS surveys (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    url TEXT NOT NULL
)
";

/// SQL statement to create the flight numbers table.
pub const CREATE_FLIGHT_NUMBERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flight_numbers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    number TEXT NOT NULL
)
";

/// SQL statement to create the survey records table.
pub const CREATE_SURVEY_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS survey_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    survey_name TEXT NOT NULL,
    flight_number TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    submitted INTEGER NOT NULL CHECK (submitted IN (0, 1)),
    survey_url TEXT NOT NULL
)
";

/// SQL statement to create an index on `submitted` for finding pending records.
pub const CREATE_SUBMITTED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_survey_records_submitted ON survey_records(submitted)
";

/// SQL statement to create the user profile table.
///
/// The key is pinned to a single value so the table can never hold more
/// than one row.
pub const CREATE_USER_PROFILE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS user_profile (
    key TEXT PRIMARY KEY CHECK (key = 'current'),
    name TEXT NOT NULL,
    email TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Statements that create the version-1 collections, in order.
pub const COLLECTION_STATEMENTS: &[&str] = &[
    CREATE_SURVEYS_TABLE,
    CREATE_FLIGHT_NUMBERS_TABLE,
    CREATE_SURVEY_RECORDS_TABLE,
    CREATE_SUBMITTED_INDEX,
    CREATE_USER_PROFILE_TABLE,
];

/// Names of every collection table.
pub const COLLECTION_TABLES: &[&str] = &["surveys", "flight_numbers", "survey_records", "user_profile"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_statements_not_empty() {
        assert!(!COLLECTION_STATEMENTS.is_empty());
        for stmt in COLLECTION_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_every_collection_has_a_statement() {
        for table in COLLECTION_TABLES {
            let needle = format!("CREATE TABLE IF NOT EXISTS {table} ");
            assert!(
                COLLECTION_STATEMENTS.iter().any(|s| s.contains(&needle)),
                "missing statement for {table}"
            );
        }
    }

    #[test]
    fn test_generated_keys_use_autoincrement() {
        for stmt in [
            CREATE_SURVEYS_TABLE,
            CREATE_FLIGHT_NUMBERS_TABLE,
            CREATE_SURVEY_RECORDS_TABLE,
        ] {
            assert!(stmt.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        }
    }

    #[test]
    fn test_profile_key_is_pinned() {
        assert!(CREATE_USER_PROFILE_TABLE.contains("CHECK (key = 'current')"));
        assert!(CREATE_USER_PROFILE_TABLE.contains(crate::model::PROFILE_KEY));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
