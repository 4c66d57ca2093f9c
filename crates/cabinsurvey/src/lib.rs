//! `cabinsurvey` - Survey launcher with an offline record store
//!
//! This library provides the local record store (surveys, flight numbers,
//! survey records and the user profile) and the workflows built on it:
//! launching a survey for a flight, recording its completion, and syncing
//! pending records.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod model;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{
    FlightNumber, NewFlightNumber, NewSurvey, NewSurveyRecord, Survey, SurveyRecord, UserProfile,
};
pub use session::{Authenticator, Session, StaticCredentials};
pub use storage::StorageStats;
pub use store::{RecordStore, SqliteRecordStore};
pub use sync::{sync_records, Connectivity, FixedConnectivity, SyncOptions, SyncReport};
