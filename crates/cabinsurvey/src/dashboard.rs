//! Survey launching.
//!
//! The dashboard seeds an empty store with one default survey and flight
//! number, offers them for selection, and turns a selection into a
//! [`SurveySession`]. Closing a session writes a [`NewSurveyRecord`]
//! snapshot to the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DefaultsConfig;
use crate::error::{Error, Result};
use crate::model::{format_timestamp, FlightNumber, NewSurveyRecord, Survey, UserProfile};
use crate::store::RecordStore;

/// What the dashboard shows: the selectable rows and who is greeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    /// Selectable surveys.
    pub surveys: Vec<Survey>,
    /// Selectable flight numbers.
    pub flight_numbers: Vec<FlightNumber>,
    /// Name used in the greeting.
    pub greeting_name: String,
}

impl DashboardView {
    /// The survey preselected when nothing was chosen explicitly.
    #[must_use]
    pub fn default_survey(&self) -> Option<&Survey> {
        self.surveys.first()
    }

    /// The flight preselected when nothing was chosen explicitly.
    #[must_use]
    pub fn default_flight(&self) -> Option<&FlightNumber> {
        self.flight_numbers.first()
    }
}

/// A survey that is currently being shown for a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveySession {
    /// Name of the survey being shown.
    pub survey_name: String,
    /// Link being shown.
    pub survey_url: String,
    /// Flight the survey is shown for.
    pub flight_number: String,
}

impl SurveySession {
    /// Build the record written when this session closes at `closed_at`.
    ///
    /// The record counts as submitted when the close happened online.
    #[must_use]
    pub fn into_record(self, closed_at: DateTime<Utc>, online: bool) -> NewSurveyRecord {
        NewSurveyRecord {
            survey_name: self.survey_name,
            flight_number: self.flight_number,
            timestamp: format_timestamp(closed_at),
            submitted: online,
            survey_url: self.survey_url,
        }
    }
}

/// Seed the default survey and flight number into empty collections.
///
/// Returns `(seeded_survey, seeded_flight)`. Collections that already hold
/// rows are left alone.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub async fn seed_defaults(
    store: &dyn RecordStore,
    defaults: &DefaultsConfig,
) -> Result<(bool, bool)> {
    let seeded_survey = if store.list_surveys().await?.is_empty() {
        let id = store.add_survey(defaults.survey()).await?;
        info!("Seeded default survey with id {}", id);
        true
    } else {
        false
    };

    let seeded_flight = if store.list_flight_numbers().await?.is_empty() {
        let id = store.add_flight_number(defaults.flight()).await?;
        info!("Seeded default flight number with id {}", id);
        true
    } else {
        false
    };

    Ok((seeded_survey, seeded_flight))
}

/// The saved profile, or the configured fallback when none was saved.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn profile_or_default(
    store: &dyn RecordStore,
    defaults: &DefaultsConfig,
) -> Result<UserProfile> {
    Ok(store
        .get_user_profile()
        .await?
        .unwrap_or_else(|| defaults.profile()))
}

/// Seed defaults, then load everything the dashboard shows.
///
/// # Errors
///
/// Returns an error if the store cannot be read or written.
pub async fn load_dashboard(
    store: &dyn RecordStore,
    defaults: &DefaultsConfig,
) -> Result<DashboardView> {
    seed_defaults(store, defaults).await?;

    let surveys = store.list_surveys().await?;
    let flight_numbers = store.list_flight_numbers().await?;
    let profile = profile_or_default(store, defaults).await?;
    let greeting_name = if profile.name.trim().is_empty() {
        defaults.profile_name.clone()
    } else {
        profile.name
    };

    Ok(DashboardView {
        surveys,
        flight_numbers,
        greeting_name,
    })
}

/// Resolve a survey and flight selection into a session.
///
/// # Errors
///
/// Returns [`Error::SurveyNotFound`] or [`Error::FlightNotFound`] if an id
/// does not resolve, or a store error if the lookup itself fails.
pub async fn launch(
    store: &dyn RecordStore,
    survey_id: i64,
    flight_id: i64,
) -> Result<SurveySession> {
    let survey = store
        .get_survey(survey_id)
        .await?
        .ok_or(Error::SurveyNotFound(survey_id))?;
    let flight = store
        .get_flight_number(flight_id)
        .await?
        .ok_or(Error::FlightNotFound(flight_id))?;

    debug!("Launching survey '{}' for flight {}", survey.name, flight.number);
    Ok(SurveySession {
        survey_name: survey.name,
        survey_url: survey.url,
        flight_number: flight.number,
    })
}

/// Close a session and store its record. Returns the new record's id.
///
/// # Errors
///
/// Returns an error if the record cannot be written.
pub async fn close_session(
    store: &dyn RecordStore,
    session: SurveySession,
    online: bool,
) -> Result<i64> {
    let record = session.into_record(Utc::now(), online);
    let id = store.add_survey_record(record).await?;
    if online {
        info!("Recorded survey close as record {}", id);
    } else {
        info!("Offline: stored survey record {} locally", id);
    }
    Ok(id)
}
