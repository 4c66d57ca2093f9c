//! Entity types held by the record store.
//!
//! Each collection has a persisted form carrying its assigned id and a
//! "new" form used for inserts, where the id has not been assigned yet.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Fixed key of the single user profile row.
pub const PROFILE_KEY: &str = "current";

/// A survey that can be launched for a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    /// Store-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Link to the survey itself.
    pub url: String,
}

/// A survey that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSurvey {
    /// Display name.
    pub name: String,
    /// Link to the survey itself.
    pub url: String,
}

impl NewSurvey {
    /// Create a new survey definition.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A flight code that surveys can be launched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightNumber {
    /// Store-assigned identifier.
    pub id: i64,
    /// Flight code, e.g. `FA123`.
    pub number: String,
}

/// A flight number that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlightNumber {
    /// Flight code, e.g. `FA123`.
    pub number: String,
}

impl NewFlightNumber {
    /// Create a new flight number.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
        }
    }
}

/// Snapshot of a survey shown for a flight, taken when the session closed.
///
/// The fields are denormalized on purpose: deleting the survey or flight
/// later does not touch the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    /// Store-assigned identifier.
    pub id: i64,
    /// Name of the survey that was shown.
    pub survey_name: String,
    /// Flight code the survey was shown for.
    pub flight_number: String,
    /// ISO-8601 point in time the session closed.
    pub timestamp: String,
    /// Whether the record has been delivered.
    pub submitted: bool,
    /// Link of the survey that was shown.
    pub survey_url: String,
}

impl SurveyRecord {
    /// Split this record into its id and its id-less body.
    #[must_use]
    pub fn into_parts(self) -> (i64, NewSurveyRecord) {
        (
            self.id,
            NewSurveyRecord {
                survey_name: self.survey_name,
                flight_number: self.flight_number,
                timestamp: self.timestamp,
                submitted: self.submitted,
                survey_url: self.survey_url,
            },
        )
    }

    /// Human-readable delivery status.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.submitted {
            "Submitted"
        } else {
            "Pending Sync"
        }
    }
}

/// A survey record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSurveyRecord {
    /// Name of the survey that was shown.
    pub survey_name: String,
    /// Flight code the survey was shown for.
    pub flight_number: String,
    /// ISO-8601 point in time the session closed.
    pub timestamp: String,
    /// Whether the record has been delivered.
    pub submitted: bool,
    /// Link of the survey that was shown.
    pub survey_url: String,
}

impl NewSurveyRecord {
    /// Attach a store-assigned id.
    #[must_use]
    pub fn with_id(self, id: i64) -> SurveyRecord {
        SurveyRecord {
            id,
            survey_name: self.survey_name,
            flight_number: self.flight_number,
            timestamp: self.timestamp,
            submitted: self.submitted,
            survey_url: self.survey_url,
        }
    }
}

/// Format a point in time the way survey records store it.
///
/// Millisecond precision with a `Z` suffix, e.g. `2024-01-01T00:00:00.000Z`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The operator's profile. At most one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name used in greetings.
    pub name: String,
    /// Contact email.
    pub email: String,
}

impl UserProfile {
    /// Create a profile.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> NewSurveyRecord {
        NewSurveyRecord {
            survey_name: "Cabin Crew Feedback".to_string(),
            flight_number: "FA200".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            submitted: false,
            survey_url: "https://example.com/s1".to_string(),
        }
    }

    #[test]
    fn test_with_id_and_into_parts() {
        let record = sample_record().with_id(4);
        assert_eq!(record.id, 4);

        let (id, body) = record.into_parts();
        assert_eq!(id, 4);
        assert_eq!(body, sample_record());
    }

    #[test]
    fn test_status_label() {
        let mut record = sample_record().with_id(1);
        assert_eq!(record.status_label(), "Pending Sync");
        record.submitted = true;
        assert_eq!(record.status_label(), "Submitted");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(sample_record().with_id(1)).unwrap();
        assert_eq!(json["surveyName"], "Cabin Crew Feedback");
        assert_eq!(json["flightNumber"], "FA200");
        assert_eq!(json["surveyUrl"], "https://example.com/s1");
        assert_eq!(json["submitted"], false);
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_constructors() {
        assert_eq!(NewSurvey::new("A", "https://a").name, "A");
        assert_eq!(NewFlightNumber::new("FA1").number, "FA1");
        assert_eq!(UserProfile::new("N", "e@x").email, "e@x");
    }
}
