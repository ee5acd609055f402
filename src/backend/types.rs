//! Wire types for the adebar server API

use serde::{Deserialize, Serialize};

use crate::config::CatalogShape;
use crate::picker::model::{CandidateRecord, RecordId};

/// Shown in place of a missing date of birth
pub const MISSING_DOB: &str = "---";

/// Person search result (`/api/persons/simpleSearch` and friends)
#[derive(Debug, Clone, Deserialize)]
pub struct SimplePerson {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<SimplePerson> for CandidateRecord {
    fn from(person: SimplePerson) -> Self {
        let dob = person
            .dob
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| MISSING_DOB.to_string());
        let address = person.address.unwrap_or_default();
        CandidateRecord {
            id: person.id,
            title: person.name,
            description: address.clone(),
            details: vec![dob, address],
        }
    }
}

/// Event listing entry (`/api/events/localGroup`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleEvent {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
}

impl From<SimpleEvent> for CandidateRecord {
    fn from(event: SimpleEvent) -> Self {
        let place = event.place.unwrap_or_default();
        CandidateRecord {
            id: event.id,
            title: event.name,
            description: place.clone(),
            details: vec![
                event.start_date.unwrap_or_default(),
                event.end_date.unwrap_or_default(),
                place,
            ],
        }
    }
}

/// Decode a search response body into candidates, keeping server order.
pub fn decode_records(
    shape: CatalogShape,
    body: &str,
) -> Result<Vec<CandidateRecord>, serde_json::Error> {
    Ok(match shape {
        CatalogShape::Person => serde_json::from_str::<Vec<SimplePerson>>(body)?
            .into_iter()
            .map(CandidateRecord::from)
            .collect(),
        CatalogShape::Event => serde_json::from_str::<Vec<SimpleEvent>>(body)?
            .into_iter()
            .map(CandidateRecord::from)
            .collect(),
    })
}

/// Status answer of the reservation endpoints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusResponse {
    Ok,
    Overbooked {
        #[serde(rename = "slotsAvailable")]
        slots_available: u32,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

/// Body of `/api/events/addReservation` and `/api/events/editReservation`
#[derive(Debug, Clone, Serialize)]
pub struct ReservationForm<'a> {
    pub event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub description: &'a str,
    pub slots: u32,
    pub email: &'a str,
}

/// Body of `/api/events/removeReservation`
#[derive(Debug, Clone, Serialize)]
pub struct RemoveReservationForm<'a> {
    pub event: &'a str,
    pub id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_records_keep_server_order() {
        let body = r#"[
            {"id": 1, "name": "Anna", "dob": "01.01.1990", "address": "Berlin"},
            {"id": 2, "name": "Ben", "dob": null, "address": "Leipzig"},
            {"id": 3, "name": "Carla"}
        ]"#;
        let records = decode_records(CatalogShape::Person, body).unwrap();

        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Anna", "Ben", "Carla"]);
        assert_eq!(records[0].id, RecordId::Number(1));
        assert_eq!(records[0].description, "Berlin");
        assert_eq!(records[0].details, vec!["01.01.1990", "Berlin"]);
        assert_eq!(records[1].details[0], MISSING_DOB);
        assert_eq!(records[2].description, "");
    }

    #[test]
    fn test_event_records() {
        let body = r#"[{"id": 12, "name": "Sommercamp", "startDate": "2017-07-01T10:00",
                        "endDate": "2017-07-08T16:00", "place": "Dresden"}]"#;
        let records = decode_records(CatalogShape::Event, body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Sommercamp");
        assert_eq!(records[0].description, "Dresden");
        assert_eq!(records[0].details[0], "2017-07-01T10:00");
    }

    #[test]
    fn test_empty_result() {
        assert!(decode_records(CatalogShape::Person, "[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(decode_records(CatalogShape::Person, r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn test_status_responses() {
        let ok: StatusResponse = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert_eq!(ok, StatusResponse::Ok);

        let overbooked: StatusResponse =
            serde_json::from_str(r#"{"status": "overbooked", "slotsAvailable": 2}"#).unwrap();
        assert_eq!(overbooked, StatusResponse::Overbooked { slots_available: 2 });

        let error: StatusResponse =
            serde_json::from_str(r#"{"status": "error", "message": "no such event"}"#).unwrap();
        assert_eq!(
            error,
            StatusResponse::Error {
                message: "no such event".to_string()
            }
        );
    }
}
