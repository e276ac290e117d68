use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::CollaboratorError;
use crate::models::slot::SLOT_TIME_ZONE;
use crate::models::BookingRecord;

const SERVICE: &str = "calendar";

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Start timestamps of every timed event starting in `[from, to)`.
    async fn list_event_starts(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<DateTime<FixedOffset>>, CollaboratorError>;

    /// Inserts an event covering the booked slot; returns the event id.
    async fn insert_event(&self, record: &BookingRecord) -> Result<String, CollaboratorError>;
}

/// Google Calendar v3 over plain REST with a bearer token.
pub struct GoogleCalendar {
    api_base: String,
    calendar_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl GoogleCalendar {
    pub fn new(api_base: String, calendar_id: String, access_token: String) -> Self {
        Self {
            api_base,
            calendar_id,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn events_url(&self) -> Result<Url, CollaboratorError> {
        let mut url = Url::parse(&self.api_base).map_err(|e| CollaboratorError::Malformed {
            service: SERVICE,
            detail: format!("invalid api base: {e}"),
        })?;
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::Malformed {
                service: SERVICE,
                detail: "api base cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["calendar", "v3", "calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<EventItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    #[serde(default)]
    start: Option<EventTime>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewEvent {
    summary: String,
    description: String,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

fn event_time(at: DateTime<FixedOffset>) -> EventTime {
    EventTime {
        date_time: Some(at.to_rfc3339()),
        time_zone: Some(SLOT_TIME_ZONE.to_string()),
    }
}

fn event_description(record: &BookingRecord) -> String {
    format!(
        "booking_id: {}\nrequester: {}\nbooked_at: {}\n{}",
        record.id,
        record.requester_id,
        record.created_at.to_rfc3339(),
        record.message
    )
}

#[async_trait]
impl CalendarProvider for GoogleCalendar {
    async fn list_event_starts(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<DateTime<FixedOffset>>, CollaboratorError> {
        let url = self.events_url()?;
        let mut starts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("timeMin", from.to_rfc3339()),
                ("timeMax", to.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("timeZone", SLOT_TIME_ZONE.to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(url.clone())
                .bearer_auth(&self.access_token)
                .query(&query)
                .send()
                .await
                .map_err(CollaboratorError::http(SERVICE))?;
            if !response.status().is_success() {
                return Err(CollaboratorError::Status {
                    service: SERVICE,
                    status: response.status(),
                });
            }
            let page: EventList = response.json().await.map_err(CollaboratorError::http(SERVICE))?;

            for item in page.items {
                // All-day events carry `date` only and never collide with a timed slot.
                let Some(raw) = item.start.and_then(|s| s.date_time) else {
                    continue;
                };
                let start = DateTime::parse_from_rfc3339(&raw).map_err(|e| {
                    CollaboratorError::Malformed {
                        service: SERVICE,
                        detail: format!("bad event start {raw}: {e}"),
                    }
                })?;
                starts.push(start);
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(starts)
    }

    async fn insert_event(&self, record: &BookingRecord) -> Result<String, CollaboratorError> {
        let event = NewEvent {
            summary: format!("Booking {}", record.requester_id),
            description: event_description(record),
            start: event_time(record.slot.start_at()),
            end: event_time(record.slot.end_at()),
        };

        let response = self
            .client
            .post(self.events_url()?)
            .bearer_auth(&self.access_token)
            .json(&event)
            .send()
            .await
            .map_err(CollaboratorError::http(SERVICE))?;
        if !response.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: response.status(),
            });
        }
        let inserted: InsertedEvent = response.json().await.map_err(CollaboratorError::http(SERVICE))?;

        Ok(inserted.id)
    }
}
