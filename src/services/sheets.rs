use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::CollaboratorError;
use crate::models::booking::MESSAGE_COLUMN;
use crate::models::{BookingRecord, TimeSlot};

const SERVICE: &str = "spreadsheet";

/// Row storage for bookings, one row per booking (see `BookingRecord::to_row`).
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    async fn append_booking(&self, record: &BookingRecord) -> Result<(), CollaboratorError>;

    /// Whether any row already holds this slot.
    async fn find_slot(&self, slot: &TimeSlot) -> Result<bool, CollaboratorError>;

    /// Rewrites the message cell of the requester's row for `booking_id`.
    /// Returns false when no such row exists.
    async fn update_message(
        &self,
        requester_id: &str,
        booking_id: &str,
        message: &str,
    ) -> Result<bool, CollaboratorError>;
}

/// Google Sheets v4 values API. `range` must start at column A, row 1 (e.g. `Sheet1!A:E`).
pub struct GoogleSheets {
    api_base: String,
    spreadsheet_id: String,
    range: String,
    access_token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ValuesBody<'a> {
    values: Vec<Vec<&'a str>>,
}

impl GoogleSheets {
    pub fn new(api_base: String, spreadsheet_id: String, range: String, access_token: String) -> Self {
        Self {
            api_base,
            spreadsheet_id,
            range,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn values_url(&self, range: &str) -> Result<Url, CollaboratorError> {
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
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    fn sheet_name(&self) -> &str {
        self.range.split_once('!').map_or(self.range.as_str(), |(sheet, _)| sheet)
    }

    async fn rows(&self) -> Result<Vec<Vec<String>>, CollaboratorError> {
        let response = self
            .client
            .get(self.values_url(&self.range)?)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(CollaboratorError::http(SERVICE))?;
        if !response.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: response.status(),
            });
        }
        let body: ValueRange = response.json().await.map_err(CollaboratorError::http(SERVICE))?;
        Ok(body.values)
    }
}

fn row_holds_slot(row: &[String], slot: &TimeSlot) -> bool {
    row.get(1).map(String::as_str) == Some(slot.date_label().as_str())
        && row.get(2).map(String::as_str) == Some(slot.time_label().as_str())
}

/// 1-based sheet row of the last row matching requester and booking id.
fn find_booking_row(rows: &[Vec<String>], requester_id: &str, booking_id: &str) -> Option<usize> {
    rows.iter()
        .rposition(|row| {
            row.first().map(String::as_str) == Some(requester_id)
                && row.get(4).map(String::as_str) == Some(booking_id)
        })
        .map(|idx| idx + 1)
}

fn message_column_letter() -> char {
    char::from(b'A' + MESSAGE_COLUMN as u8)
}

#[async_trait]
impl SpreadsheetStore for GoogleSheets {
    async fn append_booking(&self, record: &BookingRecord) -> Result<(), CollaboratorError> {
        let row = record.to_row();
        let body = ValuesBody {
            values: vec![row.iter().map(String::as_str).collect()],
        };
        let url = self.values_url(&format!("{}:append", self.range))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body)
            .send()
            .await
            .map_err(CollaboratorError::http(SERVICE))?;
        if !response.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: response.status(),
            });
        }
        Ok(())
    }

    async fn find_slot(&self, slot: &TimeSlot) -> Result<bool, CollaboratorError> {
        Ok(self.rows().await?.iter().any(|row| row_holds_slot(row, slot)))
    }

    async fn update_message(
        &self,
        requester_id: &str,
        booking_id: &str,
        message: &str,
    ) -> Result<bool, CollaboratorError> {
        let rows = self.rows().await?;
        let Some(row_number) = find_booking_row(&rows, requester_id, booking_id) else {
            return Ok(false);
        };

        let cell = format!("{}!{}{}", self.sheet_name(), message_column_letter(), row_number);
        let body = ValuesBody {
            values: vec![vec![message]],
        };

        let response = self
            .client
            .put(self.values_url(&cell)?)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await
            .map_err(CollaboratorError::http(SERVICE))?;
        if !response.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: response.status(),
            });
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_row_holds_slot() {
        let slot = TimeSlot::new(
            NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        );
        assert!(row_holds_slot(&row(&["C1", "2025-06-16", "07:00", "hi", "b1"]), &slot));
        assert!(!row_holds_slot(&row(&["C1", "2025-06-17", "07:00"]), &slot));
        assert!(!row_holds_slot(&row(&["C1"]), &slot));
    }

    #[test]
    fn test_find_booking_row_is_one_based() {
        let rows = vec![
            row(&["requester", "date", "time", "message", "booking_id"]),
            row(&["C1", "2025-06-16", "07:00", "", "b1"]),
            row(&["C2", "2025-06-16", "10:00", "", "b2"]),
        ];
        assert_eq!(find_booking_row(&rows, "C2", "b2"), Some(3));
        assert_eq!(find_booking_row(&rows, "C1", "b2"), None);
    }

    #[test]
    fn test_urls() {
        let sheets = GoogleSheets::new(
            "https://sheets.googleapis.com".to_string(),
            "sheet-id".to_string(),
            "Bookings!A:E".to_string(),
            "token".to_string(),
        );
        assert_eq!(sheets.sheet_name(), "Bookings");
        assert_eq!(message_column_letter(), 'D');
        assert_eq!(
            sheets.values_url("Bookings!A:E:append").unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/Bookings!A:E:append"
        );
    }
}
