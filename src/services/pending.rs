use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::CollaboratorError;
use crate::models::{PendingSelection, TimeSlot};

/// Requester-keyed selections awaiting their broadcast message.
/// Every entry carries an expiry; an expired entry reads as absent.
#[derive(Clone)]
pub struct PendingStore {
    db: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl PendingStore {
    pub fn new(db: Arc<Mutex<Connection>>, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    pub fn put(
        &self,
        requester_id: &str,
        slot: TimeSlot,
        booking_id: &str,
        now: NaiveDateTime,
    ) -> Result<PendingSelection, CollaboratorError> {
        let pending = PendingSelection {
            requester_id: requester_id.to_string(),
            slot,
            booking_id: booking_id.to_string(),
            expires_at: now + self.ttl,
        };
        let db = self.db.lock().unwrap();
        queries::upsert_pending(&db, &pending).map_err(CollaboratorError::PendingStore)?;
        Ok(pending)
    }

    pub fn get(
        &self,
        requester_id: &str,
        now: NaiveDateTime,
    ) -> Result<Option<PendingSelection>, CollaboratorError> {
        let db = self.db.lock().unwrap();
        queries::get_pending(&db, requester_id, &now).map_err(CollaboratorError::PendingStore)
    }

    pub fn remove(&self, requester_id: &str) -> Result<bool, CollaboratorError> {
        let db = self.db.lock().unwrap();
        queries::delete_pending(&db, requester_id).map_err(CollaboratorError::PendingStore)
    }

    pub fn purge_expired(&self, now: NaiveDateTime) -> Result<usize, CollaboratorError> {
        let db = self.db.lock().unwrap();
        queries::expire_pending(&db, &now).map_err(CollaboratorError::PendingStore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::{NaiveDate, NaiveTime};

    fn store(ttl_minutes: i64) -> PendingStore {
        let conn = db::init_db(":memory:").unwrap();
        PendingStore::new(Arc::new(Mutex::new(conn)), Duration::minutes(ttl_minutes))
    }

    fn slot() -> TimeSlot {
        TimeSlot::new(
            NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        )
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_put_sets_expiry_from_ttl() {
        let store = store(15);
        let pending = store.put("C1", slot(), "b-1", now()).unwrap();
        assert_eq!(pending.expires_at, now() + Duration::minutes(15));
        assert_eq!(store.get("C1", now()).unwrap(), Some(pending));
    }

    #[test]
    fn test_entry_vanishes_after_ttl() {
        let store = store(15);
        store.put("C1", slot(), "b-1", now()).unwrap();

        assert!(store.get("C1", now() + Duration::minutes(14)).unwrap().is_some());
        assert!(store.get("C1", now() + Duration::minutes(16)).unwrap().is_none());

        assert_eq!(store.purge_expired(now() + Duration::minutes(16)).unwrap(), 1);
        assert!(!store.remove("C1").unwrap());
    }
}
