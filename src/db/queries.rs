use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection};

use crate::models::{PendingSelection, TimeSlot};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Pending selections ──

pub fn upsert_pending(conn: &Connection, pending: &PendingSelection) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO pending_selections (requester_id, slot_date, slot_time, booking_id, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(requester_id) DO UPDATE SET
           slot_date = excluded.slot_date,
           slot_time = excluded.slot_time,
           booking_id = excluded.booking_id,
           expires_at = excluded.expires_at",
        params![
            pending.requester_id,
            pending.slot.date_label(),
            pending.slot.time_label(),
            pending.booking_id,
            pending.expires_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

/// Returns the requester's selection unless it expired at or before `now`.
pub fn get_pending(
    conn: &Connection,
    requester_id: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<PendingSelection>> {
    let now = now.format(TIMESTAMP_FORMAT).to_string();
    let mut stmt = conn.prepare(
        "SELECT requester_id, slot_date, slot_time, booking_id, expires_at
         FROM pending_selections WHERE requester_id = ?1 AND expires_at > ?2",
    )?;

    let result = stmt.query_row(params![requester_id, now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    });

    match result {
        Ok((requester_id, date, time, booking_id, expires_at)) => Ok(Some(PendingSelection {
            requester_id,
            slot: TimeSlot::new(
                NaiveDate::parse_from_str(&date, "%Y-%m-%d")?,
                NaiveTime::parse_from_str(&time, "%H:%M")?,
            ),
            booking_id,
            expires_at: NaiveDateTime::parse_from_str(&expires_at, TIMESTAMP_FORMAT)?,
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn delete_pending(conn: &Connection, requester_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM pending_selections WHERE requester_id = ?1",
        params![requester_id],
    )?;
    Ok(count > 0)
}

pub fn expire_pending(conn: &Connection, now: &NaiveDateTime) -> anyhow::Result<usize> {
    let now = now.format(TIMESTAMP_FORMAT).to_string();
    let count = conn.execute(
        "DELETE FROM pending_selections WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}
