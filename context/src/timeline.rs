//! "Last seen" bookkeeping per timeline.
//!
//! For each (timeline type, user) pair we remember the date of the newest
//! downloaded item, when the timeline was last downloaded, and the remote
//! position to continue from.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use warble_types::{TimelinePosition, TimelineType, UserId};

use crate::{Database, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestTimelineItem {
    timeline_type: TimelineType,
    user_id: UserId,
    item_date: i64,
    downloaded_date: i64,
    position: TimelinePosition,
    changed: bool,
}

impl LatestTimelineItem {
    /// Load the stored record, or a zeroed one when there is none.
    pub fn load(
        db: &Database,
        timeline_type: TimelineType,
        user_id: UserId,
    ) -> Result<Self, StorageError> {
        let stored = db
            .conn()
            .query_row(
                "SELECT item_date, downloaded_date, position FROM latest_timeline_item
                 WHERE timeline_type = ?1 AND user_id = ?2",
                params![timeline_type.save(), user_id.value()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        let (item_date, downloaded_date, position) = stored.unwrap_or_default();
        Ok(Self {
            timeline_type,
            user_id,
            item_date,
            downloaded_date,
            position: TimelinePosition::new(position),
            changed: false,
        })
    }

    /// Record that the timeline was just downloaded.
    pub fn on_timeline_downloaded(&mut self) {
        self.downloaded_date = Utc::now().timestamp_millis();
        self.changed = true;
    }

    /// Record a downloaded message; only a newer one moves the position.
    pub fn on_new_msg(&mut self, position: TimelinePosition, sent_date: i64) {
        if sent_date > self.item_date && !position.is_empty() {
            self.item_date = sent_date;
            self.position = position;
            self.changed = true;
        }
    }

    /// Persist if anything changed. Dates of timelines that don't remember
    /// them are stored as zero.
    pub fn save(&mut self, db: &Database) -> Result<(), StorageError> {
        if !self.changed {
            return Ok(());
        }
        let remember = self.timeline_type.remembers_dates();
        let (item_date, downloaded_date, position) = if remember {
            (self.item_date, self.downloaded_date, self.position.as_str())
        } else {
            (0, 0, "")
        };
        db.conn().execute(
            "INSERT INTO latest_timeline_item
                (timeline_type, user_id, item_date, downloaded_date, position)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(timeline_type, user_id) DO UPDATE SET
                item_date = excluded.item_date,
                downloaded_date = excluded.downloaded_date,
                position = excluded.position",
            params![
                self.timeline_type.save(),
                self.user_id.value(),
                item_date,
                downloaded_date,
                position
            ],
        )?;
        self.changed = false;
        tracing::debug!(timeline = %self.timeline_type, user = %self.user_id, "Saved latest timeline item");
        Ok(())
    }

    #[must_use]
    pub fn timeline_item_date(&self) -> i64 {
        self.item_date
    }

    #[must_use]
    pub fn timeline_downloaded_date(&self) -> i64 {
        self.downloaded_date
    }

    #[must_use]
    pub fn position(&self) -> &TimelinePosition {
        &self.position
    }
}
