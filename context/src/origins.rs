//! Origins loaded from storage.

use std::collections::BTreeMap;

use rusqlite::{OptionalExtension, params};
use warble_types::{Origin, OriginId, OriginKind};

use crate::{Database, StorageError};

/// Origins every installation starts with.
const BUILTIN_ORIGINS: &[(&str, OriginKind)] = &[
    ("twitter", OriginKind::Twitter),
    ("statusnet", OriginKind::StatusNet),
    ("pumpio", OriginKind::PumpIo),
];

#[derive(Debug, Clone, Default)]
pub struct PersistentOrigins {
    by_id: BTreeMap<OriginId, Origin>,
}

impl PersistentOrigins {
    /// Placeholder used by contexts that are not (yet) backed by storage.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load all origins, inserting the built-in ones on first use.
    pub fn initialize(&mut self, db: &Database) -> Result<(), StorageError> {
        let conn = db.conn();
        for (name, kind) in BUILTIN_ORIGINS {
            conn.execute(
                "INSERT OR IGNORE INTO origin (name, kind, text_limit) VALUES (?1, ?2, ?3)",
                params![name, kind.as_str(), kind.default_text_limit()],
            )?;
        }

        let mut stmt = conn.prepare("SELECT id, name, kind, text_limit FROM origin ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?;

        let mut by_id = BTreeMap::new();
        for row in rows {
            let (id, name, kind, text_limit) = row?;
            let Some(kind) = OriginKind::parse(&kind) else {
                tracing::warn!(origin = %name, kind = %kind, "Skipping origin of unknown kind");
                continue;
            };
            let id = OriginId::new(id);
            by_id.insert(id, Origin::new(id, name, kind).with_text_limit(text_limit));
        }
        tracing::debug!(count = by_id.len(), "Origins loaded");
        self.by_id = by_id;
        Ok(())
    }

    /// Register a new origin (e.g. a particular StatusNet site) and cache it.
    pub fn add(
        &mut self,
        db: &Database,
        name: &str,
        kind: OriginKind,
        text_limit: u32,
    ) -> Result<Origin, StorageError> {
        let conn = db.conn();
        conn.execute(
            "INSERT INTO origin (name, kind, text_limit) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET kind = excluded.kind, text_limit = excluded.text_limit",
            params![name, kind.as_str(), text_limit],
        )?;
        let id: i64 = conn
            .query_row("SELECT id FROM origin WHERE name = ?1", [name], |row| row.get(0))
            .optional()?
            .ok_or_else(|| StorageError::UnknownOrigin(name.to_string()))?;
        let origin = Origin::new(OriginId::new(id), name, kind).with_text_limit(text_limit);
        self.by_id.insert(origin.id, origin.clone());
        Ok(origin)
    }

    #[must_use]
    pub fn from_id(&self, id: OriginId) -> Option<&Origin> {
        self.by_id.get(&id)
    }

    #[must_use]
    pub fn from_name(&self, name: &str) -> Option<&Origin> {
        self.by_id.values().find(|origin| origin.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Origin> {
        self.by_id.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
